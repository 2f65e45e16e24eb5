//! Result, error-log and summary types for extraction runs

use crate::classify::ErrorCategory;
use crate::parser::{ParsedResponse, NOT_AVAILABLE};
use chrono::{DateTime, Local};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::time::Duration;

/// Name of the first column of every results table
pub const FILENAME_COLUMN: &str = "filename";

/// Metadata extracted from one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRecord {
    /// File name of the source document
    pub filename: String,
    /// `(field, value)` pairs in requested order
    pub fields: Vec<(String, String)>,
}

impl ExtractionRecord {
    /// Create a record from a parsed reply
    pub fn new(filename: impl Into<String>, parsed: ParsedResponse) -> Self {
        Self {
            filename: filename.into(),
            fields: parsed.values,
        }
    }

    /// Value of `field`
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    /// Cells of this record for `columns`
    pub fn row<'a>(&'a self, columns: &[String]) -> Vec<&'a str> {
        columns
            .iter()
            .map(|column| {
                if column == FILENAME_COLUMN {
                    self.filename.as_str()
                } else {
                    self.get(column).unwrap_or(NOT_AVAILABLE)
                }
            })
            .collect()
    }
}

// Serialized as a flat object: filename first, then the fields in order
impl Serialize for ExtractionRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry(FILENAME_COLUMN, &self.filename)?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// All successful records of a batch, with a fixed column set
///
/// The columns are `filename` followed by the requested fields, even when
/// there are no rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsTable {
    columns: Vec<String>,
    rows: Vec<ExtractionRecord>,
}

impl ResultsTable {
    /// Create an empty table for `fields`
    pub fn new(fields: &[String]) -> Self {
        let mut columns = Vec::with_capacity(fields.len() + 1);
        columns.push(FILENAME_COLUMN.to_string());
        columns.extend(fields.iter().cloned());
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a record
    pub fn push(&mut self, record: ExtractionRecord) {
        self.rows.push(record);
    }

    /// Column names
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Records in processing order
    pub fn rows(&self) -> &[ExtractionRecord] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One failed attempt (or skipped file) in the error log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorLogEntry {
    /// When the failure was recorded
    pub timestamp: DateTime<Local>,
    /// File name of the document
    pub filename: String,
    /// Failure category
    pub category: ErrorCategory,
    /// Human-readable cause
    pub message: String,
    /// Attempt number (0 when the file was never attempted)
    pub attempt: u32,
}

impl ErrorLogEntry {
    /// Create an entry stamped with the current time
    pub fn new(
        filename: impl Into<String>,
        category: ErrorCategory,
        message: impl Into<String>,
        attempt: u32,
    ) -> Self {
        Self {
            timestamp: Local::now(),
            filename: filename.into(),
            category,
            message: message.into(),
            attempt,
        }
    }
}

/// What happened to one document
#[derive(Debug, Clone)]
pub struct DocumentOutcome {
    /// File name of the document
    pub filename: String,
    /// Extracted metadata, present on success
    pub record: Option<ExtractionRecord>,
    /// Failed attempts, in order
    pub error_log: Vec<ErrorLogEntry>,
    /// Non-fatal warnings (file checks, missing fields)
    pub warnings: Vec<String>,
    /// Remote calls made
    pub attempts: u32,
}

impl DocumentOutcome {
    /// Whether a record was extracted
    pub fn is_success(&self) -> bool {
        self.record.is_some()
    }
}

/// Progress notification emitted before each document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchProgress {
    /// 1-based position of the document
    pub index: usize,
    /// Number of documents in the batch
    pub total: usize,
    /// File name of the document about to be processed
    pub filename: String,
    /// Successes so far
    pub succeeded: usize,
    /// Failures so far
    pub failed: usize,
}

/// Last error recorded for a document that failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureDigest {
    /// File name of the document
    pub filename: String,
    /// Category of the last error
    pub category: ErrorCategory,
    /// Message of the last error
    pub last_error: String,
    /// Attempts made before giving up
    pub attempts: u32,
}

/// Non-fatal warning raised while processing one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchWarning {
    /// File name of the document
    pub filename: String,
    /// Warning text
    pub message: String,
}

/// Counts and timing for one batch run
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    /// Documents in the batch
    pub total_files: usize,
    /// Documents with an extracted record
    pub succeeded: usize,
    /// Documents without one
    pub failed: usize,
    /// Wall-clock time of the whole run
    pub elapsed: Duration,
    /// One digest per distinct failed file name, holding its last error
    pub failures: Vec<FailureDigest>,
}

impl BatchSummary {
    /// Mean wall-clock time per document
    pub fn average_per_file(&self) -> Duration {
        match u32::try_from(self.total_files) {
            Ok(0) | Err(_) => Duration::ZERO,
            Ok(n) => self.elapsed / n,
        }
    }

    /// Human-readable multi-line summary
    pub fn render(&self) -> String {
        let mut out = format!(
            "Processed {} file(s): {} succeeded, {} failed\nTotal time: {:.1}s (average {:.1}s per file)",
            self.total_files,
            self.succeeded,
            self.failed,
            self.elapsed.as_secs_f64(),
            self.average_per_file().as_secs_f64(),
        );

        if !self.failures.is_empty() {
            out.push_str("\nFailures:");
            for failure in &self.failures {
                out.push_str(&format!(
                    "\n  - {} [{}] after {} attempt(s): {}",
                    failure.filename, failure.category, failure.attempts, failure.last_error
                ));
            }
        }

        out
    }
}

/// Everything a batch run produces
#[derive(Debug, Clone)]
pub struct BatchOutput {
    /// Successful records
    pub results: ResultsTable,
    /// Every failed attempt and skipped file
    pub error_log: Vec<ErrorLogEntry>,
    /// Warnings for documents that were still processed
    pub warnings: Vec<BatchWarning>,
    /// Counts and timing
    pub summary: BatchSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ExtractionRecord {
        ExtractionRecord {
            filename: "a.pdf".to_string(),
            fields: vec![
                ("title".to_string(), "T".to_string()),
                ("year".to_string(), "2020".to_string()),
            ],
        }
    }

    #[test]
    fn test_empty_table_keeps_columns() {
        let table = ResultsTable::new(&["title".to_string(), "year".to_string()]);
        assert!(table.is_empty());
        assert_eq!(table.columns(), ["filename", "title", "year"]);
    }

    #[test]
    fn test_record_row() {
        let columns = vec![
            "filename".to_string(),
            "year".to_string(),
            "state".to_string(),
        ];
        assert_eq!(record().row(&columns), vec!["a.pdf", "2020", NOT_AVAILABLE]);
    }

    #[test]
    fn test_record_serializes_flat() {
        let json = serde_json::to_string(&record()).unwrap();
        assert_eq!(json, r#"{"filename":"a.pdf","title":"T","year":"2020"}"#);
    }

    #[test]
    fn test_summary_average() {
        let summary = BatchSummary {
            total_files: 4,
            succeeded: 3,
            failed: 1,
            elapsed: Duration::from_secs(10),
            failures: Vec::new(),
        };
        assert_eq!(summary.average_per_file(), Duration::from_millis(2500));
    }

    #[test]
    fn test_summary_render_with_failures() {
        let summary = BatchSummary {
            total_files: 2,
            succeeded: 1,
            failed: 1,
            elapsed: Duration::from_secs(3),
            failures: vec![FailureDigest {
                filename: "b.pdf".to_string(),
                category: ErrorCategory::RateLimit,
                last_error: "HTTP 429: slow down".to_string(),
                attempts: 3,
            }],
        };

        let text = summary.render();
        assert!(text.contains("1 succeeded, 1 failed"));
        assert!(text.contains("average 1.5s per file"));
        assert!(text.contains("b.pdf [rate limit] after 3 attempt(s): HTTP 429: slow down"));
    }

    #[test]
    fn test_summary_render_without_failures() {
        let summary = BatchSummary {
            total_files: 1,
            succeeded: 1,
            failed: 0,
            elapsed: Duration::ZERO,
            failures: Vec::new(),
        };
        assert!(!summary.render().contains("Failures"));
    }
}
