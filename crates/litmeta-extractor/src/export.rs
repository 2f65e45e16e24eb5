//! CSV export for results tables and error logs

use crate::error::ExtractorError;
use crate::types::{ErrorLogEntry, ResultsTable};
use chrono::{DateTime, Local};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Header row of the error-log CSV
pub const ERROR_LOG_COLUMNS: [&str; 5] = [
    "timestamp",
    "filename",
    "error_type",
    "error_message",
    "attempt_number",
];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Write `table` as CSV, header first
pub fn write_results_csv<W: Write>(writer: W, table: &ResultsTable) -> Result<(), ExtractorError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(table.columns())?;
    for record in table.rows() {
        csv.write_record(record.row(table.columns()))?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write error-log entries as CSV, header first
pub fn write_error_log_csv<W: Write>(
    writer: W,
    entries: &[ErrorLogEntry],
) -> Result<(), ExtractorError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(ERROR_LOG_COLUMNS)?;
    for entry in entries {
        let timestamp = entry.timestamp.format(TIMESTAMP_FORMAT).to_string();
        let attempt = entry.attempt.to_string();
        csv.write_record([
            timestamp.as_str(),
            entry.filename.as_str(),
            entry.category.label(),
            entry.message.as_str(),
            attempt.as_str(),
        ])?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Timestamped file name for an error log written at `at`
pub fn error_log_file_name(at: DateTime<Local>) -> String {
    format!("extraction_errors_{}.csv", at.format("%Y%m%d_%H%M%S"))
}

/// Save `entries` to a new timestamped CSV under `dir`
///
/// Nothing is written for an empty log and `Ok(None)` is returned.
pub fn save_error_log(
    dir: &Path,
    entries: &[ErrorLogEntry],
) -> Result<Option<PathBuf>, ExtractorError> {
    if entries.is_empty() {
        return Ok(None);
    }

    std::fs::create_dir_all(dir).map_err(|e| ExtractorError::from_io(dir, e))?;
    let path = dir.join(error_log_file_name(Local::now()));
    let file = File::create(&path).map_err(|e| ExtractorError::from_io(&path, e))?;
    write_error_log_csv(file, entries)?;

    info!("Saved {} error log entries to {}", entries.len(), path.display());
    Ok(Some(path))
}

/// Save `table` as CSV at `path`
pub fn save_results(path: &Path, table: &ResultsTable) -> Result<(), ExtractorError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ExtractorError::from_io(parent, e))?;
    }
    let file = File::create(path).map_err(|e| ExtractorError::from_io(path, e))?;
    write_results_csv(file, table)?;
    info!("Saved {} result row(s) to {}", table.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ErrorCategory;
    use crate::types::ExtractionRecord;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_results_csv_quotes_separators() {
        let mut table = ResultsTable::new(&["title".to_string(), "author".to_string()]);
        table.push(ExtractionRecord {
            filename: "a.pdf".to_string(),
            fields: vec![
                ("title".to_string(), "Water, Soil".to_string()),
                ("author".to_string(), "Ann Lee; Bo Chen".to_string()),
            ],
        });

        let mut out = Vec::new();
        write_results_csv(&mut out, &table).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(
            text,
            "filename,title,author\na.pdf,\"Water, Soil\",Ann Lee; Bo Chen\n"
        );
    }

    #[test]
    fn test_empty_results_csv_has_header() {
        let table = ResultsTable::new(&["year".to_string()]);
        let mut out = Vec::new();
        write_results_csv(&mut out, &table).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "filename,year\n");
    }

    #[test]
    fn test_error_log_csv_columns() {
        let mut entry = ErrorLogEntry::new("b.pdf", ErrorCategory::RateLimit, "HTTP 429", 2);
        entry.timestamp = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();

        let mut out = Vec::new();
        write_error_log_csv(&mut out, &[entry]).unwrap();
        let text = String::from_utf8(out).unwrap();

        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("timestamp,filename,error_type,error_message,attempt_number")
        );
        assert_eq!(
            lines.next(),
            Some("2024-03-05 14:07:09,b.pdf,rate limit,HTTP 429,2")
        );
    }

    #[test]
    fn test_error_log_file_name() {
        let at = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        assert_eq!(error_log_file_name(at), "extraction_errors_20240305_140709.csv");
    }

    #[test]
    fn test_save_empty_error_log_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("logs");
        assert_eq!(save_error_log(&target, &[]).unwrap(), None);
        assert!(!target.exists());
    }

    #[test]
    fn test_save_error_log_creates_directory() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("logs");
        let entry = ErrorLogEntry::new("c.pdf", ErrorCategory::NotFound, "missing", 0);

        let path = save_error_log(&target, &[entry]).unwrap().unwrap();
        assert!(path.starts_with(&target));
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("c.pdf,not found,missing,0"));
    }

    #[test]
    fn test_save_results() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("results.csv");
        let table = ResultsTable::new(&["title".to_string()]);

        save_results(&path, &table).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "filename,title\n");
    }
}
