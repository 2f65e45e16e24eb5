//! Batch orchestration over many documents

use crate::classify::ErrorCategory;
use crate::error::ExtractorError;
use crate::extractor::{display_name, Extractor};
use crate::types::{
    BatchOutput, BatchProgress, BatchSummary, BatchWarning, ErrorLogEntry, FailureDigest,
    ResultsTable,
};
use litmeta_llm::LlmProvider;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Runs an [`Extractor`] over a list of documents, one at a time
pub struct BatchProcessor<L>
where
    L: LlmProvider,
{
    extractor: Extractor<L>,
}

impl<L> BatchProcessor<L>
where
    L: LlmProvider,
{
    /// Create a new batch processor
    pub fn new(extractor: Extractor<L>) -> Self {
        Self { extractor }
    }

    /// The underlying single-document extractor
    pub fn extractor(&self) -> &Extractor<L> {
        &self.extractor
    }

    /// Process `paths` in order, pausing `delay` between documents
    pub async fn process_batch(
        &self,
        paths: &[PathBuf],
        fields: &[String],
        delay: Duration,
    ) -> Result<BatchOutput, ExtractorError> {
        self.process_batch_with_progress(paths, fields, delay, |_| {})
            .await
    }

    /// Like [`process_batch`](Self::process_batch), reporting progress before each document
    ///
    /// Per-document failures never abort the run. Only an empty path list
    /// or an invalid field request is returned as an error, and both are
    /// detected before any file is touched.
    pub async fn process_batch_with_progress<F>(
        &self,
        paths: &[PathBuf],
        fields: &[String],
        delay: Duration,
        mut on_progress: F,
    ) -> Result<BatchOutput, ExtractorError>
    where
        F: FnMut(&BatchProgress),
    {
        if paths.is_empty() {
            return Err(ExtractorError::InvalidInput(
                "no documents to process".to_string(),
            ));
        }
        self.extractor.config().fields.validate_request(fields)?;

        let max_attempts = self.extractor.config().max_attempts;
        let total = paths.len();
        let started = Instant::now();

        let mut results = ResultsTable::new(fields);
        let mut error_log = Vec::new();
        let mut warnings = Vec::new();
        let mut failures = Vec::new();
        let mut succeeded = 0;
        let mut failed = 0;

        info!("Processing {} document(s)", total);

        for (i, path) in paths.iter().enumerate() {
            let filename = display_name(path);
            on_progress(&BatchProgress {
                index: i + 1,
                total,
                filename: filename.clone(),
                succeeded,
                failed,
            });
            info!("[{}/{}] {}", i + 1, total, filename);

            let result = if matches!(tokio::fs::try_exists(path).await, Ok(false)) {
                Err(ExtractorError::NotFound(path.clone()))
            } else {
                self.extractor.extract(path, fields, max_attempts).await
            };

            match result {
                Ok(outcome) => {
                    let last = outcome.error_log.last().cloned();
                    error_log.extend(outcome.error_log);
                    warnings.extend(outcome.warnings.into_iter().map(|message| BatchWarning {
                        filename: outcome.filename.clone(),
                        message,
                    }));
                    match outcome.record {
                        Some(record) => {
                            succeeded += 1;
                            results.push(record);
                        }
                        None => {
                            failed += 1;
                            if let Some(entry) = last {
                                record_failure(
                                    &mut failures,
                                    FailureDigest {
                                        filename: outcome.filename,
                                        category: entry.category,
                                        last_error: entry.message,
                                        attempts: outcome.attempts,
                                    },
                                );
                            }
                        }
                    }
                }
                Err(e) if e.is_configuration_error() => return Err(e),
                Err(e) => {
                    let category = match &e {
                        ExtractorError::NotFound(_) => ErrorCategory::NotFound,
                        ExtractorError::PermissionDenied(_) => ErrorCategory::PermissionDenied,
                        _ => ErrorCategory::Permanent,
                    };
                    error!("Skipping '{}': {}", filename, e);
                    failed += 1;
                    let entry = ErrorLogEntry::new(filename.clone(), category, e.to_string(), 0);
                    record_failure(
                        &mut failures,
                        FailureDigest {
                            filename,
                            category,
                            last_error: entry.message.clone(),
                            attempts: 0,
                        },
                    );
                    error_log.push(entry);
                }
            }

            if i + 1 < total && !delay.is_zero() {
                sleep(delay).await;
            }
        }

        let summary = BatchSummary {
            total_files: total,
            succeeded,
            failed,
            elapsed: started.elapsed(),
            failures,
        };

        if summary.failed > 0 {
            warn!(
                "Batch finished with {} failure(s) out of {}",
                summary.failed, summary.total_files
            );
        }
        info!(
            "Processed {} file(s): {} succeeded, {} failed in {:.1}s",
            summary.total_files,
            summary.succeeded,
            summary.failed,
            summary.elapsed.as_secs_f64()
        );

        Ok(BatchOutput {
            results,
            error_log,
            warnings,
            summary,
        })
    }
}

/// Keep one digest per file name; a later failure replaces the earlier one
fn record_failure(failures: &mut Vec<FailureDigest>, digest: FailureDigest) {
    match failures.iter_mut().find(|f| f.filename == digest.filename) {
        Some(existing) => *existing = digest,
        None => failures.push(digest),
    }
}
