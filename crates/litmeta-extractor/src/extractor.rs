//! Single-document extraction with retry and backoff

use crate::classify::{ErrorCategory, ErrorClassifier};
use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::parser::{parse_response, ParsedResponse};
use crate::prompt::{build_prompt, SYSTEM_INSTRUCTION};
use crate::types::{DocumentOutcome, ErrorLogEntry, ExtractionRecord};
use litmeta_llm::{Attachment, GenerationRequest, LlmProvider};
use std::path::Path;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

/// Result of one remote call
enum AttemptOutcome {
    Success(ParsedResponse),
    Retryable(ErrorCategory, String),
    Permanent(ErrorCategory, String),
}

/// Delay before retrying after failed attempt number `attempt` (1-based)
///
/// `base * 2^(attempt - 1)`, saturating instead of overflowing.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(factor)
}

/// Extracts metadata from one document at a time
pub struct Extractor<L>
where
    L: LlmProvider,
{
    provider: L,
    config: ExtractorConfig,
    classifier: ErrorClassifier,
}

impl<L> Extractor<L>
where
    L: LlmProvider,
{
    /// Create a new Extractor
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `config` does not validate.
    pub fn new(provider: L, config: ExtractorConfig) -> Result<Self, ExtractorError> {
        config.validate()?;
        let classifier = ErrorClassifier::from_config(&config);
        Ok(Self {
            provider,
            config,
            classifier,
        })
    }

    /// The configuration in use
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// The provider answering requests
    pub fn provider(&self) -> &L {
        &self.provider
    }

    /// Extract `fields` from the document at `path`
    ///
    /// Remote failures are part of the returned outcome, never an `Err`.
    /// Errors are reserved for invalid configuration and for documents that
    /// cannot be read at all, which are never retried.
    pub async fn extract(
        &self,
        path: &Path,
        fields: &[String],
        max_attempts: u32,
    ) -> Result<DocumentOutcome, ExtractorError> {
        if max_attempts == 0 {
            return Err(ExtractorError::Config(
                "max_attempts must be greater than 0".to_string(),
            ));
        }

        let prompt = build_prompt(&self.config.fields, fields)?;
        let filename = display_name(path);
        let (data, mut warnings) = self.load_document(path, &filename).await?;

        info!("Extracting {} field(s) from '{}'", fields.len(), filename);
        debug!("Prompt length: {} chars, document {} bytes", prompt.len(), data.len());

        let request = GenerationRequest::new(SYSTEM_INSTRUCTION, prompt)
            .with_attachment(Attachment::pdf(filename.clone(), data));

        let mut error_log = Vec::new();
        let mut attempt = 0;

        loop {
            attempt += 1;

            let (category, message, retryable) = match self.attempt(&request, fields).await {
                AttemptOutcome::Success(parsed) => {
                    warnings.extend(parsed.warnings());
                    info!("Extracted '{}' on attempt {}", filename, attempt);
                    return Ok(DocumentOutcome {
                        record: Some(ExtractionRecord::new(filename.clone(), parsed)),
                        filename,
                        error_log,
                        warnings,
                        attempts: attempt,
                    });
                }
                AttemptOutcome::Retryable(category, message) => (category, message, true),
                AttemptOutcome::Permanent(category, message) => (category, message, false),
            };

            warn!(
                "Attempt {}/{} for '{}' failed ({}): {}",
                attempt, max_attempts, filename, category, message
            );
            error_log.push(ErrorLogEntry::new(filename.clone(), category, message, attempt));

            if !retryable || attempt >= max_attempts {
                break;
            }

            let delay = backoff_delay(self.config.request_delay(), attempt);
            info!("Retrying '{}' in {:.1}s", filename, delay.as_secs_f64());
            sleep(delay).await;
        }

        Ok(DocumentOutcome {
            filename,
            record: None,
            error_log,
            warnings,
            attempts: attempt,
        })
    }

    /// One remote call plus parsing, classified
    async fn attempt(&self, request: &GenerationRequest, fields: &[String]) -> AttemptOutcome {
        let limit = self.config.request_timeout();
        let reply = match timeout(limit, self.provider.generate(request)).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                let category = self.classifier.classify(&e);
                return self.failed(category, e.to_string());
            }
            Err(_) => {
                return self.failed(
                    ErrorCategory::Timeout,
                    format!("No response within {}s", limit.as_secs()),
                );
            }
        };

        debug!("LLM response length: {} chars", reply.len());

        match parse_response(&reply, fields) {
            Ok(parsed) => AttemptOutcome::Success(parsed),
            Err(e) => {
                if let ExtractorError::MalformedResponse { raw, .. } = &e {
                    debug!("Undecodable reply: {}", raw);
                }
                self.failed(ErrorCategory::MalformedResponse, e.to_string())
            }
        }
    }

    fn failed(&self, category: ErrorCategory, message: String) -> AttemptOutcome {
        if self.classifier.is_retryable(category) {
            AttemptOutcome::Retryable(category, message)
        } else {
            AttemptOutcome::Permanent(category, message)
        }
    }

    /// Precondition checks and file read
    async fn load_document(
        &self,
        path: &Path,
        filename: &str,
    ) -> Result<(Vec<u8>, Vec<String>), ExtractorError> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| ExtractorError::from_io(path, e))?;

        if !metadata.is_file() {
            return Err(ExtractorError::InvalidInput(format!(
                "{} is not a regular file",
                path.display()
            )));
        }

        let mut warnings = Vec::new();

        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if !is_pdf {
            warnings.push(format!(
                "'{}' does not have a .pdf extension; processing anyway",
                filename
            ));
        }

        let limit = self.config.max_file_size_bytes();
        if metadata.len() > limit {
            warnings.push(format!(
                "'{}' is {:.1} MB, above the {} MB threshold; the API may reject it",
                filename,
                metadata.len() as f64 / (1024.0 * 1024.0),
                self.config.max_file_size_mb
            ));
        }

        for warning in &warnings {
            warn!("{}", warning);
        }

        let data = tokio::fs::read(path)
            .await
            .map_err(|e| ExtractorError::from_io(path, e))?;

        Ok((data, warnings))
    }
}

/// File name shown in tables and logs
pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
