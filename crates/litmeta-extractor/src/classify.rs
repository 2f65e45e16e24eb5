//! Transient-vs-permanent classification of failed attempts
//!
//! Structured information on the provider error (variant, HTTP status) is
//! consulted first. Only errors that carry nothing structured fall back to
//! substring matching on the lowercased message, which is configurable and
//! can misclassify: a permanent error whose text happens to mention
//! "connection" will be retried.

use crate::config::{ExtractorConfig, RetryPattern};
use litmeta_llm::LlmError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category recorded for every failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Document path does not exist
    NotFound,
    /// Document cannot be read
    PermissionDenied,
    /// Request timed out
    Timeout,
    /// API rate limit hit (HTTP 429)
    RateLimit,
    /// Connection or transport failure
    Network,
    /// Temporary server-side failure (HTTP 5xx)
    ServerError,
    /// Credentials missing or rejected
    Authentication,
    /// Reply was not a decodable JSON object
    MalformedResponse,
    /// Anything else; not worth retrying
    Permanent,
}

impl ErrorCategory {
    /// Human-readable label used in error logs
    pub fn label(&self) -> &'static str {
        match self {
            ErrorCategory::NotFound => "not found",
            ErrorCategory::PermissionDenied => "permission denied",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::RateLimit => "rate limit",
            ErrorCategory::Network => "network",
            ErrorCategory::ServerError => "server error",
            ErrorCategory::Authentication => "authentication",
            ErrorCategory::MalformedResponse => "malformed response",
            ErrorCategory::Permanent => "permanent",
        }
    }

    /// Whether failures of this kind are likely to succeed on retry
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorCategory::Timeout
                | ErrorCategory::RateLimit
                | ErrorCategory::Network
                | ErrorCategory::ServerError
        )
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Decides the category of a failed attempt and whether to retry it
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    patterns: Vec<RetryPattern>,
    retry_malformed: bool,
}

impl ErrorClassifier {
    /// Create a classifier with explicit fallback patterns
    pub fn new(patterns: Vec<RetryPattern>, retry_malformed: bool) -> Self {
        let patterns = patterns
            .into_iter()
            .map(|p| RetryPattern {
                pattern: p.pattern.to_lowercase(),
                category: p.category,
            })
            .collect();
        Self {
            patterns,
            retry_malformed,
        }
    }

    /// Create a classifier from the extractor configuration
    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self::new(config.retry_patterns.clone(), config.retry_malformed_responses)
    }

    /// Classify a provider error
    pub fn classify(&self, error: &LlmError) -> ErrorCategory {
        match error {
            LlmError::Timeout(_) => ErrorCategory::Timeout,
            LlmError::Communication(_) => ErrorCategory::Network,
            LlmError::MissingCredentials(_) => ErrorCategory::Authentication,
            LlmError::ModelNotAvailable(_) => ErrorCategory::Permanent,
            LlmError::Status { status, .. } => match status {
                429 => ErrorCategory::RateLimit,
                500 | 502 | 503 | 504 => ErrorCategory::ServerError,
                401 | 403 => ErrorCategory::Authentication,
                _ => self.match_message(&error.to_string()),
            },
            LlmError::InvalidResponse(_) | LlmError::Other(_) => {
                self.match_message(&error.to_string())
            }
        }
    }

    /// Fallback: first configured pattern found in the lowercased message
    pub fn match_message(&self, message: &str) -> ErrorCategory {
        let lowered = message.to_lowercase();
        self.patterns
            .iter()
            .find(|p| lowered.contains(&p.pattern))
            .map(|p| p.category)
            .unwrap_or(ErrorCategory::Permanent)
    }

    /// Whether an attempt that failed with `category` should be retried
    pub fn is_retryable(&self, category: ErrorCategory) -> bool {
        category.is_transient()
            || (category == ErrorCategory::MalformedResponse && self.retry_malformed)
    }
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::from_config(&ExtractorConfig::default())
    }
}
