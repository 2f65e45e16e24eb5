//! Litmeta Extractor
//!
//! Extracts bibliographic metadata from PDF documents with an LLM.
//!
//! # Overview
//!
//! Each document is sent, together with a prompt describing the requested
//! fields, to an [`LlmProvider`](litmeta_llm::LlmProvider). The reply is
//! decoded into one value per field. Transient failures are retried with
//! exponential backoff and every failed attempt lands in an error log.
//!
//! # Architecture
//!
//! ```text
//! PDF → PromptBuilder → LLM → parse_response → ExtractionRecord → ResultsTable
//!                        ↑ retry on transient errors ↓
//!                                          ErrorLogEntry → error-log CSV
//! ```
//!
//! # Key Features
//!
//! - **Field catalogue**: fixed field names with descriptions, configurable via TOML
//! - **Tolerant parsing**: several reply envelopes, code fences, lists and nulls
//! - **Retry policy**: structured error classification with pattern fallback
//! - **Batch runs**: sequential processing with progress callbacks and a summary
//!
//! # Example Usage
//!
//! ```no_run
//! use litmeta_extractor::{BatchProcessor, Extractor, ExtractorConfig};
//! use litmeta_llm::MockProvider;
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = MockProvider::new(r#"{"title": "A Study", "year": 2019}"#);
//! let config = ExtractorConfig::default();
//! let delay = config.request_delay();
//!
//! let batch = BatchProcessor::new(Extractor::new(llm, config)?);
//! let fields = vec!["title".to_string(), "year".to_string()];
//! let output = batch
//!     .process_batch(&[PathBuf::from("paper.pdf")], &fields, delay)
//!     .await?;
//!
//! println!("{}", output.summary.render());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod batch;
mod classify;
mod config;
mod error;
mod export;
mod extractor;
mod parser;
mod prompt;
mod types;


pub use batch::BatchProcessor;
pub use classify::{ErrorCategory, ErrorClassifier};
pub use config::{
    default_retry_patterns, ExtractorConfig, FieldDefinition, FieldSpecification, RetryPattern,
};
pub use error::ExtractorError;
pub use export::{
    error_log_file_name, save_error_log, save_results, write_error_log_csv, write_results_csv,
    ERROR_LOG_COLUMNS,
};
pub use extractor::{backoff_delay, Extractor};
pub use parser::{parse_response, ParsedResponse, ReplyShape, LIST_SEPARATOR, NOT_AVAILABLE, REPLY_SHAPES};
pub use prompt::{build_prompt, PromptBuilder, SYSTEM_INSTRUCTION};
pub use types::{
    BatchOutput, BatchProgress, BatchSummary, BatchWarning, DocumentOutcome, ErrorLogEntry,
    ExtractionRecord, FailureDigest, ResultsTable, FILENAME_COLUMN,
};
