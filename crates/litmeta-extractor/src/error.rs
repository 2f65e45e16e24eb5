//! Error types for the Extractor

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during extraction
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested fields missing from the field specification
    #[error("Configuration error: unknown field(s) requested: {}", .0.join(", "))]
    UnknownFields(Vec<String>),

    /// Document does not exist
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Document exists but cannot be read
    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    /// Reply could not be decoded into a JSON object
    #[error("Malformed response: {message}")]
    MalformedResponse {
        /// What went wrong while decoding
        message: String,
        /// The undecodable reply, kept for diagnostics
        raw: String,
    },

    /// Invalid caller input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Other I/O failure on a path
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// CSV serialization error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ExtractorError {
    /// Whether this error stems from invalid configuration
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, ExtractorError::Config(_) | ExtractorError::UnknownFields(_))
    }

    /// Map an I/O error on `path` onto the matching user-facing kind
    pub(crate) fn from_io(path: &std::path::Path, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => ExtractorError::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => {
                ExtractorError::PermissionDenied(path.to_path_buf())
            }
            _ => ExtractorError::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }
}
