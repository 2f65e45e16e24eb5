//! litmeta LLM Provider Layer
//!
//! Remote model integrations used to read a document and answer a prompt
//! about it.
//!
//! # Architecture
//!
//! Every provider implements [`LlmProvider`]: one call takes a
//! [`GenerationRequest`] (system instruction, user prompt and an optional file
//! attachment) and returns the raw reply body as text. Locating the JSON
//! payload inside that body is left to the caller, because each API wraps it
//! in a different envelope.
//!
//! A provider performs exactly one remote call per `generate`. Retrying is
//! the caller's business.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic, scriptable mock for testing
//! - `GeminiProvider`: Google Gemini `generateContent` API
//! - `OpenAiProvider`: OpenAI-compatible chat-completions API
//!
//! # Examples
//!
//! ```
//! use litmeta_llm::{GenerationRequest, LlmProvider, MockProvider};
//!
//! # tokio_test::block_on(async {
//! let provider = MockProvider::new(r#"{"title": "Hello"}"#);
//! let request = GenerationRequest::new("system", "prompt");
//! let reply = provider.generate(&request).await.unwrap();
//! assert_eq!(reply, r#"{"title": "Hello"}"#);
//! # });
//! ```

#![warn(missing_docs)]

pub mod gemini;
mod http;
pub mod openai;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

/// MIME type used for PDF attachments
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Errors that can occur during LLM operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// Network or connection failure before a response was received
    #[error("Communication error: {0}")]
    Communication(String),

    /// The request did not complete within the client timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The API answered with a non-success HTTP status
    #[error("HTTP {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Error message extracted from the response body
        message: String,
    },

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// No API key was supplied for a provider that needs one
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl LlmError {
    /// HTTP status code carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            LlmError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A file sent alongside the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name as shown to the model
    pub file_name: String,
    /// MIME type of `data`
    pub mime_type: String,
    /// Raw file bytes
    pub data: Vec<u8>,
}

impl Attachment {
    /// Create a PDF attachment
    pub fn pdf(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: PDF_MIME_TYPE.to_string(),
            data,
        }
    }

    /// Base64 encoding of the file content
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }

    /// `data:` URL embedding the file content
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }
}

/// One remote call: instruction, prompt and optional attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// System-level instruction for the model
    pub system_instruction: String,
    /// User prompt
    pub prompt: String,
    /// File attached to the user turn
    pub attachment: Option<Attachment>,
}

impl GenerationRequest {
    /// Create a request without an attachment
    pub fn new(system_instruction: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system_instruction: system_instruction.into(),
            prompt: prompt.into(),
            attachment: None,
        }
    }

    /// Attach a file to the request
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

/// Trait for LLM provider operations
pub trait LlmProvider {
    /// Name of the model answering requests
    fn model_name(&self) -> &str;

    /// Issue one remote call and return the raw reply body
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;
}

/// Mock LLM provider for deterministic testing
///
/// This provider returns pre-configured responses without making any network calls.
/// Scripted outcomes are consumed first, in order; after that, responses
/// registered for the attached file name are used, then the default response.
///
/// # Examples
///
/// ```
/// use litmeta_llm::{Attachment, GenerationRequest, LlmError, LlmProvider, MockProvider};
///
/// # tokio_test::block_on(async {
/// let mut provider = MockProvider::new("{}");
/// provider.add_response("a.pdf", r#"{"title": "A"}"#);
/// provider.push_outcome(Err(LlmError::Timeout("slow".into())));
///
/// let request = GenerationRequest::new("system", "prompt")
///     .with_attachment(Attachment::pdf("a.pdf", vec![1, 2, 3]));
///
/// assert!(provider.generate(&request).await.is_err());
/// assert_eq!(provider.generate(&request).await.unwrap(), r#"{"title": "A"}"#);
/// assert_eq!(provider.call_count(), 2);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    responses: Arc<Mutex<HashMap<String, Result<String, LlmError>>>>,
    script: Arc<Mutex<VecDeque<Result<String, LlmError>>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all requests
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(HashMap::new())),
            script: Arc::new(Mutex::new(VecDeque::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Create a provider that plays back `outcomes` in order
    pub fn scripted(outcomes: impl IntoIterator<Item = Result<String, LlmError>>) -> Self {
        let provider = Self::default();
        provider.script.lock().unwrap().extend(outcomes);
        provider
    }

    /// Queue one outcome to be returned before any other response
    pub fn push_outcome(&self, outcome: Result<String, LlmError>) {
        self.script.lock().unwrap().push_back(outcome);
    }

    /// Add a specific response for requests attaching `file_name`
    pub fn add_response(&mut self, file_name: impl Into<String>, response: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .insert(file_name.into(), Ok(response.into()));
    }

    /// Configure to return an error for requests attaching `file_name`
    pub fn add_error(&mut self, file_name: impl Into<String>, error: LlmError) {
        self.responses
            .lock()
            .unwrap()
            .insert(file_name.into(), Err(error));
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        *self.call_count.lock().unwrap() = 0;
    }

    fn next_outcome(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        *self.call_count.lock().unwrap() += 1;

        if let Some(outcome) = self.script.lock().unwrap().pop_front() {
            return outcome;
        }

        if let Some(attachment) = &request.attachment {
            if let Some(outcome) = self.responses.lock().unwrap().get(&attachment.file_name) {
                return outcome.clone();
            }
        }

        Ok(self.default_response.clone())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("{}")
    }
}

impl LlmProvider for MockProvider {
    fn model_name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        self.next_outcome(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_for(file_name: &str) -> GenerationRequest {
        GenerationRequest::new("system", "prompt")
            .with_attachment(Attachment::pdf(file_name, b"%PDF-1.4".to_vec()))
    }

    #[tokio::test]
    async fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        let result = provider.generate(&request_for("any.pdf")).await;
        assert_eq!(result.unwrap(), "Test response");
    }

    #[tokio::test]
    async fn test_mock_provider_specific_responses() {
        let mut provider = MockProvider::default();
        provider.add_response("hello.pdf", "world");
        provider.add_response("foo.pdf", "bar");

        assert_eq!(provider.generate(&request_for("hello.pdf")).await.unwrap(), "world");
        assert_eq!(provider.generate(&request_for("foo.pdf")).await.unwrap(), "bar");
        assert_eq!(provider.generate(&request_for("unknown.pdf")).await.unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_mock_provider_script_runs_first() {
        let mut provider = MockProvider::scripted([
            Err(LlmError::Timeout("first".to_string())),
            Ok("scripted".to_string()),
        ]);
        provider.add_response("a.pdf", "keyed");

        assert!(matches!(
            provider.generate(&request_for("a.pdf")).await,
            Err(LlmError::Timeout(_))
        ));
        assert_eq!(provider.generate(&request_for("a.pdf")).await.unwrap(), "scripted");
        assert_eq!(provider.generate(&request_for("a.pdf")).await.unwrap(), "keyed");
    }

    #[tokio::test]
    async fn test_mock_provider_call_count() {
        let provider = MockProvider::new("test");

        assert_eq!(provider.call_count(), 0);

        provider.generate(&request_for("1.pdf")).await.unwrap();
        assert_eq!(provider.call_count(), 1);

        provider.generate(&request_for("2.pdf")).await.unwrap();
        assert_eq!(provider.call_count(), 2);

        provider.reset_call_count();
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_provider_error() {
        let mut provider = MockProvider::default();
        provider.add_error(
            "bad.pdf",
            LlmError::Status {
                status: 401,
                message: "invalid key".to_string(),
            },
        );

        let result = provider.generate(&request_for("bad.pdf")).await;
        assert_eq!(result.unwrap_err().status(), Some(401));
    }

    #[tokio::test]
    async fn test_mock_provider_clone() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.generate(&request_for("x.pdf")).await.unwrap();

        // Both share the same call count due to Arc
        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
    }

    #[test]
    fn test_attachment_encoding() {
        let attachment = Attachment::pdf("paper.pdf", b"hi".to_vec());
        assert_eq!(attachment.mime_type, PDF_MIME_TYPE);
        assert_eq!(attachment.to_base64(), "aGk=");
        assert_eq!(attachment.data_url(), "data:application/pdf;base64,aGk=");
    }

    #[test]
    fn test_error_display() {
        let err = LlmError::Status {
            status: 503,
            message: "Service Unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 503: Service Unavailable");
        assert_eq!(LlmError::Timeout("x".to_string()).status(), None);
    }
}
