//! Shared HTTP plumbing for the remote providers

use crate::LlmError;
use serde_json::Value;
use std::time::Duration;

/// Longest error body echoed back in an error message
const MAX_ERROR_BODY_CHARS: usize = 300;

pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LlmError::Other(format!("Failed to build HTTP client: {}", e)))
}

/// Map a transport-level reqwest failure onto the provider error taxonomy
pub(crate) fn send_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout(e.to_string())
    } else if e.is_connect() || e.is_request() || e.is_body() {
        LlmError::Communication(format!("Request failed: {}", e))
    } else {
        LlmError::Other(e.to_string())
    }
}

/// Read the body of a response, turning non-success statuses into errors
pub(crate) async fn read_reply(response: reqwest::Response, model: &str) -> Result<String, LlmError> {
    let status = response.status();
    let body = response.text().await.map_err(send_error)?;

    if status.is_success() {
        return Ok(body);
    }

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(LlmError::ModelNotAvailable(model.to_string()));
    }

    Err(LlmError::Status {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// Pull `error.message` out of a JSON error body, or fall back to the raw text
pub(crate) fn error_message(body: &str) -> String {
    let structured = serde_json::from_str::<Value>(body).ok().and_then(|json| {
        json.pointer("/error/message")
            .and_then(Value::as_str)
            .map(str::to_string)
    });

    match structured {
        Some(message) => message,
        None if body.trim().is_empty() => "Unknown error".to_string(),
        None => body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_from_json_body() {
        let body = r#"{"error": {"code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(error_message(body), "Resource has been exhausted");
    }

    #[test]
    fn test_error_message_from_plain_body() {
        assert_eq!(error_message("  Bad Gateway \n"), "Bad Gateway");
        assert_eq!(error_message(""), "Unknown error");
    }

    #[test]
    fn test_error_message_is_truncated() {
        let body = "x".repeat(1_000);
        assert_eq!(error_message(&body).len(), MAX_ERROR_BODY_CHARS);
    }
}
