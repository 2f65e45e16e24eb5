//! Parse LLM replies into flat metadata records

use crate::error::ExtractorError;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Value substituted for any field the model did not return
pub const NOT_AVAILABLE: &str = "N/A";

/// Separator used when flattening list values
pub const LIST_SEPARATOR: &str = "; ";

/// Where a provider puts the JSON payload text inside its reply envelope
#[derive(Debug, Clone, Copy)]
pub struct ReplyShape {
    /// Short name used in logs
    pub name: &'static str,
    pointer: &'static str,
}

impl ReplyShape {
    const fn new(name: &'static str, pointer: &'static str) -> Self {
        Self { name, pointer }
    }

    /// Payload text inside `envelope`, if this shape matches
    pub fn payload<'a>(&self, envelope: &'a Value) -> Option<&'a str> {
        envelope.pointer(self.pointer)?.as_str()
    }
}

/// Envelope shapes tried in order; the first match wins
pub const REPLY_SHAPES: &[ReplyShape] = &[
    ReplyShape::new("bare string", ""),
    ReplyShape::new("content", "/content"),
    ReplyShape::new("chat completion", "/choices/0/message/content"),
    ReplyShape::new("gemini candidate", "/candidates/0/content/parts/0/text"),
];

/// Top-level keys that only appear in provider envelopes
const ENVELOPE_MARKERS: &[&str] = &["content", "choices", "candidates", "promptFeedback"];

/// Where providers explain a reply without payload text
const EMPTY_REPLY_REASONS: &[(&str, &str)] = &[
    ("refusal", "/choices/0/message/refusal"),
    ("finish_reason", "/choices/0/finish_reason"),
    ("finishReason", "/candidates/0/finishReason"),
    ("blockReason", "/promptFeedback/blockReason"),
];

/// One reply reduced to a string per requested field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    /// `(field, value)` pairs in requested order
    pub values: Vec<(String, String)>,
    /// Requested fields absent from the reply
    pub missing_fields: Vec<String>,
}

impl ParsedResponse {
    /// Value for `field`, if requested
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    /// One warning per missing field
    pub fn warnings(&self) -> Vec<String> {
        self.missing_fields
            .iter()
            .map(|field| {
                format!(
                    "Field '{}' missing from response; using {}",
                    field, NOT_AVAILABLE
                )
            })
            .collect()
    }
}

/// Parse a raw reply into one value per requested field
///
/// # Examples
///
/// ```
/// use litmeta_extractor::parse_response;
///
/// let reply = r#"{"title": "Soil Survey", "author": ["A. Smith", "B. Jones"]}"#;
/// let fields = vec!["title".to_string(), "author".to_string(), "year".to_string()];
/// let parsed = parse_response(reply, &fields).unwrap();
///
/// assert_eq!(parsed.get("author"), Some("A. Smith; B. Jones"));
/// assert_eq!(parsed.get("year"), Some("N/A"));
/// assert_eq!(parsed.missing_fields, vec!["year".to_string()]);
/// ```
pub fn parse_response(
    raw_reply: &str,
    requested_fields: &[String],
) -> Result<ParsedResponse, ExtractorError> {
    let payload = locate_payload(raw_reply, requested_fields)?;

    let mut values = Vec::with_capacity(requested_fields.len());
    let mut missing_fields = Vec::new();

    for field in requested_fields {
        match payload.get(field) {
            Some(value) => values.push((field.clone(), normalize_value(value))),
            None => {
                missing_fields.push(field.clone());
                values.push((field.clone(), NOT_AVAILABLE.to_string()));
            }
        }
    }

    if !missing_fields.is_empty() {
        warn!("Response missing field(s): {}", missing_fields.join(", "));
    }

    let extra = payload
        .keys()
        .filter(|key| !requested_fields.contains(*key))
        .count();
    if extra > 0 {
        debug!("Ignoring {} unrequested key(s) in response", extra);
    }

    Ok(ParsedResponse {
        values,
        missing_fields,
    })
}

/// Find and decode the JSON object carried by a reply
///
/// An object matching no reply shape is the payload itself, unless it
/// carries an envelope marker that is not a requested field. Such a reply
/// is an envelope without payload text (a refusal or a blocked candidate).
fn locate_payload(
    raw_reply: &str,
    requested_fields: &[String],
) -> Result<Map<String, Value>, ExtractorError> {
    let envelope: Value = serde_json::from_str(strip_code_fence(raw_reply))
        .map_err(|e| malformed(format!("reply is not valid JSON: {}", e), raw_reply))?;

    let shaped = REPLY_SHAPES
        .iter()
        .find_map(|shape| shape.payload(&envelope).map(|text| (shape.name, text)));

    let payload = match shaped {
        Some((name, text)) => {
            debug!("Reply payload found via '{}' shape", name);
            serde_json::from_str(strip_code_fence(text)).map_err(|e| {
                malformed(format!("payload is not valid JSON: {}", e), raw_reply)
            })?
        }
        None if is_envelope(&envelope, requested_fields) => {
            return Err(malformed(empty_reply_message(&envelope), raw_reply));
        }
        None => envelope,
    };

    match payload {
        Value::Object(map) => Ok(map),
        other => Err(malformed(
            format!("expected a JSON object, found {}", json_kind(&other)),
            raw_reply,
        )),
    }
}

fn is_envelope(value: &Value, requested_fields: &[String]) -> bool {
    let Value::Object(map) = value else {
        return false;
    };
    ENVELOPE_MARKERS
        .iter()
        .any(|marker| map.contains_key(*marker) && !requested_fields.iter().any(|f| f == marker))
}

fn empty_reply_message(envelope: &Value) -> String {
    let reasons: Vec<String> = EMPTY_REPLY_REASONS
        .iter()
        .filter_map(|(label, pointer)| {
            let reason = match envelope.pointer(pointer)? {
                Value::Null => return None,
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            Some(format!("{}: {}", label, reason))
        })
        .collect();

    if reasons.is_empty() {
        "reply envelope carried no payload text".to_string()
    } else {
        format!("reply envelope carried no payload text ({})", reasons.join(", "))
    }
}

/// Strip a surrounding Markdown code fence, if any
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Skip the opening line (```json or ```)
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };

    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Reduce any JSON value to the single string stored in a table cell
fn normalize_value(value: &Value) -> String {
    match value {
        Value::Null => NOT_AVAILABLE.to_string(),
        Value::String(text) => text.clone(),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter(|item| !item.is_null())
                .map(|item| match item {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                })
                .collect();
            if parts.is_empty() {
                NOT_AVAILABLE.to_string()
            } else {
                parts.join(LIST_SEPARATOR)
            }
        }
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn malformed(message: String, raw_reply: &str) -> ExtractorError {
    ExtractorError::MalformedResponse {
        message,
        raw: raw_reply.to_string(),
    }
}
