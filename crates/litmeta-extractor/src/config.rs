//! Configuration for the Extractor

use crate::classify::ErrorCategory;
use crate::error::ExtractorError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// One extractable field and the description shown to the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Key the model must use in its JSON reply
    pub name: String,
    /// Instruction describing what to extract
    pub description: String,
}

impl FieldDefinition {
    /// Create a field definition
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Ordered set of extractable fields
///
/// # Examples
///
/// ```
/// use litmeta_extractor::FieldSpecification;
///
/// let spec = FieldSpecification::standard();
/// assert!(spec.contains("title"));
/// assert_eq!(spec.description("year"), Some("Year of publication (four digits)"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSpecification(Vec<FieldDefinition>);

impl FieldSpecification {
    /// Build a specification, rejecting duplicate or blank names
    pub fn new(fields: Vec<FieldDefinition>) -> Result<Self, ExtractorError> {
        let spec = Self(fields);
        spec.validate()?;
        Ok(spec)
    }

    /// The bibliographic fields used for literature reviews
    pub fn standard() -> Self {
        Self(vec![
            FieldDefinition::new("title", "Full title of the document"),
            FieldDefinition::new(
                "author",
                "Author name(s); list every author when there are several",
            ),
            FieldDefinition::new("year", "Year of publication (four digits)"),
            FieldDefinition::new(
                "organization",
                "Organization, agency or institution that produced or published the document",
            ),
            FieldDefinition::new(
                "state",
                "U.S. state (or other region) the document focuses on, if any",
            ),
            FieldDefinition::new(
                "key_findings",
                "Main findings or conclusions, summarized as a few short points",
            ),
        ])
    }

    /// Description for `name`, if defined
    pub fn description(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.description.as_str())
    }

    /// Whether `name` is defined
    pub fn contains(&self, name: &str) -> bool {
        self.description(name).is_some()
    }

    /// Field names in configured order
    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|f| f.name.clone()).collect()
    }

    /// Iterate over the definitions in configured order
    pub fn iter(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.0.iter()
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no fields are defined
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check the field definitions for blank or duplicate names
    pub fn validate(&self) -> Result<(), ExtractorError> {
        let mut seen = HashSet::new();
        for field in &self.0 {
            if field.name.trim().is_empty() {
                return Err(ExtractorError::Config("field names must not be blank".to_string()));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(ExtractorError::Config(format!(
                    "field '{}' is defined more than once",
                    field.name
                )));
            }
        }
        Ok(())
    }

    /// Check a field request against these definitions
    ///
    /// Every unknown name is reported, not just the first.
    pub fn validate_request(&self, requested: &[String]) -> Result<(), ExtractorError> {
        if requested.is_empty() {
            return Err(ExtractorError::Config(
                "at least one field must be requested".to_string(),
            ));
        }

        let mut unknown: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for name in requested {
            if !self.contains(name) {
                if !unknown.contains(name) {
                    unknown.push(name.clone());
                }
            } else if !seen.insert(name.as_str()) {
                return Err(ExtractorError::Config(format!(
                    "field '{}' requested more than once",
                    name
                )));
            }
        }

        if unknown.is_empty() {
            Ok(())
        } else {
            Err(ExtractorError::UnknownFields(unknown))
        }
    }
}

impl Default for FieldSpecification {
    fn default() -> Self {
        Self::standard()
    }
}

/// Message substring mapped to an error category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPattern {
    /// Substring searched for in the lowercased error message
    pub pattern: String,
    /// Category assigned when the substring is found
    pub category: ErrorCategory,
}

impl RetryPattern {
    fn new(pattern: &str, category: ErrorCategory) -> Self {
        Self {
            pattern: pattern.to_string(),
            category,
        }
    }
}

/// Fallback patterns for errors that carry no structured status
pub fn default_retry_patterns() -> Vec<RetryPattern> {
    vec![
        RetryPattern::new("timeout", ErrorCategory::Timeout),
        RetryPattern::new("timed out", ErrorCategory::Timeout),
        RetryPattern::new("rate limit", ErrorCategory::RateLimit),
        RetryPattern::new("429", ErrorCategory::RateLimit),
        RetryPattern::new("network", ErrorCategory::Network),
        RetryPattern::new("connection", ErrorCategory::Network),
        RetryPattern::new("temporary", ErrorCategory::ServerError),
        RetryPattern::new("502", ErrorCategory::ServerError),
        RetryPattern::new("503", ErrorCategory::ServerError),
    ]
}

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Fields requested when the caller names none
    pub default_fields: Vec<String>,

    /// Remote call attempts per document
    pub max_attempts: u32,

    /// Pause between documents (seconds); also the base of the retry backoff
    pub request_delay_secs: f64,

    /// Maximum time for a single remote call (seconds)
    pub request_timeout_secs: u64,

    /// Documents above this size (MiB) trigger a warning
    pub max_file_size_mb: u64,

    /// Retry replies that are not valid JSON
    pub retry_malformed_responses: bool,

    /// Fields the model can be asked for
    pub fields: FieldSpecification,

    /// Fallback message patterns used by the error classifier
    pub retry_patterns: Vec<RetryPattern>,
}

impl ExtractorConfig {
    /// Inter-request delay as a Duration
    ///
    /// Zero when `request_delay_secs` is not representable; `validate`
    /// rejects such values.
    pub fn request_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.request_delay_secs).unwrap_or(Duration::ZERO)
    }

    /// Per-call timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Size warning threshold in bytes
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }

    /// The requested fields, or the configured defaults when none are given
    pub fn resolve_fields(&self, requested: &[String]) -> Vec<String> {
        if requested.is_empty() {
            self.default_fields.clone()
        } else {
            requested.to_vec()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ExtractorError> {
        self.fields.validate()?;
        self.fields
            .validate_request(&self.default_fields)
            .map_err(|e| ExtractorError::Config(format!("invalid default_fields: {}", e)))?;
        if self.max_attempts == 0 {
            return Err(ExtractorError::Config(
                "max_attempts must be greater than 0".to_string(),
            ));
        }
        if !self.request_delay_secs.is_finite() || self.request_delay_secs < 0.0 {
            return Err(ExtractorError::Config(
                "request_delay_secs must be a non-negative number".to_string(),
            ));
        }
        if let Err(e) = Duration::try_from_secs_f64(self.request_delay_secs) {
            return Err(ExtractorError::Config(format!(
                "request_delay_secs {} is out of range: {}",
                self.request_delay_secs, e
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(ExtractorError::Config(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.retry_patterns.iter().any(|p| p.pattern.trim().is_empty()) {
            return Err(ExtractorError::Config(
                "retry patterns must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        let fields = FieldSpecification::standard();
        Self {
            default_fields: fields.names(),
            fields,
            max_attempts: 3,
            request_delay_secs: 2.0,
            request_timeout_secs: 120,
            max_file_size_mb: 20,
            retry_malformed_responses: true,
            retry_patterns: default_retry_patterns(),
        }
    }
}

impl ExtractorConfig {
    /// Fast preset: short pauses and timeouts, fewer attempts
    pub fn fast() -> Self {
        Self {
            max_attempts: 2,
            request_delay_secs: 0.5,
            request_timeout_secs: 60,
            ..Self::default()
        }
    }

    /// Patient preset: long pauses for strict rate limits, more attempts
    pub fn patient() -> Self {
        Self {
            max_attempts: 5,
            request_delay_secs: 5.0,
            request_timeout_secs: 300,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ExtractorError> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| ExtractorError::Config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ExtractorError> {
        toml::to_string_pretty(self)
            .map_err(|e| ExtractorError::Config(format!("Failed to serialize to TOML: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = ExtractorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_fields.len(), 6);
        assert_eq!(config.request_delay(), Duration::from_secs(2));
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(ExtractorConfig::fast().validate().is_ok());
        assert!(ExtractorConfig::patient().validate().is_ok());
        assert_eq!(ExtractorConfig::patient().max_attempts, 5);
    }

    #[test]
    fn test_invalid_max_attempts() {
        let mut config = ExtractorConfig::default();
        config.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_delay() {
        let mut config = ExtractorConfig::default();
        config.request_delay_secs = -1.0;
        assert!(config.validate().is_err());

        config.request_delay_secs = f64::NAN;
        assert!(config.validate().is_err());

        config.request_delay_secs = 1e20;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("out of range"));
        assert_eq!(config.request_delay(), Duration::ZERO);

        config.request_delay_secs = 2.5;
        assert!(config.validate().is_ok());
        assert_eq!(config.request_delay(), Duration::from_millis(2500));
    }

    #[test]
    fn test_default_fields_must_exist() {
        let mut config = ExtractorConfig::default();
        config.default_fields = names(&["title", "doi"]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("doi"));
    }

    #[test]
    fn test_duplicate_field_definitions_rejected() {
        let result = FieldSpecification::new(vec![
            FieldDefinition::new("title", "a"),
            FieldDefinition::new("title", "b"),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_request_reports_all_unknown() {
        let spec = FieldSpecification::standard();
        let err = spec
            .validate_request(&names(&["title", "doi", "isbn", "doi"]))
            .unwrap_err();
        match err {
            ExtractorError::UnknownFields(unknown) => {
                assert_eq!(unknown, names(&["doi", "isbn"]));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_request_rejects_empty_and_duplicates() {
        let spec = FieldSpecification::standard();
        assert!(spec.validate_request(&[]).unwrap_err().is_configuration_error());
        assert!(spec.validate_request(&names(&["year", "year"])).is_err());
        assert!(spec.validate_request(&names(&["year", "title"])).is_ok());
    }

    #[test]
    fn test_resolve_fields() {
        let config = ExtractorConfig::default();
        assert_eq!(config.resolve_fields(&[]), config.default_fields);
        assert_eq!(config.resolve_fields(&names(&["year"])), names(&["year"]));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ExtractorConfig::default();
        let toml_str = config.to_toml().unwrap();
        let parsed = ExtractorConfig::from_toml(&toml_str).unwrap();

        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed = ExtractorConfig::from_toml(
            r#"
            max_attempts = 4
            default_fields = ["title", "year"]

            [[retry_patterns]]
            pattern = "overloaded"
            category = "server_error"
            "#,
        )
        .unwrap();

        assert_eq!(parsed.max_attempts, 4);
        assert_eq!(parsed.default_fields, names(&["title", "year"]));
        assert_eq!(parsed.fields, FieldSpecification::standard());
        assert_eq!(parsed.retry_patterns.len(), 1);
        assert_eq!(parsed.retry_patterns[0].category, ErrorCategory::ServerError);
    }

    #[test]
    fn test_custom_fields_from_toml() {
        let parsed = ExtractorConfig::from_toml(
            r#"
            default_fields = ["doi"]

            [[fields]]
            name = "doi"
            description = "Digital Object Identifier"
            "#,
        )
        .unwrap();

        assert_eq!(parsed.fields.len(), 1);
        assert_eq!(parsed.fields.description("doi"), Some("Digital Object Identifier"));
    }
}
