//! LLM prompt engineering for metadata extraction

use crate::config::FieldSpecification;
use crate::error::ExtractorError;

/// System instruction sent with every request
pub const SYSTEM_INSTRUCTION: &str = "You are a research assistant helping with a \
literature review. You read the attached document and extract bibliographic \
metadata from it. You answer with a single JSON object and nothing else.";

/// Builds prompts for the LLM to extract metadata fields
pub struct PromptBuilder<'a> {
    spec: &'a FieldSpecification,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder over a field specification
    pub fn new(spec: &'a FieldSpecification) -> Self {
        Self { spec }
    }

    /// Build the complete extraction prompt for `requested` fields
    pub fn build(&self, requested: &[String]) -> Result<String, ExtractorError> {
        self.spec.validate_request(requested)?;

        let field_block = requested
            .iter()
            .filter_map(|name| {
                self.spec
                    .description(name)
                    .map(|description| format!("- {}: {}", name, description))
            })
            .collect::<Vec<_>>()
            .join("\n");

        // Block goes in last so descriptions are never re-substituted
        Ok(PROMPT_TEMPLATE
            .replace("{field_names}", &requested.join(", "))
            .replace("{field_block}", &field_block))
    }
}

/// Build the extraction prompt for `requested` fields of `spec`
pub fn build_prompt(
    spec: &FieldSpecification,
    requested: &[String],
) -> Result<String, ExtractorError> {
    PromptBuilder::new(spec).build(requested)
}

const PROMPT_TEMPLATE: &str = r#"Read the attached PDF document and extract the following information:

{field_block}

Respond with a single JSON object containing exactly these keys: {field_names}

Rules:
- Use the keys exactly as listed, with no additional keys
- If a value cannot be found in the document, use null
- When a field has several values (for example multiple authors or findings), use a JSON array of strings
- Copy names and titles as they appear in the document

Remember: Return ONLY valid JSON, no markdown code blocks, no explanations."#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldDefinition;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_prompt_includes_each_field_line_once() {
        let spec = FieldSpecification::standard();
        let requested = spec.names();
        let prompt = build_prompt(&spec, &requested).unwrap();

        for field in spec.iter() {
            let line = format!("- {}: {}", field.name, field.description);
            assert_eq!(prompt.matches(&line).count(), 1, "line for {}", field.name);
            assert_eq!(prompt.matches(&field.description).count(), 1);
        }
    }

    #[test]
    fn test_prompt_lists_keys() {
        let spec = FieldSpecification::standard();
        let prompt = build_prompt(&spec, &names(&["year", "title"])).unwrap();

        assert!(prompt.contains("exactly these keys: year, title"));
        // Requested order is kept
        let year = prompt.find("- year:").unwrap();
        let title = prompt.find("- title:").unwrap();
        assert!(year < title);
    }

    #[test]
    fn test_prompt_omits_unrequested_fields() {
        let spec = FieldSpecification::standard();
        let prompt = build_prompt(&spec, &names(&["title"])).unwrap();

        assert!(!prompt.contains(spec.description("key_findings").unwrap()));
        assert!(!prompt.contains("{field_block}"));
        assert!(!prompt.contains("{field_names}"));
    }

    #[test]
    fn test_prompt_rejects_unknown_fields() {
        let spec = FieldSpecification::standard();
        let err = build_prompt(&spec, &names(&["title", "doi", "isbn"])).unwrap_err();

        match err {
            ExtractorError::UnknownFields(unknown) => assert_eq!(unknown, names(&["doi", "isbn"])),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_prompt_rejects_empty_request() {
        let spec = FieldSpecification::standard();
        assert!(build_prompt(&spec, &[]).unwrap_err().is_configuration_error());
    }

    #[test]
    fn test_description_with_placeholder_text_is_verbatim() {
        let spec = FieldSpecification::new(vec![FieldDefinition::new(
            "odd",
            "Mentions {field_names} literally",
        )])
        .unwrap();

        let prompt = build_prompt(&spec, &names(&["odd"])).unwrap();
        assert!(prompt.contains("- odd: Mentions {field_names} literally"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let spec = FieldSpecification::standard();
        let requested = names(&["author", "state"]);
        assert_eq!(
            build_prompt(&spec, &requested).unwrap(),
            build_prompt(&spec, &requested).unwrap()
        );
    }
}
