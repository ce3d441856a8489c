//! Well-formedness validation
//!
//! Validation never fails: every parse problem is folded into a
//! [`ValidationResult`] so callers can show it and carry on.

use serde::{Deserialize, Serialize};

use crate::error::{ParseError, TextPosition};
use crate::parser::parse_document;

/// Outcome of a single validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    /// Empty when the document is valid
    pub error_message: String,
    /// 1-based position of the first error, when known
    pub error_position: Option<TextPosition>,
}

impl ValidationResult {
    /// Create a successful validation result
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            error_message: String::new(),
            error_position: None,
        }
    }

    /// Create a failed validation result from a parse error
    pub fn invalid(error: ParseError) -> Self {
        Self {
            is_valid: false,
            error_message: error.message,
            error_position: error.position,
        }
    }

    /// The failure as a [`ParseError`], or `None` for a valid document
    pub fn to_error(&self) -> Option<ParseError> {
        if self.is_valid {
            None
        } else {
            Some(ParseError::new(self.error_message.clone(), self.error_position))
        }
    }
}

impl From<Result<(), ParseError>> for ValidationResult {
    fn from(result: Result<(), ParseError>) -> Self {
        match result {
            Ok(()) => ValidationResult::valid(),
            Err(error) => ValidationResult::invalid(error),
        }
    }
}

/// Check that `text` is a single well-formed XML document.
pub fn validate(text: &str) -> ValidationResult {
    let result = parse_document(text).map(|_| ());
    if let Err(error) = &result {
        tracing::debug!(error = %error, "document is not well-formed");
    }
    result.into()
}

/// Validator object for callers that want one at the seam
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlValidator;

impl XmlValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, text: &str) -> ValidationResult {
        validate(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_well_formed_document() {
        let result = validate("<root><item>Content</item></root>");
        assert!(result.is_valid);
        assert!(result.error_message.is_empty());
        assert_eq!(result.error_position, None);
        assert_eq!(result.to_error(), None);
    }

    #[test]
    fn test_rejects_mismatched_closing_tag() {
        let result = validate("<root><child></root>");
        assert!(!result.is_valid);
        assert!(!result.error_message.is_empty());
        let position = result.error_position.expect("position should be reported");
        assert_eq!(position.line, 1);
        assert!(position.column > 1);
    }

    #[test]
    fn test_reports_line_of_error() {
        let result = validate("<root>\n  <a>\n  </b>\n</root>");
        assert!(!result.is_valid);
        assert_eq!(result.error_position.map(|p| p.line), Some(3));
    }

    #[test]
    fn test_empty_text_is_invalid() {
        assert!(!validate("").is_valid);
    }

    #[test]
    fn test_forbidden_content_is_invalid() {
        for text in ["<a>]]></a>", "<a>\u{1}</a>", "<a b=\"<\"/>"] {
            let result = validate(text);
            assert!(!result.is_valid, "accepted {:?}", text);
            assert!(result.error_position.is_some());
        }
    }

    #[test]
    fn test_internal_entity_is_valid() {
        assert!(validate("<!DOCTYPE r [<!ENTITY e \"x\">]><r>&e;</r>").is_valid);
        assert!(!validate("<!DOCTYPE r [<!ENTITY e SYSTEM \"e.txt\">]><r>&e;</r>").is_valid);
    }

    #[test]
    fn test_validator_object() {
        let validator = XmlValidator::new();
        assert!(validator.validate("<a/>").is_valid);
        assert!(!validator.validate("<a>").is_valid);
    }

    #[test]
    fn test_result_serializes_to_json() {
        let result = validate("<a><b></a>");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["is_valid"], false);
        assert!(json["error_position"]["line"].is_number());
    }

    #[test]
    fn test_to_error_round_trip() {
        let result = validate("<a><b></a>");
        let error = result.to_error().unwrap();
        assert_eq!(error.message, result.error_message);
        assert_eq!(error.position, result.error_position);
    }
}
