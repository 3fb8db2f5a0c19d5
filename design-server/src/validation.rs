//! Input validation for untrusted data.
//!
//! All user-supplied input MUST be validated before use.
//! The sanitizer coerces field values; these checks reject requests that are
//! too large or address records with unusable ids.

use serde_json::Value;
use thiserror::Error;

/// Maximum length for design IDs.
pub const MAX_DESIGN_ID_LEN: usize = 64;
/// Maximum length for owner IDs.
pub const MAX_OWNER_ID_LEN: usize = 64;
/// Maximum text content length in elements.
pub const MAX_TEXT_CONTENT_LEN: usize = 1_048_576; // 1MB
/// Maximum elements per design.
pub const MAX_ELEMENTS_PER_DESIGN: usize = 10_000;

/// Validation error types.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Design ID exceeds maximum length.
    #[error("design id too long (max {MAX_DESIGN_ID_LEN} chars)")]
    DesignIdTooLong,
    /// Design ID is empty or contains invalid characters.
    #[error("design id contains invalid characters")]
    DesignIdInvalidChars,
    /// Owner ID exceeds maximum length.
    #[error("owner id too long (max {MAX_OWNER_ID_LEN} chars)")]
    OwnerIdTooLong,
    /// Owner ID is empty or contains invalid characters.
    #[error("owner id contains invalid characters")]
    OwnerIdInvalidChars,
    /// Text content exceeds maximum length.
    #[error("text content too long (max {MAX_TEXT_CONTENT_LEN} bytes)")]
    TextContentTooLong,
    /// Too many elements in the design.
    #[error("too many elements (max {MAX_ELEMENTS_PER_DESIGN})")]
    TooManyElements,
}

impl ValidationError {
    /// Short label used for metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DesignIdTooLong | Self::DesignIdInvalidChars => "design_id",
            Self::OwnerIdTooLong | Self::OwnerIdInvalidChars => "owner_id",
            Self::TextContentTooLong => "text_content",
            Self::TooManyElements => "element_count",
        }
    }

    /// Whether the request was well-formed but exceeds a limit.
    #[must_use]
    pub fn is_limit(&self) -> bool {
        matches!(self, Self::TextContentTooLong | Self::TooManyElements)
    }
}

/// Check if a character is valid for IDs (alphanumeric, hyphen, or underscore).
fn is_valid_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Validate a design ID.
///
/// Valid design IDs:
/// - 1-64 characters
/// - Alphanumeric, hyphen, underscore only (UUIDs are valid)
///
/// # Errors
///
/// Returns [`ValidationError::DesignIdTooLong`] if the ID exceeds 64 characters.
/// Returns [`ValidationError::DesignIdInvalidChars`] if the ID is empty or contains invalid characters.
pub fn validate_design_id(id: &str) -> Result<(), ValidationError> {
    if id.len() > MAX_DESIGN_ID_LEN {
        return Err(ValidationError::DesignIdTooLong);
    }
    if id.is_empty() || !id.chars().all(is_valid_id_char) {
        return Err(ValidationError::DesignIdInvalidChars);
    }
    Ok(())
}

/// Validate an owner ID.
///
/// # Errors
///
/// Returns [`ValidationError::OwnerIdTooLong`] if the ID exceeds 64 characters.
/// Returns [`ValidationError::OwnerIdInvalidChars`] if the ID is empty or contains invalid characters.
pub fn validate_owner_id(id: &str) -> Result<(), ValidationError> {
    if id.len() > MAX_OWNER_ID_LEN {
        return Err(ValidationError::OwnerIdTooLong);
    }
    if id.is_empty() || !id.chars().all(is_valid_id_char) {
        return Err(ValidationError::OwnerIdInvalidChars);
    }
    Ok(())
}

/// Validate text content length.
///
/// # Errors
///
/// Returns [`ValidationError::TextContentTooLong`] if the text exceeds 1MB.
pub fn validate_text_content(text: &str) -> Result<(), ValidationError> {
    if text.len() > MAX_TEXT_CONTENT_LEN {
        return Err(ValidationError::TextContentTooLong);
    }
    Ok(())
}

/// Validate element count in a design.
///
/// # Errors
///
/// Returns [`ValidationError::TooManyElements`] if the count exceeds the limit.
pub fn validate_element_count(count: usize) -> Result<(), ValidationError> {
    if count > MAX_ELEMENTS_PER_DESIGN {
        return Err(ValidationError::TooManyElements);
    }
    Ok(())
}

/// Validate the size limits of a raw document before it is sanitized.
///
/// # Errors
///
/// Returns [`ValidationError::TooManyElements`] or
/// [`ValidationError::TextContentTooLong`] if a limit is exceeded.
pub fn validate_document_limits(document: &Value) -> Result<(), ValidationError> {
    let Some(elements) = document.get("designElements").and_then(Value::as_array) else {
        return Ok(());
    };
    validate_element_count(elements.len())?;
    for element in elements {
        if element.get("type").and_then(Value::as_str) != Some("text") {
            continue;
        }
        if let Some(content) = element.get("content").and_then(Value::as_str) {
            validate_text_content(content)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_valid_design_ids() {
        assert!(validate_design_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_design_id("design_1").is_ok());
        assert!(validate_design_id("a").is_ok());
    }

    #[test]
    fn test_invalid_design_ids() {
        assert!(validate_design_id("").is_err());
        assert!(validate_design_id("has spaces").is_err());
        assert!(validate_design_id("../../../etc/passwd").is_err());
        assert!(validate_design_id("path\\traversal").is_err());
        assert!(validate_design_id("contains<script>").is_err());
        assert!(validate_design_id("ünïcode").is_err());
    }

    #[test]
    fn test_design_id_boundary() {
        // Exactly at limit should pass
        let at_limit = "x".repeat(MAX_DESIGN_ID_LEN);
        assert!(validate_design_id(&at_limit).is_ok());

        // One over should fail
        let over_limit = "x".repeat(MAX_DESIGN_ID_LEN + 1);
        assert!(matches!(
            validate_design_id(&over_limit),
            Err(ValidationError::DesignIdTooLong)
        ));
    }

    #[test]
    fn test_owner_ids() {
        assert!(validate_owner_id("user-42").is_ok());
        assert!(validate_owner_id("user 42").is_err());
        assert!(validate_owner_id(&"u".repeat(MAX_OWNER_ID_LEN + 1)).is_err());
    }

    #[test]
    fn test_text_content_length() {
        assert!(validate_text_content("Hello, world!").is_ok());
        assert!(validate_text_content(&"x".repeat(MAX_TEXT_CONTENT_LEN)).is_ok());
        assert!(validate_text_content(&"x".repeat(MAX_TEXT_CONTENT_LEN + 1)).is_err());
    }

    #[test]
    fn test_element_count() {
        assert!(validate_element_count(0).is_ok());
        assert!(validate_element_count(MAX_ELEMENTS_PER_DESIGN).is_ok());
        assert!(validate_element_count(MAX_ELEMENTS_PER_DESIGN + 1).is_err());
    }

    #[test]
    fn test_document_limits() {
        let ok = json!({ "designElements": [{ "type": "text", "content": "short" }] });
        assert!(validate_document_limits(&ok).is_ok());

        let long_text = json!({
            "designElements": [{ "type": "text", "content": "x".repeat(MAX_TEXT_CONTENT_LEN + 1) }]
        });
        assert!(matches!(
            validate_document_limits(&long_text),
            Err(ValidationError::TextContentTooLong)
        ));

        // Image content is an asset payload, not text.
        let big_image = json!({
            "designElements": [{ "type": "image", "content": "x".repeat(MAX_TEXT_CONTENT_LEN + 1) }]
        });
        assert!(validate_document_limits(&big_image).is_ok());

        let crowded = json!({ "designElements": vec![json!({}); MAX_ELEMENTS_PER_DESIGN + 1] });
        assert!(matches!(
            validate_document_limits(&crowded),
            Err(ValidationError::TooManyElements)
        ));
    }

    #[test]
    fn test_error_messages() {
        let err = ValidationError::DesignIdTooLong;
        assert!(err.to_string().contains("64"));

        let err = ValidationError::TextContentTooLong;
        assert!(err.to_string().contains("1048576"));
        assert!(err.is_limit());
        assert_eq!(err.kind(), "text_content");
    }

    proptest! {
        #[test]
        fn prop_id_charset_accepted(id in "[A-Za-z0-9_-]{1,64}") {
            prop_assert!(validate_design_id(&id).is_ok());
            prop_assert!(validate_owner_id(&id).is_ok());
        }

        #[test]
        fn prop_foreign_char_rejected(
            prefix in "[a-z0-9]{0,20}",
            bad in "[^A-Za-z0-9_-]",
            suffix in "[a-z0-9]{0,20}",
        ) {
            let id = format!("{prefix}{bad}{suffix}");
            prop_assert!(validate_design_id(&id).is_err());
        }
    }
}
