//! Save payload decoding.
//!
//! Editors post the raw document shape, but form-style clients send
//! `canvasSize`, `canvasBackground` and `designElements` as JSON-encoded
//! strings. [`SavePayload::decode`] parses those in place and lifts the
//! `ownerId` off the document before sanitization.

use design_core::normalize::json_kind;
use serde_json::{Map, Value};

use crate::sanitizer::SaveError;

/// Top-level fields that may arrive JSON-encoded.
pub const STRING_ENCODED_FIELDS: &[&str] = &["canvasSize", "canvasBackground", "designElements"];

/// A decoded save request.
#[derive(Debug, Clone, PartialEq)]
pub struct SavePayload {
    /// Raw document fields, with string-encoded fields parsed.
    pub document: Value,
    /// Owning user, if the client sent one.
    pub owner_id: Option<String>,
}

impl SavePayload {
    /// Decode a request body.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError::NotAnObject`] if the body is not a JSON object.
    pub fn decode(body: Value) -> Result<Self, SaveError> {
        let Value::Object(mut fields) = body else {
            return Err(SaveError::NotAnObject(json_kind(&body)));
        };

        let owner_id = fields.remove("ownerId").and_then(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });
        decode_string_fields(&mut fields);

        Ok(Self {
            document: Value::Object(fields),
            owner_id,
        })
    }
}

/// Parse each string-encoded field in place. A string is replaced only when
/// it parses to an object, array or string; anything else is left for the
/// sanitizer to coerce.
fn decode_string_fields(fields: &mut Map<String, Value>) {
    for key in STRING_ENCODED_FIELDS {
        let Some(Value::String(text)) = fields.get(*key) else {
            continue;
        };
        match serde_json::from_str::<Value>(text) {
            Ok(parsed @ (Value::Object(_) | Value::Array(_) | Value::String(_))) => {
                fields.insert((*key).to_string(), parsed);
            }
            _ => {}
        }
    }
}
