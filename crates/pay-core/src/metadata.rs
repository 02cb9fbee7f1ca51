//! Schema validation for caller-supplied payment metadata.
//!
//! Metadata rides along with a payment request to describe what is being
//! paid for. It comes from the page, not the wallet holder, so it is
//! validated before submission and a failure is terminal for that
//! request. Absent metadata is valid.

use serde_json::Value;

use crate::error::ValidationError;

/// Keys a metadata object may carry. Everything else is rejected.
const ALLOWED_KEYS: &[&str] = &["location", "image", "description"];

/// Validate a raw metadata string against the schema.
///
/// The string must parse as a JSON object whose keys are drawn from the
/// allowed set and whose values are all strings. Returns the parsed
/// object on success so callers don't parse twice.
pub fn validate(raw: &str) -> Result<Value, ValidationError> {
    let value: Value = serde_json::from_str(raw)?;

    let object = value
        .as_object()
        .ok_or(ValidationError::MetadataNotObject)?;

    for (key, field) in object {
        if !ALLOWED_KEYS.contains(&key.as_str()) {
            return Err(ValidationError::MetadataKey(key.clone()));
        }
        if !field.is_string() {
            return Err(ValidationError::MetadataValue(key.clone()));
        }
    }

    Ok(value)
}
