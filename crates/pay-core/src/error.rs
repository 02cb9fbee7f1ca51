//! Shared error types.

use thiserror::Error;

/// Errors for caller-supplied input that cannot be corrected interactively.
///
/// Metadata and payment requests come from the requesting page, not from
/// the wallet holder, so these are terminal for the request they arrived
/// with.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Metadata string is not valid JSON.
    #[error("metadata is not valid JSON: {0}")]
    MetadataJson(#[from] serde_json::Error),

    /// Metadata parsed but is not a JSON object.
    #[error("metadata must be a JSON object")]
    MetadataNotObject,

    /// Metadata object carries a key outside the allowed schema.
    #[error("metadata key not allowed: {0}")]
    MetadataKey(String),

    /// Metadata value has the wrong type for its key.
    #[error("metadata value for '{0}' must be a string")]
    MetadataValue(String),

    /// The payment request string could not be decoded.
    #[error("payment request could not be decoded: {0}")]
    UndecodableRequest(String),
}

/// Failure reported by an external collaborator.
///
/// Covers the invoice decoder, LNURL resolver, fiat converter and payment
/// executor. The core treats these services as opaque; only the service
/// name and its message survive.
#[derive(Debug, Error)]
#[error("{service} failure: {message}")]
pub struct UpstreamError {
    /// Which collaborator failed (e.g. "executor", "lnurl").
    pub service: &'static str,
    /// Message reported by the collaborator.
    pub message: String,
}

impl UpstreamError {
    /// Create an upstream error for the named collaborator.
    pub fn new(service: &'static str, message: impl Into<String>) -> Self {
        Self {
            service,
            message: message.into(),
        }
    }
}
