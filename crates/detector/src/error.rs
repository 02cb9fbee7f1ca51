//! Detector error types.

use thiserror::Error;

/// Errors produced while classifying a page-declared recipient tag.
///
/// A recipient with missing or unsupported fields fails closed here; a
/// partially populated descriptor never reaches downstream consumers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DetectorError {
    /// The tag is missing a field its method requires.
    #[error("recipient tag missing required field: {0}")]
    MissingField(&'static str),

    /// The declared payment method is not one the wallet can pay.
    #[error("unsupported recipient method: {0}")]
    UnsupportedMethod(String),

    /// The tag content is empty or contains no parseable tokens.
    #[error("recipient tag is empty")]
    EmptyTag,
}
