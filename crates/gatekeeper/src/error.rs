//! Error types for gatekeeper operations.

use allowance::StoreError;
use bridge::BridgeError;
use pay_core::{UpstreamError, ValidationError};
use thiserror::Error;

/// Errors that can occur while authorizing a payment.
#[derive(Debug, Error)]
pub enum GateError {
    /// No payment request was supplied, in props or query parameters.
    #[error("no payment request supplied")]
    MissingPaymentRequest,

    /// No origin was supplied for the confirmation.
    #[error("no origin supplied")]
    MissingOrigin,

    /// Caller-supplied input failed validation.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The bridge failed or the remote side returned an error frame.
    #[error("bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// The allowance store failed.
    #[error("allowance store error: {0}")]
    Store(#[from] StoreError),

    /// An external collaborator failed.
    #[error("upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// A payload crossing the bridge did not have the expected shape.
    #[error("malformed payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// The session is not in a state that allows the operation.
    #[error("invalid session transition: {0}")]
    InvalidTransition(&'static str),

    /// The resolved LNURL details do not describe a payable target.
    #[error("lnurl target is not payable: tagged '{0}'")]
    NotPayable(String),
}
