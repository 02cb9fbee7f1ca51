//! Wire frames exchanged between endpoints.

use pay_core::OriginDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Distinguished error codes carried by error frames.
pub mod error_kind {
    /// The wallet holder explicitly declined an externally-initiated request.
    pub const USER_REJECTED: &str = "USER_REJECTED";
    /// Caller-supplied input failed validation.
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    /// The payment executor reported a failure.
    pub const PAYMENT_FAILED: &str = "PAYMENT_FAILED";
    /// The requested method is not served on this endpoint.
    pub const METHOD_NOT_FOUND: &str = "METHOD_NOT_FOUND";
    /// The request arrived without required fields.
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    /// The privileged context failed internally.
    pub const INTERNAL: &str = "INTERNAL";
}

/// Page-origin context attached to a [`Frame::Request`] sent via `call`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallContext {
    /// Identity of the page the request is made on behalf of.
    pub origin: Option<OriginDescriptor>,
    /// Opaque caller-supplied metadata.
    pub metadata: Option<String>,
}

impl CallContext {
    /// Context carrying an origin and optional metadata.
    pub fn new(origin: OriginDescriptor, metadata: Option<String>) -> Self {
        Self {
            origin: Some(origin),
            metadata,
        }
    }
}

/// One message on the wire between two endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frame {
    /// Method invocation awaiting a terminal response.
    Request {
        /// Correlation id allocated by the calling endpoint.
        id: Uuid,
        /// Method name.
        method: String,
        /// Method arguments.
        args: Value,
        /// Page-origin context; absent for privileged `request` calls.
        context: Option<CallContext>,
    },
    /// Success completion for a request.
    Reply {
        /// Correlation id of the completed request.
        id: Uuid,
        /// Result value.
        value: Value,
    },
    /// Failure completion for a request.
    Error {
        /// Correlation id of the completed request.
        id: Uuid,
        /// Error code, e.g. [`error_kind::USER_REJECTED`].
        kind: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_tagging() {
        let frame = Frame::Error {
            id: Uuid::new_v4(),
            kind: error_kind::USER_REJECTED.to_string(),
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["kind"], "USER_REJECTED");
    }
}
