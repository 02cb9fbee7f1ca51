//! Bridge error types.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur on the bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The channel closed before a terminal response arrived.
    #[error("bridge channel closed before a terminal response")]
    ConnectionClosed,

    /// A terminal response was already delivered for this correlation id.
    #[error("terminal response already delivered for correlation id {0}")]
    AlreadyCompleted(Uuid),

    /// No request with this correlation id is awaiting a response.
    #[error("unknown correlation id: {0}")]
    UnknownCorrelation(Uuid),

    /// The remote side completed the request with an error frame.
    #[error("remote error: {0}")]
    Remote(String),
}

impl BridgeError {
    /// The error code carried by a remote error frame, if any.
    pub fn remote_kind(&self) -> Option<&str> {
        match self {
            BridgeError::Remote(kind) => Some(kind),
            _ => None,
        }
    }
}
