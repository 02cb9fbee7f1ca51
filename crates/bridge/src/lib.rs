//! Correlation-addressed RPC bridge between isolated execution contexts.
//!
//! The page context and the privileged wallet context each hold one
//! [`Endpoint`] of a duplex channel. Outbound, an endpoint offers
//! [`Endpoint::call`] (method + args + page-origin context) and
//! [`Endpoint::request`] (privileged operations, no context); both
//! allocate a correlation id and suspend until the single terminal
//! response for that id arrives. Inbound, [`Endpoint::next_request`]
//! yields requests paired with a one-shot [`Responder`].
//!
//! # Contract
//!
//! Each correlation id receives exactly one terminal response - a reply
//! or an error, never both, never more than once. A second attempt on a
//! completed id is rejected with [`BridgeError::AlreadyCompleted`]
//! instead of being double-delivered. If the channel closes before a
//! terminal response arrives, every waiting call fails with
//! [`BridgeError::ConnectionClosed`]; there is no retry at this layer.
//!
//! # Example
//!
//! ```rust,ignore
//! let (page, privileged) = bridge::channel();
//!
//! tokio::spawn(async move {
//!     while let Some(request) = privileged.next_request().await {
//!         let responder = request.responder;
//!         responder.reply(serde_json::json!({"ok": true})).await.ok();
//!     }
//! });
//!
//! let ack = page.request("fetchAccountInfo", serde_json::Value::Null).await?;
//! ```

mod endpoint;
mod error;
mod frame;

pub use endpoint::{channel, Endpoint, InboundRequest, Responder};
pub use error::BridgeError;
pub use frame::{error_kind, CallContext, Frame};
