//! Core types and collaborator traits for the Satgate payment bridge.
//!
//! This crate provides the shared vocabulary for all Satgate crates. It
//! defines:
//!
//! - [`OriginDescriptor`] / [`RecipientDescriptor`] - identity of the
//!   requesting page and the page-declared payment target
//! - [`PaymentEnvelope`] - the unit of work flowing across the bridge
//! - [`InvoiceDecoder`], [`PaymentExecutor`], [`LnurlResolver`],
//!   [`FiatConverter`], [`AccountProvider`] - seams for the external
//!   collaborators the core calls through but never implements
//! - [`metadata`] - schema validation for caller-supplied payment metadata
//!
//! # Example
//!
//! ```rust
//! use pay_core::{PaymentEnvelope, OriginDescriptor};
//!
//! let origin = OriginDescriptor::new("podcast.example", "Example Podcast", "https://podcast.example/icon.png");
//! let envelope = PaymentEnvelope::new("lnbc10u1p...", origin);
//! assert!(envelope.metadata.is_none());
//! ```

mod collaborators;
mod error;
pub mod metadata;
mod types;

pub use collaborators::{
    AccountProvider, FiatConverter, InvoiceDecoder, LnurlResolver, NoopConverter,
    PaymentExecutor,
};
pub use error::{UpstreamError, ValidationError};
pub use types::{
    AccountInfo, DecodedInvoice, LnurlPayDetails, OriginDescriptor, PaymentEnvelope,
    PaymentResult, RecipientDescriptor,
};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
