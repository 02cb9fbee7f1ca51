//! Shared data model.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of the page initiating a payment request.
///
/// Captured once per page load and read-only afterwards; `host` is the
/// identity key used by the allowance store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginDescriptor {
    /// Host of the requesting page (identity key).
    pub host: String,
    /// Display name of the page.
    pub name: String,
    /// Icon URL of the page.
    pub icon: String,
    /// Whether the request was initiated by the page rather than typed
    /// in by the wallet holder.
    #[serde(default)]
    pub external: bool,
}

impl OriginDescriptor {
    /// Capture an origin from its parts.
    pub fn new(host: impl Into<String>, name: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            name: name.into(),
            icon: icon.into(),
            external: false,
        }
    }

    /// Mark this origin as page-initiated.
    pub fn external(mut self) -> Self {
        self.external = true;
        self
    }
}

/// A page-declared payment target, classified by method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum RecipientDescriptor {
    /// LNURL-pay target resolved from a human-readable address.
    Lnurl {
        /// Lightning address or LNURL string.
        address: String,
    },
    /// Spontaneous payment addressed directly to a node id.
    Keysend {
        /// Destination node pubkey.
        address: String,
        /// TLV records attached to the payment.
        #[serde(default)]
        custom_records: HashMap<String, String>,
    },
}

impl RecipientDescriptor {
    /// The target address regardless of method.
    pub fn address(&self) -> &str {
        match self {
            RecipientDescriptor::Lnurl { address } => address,
            RecipientDescriptor::Keysend { address, .. } => address,
        }
    }
}

/// The unit of work flowing through the bridge: one payment request plus
/// the identity and metadata it arrived with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEnvelope {
    /// BOLT11 payment request string.
    pub payment_request: String,
    /// Identity of the requesting page.
    pub origin: OriginDescriptor,
    /// Opaque caller-supplied metadata, validated before submission.
    pub metadata: Option<String>,
    /// Correlation id binding this envelope to its terminal response.
    pub correlation_id: Uuid,
}

impl PaymentEnvelope {
    /// Create an envelope with a fresh correlation id and no metadata.
    pub fn new(payment_request: impl Into<String>, origin: OriginDescriptor) -> Self {
        Self {
            payment_request: payment_request.into(),
            origin,
            metadata: None,
            correlation_id: Uuid::new_v4(),
        }
    }

    /// Attach caller-supplied metadata.
    pub fn with_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }
}

/// Amount and description decoded from a payment request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedInvoice {
    /// Requested amount in satoshis.
    pub amount_sats: i64,
    /// Invoice description, if present.
    pub description: Option<String>,
}

/// Wallet account state returned by `fetchAccountInfo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Account alias.
    pub alias: String,
    /// Spendable balance in satoshis.
    pub balance_sats: i64,
    /// Display currency code.
    pub currency: String,
}

/// Result of an executed payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentResult {
    /// Proof of payment.
    pub preimage: String,
    /// Payment hash of the settled invoice.
    pub payment_hash: String,
    /// Routing fee paid, in satoshis.
    pub fee_sats: i64,
}

/// Details resolved from an LNURL-pay address.
///
/// Only `payRequest`-tagged details are payable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LnurlPayDetails {
    /// LNURL subprotocol tag.
    pub tag: String,
    /// Callback URL for requesting an invoice.
    pub callback: String,
    /// Minimum sendable amount in millisatoshis.
    pub min_sendable: i64,
    /// Maximum sendable amount in millisatoshis.
    pub max_sendable: i64,
}

impl LnurlPayDetails {
    /// Whether these details describe a payable target.
    pub fn is_pay_request(&self) -> bool {
        self.tag == "payRequest"
    }
}
