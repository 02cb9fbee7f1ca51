//! Seams for the external collaborators the core calls through.
//!
//! Invoice decoding, LNURL resolution, fiat conversion, account lookup
//! and payment execution are out of scope for the core: it only decides
//! whether a submission is authorized. Each concern is a trait so real
//! backends and test doubles plug in the same way.

use async_trait::async_trait;

use crate::error::{UpstreamError, ValidationError};
use crate::types::{AccountInfo, DecodedInvoice, LnurlPayDetails, PaymentEnvelope, PaymentResult};

/// Decodes a payment request string into its amount and description.
///
/// Decoding is pure; an undecodable request is caller-supplied garbage
/// and therefore a [`ValidationError`].
pub trait InvoiceDecoder: Send + Sync {
    /// Decode a BOLT11 payment request.
    fn decode(&self, payment_request: &str) -> Result<DecodedInvoice, ValidationError>;
}

/// Executes an authorized payment.
///
/// The executor is opaque: routing, signing and ledger updates happen
/// behind this seam. Once invoked it runs to completion independently;
/// the core never retracts an in-flight submission.
#[async_trait]
pub trait PaymentExecutor: Send + Sync {
    /// Execute the payment described by the envelope.
    async fn pay(&self, envelope: &PaymentEnvelope) -> Result<PaymentResult, UpstreamError>;
}

/// Resolves a human-readable address to LNURL-pay details.
#[async_trait]
pub trait LnurlResolver: Send + Sync {
    /// Resolve an LNURL or Lightning address.
    async fn resolve(&self, address: &str) -> Result<LnurlPayDetails, UpstreamError>;
}

/// Converts a satoshi amount to a display fiat string.
///
/// Quote failures degrade gracefully: callers leave the fiat display
/// blank rather than blocking a payment.
#[async_trait]
pub trait FiatConverter: Send + Sync {
    /// Convert an amount in satoshis to a formatted fiat string.
    async fn to_fiat(&self, amount_sats: i64) -> Result<String, UpstreamError>;
}

/// Source of wallet account state for `fetchAccountInfo`.
#[async_trait]
pub trait AccountProvider: Send + Sync {
    /// Fetch the current account info, including the spendable balance.
    async fn account_info(&self) -> Result<AccountInfo, UpstreamError>;
}

/// A fiat converter that never produces a quote.
///
/// Useful in tests and in deployments with no rate service configured;
/// the confirmation flow then shows no fiat amount.
#[derive(Debug, Clone, Default)]
pub struct NoopConverter;

#[async_trait]
impl FiatConverter for NoopConverter {
    async fn to_fiat(&self, _amount_sats: i64) -> Result<String, UpstreamError> {
        Err(UpstreamError::new("fiat", "no rate service configured"))
    }
}
