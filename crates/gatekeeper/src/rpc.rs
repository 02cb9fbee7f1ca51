//! Method names and argument shapes of the bridge RPC surface.

use serde::{Deserialize, Serialize};

/// Execute a payment: `sendPayment(paymentRequest, {origin, metadata})`.
pub const SEND_PAYMENT: &str = "sendPayment";
/// Persist a spending allowance for an origin.
pub const ADD_ALLOWANCE: &str = "addAllowance";
/// Fetch wallet account state, including the spendable balance.
pub const FETCH_ACCOUNT_INFO: &str = "fetchAccountInfo";

/// Arguments for [`SEND_PAYMENT`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendPaymentArgs {
    /// BOLT11 payment request string.
    pub payment_request: String,
}

/// Arguments for [`ADD_ALLOWANCE`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddAllowanceArgs {
    /// Total pre-authorized budget in satoshis.
    pub total_budget: i64,
    /// Host the allowance is keyed on.
    pub host: String,
    /// Display name of the origin.
    pub name: String,
    /// Icon URL of the origin.
    #[serde(rename = "imageURL")]
    pub image_url: String,
}
