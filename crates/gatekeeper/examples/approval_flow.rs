//! End-to-end wiring example: a page requests a payment, the wallet
//! holder remembers the origin, and the next payment bypasses the
//! confirmation.
//!
//! Run with: cargo run -p gatekeeper --example approval_flow

use std::sync::Arc;

use allowance::Database;
use bridge::CallContext;
use gatekeeper::{AccountSession, ConfirmationSession, PaymentGate};
use pay_core::{
    async_trait, AccountInfo, AccountProvider, DecodedInvoice, InvoiceDecoder, OriginDescriptor,
    PaymentEnvelope, PaymentExecutor, PaymentResult, UpstreamError, ValidationError,
};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::info;

/// Decodes demo payment requests of the form `lntest:<sats>`.
struct DemoDecoder;

impl InvoiceDecoder for DemoDecoder {
    fn decode(&self, payment_request: &str) -> Result<DecodedInvoice, ValidationError> {
        let amount = payment_request
            .strip_prefix("lntest:")
            .and_then(|rest| rest.parse().ok())
            .ok_or_else(|| ValidationError::UndecodableRequest(payment_request.to_string()))?;
        Ok(DecodedInvoice {
            amount_sats: amount,
            description: Some("demo invoice".to_string()),
        })
    }
}

/// Settles every payment instantly.
struct DemoExecutor;

#[async_trait]
impl PaymentExecutor for DemoExecutor {
    async fn pay(&self, envelope: &PaymentEnvelope) -> Result<PaymentResult, UpstreamError> {
        info!(
            "executing payment of {} for {}",
            envelope.payment_request, envelope.origin.host
        );
        Ok(PaymentResult {
            preimage: "00".repeat(32),
            payment_hash: "11".repeat(32),
            fee_sats: 1,
        })
    }
}

struct DemoAccounts;

#[async_trait]
impl AccountProvider for DemoAccounts {
    async fn account_info(&self) -> Result<AccountInfo, UpstreamError> {
        Ok(AccountInfo {
            alias: "demo wallet".to_string(),
            balance_sats: 500_000,
            currency: "USD".to_string(),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let db = Database::connect_with_pool_size("sqlite::memory:", 1).await?;
    db.migrate().await?;

    let gate = Arc::new(PaymentGate::new(
        db,
        Arc::new(DemoExecutor),
        Arc::new(DemoAccounts),
        Arc::new(DemoDecoder),
    ));

    let (page, page_served) = bridge::channel();
    let (app, app_served) = bridge::channel();
    let (confirmations_tx, mut confirmations) = mpsc::unbounded_channel();

    tokio::spawn(gate.clone().serve_page(page_served, confirmations_tx));
    tokio::spawn(gate.serve_app(app_served));

    let account = Arc::new(AccountSession::new());
    let origin = OriginDescriptor::new("podcast.example", "Example Podcast", "icon.png");

    // The page asks for a payment; no allowance exists yet, so the gate
    // defers to interactive confirmation.
    let caller = {
        let page = page.clone();
        let origin = origin.clone();
        tokio::spawn(async move {
            page.call(
                gatekeeper::rpc::SEND_PAYMENT,
                json!({ "paymentRequest": "lntest:1000" }),
                CallContext::new(origin, None),
            )
            .await
        })
    };

    let pending = confirmations.recv().await.expect("confirmation expected");
    let mut session = ConfirmationSession::for_request(pending, app.clone(), account.clone());
    info!("session opened: {:?}", session.state());

    // The wallet holder remembers the origin with the proposed budget
    // and confirms.
    session.set_remember(true)?;
    session.confirm().await?;
    info!("session finished: {:?}", session.state());

    let result = caller.await??;
    info!("page received: {}", result);

    // A second payment from the same origin is now covered by the
    // allowance and approved with no interaction.
    let result = page
        .call(
            gatekeeper::rpc::SEND_PAYMENT,
            json!({ "paymentRequest": "lntest:2000" }),
            CallContext::new(origin, None),
        )
        .await?;
    info!("auto-approved payment: {}", result);

    Ok(())
}
