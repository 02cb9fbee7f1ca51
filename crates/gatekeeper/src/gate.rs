//! Privileged request router.
//!
//! The [`PaymentGate`] runs in the privileged wallet context. It serves
//! the bridge RPC surface on two endpoints: the untrusted page side,
//! where a payment is only executed automatically when a remembered
//! allowance covers it, and the trusted app side, where the interactive
//! confirmation UI submits payments that the wallet holder already
//! approved.

use std::sync::Arc;

use allowance::{store, Database, StoreError};
use bridge::{error_kind, Endpoint, InboundRequest, Responder};
use pay_core::{
    AccountProvider, DecodedInvoice, InvoiceDecoder, PaymentEnvelope, PaymentExecutor,
};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::GateError;
use crate::rpc::{self, AddAllowanceArgs, SendPaymentArgs};

/// An externally-initiated payment waiting for interactive approval.
///
/// Handed from the router to whatever opens the confirmation UI; the
/// responder inside is the single completion handle for the page's
/// request.
pub struct PendingConfirmation {
    /// The payment and the identity it arrived with.
    pub envelope: PaymentEnvelope,
    /// Amount and description decoded from the payment request.
    pub decoded: DecodedInvoice,
    /// One-shot handle answering the requesting page.
    pub responder: Responder,
}

/// The privileged router: allowance consultation, payment execution and
/// account lookups.
pub struct PaymentGate {
    db: Database,
    executor: Arc<dyn PaymentExecutor>,
    accounts: Arc<dyn AccountProvider>,
    decoder: Arc<dyn InvoiceDecoder>,
}

impl PaymentGate {
    /// Create a gate over the given allowance database and collaborators.
    pub fn new(
        db: Database,
        executor: Arc<dyn PaymentExecutor>,
        accounts: Arc<dyn AccountProvider>,
        decoder: Arc<dyn InvoiceDecoder>,
    ) -> Self {
        Self {
            db,
            executor,
            accounts,
            decoder,
        }
    }

    /// The allowance database this gate consults.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Serve requests arriving from the untrusted page context.
    ///
    /// Payments that a remembered allowance covers are debited and
    /// executed without interaction; everything else is forwarded on
    /// `confirmations` for interactive approval. Requests are handled
    /// concurrently; the allowance store serializes racing debits.
    pub async fn serve_page(
        self: Arc<Self>,
        endpoint: Endpoint,
        confirmations: mpsc::UnboundedSender<PendingConfirmation>,
    ) {
        while let Some(request) = endpoint.next_request().await {
            let gate = self.clone();
            let confirmations = confirmations.clone();
            tokio::spawn(async move {
                gate.handle_page_request(request, confirmations).await;
            });
        }
    }

    /// Serve requests arriving from the trusted confirmation UI.
    pub async fn serve_app(self: Arc<Self>, endpoint: Endpoint) {
        while let Some(request) = endpoint.next_request().await {
            let gate = self.clone();
            tokio::spawn(async move {
                gate.handle_app_request(request).await;
            });
        }
    }

    async fn handle_page_request(
        &self,
        request: InboundRequest,
        confirmations: mpsc::UnboundedSender<PendingConfirmation>,
    ) {
        let InboundRequest {
            method,
            args,
            context,
            responder,
        } = request;

        if method != rpc::SEND_PAYMENT {
            warn!("page context requested unserved method: {}", method);
            let _ = responder.error(error_kind::METHOD_NOT_FOUND).await;
            return;
        }

        let args: SendPaymentArgs = match serde_json::from_value(args) {
            Ok(args) => args,
            Err(err) => {
                warn!("malformed sendPayment args: {}", err);
                let _ = responder.error(error_kind::INVALID_REQUEST).await;
                return;
            }
        };
        let context = context.unwrap_or_default();
        let Some(origin) = context.origin else {
            let _ = responder.error(error_kind::INVALID_REQUEST).await;
            return;
        };

        let decoded = match self.decoder.decode(&args.payment_request) {
            Ok(decoded) => decoded,
            Err(err) => {
                warn!("undecodable payment request from {}: {}", origin.host, err);
                let _ = responder.error(error_kind::VALIDATION_FAILED).await;
                return;
            }
        };

        let envelope = PaymentEnvelope {
            payment_request: args.payment_request,
            origin: origin.clone().external(),
            metadata: context.metadata,
            correlation_id: responder.correlation_id(),
        };

        match self.try_allowance(&origin.host, decoded.amount_sats).await {
            Ok(true) => {
                self.execute_and_respond(&envelope, responder).await;
            }
            Ok(false) => {
                let pending = PendingConfirmation {
                    envelope,
                    decoded,
                    responder,
                };
                if let Err(err) = confirmations.send(pending) {
                    // Nothing is listening for approvals; fail the page
                    // request instead of leaving it hanging.
                    let _ = err.0.responder.error(error_kind::INTERNAL).await;
                }
            }
            Err(err) => {
                warn!("allowance consultation failed for {}: {}", origin.host, err);
                let _ = responder.error(error_kind::INTERNAL).await;
            }
        }
    }

    /// Check whether a remembered allowance authorizes the payment.
    ///
    /// Returns `Ok(true)` after a successful debit; a missing,
    /// unremembered or exhausted allowance falls back to interactive
    /// confirmation.
    async fn try_allowance(&self, host: &str, amount_sats: i64) -> Result<bool, GateError> {
        match store::get(self.db.pool(), host).await? {
            Some(record) if record.remembered => {
                match store::debit(self.db.pool(), host, amount_sats).await {
                    Ok(()) => Ok(true),
                    Err(StoreError::BudgetExceeded { remaining, .. }) => {
                        info!(
                            "allowance for {} cannot cover {} sats ({} remaining); asking the user",
                            host, amount_sats, remaining
                        );
                        Ok(false)
                    }
                    Err(err) => Err(err.into()),
                }
            }
            _ => Ok(false),
        }
    }

    async fn handle_app_request(&self, request: InboundRequest) {
        let InboundRequest {
            method,
            args,
            context,
            responder,
        } = request;

        match method.as_str() {
            rpc::SEND_PAYMENT => {
                let args: SendPaymentArgs = match serde_json::from_value(args) {
                    Ok(args) => args,
                    Err(err) => {
                        warn!("malformed sendPayment args: {}", err);
                        let _ = responder.error(error_kind::INVALID_REQUEST).await;
                        return;
                    }
                };
                let context = context.unwrap_or_default();
                let Some(origin) = context.origin else {
                    let _ = responder.error(error_kind::INVALID_REQUEST).await;
                    return;
                };

                // The confirmation UI already collected the approval;
                // execute directly.
                let envelope = PaymentEnvelope {
                    payment_request: args.payment_request,
                    origin,
                    metadata: context.metadata,
                    correlation_id: responder.correlation_id(),
                };
                self.execute_and_respond(&envelope, responder).await;
            }
            rpc::ADD_ALLOWANCE => {
                let args: AddAllowanceArgs = match serde_json::from_value(args) {
                    Ok(args) => args,
                    Err(err) => {
                        warn!("malformed addAllowance args: {}", err);
                        let _ = responder.error(error_kind::INVALID_REQUEST).await;
                        return;
                    }
                };
                match store::create(
                    self.db.pool(),
                    &args.host,
                    args.total_budget,
                    &args.name,
                    &args.image_url,
                )
                .await
                {
                    Ok(()) => {
                        let _ = responder.reply(json!({ "ok": true })).await;
                    }
                    Err(err) => {
                        warn!("could not persist allowance for {}: {}", args.host, err);
                        let _ = responder.error(error_kind::INTERNAL).await;
                    }
                }
            }
            rpc::FETCH_ACCOUNT_INFO => match self.accounts.account_info().await {
                Ok(info) => match serde_json::to_value(&info) {
                    Ok(value) => {
                        let _ = responder.reply(value).await;
                    }
                    Err(_) => {
                        let _ = responder.error(error_kind::INTERNAL).await;
                    }
                },
                Err(err) => {
                    warn!("account info unavailable: {}", err);
                    let _ = responder.error(error_kind::INTERNAL).await;
                }
            },
            other => {
                warn!("app context requested unserved method: {}", other);
                let _ = responder.error(error_kind::METHOD_NOT_FOUND).await;
            }
        }
    }

    /// Run the payment through the executor and deliver the single
    /// terminal response for it.
    async fn execute_and_respond(&self, envelope: &PaymentEnvelope, responder: Responder) {
        match self.executor.pay(envelope).await {
            Ok(result) => match serde_json::to_value(&result) {
                Ok(value) => {
                    let _ = responder.reply(value).await;
                }
                Err(_) => {
                    let _ = responder.error(error_kind::INTERNAL).await;
                }
            },
            Err(err) => {
                warn!(
                    "payment to {} failed: {}",
                    envelope.origin.host, err
                );
                let _ = responder.error(error_kind::PAYMENT_FAILED).await;
            }
        }
    }
}
