//! The approval state machine for one payment attempt.

use std::sync::Arc;

use bridge::{error_kind, CallContext, Endpoint};
use pay_core::{metadata, DecodedInvoice, FiatConverter, InvoiceDecoder, PaymentEnvelope, PaymentResult};
use tracing::{info, warn};
use uuid::Uuid;

use crate::account::AccountSession;
use crate::error::GateError;
use crate::gate::PendingConfirmation;
use crate::params::SessionParams;
use crate::rpc::{self, AddAllowanceArgs, SendPaymentArgs};

/// Where a confirmation session currently stands.
///
/// All mutable UI state (budget text, remember flag, last error) lives
/// inside the state value and changes only through the session's
/// transition methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the wallet holder to confirm or reject.
    AwaitingDecision {
        /// Editable proposed allowance budget, in satoshis.
        budget: String,
        /// Whether to remember this origin with the budget above.
        remember: bool,
        /// Message from a failed or blocked previous attempt.
        last_error: Option<String>,
    },
    /// The submission is in flight with the payment executor.
    Submitting,
    /// The payment settled.
    Succeeded {
        /// Executor result, also forwarded to the requesting page.
        result: PaymentResult,
    },
    /// The wallet holder declined; the session accepts no further input.
    Rejected,
}

/// How a rejection concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectOutcome {
    /// The requesting page received a `USER_REJECTED` error frame.
    Signalled,
    /// Locally-initiated request: navigate back, no bridge signal.
    NavigateBack,
}

/// One in-flight payment approval.
///
/// Created when the approval UI opens and destroyed when a terminal
/// response has been dispatched or the UI closes. Transitions strictly
/// forward; a failed submission returns to [`SessionState::AwaitingDecision`]
/// for retry, everything else is terminal.
pub struct ConfirmationSession {
    app: Endpoint,
    account: Arc<AccountSession>,
    envelope: PaymentEnvelope,
    decoded: DecodedInvoice,
    responder: Option<bridge::Responder>,
    state: SessionState,
}

/// The proposed default budget is ten times the payment amount.
const DEFAULT_BUDGET_MULTIPLIER: i64 = 10;

impl ConfirmationSession {
    /// Open a session for a locally-initiated payment.
    ///
    /// The payment request comes from props or, for a detached window,
    /// from URL query parameters (see [`SessionParams::merge_query`]).
    pub fn open(
        params: SessionParams,
        decoder: &dyn InvoiceDecoder,
        app: Endpoint,
        account: Arc<AccountSession>,
    ) -> Result<Self, GateError> {
        let payment_request = params
            .payment_request
            .ok_or(GateError::MissingPaymentRequest)?;
        let origin = params.origin.ok_or(GateError::MissingOrigin)?;
        let decoded = decoder.decode(&payment_request)?;

        let envelope = PaymentEnvelope {
            payment_request,
            origin,
            metadata: params.metadata,
            correlation_id: Uuid::new_v4(),
        };

        Ok(Self::start(app, account, envelope, decoded, None))
    }

    /// Open a session for an externally-initiated request handed over by
    /// the privileged router, keeping its one-shot responder so exactly
    /// one terminal response reaches the requesting page.
    pub fn for_request(
        pending: PendingConfirmation,
        app: Endpoint,
        account: Arc<AccountSession>,
    ) -> Self {
        Self::start(
            app,
            account,
            pending.envelope,
            pending.decoded,
            Some(pending.responder),
        )
    }

    fn start(
        app: Endpoint,
        account: Arc<AccountSession>,
        envelope: PaymentEnvelope,
        decoded: DecodedInvoice,
        responder: Option<bridge::Responder>,
    ) -> Self {
        let proposed = decoded.amount_sats * DEFAULT_BUDGET_MULTIPLIER;
        Self {
            app,
            account,
            envelope,
            decoded,
            responder,
            state: SessionState::AwaitingDecision {
                budget: proposed.to_string(),
                remember: false,
                last_error: None,
            },
        }
    }

    /// Current state of the approval.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Amount of the payment being approved, in satoshis.
    pub fn amount_sats(&self) -> i64 {
        self.decoded.amount_sats
    }

    /// Description decoded from the payment request.
    pub fn description(&self) -> Option<&str> {
        self.decoded.description.as_deref()
    }

    /// The origin this payment is for.
    pub fn origin(&self) -> &pay_core::OriginDescriptor {
        &self.envelope.origin
    }

    /// Whether the request was supplied by a page rather than typed in
    /// by the wallet holder.
    pub fn is_external(&self) -> bool {
        self.responder.is_some()
    }

    /// Edit the proposed budget.
    pub fn set_budget(&mut self, text: impl Into<String>) -> Result<(), GateError> {
        match &mut self.state {
            SessionState::AwaitingDecision { budget, .. } => {
                *budget = text.into();
                Ok(())
            }
            _ => Err(GateError::InvalidTransition("set_budget")),
        }
    }

    /// Toggle remembering this origin.
    pub fn set_remember(&mut self, value: bool) -> Result<(), GateError> {
        match &mut self.state {
            SessionState::AwaitingDecision { remember, .. } => {
                *remember = value;
                Ok(())
            }
            _ => Err(GateError::InvalidTransition("set_remember")),
        }
    }

    /// Fiat display string for the current budget.
    ///
    /// Quote failures degrade gracefully to an empty string and never
    /// block the payment.
    pub async fn fiat_budget(&self, converter: &dyn FiatConverter) -> String {
        let amount = match &self.state {
            SessionState::AwaitingDecision { budget, .. } => {
                budget.parse::<i64>().unwrap_or(0)
            }
            _ => return String::new(),
        };
        match converter.to_fiat(amount).await {
            Ok(fiat) => fiat,
            Err(err) => {
                warn!("fiat quote unavailable: {}", err);
                String::new()
            }
        }
    }

    /// Confirm the payment.
    ///
    /// Persists the allowance first when remembering, validates any
    /// caller-supplied metadata, then submits across the bridge. An
    /// executor failure returns the session to
    /// [`SessionState::AwaitingDecision`] for retry; a metadata failure
    /// does the same but is terminal for this request since metadata is
    /// not editable here.
    pub async fn confirm(&mut self) -> Result<&SessionState, GateError> {
        let (budget, remember) = match &self.state {
            SessionState::AwaitingDecision {
                budget, remember, ..
            } => (budget.clone(), *remember),
            _ => return Err(GateError::InvalidTransition("confirm")),
        };

        if remember {
            if let Ok(total) = budget.parse::<i64>() {
                if total > 0 {
                    if let Err(err) = self.save_allowance(total).await {
                        self.return_to_decision(budget, remember, err.to_string());
                        return Err(err);
                    }
                }
            }
        }

        if let Some(raw) = self.envelope.metadata.clone() {
            if let Err(err) = metadata::validate(&raw) {
                self.return_to_decision(budget, remember, err.to_string());
                return Err(GateError::Validation(err));
            }
        }

        self.state = SessionState::Submitting;

        let args = SendPaymentArgs {
            payment_request: self.envelope.payment_request.clone(),
        };
        let context = CallContext::new(
            self.envelope.origin.clone(),
            self.envelope.metadata.clone(),
        );
        let args = serde_json::to_value(&args)?;

        match self.app.call(rpc::SEND_PAYMENT, args, context).await {
            Ok(value) => {
                let result: PaymentResult = match serde_json::from_value(value.clone()) {
                    Ok(result) => result,
                    Err(err) => {
                        self.return_to_decision(budget, remember, err.to_string());
                        return Err(GateError::Payload(err));
                    }
                };

                info!(
                    "payment of {} sats to {} settled",
                    self.decoded.amount_sats, self.envelope.origin.host
                );

                if let Err(err) = self.account.refresh(&self.app).await {
                    warn!("balance refresh failed: {}", err);
                }

                // Forward the executor's response verbatim to the page
                // that asked, exactly once.
                if let Some(responder) = self.responder.take() {
                    if let Err(err) = responder.reply(value).await {
                        warn!("could not deliver payment result to requesting page: {}", err);
                    }
                }

                self.state = SessionState::Succeeded { result };
                Ok(&self.state)
            }
            Err(err) => {
                self.return_to_decision(budget, remember, err.to_string());
                Ok(&self.state)
            }
        }
    }

    /// Reject the payment.
    ///
    /// An externally-initiated request receives exactly one
    /// `USER_REJECTED` error frame; a locally-initiated one ends with a
    /// silent navigation.
    pub async fn reject(&mut self) -> Result<RejectOutcome, GateError> {
        match self.state {
            SessionState::AwaitingDecision { .. } => {}
            _ => return Err(GateError::InvalidTransition("reject")),
        }

        self.state = SessionState::Rejected;

        match self.responder.take() {
            Some(responder) => {
                responder.error(error_kind::USER_REJECTED).await?;
                Ok(RejectOutcome::Signalled)
            }
            None => Ok(RejectOutcome::NavigateBack),
        }
    }

    async fn save_allowance(&self, total_budget: i64) -> Result<(), GateError> {
        let args = AddAllowanceArgs {
            total_budget,
            host: self.envelope.origin.host.clone(),
            name: self.envelope.origin.name.clone(),
            image_url: self.envelope.origin.icon.clone(),
        };
        self.app
            .request(rpc::ADD_ALLOWANCE, serde_json::to_value(&args)?)
            .await?;
        Ok(())
    }

    fn return_to_decision(&mut self, budget: String, remember: bool, message: String) {
        self.state = SessionState::AwaitingDecision {
            budget,
            remember,
            last_error: Some(message),
        };
    }
}
