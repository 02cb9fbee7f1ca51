//! End-to-end authorization flows across the bridge.
//!
//! Wires a PaymentGate to a page endpoint and an app endpoint over real
//! bridge channels, with stub collaborators standing in for the invoice
//! decoder, payment executor and account backend.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use allowance::{store, Database};
use bridge::{error_kind, CallContext, Endpoint};
use gatekeeper::{
    AccountSession, ConfirmationSession, GateError, PaymentGate, PendingConfirmation,
    RejectOutcome, SessionParams, SessionState,
};
use pay_core::{
    async_trait, AccountInfo, DecodedInvoice, InvoiceDecoder, OriginDescriptor, PaymentEnvelope,
    PaymentExecutor, PaymentResult, UpstreamError, ValidationError,
};
use serde_json::{json, Value};
use tokio::sync::mpsc;

/// Decodes test payment requests of the form `lntest:<sats>`.
struct StubDecoder;

impl InvoiceDecoder for StubDecoder {
    fn decode(&self, payment_request: &str) -> Result<DecodedInvoice, ValidationError> {
        let amount = payment_request
            .strip_prefix("lntest:")
            .and_then(|rest| rest.parse().ok())
            .ok_or_else(|| ValidationError::UndecodableRequest(payment_request.to_string()))?;
        Ok(DecodedInvoice {
            amount_sats: amount,
            description: Some("stub invoice".to_string()),
        })
    }
}

/// Counts invocations and fails on demand.
#[derive(Default)]
struct StubExecutor {
    calls: AtomicUsize,
    fail: AtomicBool,
}

#[async_trait]
impl PaymentExecutor for StubExecutor {
    async fn pay(&self, _envelope: &PaymentEnvelope) -> Result<PaymentResult, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(UpstreamError::new("executor", "no route to destination"));
        }
        Ok(PaymentResult {
            preimage: "00".repeat(32),
            payment_hash: "11".repeat(32),
            fee_sats: 1,
        })
    }
}

struct StubAccounts;

#[async_trait]
impl pay_core::AccountProvider for StubAccounts {
    async fn account_info(&self) -> Result<AccountInfo, UpstreamError> {
        Ok(AccountInfo {
            alias: "test wallet".to_string(),
            balance_sats: 100_000,
            currency: "USD".to_string(),
        })
    }
}

struct Harness {
    page: Endpoint,
    app: Endpoint,
    confirmations: mpsc::UnboundedReceiver<PendingConfirmation>,
    executor: Arc<StubExecutor>,
    db: Database,
    account: Arc<AccountSession>,
}

impl Harness {
    /// Open a session for the next payment the gate deferred to
    /// interactive confirmation.
    async fn next_session(&mut self) -> ConfirmationSession {
        let pending = self.confirmations.recv().await.expect("confirmation expected");
        ConfirmationSession::for_request(pending, self.app.clone(), self.account.clone())
    }
}

async fn harness() -> Harness {
    let db = Database::connect_with_pool_size("sqlite::memory:", 1)
        .await
        .unwrap();
    db.migrate().await.unwrap();

    let executor = Arc::new(StubExecutor::default());
    let gate = Arc::new(PaymentGate::new(
        db.clone(),
        executor.clone(),
        Arc::new(StubAccounts),
        Arc::new(StubDecoder),
    ));

    let (page, page_served) = bridge::channel();
    let (app, app_served) = bridge::channel();
    let (confirmations_tx, confirmations) = mpsc::unbounded_channel();

    tokio::spawn(gate.clone().serve_page(page_served, confirmations_tx));
    tokio::spawn(gate.serve_app(app_served));

    Harness {
        page,
        app,
        confirmations,
        executor,
        db,
        account: Arc::new(AccountSession::new()),
    }
}

fn origin() -> OriginDescriptor {
    OriginDescriptor::new("podcast.example", "Example Podcast", "icon.png")
}

fn page_payment(page: &Endpoint, sats: i64) -> impl std::future::Future<Output = Result<Value, bridge::BridgeError>> {
    let page = page.clone();
    async move {
        page.call(
            gatekeeper::rpc::SEND_PAYMENT,
            json!({ "paymentRequest": format!("lntest:{sats}") }),
            CallContext::new(origin(), None),
        )
        .await
    }
}

#[tokio::test]
async fn test_remembered_allowance_bypasses_confirmation() {
    let h = harness().await;
    store::create(h.db.pool(), "podcast.example", 10_000, "Example Podcast", "icon.png")
        .await
        .unwrap();

    let value = page_payment(&h.page, 1_000).await.unwrap();

    assert_eq!(value["preimage"], "00".repeat(32));
    assert_eq!(h.executor.calls.load(Ordering::SeqCst), 1);

    let record = store::get(h.db.pool(), "podcast.example").await.unwrap().unwrap();
    assert_eq!(record.used_amount, 1_000);
}

#[tokio::test]
async fn test_unknown_origin_defers_to_confirmation() {
    let mut h = harness().await;

    let caller = tokio::spawn(page_payment(&h.page, 1_000));

    let session = h.next_session().await;
    assert!(session.is_external());
    assert_eq!(session.amount_sats(), 1_000);
    assert_eq!(h.executor.calls.load(Ordering::SeqCst), 0);

    // The page is still waiting; clean up by rejecting.
    let mut session = session;
    session.reject().await.unwrap();
    let err = caller.await.unwrap().unwrap_err();
    assert_eq!(err.remote_kind(), Some(error_kind::USER_REJECTED));
}

#[tokio::test]
async fn test_proposed_budget_is_ten_times_amount() {
    let mut h = harness().await;

    let _caller = tokio::spawn(page_payment(&h.page, 1_000));
    let session = h.next_session().await;

    let SessionState::AwaitingDecision { budget, remember, last_error } = session.state() else {
        panic!("expected awaiting decision");
    };
    assert_eq!(budget, "10000");
    assert!(!remember);
    assert!(last_error.is_none());
}

#[tokio::test]
async fn test_confirm_executes_and_replies_to_page() {
    let mut h = harness().await;

    let caller = tokio::spawn(page_payment(&h.page, 1_000));
    let mut session = h.next_session().await;

    let state = session.confirm().await.unwrap();
    assert!(matches!(state, SessionState::Succeeded { .. }));

    let value = caller.await.unwrap().unwrap();
    assert_eq!(value["preimage"], "00".repeat(32));
    assert_eq!(h.executor.calls.load(Ordering::SeqCst), 1);

    // Success refreshed the account balance through the bridge.
    let info = h.account.current().await.unwrap();
    assert_eq!(info.balance_sats, 100_000);
}

#[tokio::test]
async fn test_remember_persists_allowance_before_submission() {
    let mut h = harness().await;

    let caller = tokio::spawn(page_payment(&h.page, 1_000));
    let mut session = h.next_session().await;

    session.set_remember(true).unwrap();
    session.set_budget("5000").unwrap();
    session.confirm().await.unwrap();
    caller.await.unwrap().unwrap();

    // The confirmed payment itself does not debit the fresh window.
    let record = store::get(h.db.pool(), "podcast.example").await.unwrap().unwrap();
    assert_eq!(record.total_budget, 5_000);
    assert_eq!(record.used_amount, 0);
    assert!(record.remembered);

    // The next payment from this origin is approved automatically.
    let value = page_payment(&h.page, 2_000).await.unwrap();
    assert_eq!(value["preimage"], "00".repeat(32));
    assert_eq!(h.executor.calls.load(Ordering::SeqCst), 2);

    let record = store::get(h.db.pool(), "podcast.example").await.unwrap().unwrap();
    assert_eq!(record.used_amount, 2_000);
}

#[tokio::test]
async fn test_invalid_metadata_blocks_submission() {
    let mut h = harness().await;

    let caller = {
        let page = h.page.clone();
        tokio::spawn(async move {
            page.call(
                gatekeeper::rpc::SEND_PAYMENT,
                json!({ "paymentRequest": "lntest:1000" }),
                CallContext::new(origin(), Some("not json".to_string())),
            )
            .await
        })
    };

    let mut session = h.next_session().await;
    let result = session.confirm().await;
    assert!(matches!(result, Err(GateError::Validation(_))));

    // The executor was never invoked and the session stays at the
    // decision with the error surfaced inline.
    assert_eq!(h.executor.calls.load(Ordering::SeqCst), 0);
    let SessionState::AwaitingDecision { last_error, .. } = session.state() else {
        panic!("expected awaiting decision");
    };
    assert!(last_error.is_some());

    session.reject().await.unwrap();
    let err = caller.await.unwrap().unwrap_err();
    assert_eq!(err.remote_kind(), Some(error_kind::USER_REJECTED));
}

#[tokio::test]
async fn test_reject_external_emits_single_user_rejected() {
    let mut h = harness().await;

    let caller = tokio::spawn(page_payment(&h.page, 1_000));
    let mut session = h.next_session().await;

    let outcome = session.reject().await.unwrap();
    assert_eq!(outcome, RejectOutcome::Signalled);
    assert_eq!(*session.state(), SessionState::Rejected);

    let err = caller.await.unwrap().unwrap_err();
    assert_eq!(err.remote_kind(), Some(error_kind::USER_REJECTED));

    // The session is terminal; a second rejection is refused.
    assert!(matches!(
        session.reject().await,
        Err(GateError::InvalidTransition("reject"))
    ));
}

#[tokio::test]
async fn test_reject_local_navigates_silently() {
    let h = harness().await;

    let params = SessionParams::new(Some("lntest:1000".to_string()), Some(origin()), None);
    let mut session =
        ConfirmationSession::open(params, &StubDecoder, h.app.clone(), h.account.clone()).unwrap();

    assert!(!session.is_external());
    let outcome = session.reject().await.unwrap();
    assert_eq!(outcome, RejectOutcome::NavigateBack);
}

#[tokio::test]
async fn test_executor_failure_is_retryable() {
    let mut h = harness().await;
    h.executor.fail.store(true, Ordering::SeqCst);

    let caller = tokio::spawn(page_payment(&h.page, 1_000));
    let mut session = h.next_session().await;

    let state = session.confirm().await.unwrap();
    let SessionState::AwaitingDecision { last_error, .. } = state else {
        panic!("expected return to decision after executor failure");
    };
    assert!(last_error.as_deref().unwrap().contains(error_kind::PAYMENT_FAILED));
    assert_eq!(h.executor.calls.load(Ordering::SeqCst), 1);

    // The page received no terminal response yet; retrying succeeds and
    // delivers exactly one reply.
    h.executor.fail.store(false, Ordering::SeqCst);
    let state = session.confirm().await.unwrap();
    assert!(matches!(state, SessionState::Succeeded { .. }));

    let value = caller.await.unwrap().unwrap();
    assert_eq!(value["preimage"], "00".repeat(32));
}

#[tokio::test]
async fn test_exhausted_allowance_falls_back_to_confirmation() {
    let mut h = harness().await;
    store::create(h.db.pool(), "podcast.example", 1_500, "Example Podcast", "icon.png")
        .await
        .unwrap();

    // First payment fits the budget and auto-approves.
    page_payment(&h.page, 1_000).await.unwrap();

    // The second would overdraw; it must go through the user instead.
    let caller = tokio::spawn(page_payment(&h.page, 1_000));
    let mut session = h.next_session().await;
    assert_eq!(session.amount_sats(), 1_000);

    session.reject().await.unwrap();
    let err = caller.await.unwrap().unwrap_err();
    assert_eq!(err.remote_kind(), Some(error_kind::USER_REJECTED));

    let record = store::get(h.db.pool(), "podcast.example").await.unwrap().unwrap();
    assert_eq!(record.used_amount, 1_000);
}

#[tokio::test]
async fn test_concurrent_payments_cannot_jointly_exceed_budget() {
    let mut h = harness().await;
    store::create(h.db.pool(), "podcast.example", 1_500, "Example Podcast", "icon.png")
        .await
        .unwrap();

    // Each fits alone, together they exceed the budget: exactly one may
    // auto-approve, the other must be deferred to the user.
    let first = tokio::spawn(page_payment(&h.page, 1_000));
    let second = tokio::spawn(page_payment(&h.page, 1_000));

    let mut session = h.next_session().await;
    session.reject().await.unwrap();

    let results = [first.await.unwrap(), second.await.unwrap()];
    let approved = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| {
            matches!(r, Err(err) if err.remote_kind() == Some(error_kind::USER_REJECTED))
        })
        .count();
    assert_eq!(approved, 1);
    assert_eq!(rejected, 1);

    let record = store::get(h.db.pool(), "podcast.example").await.unwrap().unwrap();
    assert_eq!(record.used_amount, 1_000);
}

#[tokio::test]
async fn test_undecodable_payment_request_never_reaches_executor() {
    let h = harness().await;

    let err = h
        .page
        .call(
            gatekeeper::rpc::SEND_PAYMENT,
            json!({ "paymentRequest": "garbage" }),
            CallContext::new(origin(), None),
        )
        .await
        .unwrap_err();

    assert_eq!(err.remote_kind(), Some(error_kind::VALIDATION_FAILED));
    assert_eq!(h.executor.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unserved_method_is_rejected() {
    let h = harness().await;

    let err = h
        .page
        .call("openChannel", json!({}), CallContext::new(origin(), None))
        .await
        .unwrap_err();
    assert_eq!(err.remote_kind(), Some(error_kind::METHOD_NOT_FOUND));
}

#[tokio::test]
async fn test_detached_window_reads_query_parameters() {
    let h = harness().await;

    let params = SessionParams::new(None, Some(origin()), None)
        .merge_query("?paymentRequest=lntest:2500");
    let session =
        ConfirmationSession::open(params, &StubDecoder, h.app.clone(), h.account.clone()).unwrap();

    assert_eq!(session.amount_sats(), 2_500);
    let SessionState::AwaitingDecision { budget, .. } = session.state() else {
        panic!("expected awaiting decision");
    };
    assert_eq!(budget, "25000");
}

#[tokio::test]
async fn test_missing_payment_request_fails_to_open() {
    let h = harness().await;

    let params = SessionParams::new(None, Some(origin()), None).merge_query("?foo=bar");
    let result = ConfirmationSession::open(params, &StubDecoder, h.app.clone(), h.account.clone());
    assert!(matches!(result, Err(GateError::MissingPaymentRequest)));
}
