//! Payment confirmation state machine and privileged request router.
//!
//! This crate decides whether a Lightning payment request is authorized.
//! It never executes payments itself; that is the job of the external
//! executor behind the [`pay_core::PaymentExecutor`] seam.
//!
//! # Architecture
//!
//! ```text
//! Untrusted page                      Privileged wallet context
//!       │  call("sendPayment", ...)          │
//!       ├──────────── bridge ───────────────▶│ PaymentGate
//!       │                                    │   ├─ remembered allowance
//!       │                                    │   │  covers it? debit, pay,
//!       │◀──────────── reply ────────────────┤   │  reply - no interaction
//!       │                                    │   └─ otherwise: hand off as
//!       │                                    │      PendingConfirmation
//!       │                                    ▼
//!       │                        ConfirmationSession (app context)
//!       │                          AwaitingDecision ──▶ Submitting
//!       │◀─ reply / USER_REJECTED ── Succeeded / Rejected
//! ```
//!
//! The wallet holder either approves each payment individually or
//! remembers an origin with a budget; remembered origins bypass the
//! confirmation until the budget is exhausted. Every externally
//! initiated request receives exactly one terminal response across the
//! bridge.

mod account;
mod error;
mod gate;
mod params;
pub mod publisher;
pub mod rpc;
mod session;

// Public exports
pub use account::AccountSession;
pub use error::GateError;
pub use gate::{PaymentGate, PendingConfirmation};
pub use params::SessionParams;
pub use publisher::{send_to_site, PublisherSend};
pub use session::{ConfirmationSession, RejectOutcome, SessionState};
