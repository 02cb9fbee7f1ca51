//! Bridge endpoints and the demux loop behind them.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::BridgeError;
use crate::frame::{CallContext, Frame};

type PendingMap = Arc<Mutex<HashMap<Uuid, oneshot::Sender<Result<Value, BridgeError>>>>>;

/// Tracks inbound correlation ids awaiting their single terminal response.
///
/// Completed ids are retained so a late second attempt is reported as a
/// protocol violation rather than an unknown id.
#[derive(Clone, Default)]
struct OpenSet {
    inner: Arc<Mutex<OpenState>>,
}

#[derive(Default)]
struct OpenState {
    open: HashSet<Uuid>,
    done: HashSet<Uuid>,
}

impl OpenSet {
    async fn insert(&self, id: Uuid) {
        self.inner.lock().await.open.insert(id);
    }

    /// Consume the id, enforcing the exactly-once contract.
    async fn complete(&self, id: Uuid) -> Result<(), BridgeError> {
        let mut state = self.inner.lock().await;
        if state.open.remove(&id) {
            state.done.insert(id);
            Ok(())
        } else if state.done.contains(&id) {
            Err(BridgeError::AlreadyCompleted(id))
        } else {
            Err(BridgeError::UnknownCorrelation(id))
        }
    }
}

/// Create a connected pair of endpoints, one per execution context.
pub fn channel() -> (Endpoint, Endpoint) {
    let (a_to_b, b_from_a) = mpsc::unbounded_channel();
    let (b_to_a, a_from_b) = mpsc::unbounded_channel();
    (
        Endpoint::new(a_to_b, a_from_b),
        Endpoint::new(b_to_a, b_from_a),
    )
}

/// One side of the bridge.
///
/// Cloning an endpoint shares the underlying channel; the connection
/// closes when every clone on a side has been dropped.
#[derive(Clone)]
pub struct Endpoint {
    out: mpsc::UnboundedSender<Frame>,
    pending: PendingMap,
    inbound: Arc<Mutex<mpsc::UnboundedReceiver<InboundRequest>>>,
    open: OpenSet,
}

/// An inbound method invocation paired with its one-shot responder.
pub struct InboundRequest {
    /// Method name.
    pub method: String,
    /// Method arguments.
    pub args: Value,
    /// Page-origin context, present only for `call`-originated requests.
    pub context: Option<CallContext>,
    /// Handle for delivering the single terminal response.
    pub responder: Responder,
}

impl Endpoint {
    fn new(out: mpsc::UnboundedSender<Frame>, raw_in: mpsc::UnboundedReceiver<Frame>) -> Self {
        let pending: PendingMap = Arc::default();
        let open = OpenSet::default();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        tokio::spawn(demux(
            raw_in,
            pending.clone(),
            open.clone(),
            inbound_tx,
            out.clone(),
        ));

        Self {
            out,
            pending,
            inbound: Arc::new(Mutex::new(inbound_rx)),
            open,
        }
    }

    /// Send a method invocation with page-origin context attached and
    /// await its terminal response.
    pub async fn call(
        &self,
        method: &str,
        args: Value,
        context: CallContext,
    ) -> Result<Value, BridgeError> {
        self.dispatch(method, args, Some(context)).await
    }

    /// Send a privileged method invocation that needs no page-origin
    /// context and await its terminal response.
    pub async fn request(&self, method: &str, args: Value) -> Result<Value, BridgeError> {
        self.dispatch(method, args, None).await
    }

    async fn dispatch(
        &self,
        method: &str,
        args: Value,
        context: Option<CallContext>,
    ) -> Result<Value, BridgeError> {
        let id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        debug!("dispatching {} with correlation id {}", method, id);

        let frame = Frame::Request {
            id,
            method: method.to_string(),
            args,
            context,
        };
        if self.out.send(frame).is_err() {
            self.pending.lock().await.remove(&id);
            return Err(BridgeError::ConnectionClosed);
        }

        match rx.await {
            Ok(result) => result,
            Err(_) => Err(BridgeError::ConnectionClosed),
        }
    }

    /// Receive the next inbound request, or `None` once the channel has
    /// closed and every queued request has been taken.
    pub async fn next_request(&self) -> Option<InboundRequest> {
        self.inbound.lock().await.recv().await
    }

    /// Send the single success completion for an inbound request.
    pub async fn reply(&self, id: Uuid, value: Value) -> Result<(), BridgeError> {
        send_terminal(&self.out, &self.open, id, Frame::Reply { id, value }).await
    }

    /// Send the single failure completion for an inbound request.
    pub async fn error(&self, id: Uuid, kind: &str) -> Result<(), BridgeError> {
        let frame = Frame::Error {
            id,
            kind: kind.to_string(),
        };
        send_terminal(&self.out, &self.open, id, frame).await
    }
}

/// One-shot handle for completing an inbound request.
///
/// Consumed by `reply` or `error`; the shared open-set additionally
/// rejects a completion raced through the endpoint-level primitives, so
/// no correlation id can ever be answered twice.
pub struct Responder {
    id: Uuid,
    out: mpsc::UnboundedSender<Frame>,
    open: OpenSet,
}

impl Responder {
    /// Correlation id this responder answers.
    pub fn correlation_id(&self) -> Uuid {
        self.id
    }

    /// Deliver the success completion.
    pub async fn reply(self, value: Value) -> Result<(), BridgeError> {
        let frame = Frame::Reply { id: self.id, value };
        send_terminal(&self.out, &self.open, self.id, frame).await
    }

    /// Deliver the failure completion.
    pub async fn error(self, kind: &str) -> Result<(), BridgeError> {
        let frame = Frame::Error {
            id: self.id,
            kind: kind.to_string(),
        };
        send_terminal(&self.out, &self.open, self.id, frame).await
    }
}

async fn send_terminal(
    out: &mpsc::UnboundedSender<Frame>,
    open: &OpenSet,
    id: Uuid,
    frame: Frame,
) -> Result<(), BridgeError> {
    open.complete(id).await?;
    out.send(frame).map_err(|_| BridgeError::ConnectionClosed)
}

/// Routes incoming frames: requests to the inbound queue, terminal
/// responses to their pending completion.
async fn demux(
    mut raw_in: mpsc::UnboundedReceiver<Frame>,
    pending: PendingMap,
    open: OpenSet,
    inbound_tx: mpsc::UnboundedSender<InboundRequest>,
    out: mpsc::UnboundedSender<Frame>,
) {
    loop {
        let frame = tokio::select! {
            frame = raw_in.recv() => match frame {
                Some(frame) => frame,
                None => break,
            },
            // Every endpoint clone on this side is gone; stop serving.
            _ = inbound_tx.closed() => break,
        };

        match frame {
            Frame::Request {
                id,
                method,
                args,
                context,
            } => {
                open.insert(id).await;
                let request = InboundRequest {
                    method,
                    args,
                    context,
                    responder: Responder {
                        id,
                        out: out.clone(),
                        open: open.clone(),
                    },
                };
                if inbound_tx.send(request).is_err() {
                    warn!("inbound request {} dropped: endpoint no longer receiving", id);
                    break;
                }
            }
            Frame::Reply { id, value } => {
                complete_pending(&pending, id, Ok(value)).await;
            }
            Frame::Error { id, kind } => {
                complete_pending(&pending, id, Err(BridgeError::Remote(kind))).await;
            }
        }
    }

    // Channel closed: every in-flight call fails with a connection error.
    pending.lock().await.clear();
}

async fn complete_pending(pending: &PendingMap, id: Uuid, result: Result<Value, BridgeError>) {
    match pending.lock().await.remove(&id) {
        Some(tx) => {
            // A dropped caller is fine; the response is simply discarded.
            let _ = tx.send(result);
        }
        None => warn!("discarding duplicate terminal response for {}", id),
    }
}
