//! Injected account context for the confirmation UI.

use bridge::Endpoint;
use pay_core::AccountInfo;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::GateError;
use crate::rpc;

/// Wallet account state for one signed-in session.
///
/// Constructed by the process root and injected into each confirmation
/// session; dropped on logout. Never reached through ambient global
/// state.
#[derive(Debug, Default)]
pub struct AccountSession {
    info: RwLock<Option<AccountInfo>>,
}

impl AccountSession {
    /// Create an empty account session.
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently fetched account info, if any.
    pub async fn current(&self) -> Option<AccountInfo> {
        self.info.read().await.clone()
    }

    /// Refresh the cached account info across the bridge.
    pub async fn refresh(&self, app: &Endpoint) -> Result<AccountInfo, GateError> {
        let value = app.request(rpc::FETCH_ACCOUNT_INFO, Value::Null).await?;
        let info: AccountInfo = serde_json::from_value(value)?;
        *self.info.write().await = Some(info.clone());
        Ok(info)
    }

    /// Drop the cached state, e.g. on logout.
    pub async fn clear(&self) {
        *self.info.write().await = None;
    }
}
