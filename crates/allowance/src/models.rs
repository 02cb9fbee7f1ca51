//! Allowance store models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A per-origin spending allowance.
///
/// Invariant: `0 <= used_amount <= total_budget` at every observable
/// instant. `host` uniquely identifies at most one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AllowanceRecord {
    /// Host of the origin this allowance belongs to (key).
    pub host: String,
    /// Display name of the origin.
    pub name: String,
    /// Icon URL of the origin.
    pub icon: String,
    /// Total pre-authorized budget in satoshis.
    pub total_budget: i64,
    /// Amount already spent against the budget, in satoshis.
    pub used_amount: i64,
    /// Whether the wallet holder chose to remember this origin.
    pub remembered: bool,
    /// Last update timestamp.
    pub updated_at: String,
}

impl AllowanceRecord {
    /// Budget still available for automatic approval.
    pub fn remaining(&self) -> i64 {
        self.total_budget - self.used_amount
    }
}
