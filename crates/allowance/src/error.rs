//! Allowance store error types.

use thiserror::Error;

/// Errors that can occur during allowance store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLx error (connection, query, etc.)
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// No allowance exists for the host.
    #[error("no allowance for host: {host}")]
    NotFound {
        /// Host the lookup was keyed on.
        host: String,
    },

    /// A debit would push usage past the budget. The record is left
    /// unchanged.
    #[error("budget exceeded for {host}: requested {requested} sats, {remaining} remaining")]
    BudgetExceeded {
        /// Host whose allowance was debited.
        host: String,
        /// Amount the debit asked for, in satoshis.
        requested: i64,
        /// Budget still available, in satoshis.
        remaining: i64,
    },

    /// Amounts must be positive.
    #[error("invalid amount: {0}")]
    InvalidAmount(i64),
}

/// Result type for allowance store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
