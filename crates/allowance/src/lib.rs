//! SQLite persistence for per-origin spending allowances.
//!
//! An allowance is a pre-authorized budget a wallet holder grants to one
//! origin at confirmation time; payments from that origin then bypass
//! interactive confirmation until the budget is exhausted. This crate
//! owns the budget invariant: for every record,
//! `0 <= used_amount <= total_budget` holds at every observable instant,
//! and concurrent debits against the same host serialize through a
//! single guarded UPDATE.
//!
//! # Example
//!
//! ```no_run
//! use allowance::{store, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("sqlite:allowances.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     store::create(db.pool(), "podcast.example", 10_000, "Example Podcast", "icon.png").await?;
//!     store::debit(db.pool(), "podcast.example", 1_000).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod models;
pub mod store;

pub use error::{Result, StoreError};
pub use models::AllowanceRecord;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 5;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    ///
    /// In-memory databases should use a pool size of 1 so every task sees
    /// the same database.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!("Connected to allowance database: {} (pool size: {})", url, pool_size);

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema
    /// is up to date.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
