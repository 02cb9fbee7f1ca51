//! Allowance CRUD and the guarded debit.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::{Result, StoreError};
use crate::models::AllowanceRecord;

/// Get the allowance for a host, if one exists.
pub async fn get(pool: &SqlitePool, host: &str) -> Result<Option<AllowanceRecord>> {
    let record = sqlx::query_as::<_, AllowanceRecord>(
        r#"
        SELECT host, name, icon, total_budget, used_amount, remembered, updated_at
        FROM allowances
        WHERE host = ?
        "#,
    )
    .bind(host)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Create or overwrite the allowance for a host.
///
/// Re-remembering an origin resets the budget window: `used_amount`
/// drops back to zero and the new budget replaces the old one.
pub async fn create(
    pool: &SqlitePool,
    host: &str,
    total_budget: i64,
    name: &str,
    icon: &str,
) -> Result<()> {
    if total_budget < 0 {
        return Err(StoreError::InvalidAmount(total_budget));
    }

    sqlx::query(
        r#"
        INSERT INTO allowances (host, name, icon, total_budget, used_amount, remembered)
        VALUES (?, ?, ?, ?, 0, 1)
        ON CONFLICT(host) DO UPDATE SET
            name = excluded.name,
            icon = excluded.icon,
            total_budget = excluded.total_budget,
            used_amount = 0,
            remembered = 1,
            updated_at = datetime('now')
        "#,
    )
    .bind(host)
    .bind(name)
    .bind(icon)
    .bind(total_budget)
    .execute(pool)
    .await?;

    info!("allowance for {} set to {} sats", host, total_budget);
    Ok(())
}

/// Debit a payment against a host's allowance.
///
/// The check and increment happen in a single guarded UPDATE, so two
/// racing debits that individually fit but jointly exceed the budget can
/// never both pass. On failure the record is left unchanged and the
/// error distinguishes an exhausted budget from a missing record.
pub async fn debit(pool: &SqlitePool, host: &str, amount: i64) -> Result<()> {
    if amount <= 0 {
        return Err(StoreError::InvalidAmount(amount));
    }

    let result = sqlx::query(
        r#"
        UPDATE allowances
        SET used_amount = used_amount + ?,
            updated_at = datetime('now')
        WHERE host = ? AND used_amount + ? <= total_budget
        "#,
    )
    .bind(amount)
    .bind(host)
    .bind(amount)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return match get(pool, host).await? {
            Some(record) => Err(StoreError::BudgetExceeded {
                host: host.to_string(),
                requested: amount,
                remaining: record.remaining(),
            }),
            None => Err(StoreError::NotFound {
                host: host.to_string(),
            }),
        };
    }

    info!("debited {} sats from allowance for {}", amount, host);
    Ok(())
}

/// List every stored allowance, most recently updated first.
pub async fn list(pool: &SqlitePool) -> Result<Vec<AllowanceRecord>> {
    let records = sqlx::query_as::<_, AllowanceRecord>(
        r#"
        SELECT host, name, icon, total_budget, used_amount, remembered, updated_at
        FROM allowances
        ORDER BY updated_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(records)
}

/// Remove the allowance for a host.
///
/// This is a user-initiated management action; nothing in the payment
/// flow deletes allowances implicitly.
pub async fn forget(pool: &SqlitePool, host: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM allowances
        WHERE host = ?
        "#,
    )
    .bind(host)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound {
            host: host.to_string(),
        });
    }

    Ok(())
}
