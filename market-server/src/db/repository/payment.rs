//! Payment Transaction Repository
//!
//! One settlement row per order. order_id carries a UNIQUE index, so the
//! webhook's insert-or-update is a real upsert and redelivered callbacks
//! can never produce a second row.

use super::{RepoResult, Tx};
use shared::models::{PaymentMethod, PaymentStatus, PaymentTransaction};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

const PAYMENT_SELECT: &str = "SELECT id, order_id, method, invoice_id, provider_payment_id, amount, status, paid_at, raw_payload, created_at, updated_at FROM payment_transactions";

/// Insert the initial `pending` row when an invoice is issued. A repeat call
/// for the same order is a no-op (`ON CONFLICT DO NOTHING`).
pub async fn insert_pending(
    tx: &mut Tx<'_>,
    order_id: i64,
    method: PaymentMethod,
    invoice_id: &str,
    amount: i64,
) -> RepoResult<()> {
    let now = now_millis();
    sqlx::query(
        "INSERT INTO payment_transactions (id, order_id, method, invoice_id, amount, status, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, 'pending', ?6, ?6) ON CONFLICT(order_id) DO NOTHING",
    )
    .bind(snowflake_id())
    .bind(order_id)
    .bind(method)
    .bind(invoice_id)
    .bind(amount)
    .bind(now)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Reconcile a provider callback into the settlement row: insert when the
/// callback beat invoice persistence, update in place otherwise.
#[allow(clippy::too_many_arguments)]
pub async fn upsert_from_callback(
    tx: &mut Tx<'_>,
    order_id: i64,
    method: PaymentMethod,
    status: PaymentStatus,
    amount: i64,
    provider_payment_id: Option<&str>,
    paid_at: Option<i64>,
    raw_payload: &str,
) -> RepoResult<()> {
    let now = now_millis();
    sqlx::query(
        "INSERT INTO payment_transactions (id, order_id, method, amount, status, provider_payment_id, paid_at, raw_payload, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9) \
         ON CONFLICT(order_id) DO UPDATE SET \
             status = excluded.status, \
             provider_payment_id = excluded.provider_payment_id, \
             paid_at = excluded.paid_at, \
             raw_payload = excluded.raw_payload, \
             updated_at = excluded.updated_at",
    )
    .bind(snowflake_id())
    .bind(order_id)
    .bind(method)
    .bind(amount)
    .bind(status)
    .bind(provider_payment_id)
    .bind(paid_at)
    .bind(raw_payload)
    .bind(now)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn find_by_order(
    pool: &SqlitePool,
    order_id: i64,
) -> RepoResult<Option<PaymentTransaction>> {
    let sql = format!("{PAYMENT_SELECT} WHERE order_id = ?");
    let row = sqlx::query_as::<_, PaymentTransaction>(&sql)
        .bind(order_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Row count for an order; settlement tests assert this stays at one.
pub async fn count_for_order(pool: &SqlitePool, order_id: i64) -> RepoResult<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM payment_transactions WHERE order_id = ?")
            .bind(order_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}
