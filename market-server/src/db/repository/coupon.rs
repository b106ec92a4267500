//! Coupon Repository
//!
//! The `code` column is COLLATE NOCASE, so equality lookups are
//! case-insensitive at the storage layer.

use super::{RepoResult, Tx};
use shared::models::{Coupon, CouponUsage};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

const COUPON_SELECT: &str = "SELECT id, code, description, discount_type, discount_value, min_purchase, max_discount, usage_limit, used_count, for_plus_only, for_new_users, expires_at, is_active, created_at, updated_at FROM coupons";

pub async fn find_by_code(pool: &SqlitePool, code: &str) -> RepoResult<Option<Coupon>> {
    let sql = format!("{COUPON_SELECT} WHERE code = ?");
    let row = sqlx::query_as::<_, Coupon>(&sql)
        .bind(code)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn insert(pool: &SqlitePool, coupon: &Coupon) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO coupons (id, code, description, discount_type, discount_value, min_purchase, max_discount, usage_limit, used_count, for_plus_only, for_new_users, expires_at, is_active, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
    )
    .bind(coupon.id)
    .bind(&coupon.code)
    .bind(&coupon.description)
    .bind(coupon.discount_type)
    .bind(coupon.discount_value)
    .bind(coupon.min_purchase)
    .bind(coupon.max_discount)
    .bind(coupon.usage_limit)
    .bind(coupon.used_count)
    .bind(coupon.for_plus_only)
    .bind(coupon.for_new_users)
    .bind(coupon.expires_at)
    .bind(coupon.is_active)
    .bind(coupon.created_at)
    .bind(coupon.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Consume one use of the coupon for an order, inside the order-creation
/// transaction. The conditional increment is the second guard against
/// concurrent exhaustion (the validator already checked, but two checkouts
/// may have validated the same last use). Returns `false` when the limit
/// was hit in the meantime; the caller rolls the order back.
pub async fn redeem(
    tx: &mut Tx<'_>,
    coupon_id: i64,
    order_id: i64,
    user_id: i64,
    discount_applied: i64,
) -> RepoResult<bool> {
    let now = now_millis();
    let rows = sqlx::query(
        "UPDATE coupons SET used_count = used_count + 1, updated_at = ?1 WHERE id = ?2 AND used_count < usage_limit",
    )
    .bind(now)
    .bind(coupon_id)
    .execute(&mut **tx)
    .await?;
    if rows.rows_affected() == 0 {
        return Ok(false);
    }

    sqlx::query(
        "INSERT INTO coupon_usages (id, coupon_id, order_id, user_id, discount_applied, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(snowflake_id())
    .bind(coupon_id)
    .bind(order_id)
    .bind(user_id)
    .bind(discount_applied)
    .bind(now)
    .execute(&mut **tx)
    .await?;
    Ok(true)
}

pub async fn find_usage_by_order(
    pool: &SqlitePool,
    order_id: i64,
) -> RepoResult<Option<CouponUsage>> {
    let row = sqlx::query_as::<_, CouponUsage>(
        "SELECT id, coupon_id, order_id, user_id, discount_applied, created_at FROM coupon_usages WHERE order_id = ?",
    )
    .bind(order_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}
