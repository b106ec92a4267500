//! Product Repository
//!
//! The stock counter pair (stock_on_hand, stock_reserved) is only ever
//! mutated through the conditional single-statement UPDATEs below, which is
//! what keeps concurrent checkouts from overselling.

use super::{RepoResult, Tx};
use shared::models::Product;
use shared::util::now_millis;
use sqlx::SqlitePool;

const PRODUCT_SELECT: &str = "SELECT id, store_id, name, price, stock_on_hand, stock_reserved, is_active, created_at, updated_at FROM products";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Product>> {
    let sql = format!("{PRODUCT_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_id_tx(tx: &mut Tx<'_>, id: i64) -> RepoResult<Option<Product>> {
    let sql = format!("{PRODUCT_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(row)
}

pub async fn insert(pool: &SqlitePool, product: &Product) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO products (id, store_id, name, price, stock_on_hand, stock_reserved, is_active, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )
    .bind(product.id)
    .bind(product.store_id)
    .bind(&product.name)
    .bind(product.price)
    .bind(product.stock_on_hand)
    .bind(product.stock_reserved)
    .bind(product.is_active)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Atomically grow the reserved counter by `quantity` if enough unreserved
/// stock is available. Returns `false` when the conditional UPDATE matched
/// no row (short stock, unknown or inactive product).
pub async fn try_grow_reserved(
    tx: &mut Tx<'_>,
    product_id: i64,
    quantity: i64,
) -> RepoResult<bool> {
    let now = now_millis();
    let rows = sqlx::query(
        "UPDATE products SET stock_reserved = stock_reserved + ?1, updated_at = ?2 WHERE id = ?3 AND is_active = 1 AND stock_on_hand - stock_reserved >= ?1",
    )
    .bind(quantity)
    .bind(now)
    .bind(product_id)
    .execute(&mut **tx)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Permanently commit a confirmed hold: the units leave both the physical
/// counter and the reserved counter in one statement.
pub async fn commit_reserved(tx: &mut Tx<'_>, product_id: i64, quantity: i64) -> RepoResult<bool> {
    let now = now_millis();
    let rows = sqlx::query(
        "UPDATE products SET stock_on_hand = stock_on_hand - ?1, stock_reserved = stock_reserved - ?1, updated_at = ?2 WHERE id = ?3 AND stock_reserved >= ?1",
    )
    .bind(quantity)
    .bind(now)
    .bind(product_id)
    .execute(&mut **tx)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Return a released hold to the available pool.
pub async fn return_reserved(tx: &mut Tx<'_>, product_id: i64, quantity: i64) -> RepoResult<bool> {
    let now = now_millis();
    let rows = sqlx::query(
        "UPDATE products SET stock_reserved = stock_reserved - ?1, updated_at = ?2 WHERE id = ?3 AND stock_reserved >= ?1",
    )
    .bind(quantity)
    .bind(now)
    .bind(product_id)
    .execute(&mut **tx)
    .await?;
    Ok(rows.rows_affected() > 0)
}
