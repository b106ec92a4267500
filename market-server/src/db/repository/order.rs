//! Order Repository
//!
//! Orders, line items and the append-only status history trail.

use super::{RepoError, RepoResult, Tx};
use shared::models::{
    ActorRole, Order, OrderItem, OrderStatus, OrderStatusHistoryEntry, PaymentStatus,
};
use shared::util::now_millis;
use sqlx::SqlitePool;

const ORDER_SELECT: &str = "SELECT id, order_number, buyer_id, store_id, subtotal, shipping_fee, discount, total, status, payment_status, payment_method, shipping_address_id, coupon_code, invoice_id, invoice_url, payment_deadline, created_at, updated_at FROM orders";

const ITEM_SELECT: &str = "SELECT id, order_id, product_id, product_name, quantity, unit_price, line_total FROM order_items";

pub async fn insert(tx: &mut Tx<'_>, order: &Order) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO orders (id, order_number, buyer_id, store_id, subtotal, shipping_fee, discount, total, status, payment_status, payment_method, shipping_address_id, coupon_code, invoice_id, invoice_url, payment_deadline, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
    )
    .bind(order.id)
    .bind(&order.order_number)
    .bind(order.buyer_id)
    .bind(order.store_id)
    .bind(order.subtotal)
    .bind(order.shipping_fee)
    .bind(order.discount)
    .bind(order.total)
    .bind(order.status)
    .bind(order.payment_status)
    .bind(order.payment_method)
    .bind(order.shipping_address_id)
    .bind(&order.coupon_code)
    .bind(&order.invoice_id)
    .bind(&order.invoice_url)
    .bind(order.payment_deadline)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn insert_item(tx: &mut Tx<'_>, item: &OrderItem) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO order_items (id, order_id, product_id, product_name, quantity, unit_price, line_total) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(item.id)
    .bind(item.order_id)
    .bind(item.product_id)
    .bind(&item.product_name)
    .bind(item.quantity)
    .bind(item.unit_price)
    .bind(item.line_total)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Order>> {
    let sql = format!("{ORDER_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_id_tx(tx: &mut Tx<'_>, id: i64) -> RepoResult<Option<Order>> {
    let sql = format!("{ORDER_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(row)
}

pub async fn list_by_buyer(pool: &SqlitePool, buyer_id: i64) -> RepoResult<Vec<Order>> {
    let sql = format!("{ORDER_SELECT} WHERE buyer_id = ? ORDER BY created_at DESC");
    let rows = sqlx::query_as::<_, Order>(&sql)
        .bind(buyer_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn find_items(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<OrderItem>> {
    let sql = format!("{ITEM_SELECT} WHERE order_id = ? ORDER BY id");
    let rows = sqlx::query_as::<_, OrderItem>(&sql)
        .bind(order_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Persist the provider invoice reference and payment deadline, guarded so a
/// concurrent double-issue can never overwrite an existing reference.
pub async fn set_invoice_fields(
    tx: &mut Tx<'_>,
    order_id: i64,
    invoice_id: &str,
    invoice_url: &str,
    payment_deadline: i64,
) -> RepoResult<bool> {
    let now = now_millis();
    let rows = sqlx::query(
        "UPDATE orders SET invoice_id = ?1, invoice_url = ?2, payment_deadline = ?3, updated_at = ?4 WHERE id = ?5 AND invoice_id IS NULL",
    )
    .bind(invoice_id)
    .bind(invoice_url)
    .bind(payment_deadline)
    .bind(now)
    .bind(order_id)
    .execute(&mut **tx)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Flip the payment axis. Conditional on the current value so replayed
/// webhooks change nothing and report `false`.
pub async fn set_payment_status(
    tx: &mut Tx<'_>,
    order_id: i64,
    status: PaymentStatus,
) -> RepoResult<bool> {
    let now = now_millis();
    let rows = sqlx::query(
        "UPDATE orders SET payment_status = ?1, updated_at = ?2 WHERE id = ?3 AND payment_status != ?1",
    )
    .bind(status)
    .bind(now)
    .bind(order_id)
    .execute(&mut **tx)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Cancel an order unless it already reached a terminal status.
pub async fn cancel(tx: &mut Tx<'_>, order_id: i64) -> RepoResult<bool> {
    let now = now_millis();
    let rows = sqlx::query(
        "UPDATE orders SET status = 'cancelled', updated_at = ?1 WHERE id = ?2 AND status NOT IN ('completed', 'cancelled', 'refunded')",
    )
    .bind(now)
    .bind(order_id)
    .execute(&mut **tx)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Append one row to the status history trail. The table is append-only;
/// nothing in the codebase updates or deletes from it.
pub async fn append_history(
    tx: &mut Tx<'_>,
    order_id: i64,
    old_status: OrderStatus,
    new_status: OrderStatus,
    changed_by_role: ActorRole,
    note: Option<&str>,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO order_status_history (id, order_id, old_status, new_status, changed_by_role, note, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(shared::util::snowflake_id())
    .bind(order_id)
    .bind(old_status)
    .bind(new_status)
    .bind(changed_by_role)
    .bind(note)
    .bind(now_millis())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn find_history(
    pool: &SqlitePool,
    order_id: i64,
) -> RepoResult<Vec<OrderStatusHistoryEntry>> {
    let rows = sqlx::query_as::<_, OrderStatusHistoryEntry>(
        "SELECT id, order_id, old_status, new_status, changed_by_role, note, created_at FROM order_status_history WHERE order_id = ? ORDER BY created_at, id",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Whether the buyer has any completed order (the "new user" coupon check).
pub async fn buyer_has_completed_order(pool: &SqlitePool, buyer_id: i64) -> RepoResult<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM orders WHERE buyer_id = ? AND status = 'completed'",
    )
    .bind(buyer_id)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

/// Load an order or fail with `NotFound`.
pub async fn get(pool: &SqlitePool, id: i64) -> RepoResult<Order> {
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Order {id} not found")))
}
