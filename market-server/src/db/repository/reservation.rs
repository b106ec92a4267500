//! Stock Reservation Repository

use super::{RepoResult, Tx};
use shared::models::{ReservationStatus, StockReservation};
use sqlx::SqlitePool;

const RESERVATION_SELECT: &str = "SELECT id, order_id, product_id, quantity, status, reserved_at, expires_at FROM stock_reservations";

pub async fn insert(tx: &mut Tx<'_>, reservation: &StockReservation) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO stock_reservations (id, order_id, product_id, quantity, status, reserved_at, expires_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(reservation.id)
    .bind(reservation.order_id)
    .bind(reservation.product_id)
    .bind(reservation.quantity)
    .bind(reservation.status)
    .bind(reservation.reserved_at)
    .bind(reservation.expires_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn find_by_order(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<StockReservation>> {
    let sql = format!("{RESERVATION_SELECT} WHERE order_id = ? ORDER BY id");
    let rows = sqlx::query_as::<_, StockReservation>(&sql)
        .bind(order_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Active holds of one order, read inside the settlement transaction.
pub async fn find_active_by_order(
    tx: &mut Tx<'_>,
    order_id: i64,
) -> RepoResult<Vec<StockReservation>> {
    let sql = format!("{RESERVATION_SELECT} WHERE order_id = ? AND status = 'active' ORDER BY id");
    let rows = sqlx::query_as::<_, StockReservation>(&sql)
        .bind(order_id)
        .fetch_all(&mut **tx)
        .await?;
    Ok(rows)
}

/// Move one `active` reservation to a terminal status. Returns `false` when
/// the row was already terminal, which makes replayed settlements no-ops.
pub async fn mark_terminal(
    tx: &mut Tx<'_>,
    reservation_id: i64,
    to_status: ReservationStatus,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE stock_reservations SET status = ?1 WHERE id = ?2 AND status = 'active'",
    )
    .bind(to_status)
    .bind(reservation_id)
    .execute(&mut **tx)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Active reservations whose expiry instant has passed (sweeper input).
pub async fn find_expired_active(
    pool: &SqlitePool,
    now: i64,
    limit: i64,
) -> RepoResult<Vec<StockReservation>> {
    let sql = format!(
        "{RESERVATION_SELECT} WHERE status = 'active' AND expires_at < ? ORDER BY expires_at LIMIT ?"
    );
    let rows = sqlx::query_as::<_, StockReservation>(&sql)
        .bind(now)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}
