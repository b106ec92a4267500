//! Stock Reservation Ledger
//!
//! Tentative holds of product stock tied to orders. Every entry point takes
//! the caller's transaction: a reservation row and its product counter always
//! move together or not at all.
//!
//! The availability check and the counter increment are a single conditional
//! UPDATE (`stock_on_hand - stock_reserved >= qty`), so two checkouts racing
//! for the last units serialize on the row and the loser sees short stock.

use crate::db::repository::{RepoError, RepoResult, Tx, product, reservation};
use crate::utils::AppError;
use shared::models::{ReservationStatus, StockReservation};
use shared::util::{now_millis, snowflake_id};

/// Place an `active` hold of `quantity` units against `order_id`.
///
/// Fails with `InsufficientStock` when the available pool is short; in that
/// case no reservation row exists and no counter moved.
pub async fn reserve(
    tx: &mut Tx<'_>,
    product_id: i64,
    order_id: i64,
    quantity: i64,
    ttl_millis: i64,
) -> Result<StockReservation, AppError> {
    let grew = product::try_grow_reserved(tx, product_id, quantity)
        .await
        .map_err(AppError::from)?;

    if !grew {
        // Distinguish short stock from a bad reference for the error message.
        let product = product::find_by_id_tx(tx, product_id)
            .await
            .map_err(AppError::from)?;
        return Err(match product {
            None => AppError::NotFound(format!("Product {product_id} not found")),
            Some(p) if !p.is_active => {
                AppError::Validation(format!("Product '{}' is no longer available", p.name))
            }
            Some(p) => AppError::InsufficientStock(format!(
                "insufficient stock for '{}': requested {quantity}, available {}",
                p.name,
                p.available_stock()
            )),
        });
    }

    let now = now_millis();
    let held = StockReservation {
        id: snowflake_id(),
        order_id,
        product_id,
        quantity,
        status: ReservationStatus::Active,
        reserved_at: now,
        expires_at: now + ttl_millis,
    };
    reservation::insert(tx, &held).await.map_err(AppError::from)?;
    Ok(held)
}

/// Confirm every `active` hold of an order: the reservation becomes
/// `confirmed` and the product's physical stock is decremented for good.
///
/// Idempotent: already-terminal reservations are skipped, so a replayed
/// PAID settlement cannot double-decrement stock. Returns the number of
/// reservations confirmed by this call.
pub async fn confirm_for_order(tx: &mut Tx<'_>, order_id: i64) -> RepoResult<usize> {
    let active = reservation::find_active_by_order(tx, order_id).await?;
    let mut confirmed = 0;
    for held in active {
        if !reservation::mark_terminal(tx, held.id, ReservationStatus::Confirmed).await? {
            continue;
        }
        if !product::commit_reserved(tx, held.product_id, held.quantity).await? {
            // The counter no longer covers a hold we just confirmed; abort
            // the transaction rather than persist drifted stock.
            return Err(RepoError::Database(format!(
                "stock counter drift for product {} (reservation {})",
                held.product_id, held.id
            )));
        }
        confirmed += 1;
    }
    Ok(confirmed)
}

/// Release every `active` hold of an order back into the available pool.
///
/// `to_status` is `Released` for settlement failures/expiries and `Expired`
/// when the sweeper times a hold out. No-op on terminal rows. Returns the
/// number of reservations released by this call.
pub async fn release_for_order(
    tx: &mut Tx<'_>,
    order_id: i64,
    to_status: ReservationStatus,
) -> RepoResult<usize> {
    let active = reservation::find_active_by_order(tx, order_id).await?;
    let mut released = 0;
    for held in active {
        if !reservation::mark_terminal(tx, held.id, to_status).await? {
            continue;
        }
        if !product::return_reserved(tx, held.product_id, held.quantity).await? {
            return Err(RepoError::Database(format!(
                "stock counter drift for product {} (reservation {})",
                held.product_id, held.id
            )));
        }
        released += 1;
    }
    Ok(released)
}
