//! Expired-reservation sweeper
//!
//! Safety net for provider outages: if an invoice order never receives a
//! terminating webhook, its holds would pin stock forever. The sweeper
//! periodically expires `active` reservations past `expires_at`, returns
//! their quantity to the pool and cancels the still-unpaid order.
//!
//! Started from `ServerState::start_background_tasks()`.

use std::collections::BTreeMap;
use std::time::Duration;

use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;

use crate::db::repository::{RepoResult, order, reservation};
use crate::stock::ledger;
use shared::models::{ActorRole, OrderStatus, PaymentStatus, ReservationStatus};
use shared::util::now_millis;

/// Per-pass cap on rows fetched; a huge backlog drains over several ticks
/// instead of one long transaction burst.
const SWEEP_BATCH: i64 = 500;

pub struct ReservationSweeper {
    pool: SqlitePool,
    interval: Duration,
    shutdown: CancellationToken,
}

impl ReservationSweeper {
    pub fn new(pool: SqlitePool, interval_secs: u64, shutdown: CancellationToken) -> Self {
        Self {
            pool,
            interval: Duration::from_secs(interval_secs),
            shutdown,
        }
    }

    /// Main loop: tick → sweep → repeat until shutdown.
    pub async fn run(self) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Reservation sweeper started"
        );
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Reservation sweeper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    match sweep_once(&self.pool).await {
                        Ok(0) => {}
                        Ok(n) => tracing::info!(released = n, "Swept expired stock reservations"),
                        Err(e) => tracing::error!(error = %e, "Reservation sweep failed"),
                    }
                }
            }
        }
    }
}

/// One sweep pass. Public so tests can drive it without the timer.
///
/// Each affected order is handled in its own transaction; a failure on one
/// order does not block the rest of the batch.
pub async fn sweep_once(pool: &SqlitePool) -> RepoResult<usize> {
    let now = now_millis();
    let overdue = reservation::find_expired_active(pool, now, SWEEP_BATCH).await?;
    if overdue.is_empty() {
        return Ok(0);
    }

    let mut by_order: BTreeMap<i64, usize> = BTreeMap::new();
    for held in &overdue {
        *by_order.entry(held.order_id).or_default() += 1;
    }

    let mut total_released = 0;
    for (&order_id, _) in &by_order {
        match sweep_order(pool, order_id).await {
            Ok(n) => total_released += n,
            Err(e) => {
                tracing::error!(order_id, error = %e, "Failed to sweep order reservations");
            }
        }
    }
    Ok(total_released)
}

async fn sweep_order(pool: &SqlitePool, order_id: i64) -> RepoResult<usize> {
    let mut tx = pool.begin().await?;

    let released = ledger::release_for_order(&mut tx, order_id, ReservationStatus::Expired).await?;

    // Cancel the owning order if it is still waiting for a payment that will
    // never settle. Paid or already-terminal orders keep their status.
    if let Some(current) = order::find_by_id_tx(&mut tx, order_id).await? {
        if current.payment_status == PaymentStatus::Pending
            && order::cancel(&mut tx, order_id).await?
        {
            order::append_history(
                &mut tx,
                order_id,
                current.status,
                OrderStatus::Cancelled,
                ActorRole::System,
                Some("stock reservation expired without settlement"),
            )
            .await?;
        }
    }

    tx.commit().await?;
    Ok(released)
}
