//! Webhook Settlement Processor
//!
//! The terminal state machine of the order core: reconciles the provider's
//! reported payment outcome into Order, PaymentTransaction and
//! StockReservation state, in one transaction per callback.
//!
//! The input is untrusted, may be redelivered, and may arrive out of order.
//! Every write below is conditional (upsert keyed by order, `active`-only
//! reservation transitions, status writes guarded on the current value), so
//! replaying a terminal callback is a no-op rather than a double-apply.
//!
//! | Reported | txn.status | payment_status | order.status | reservations |
//! |----------|------------|----------------|--------------|--------------|
//! | PAID     | paid       | paid           | unchanged    | confirm      |
//! | EXPIRED  | expired    | expired        | cancelled    | release      |
//! | FAILED   | failed     | failed         | unchanged    | none         |
//! | other    | untouched  | unchanged      | unchanged    | none         |

use sqlx::SqlitePool;

use crate::db::repository::{order, payment};
use crate::stock::ledger;
use crate::utils::{AppError, AppResult};
use shared::models::{
    ActorRole, InvoiceCallback, OrderStatus, PaymentStatus, ReservationStatus,
};
use shared::util::now_millis;

/// Parsed form of the provider's status string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackStatus {
    Paid,
    Expired,
    Failed,
    Unrecognized,
}

impl CallbackStatus {
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("PAID") {
            CallbackStatus::Paid
        } else if raw.eq_ignore_ascii_case("EXPIRED") {
            CallbackStatus::Expired
        } else if raw.eq_ignore_ascii_case("FAILED") {
            CallbackStatus::Failed
        } else {
            CallbackStatus::Unrecognized
        }
    }
}

/// What a callback did, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// The state machine ran (first delivery or idempotent replay).
    Applied,
    /// The referenced order does not exist (yet); acknowledged and skipped.
    OrderMissing,
    /// Unknown status string; logged, nothing touched.
    Unrecognized,
}

/// Reconcile one provider callback. `raw_payload` is the original body,
/// retained on the payment row for audit.
pub async fn process_callback(
    pool: &SqlitePool,
    callback: &InvoiceCallback,
    raw_payload: &str,
) -> AppResult<SettlementOutcome> {
    let status = CallbackStatus::parse(&callback.status);
    if status == CallbackStatus::Unrecognized {
        tracing::warn!(
            external_id = %callback.external_id,
            status = %callback.status,
            "Unrecognized settlement status, ignoring"
        );
        return Ok(SettlementOutcome::Unrecognized);
    }

    let Ok(order_id) = callback.external_id.parse::<i64>() else {
        tracing::warn!(
            external_id = %callback.external_id,
            "Callback external_id is not an order reference"
        );
        return Ok(SettlementOutcome::OrderMissing);
    };

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    // A callback can beat order/invoice persistence; acknowledge and let the
    // provider's redelivery find the order later.
    let Some(current) = order::find_by_id_tx(&mut tx, order_id).await? else {
        tracing::warn!(order_id, "Settlement callback for unknown order, skipping");
        return Ok(SettlementOutcome::OrderMissing);
    };

    match status {
        CallbackStatus::Paid => {
            let paid_amount = callback.paid_amount.unwrap_or(current.total);
            if paid_amount != current.total {
                tracing::warn!(
                    order_id,
                    expected = current.total,
                    reported = paid_amount,
                    "Paid amount differs from order total"
                );
            }
            payment::upsert_from_callback(
                &mut tx,
                order_id,
                current.payment_method,
                PaymentStatus::Paid,
                paid_amount,
                callback.id.as_deref(),
                Some(now_millis()),
                raw_payload,
            )
            .await?;
            order::set_payment_status(&mut tx, order_id, PaymentStatus::Paid).await?;
            let confirmed = ledger::confirm_for_order(&mut tx, order_id).await?;
            tracing::info!(order_id, confirmed, "Settlement: invoice paid");
        }
        CallbackStatus::Expired => {
            // Out-of-order delivery: an expiry report must never undo a
            // settled payment.
            if current.payment_status == PaymentStatus::Paid {
                tracing::warn!(order_id, "EXPIRED callback after PAID settlement, ignoring");
                return Ok(SettlementOutcome::Applied);
            }
            payment::upsert_from_callback(
                &mut tx,
                order_id,
                current.payment_method,
                PaymentStatus::Expired,
                current.total,
                callback.id.as_deref(),
                None,
                raw_payload,
            )
            .await?;
            order::set_payment_status(&mut tx, order_id, PaymentStatus::Expired).await?;
            let released =
                ledger::release_for_order(&mut tx, order_id, ReservationStatus::Released).await?;
            if order::cancel(&mut tx, order_id).await? {
                order::append_history(
                    &mut tx,
                    order_id,
                    current.status,
                    OrderStatus::Cancelled,
                    ActorRole::System,
                    Some("payment invoice expired"),
                )
                .await?;
            }
            tracing::info!(order_id, released, "Settlement: invoice expired");
        }
        CallbackStatus::Failed => {
            payment::upsert_from_callback(
                &mut tx,
                order_id,
                current.payment_method,
                PaymentStatus::Failed,
                current.total,
                callback.id.as_deref(),
                None,
                raw_payload,
            )
            .await?;
            order::set_payment_status(&mut tx, order_id, PaymentStatus::Failed).await?;
            tracing::info!(order_id, "Settlement: payment failed");
        }
        CallbackStatus::Unrecognized => unreachable!("filtered above"),
    }

    tx.commit()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(SettlementOutcome::Applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_statuses_case_insensitively() {
        assert_eq!(CallbackStatus::parse("PAID"), CallbackStatus::Paid);
        assert_eq!(CallbackStatus::parse("paid"), CallbackStatus::Paid);
        assert_eq!(CallbackStatus::parse("EXPIRED"), CallbackStatus::Expired);
        assert_eq!(CallbackStatus::parse("FAILED"), CallbackStatus::Failed);
    }

    #[test]
    fn unknown_statuses_hit_the_unrecognized_branch() {
        assert_eq!(CallbackStatus::parse("SETTLING"), CallbackStatus::Unrecognized);
        assert_eq!(CallbackStatus::parse(""), CallbackStatus::Unrecognized);
        assert_eq!(CallbackStatus::parse("refunded"), CallbackStatus::Unrecognized);
    }
}
