//! Coupon Validator
//!
//! Checks run in order and short-circuit on the first failure: existence →
//! active → not expired → usage left → minimum purchase → membership gates.
//! Discount math is done in `Decimal` and rounded half-up back to integer
//! currency units.
//!
//! Validation never mutates state. The order builder redeems (increments
//! `used_count`, writes the usage row) inside its own transaction.

use rust_decimal::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::SqlitePool;

use crate::db::repository::{coupon, order, user};
use crate::utils::{AppError, AppResult};
use shared::models::{Coupon, DiscountType};
use shared::util::now_millis;

/// A coupon that passed every eligibility check, with the discount it yields
/// for the submitted subtotal.
#[derive(Debug, Clone)]
pub struct CouponAssessment {
    pub coupon: Coupon,
    pub discount: i64,
}

/// Validate `code` against a cart subtotal and (optionally) the buyer.
///
/// Rejections come back as `AppError::InvalidCoupon` carrying the
/// human-readable reason the storefront shows inline.
pub async fn validate_coupon(
    pool: &SqlitePool,
    code: &str,
    buyer_id: Option<i64>,
    subtotal: i64,
) -> AppResult<CouponAssessment> {
    let Some(found) = coupon::find_by_code(pool, code).await? else {
        return Err(AppError::InvalidCoupon("Coupon code not found".into()));
    };

    if !found.is_active {
        return Err(AppError::InvalidCoupon("Coupon is no longer active".into()));
    }
    if found.expires_at <= now_millis() {
        return Err(AppError::InvalidCoupon("Coupon has expired".into()));
    }
    if found.used_count >= found.usage_limit {
        return Err(AppError::InvalidCoupon(
            "Coupon usage limit has been reached".into(),
        ));
    }
    if subtotal < found.min_purchase {
        return Err(AppError::InvalidCoupon(format!(
            "Minimum purchase of {} not met",
            found.min_purchase
        )));
    }

    if found.for_plus_only {
        let is_plus = match buyer_id {
            Some(id) => user::find_by_id(pool, id).await?.is_some_and(|u| u.is_plus_member),
            None => false,
        };
        if !is_plus {
            return Err(AppError::InvalidCoupon(
                "Coupon is for plus members only".into(),
            ));
        }
    }

    if found.for_new_users {
        let is_new = match buyer_id {
            Some(id) => !order::buyer_has_completed_order(pool, id).await?,
            None => false,
        };
        if !is_new {
            return Err(AppError::InvalidCoupon(
                "Coupon is for new customers only".into(),
            ));
        }
    }

    let discount = compute_discount(&found, subtotal);
    Ok(CouponAssessment {
        coupon: found,
        discount,
    })
}

/// Discount for a subtotal, in integer currency units.
///
/// - `percentage`: `subtotal × value / 100`, rounded half-up, capped at
///   `max_discount` when set and never more than the subtotal itself.
/// - `fixed`: flat `value`, never more than the subtotal.
pub fn compute_discount(coupon: &Coupon, subtotal: i64) -> i64 {
    match coupon.discount_type {
        DiscountType::Percentage => {
            let raw = Decimal::from(subtotal) * Decimal::from(coupon.discount_value)
                / Decimal::ONE_HUNDRED;
            let rounded = raw
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_i64()
                .unwrap_or(0);
            let capped = match coupon.max_discount {
                Some(cap) => rounded.min(cap),
                None => rounded,
            };
            capped.min(subtotal)
        }
        DiscountType::Fixed => coupon.discount_value.min(subtotal),
    }
}
