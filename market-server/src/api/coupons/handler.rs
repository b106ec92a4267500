//! Coupon API Handlers

use axum::{Json, extract::State};
use serde::Serialize;

use crate::coupons::validator;
use crate::core::ServerState;
use crate::utils::{AppError, AppResult};
use shared::models::{ValidatedCoupon, VerifyCouponRequest};

#[derive(Serialize)]
pub struct VerifyCouponResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon: Option<ValidatedCoupon>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /api/coupons/verify - eligibility check plus discount for a cart
///
/// Rejections are part of the contract (`valid: false` with the reason),
/// not HTTP errors; only infrastructure failures surface as 5xx.
pub async fn verify(
    State(state): State<ServerState>,
    Json(payload): Json<VerifyCouponRequest>,
) -> AppResult<Json<VerifyCouponResponse>> {
    match validator::validate_coupon(
        state.pool(),
        &payload.code,
        payload.user_id,
        payload.cart_total,
    )
    .await
    {
        Ok(assessment) => Ok(Json(VerifyCouponResponse {
            valid: true,
            coupon: Some(ValidatedCoupon {
                code: assessment.coupon.code.clone(),
                description: assessment.coupon.description.clone(),
                discount_type: assessment.coupon.discount_type,
                discount_value: assessment.coupon.discount_value,
                discount_amount: assessment.discount,
            }),
            error: None,
        })),
        Err(AppError::InvalidCoupon(reason)) => Ok(Json(VerifyCouponResponse {
            valid: false,
            coupon: None,
            error: Some(reason),
        })),
        Err(other) => Err(other),
    }
}
