//! Promotional coupons and their usage trail

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

/// Discount definition. Codes compare case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Coupon {
    pub id: i64,
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    /// Percent (0-100) for `percentage`, flat amount for `fixed`.
    pub discount_value: i64,
    pub min_purchase: i64,
    /// Cap for percentage discounts; NULL means uncapped.
    pub max_discount: Option<i64>,
    pub usage_limit: i64,
    pub used_count: i64,
    pub for_plus_only: bool,
    pub for_new_users: bool,
    pub expires_at: i64,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// One consumed use of a coupon, tied to exactly one order.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CouponUsage {
    pub id: i64,
    pub coupon_id: i64,
    pub order_id: i64,
    pub user_id: i64,
    pub discount_applied: i64,
    pub created_at: i64,
}

// =============================================================================
// API Request / Response Types
// =============================================================================

/// Coupon verification payload (`POST /api/coupons/verify`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyCouponRequest {
    pub code: String,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub cart_total: i64,
}

/// Successful verification response body.
#[derive(Debug, Clone, Serialize)]
pub struct ValidatedCoupon {
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    /// Computed amount for the submitted cart total.
    pub discount_amount: i64,
}
