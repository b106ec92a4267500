//! Input validation helpers
//!
//! Centralized limits and validation functions for checkout payloads.
//! SQLite TEXT has no built-in length enforcement, so limits are applied
//! here before anything reaches a repository.

use crate::utils::AppError;

// ── Limits ──────────────────────────────────────────────────────────

/// Maximum distinct lines in one cart.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity per cart line.
pub const MAX_LINE_QUANTITY: i64 = 9_999;

/// Coupon codes: short identifiers.
pub const MAX_COUPON_CODE_LEN: usize = 64;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::Validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate a positive resource reference (ids are snowflake i64 > 0).
pub fn validate_id(value: i64, field: &str) -> Result<(), AppError> {
    if value <= 0 {
        return Err(AppError::Validation(format!("{field} must be a valid id")));
    }
    Ok(())
}

/// Validate a cart line quantity.
pub fn validate_quantity(quantity: i64, field: &str) -> Result<(), AppError> {
    if quantity <= 0 {
        return Err(AppError::Validation(format!(
            "{field} must be positive, got {quantity}"
        )));
    }
    if quantity > MAX_LINE_QUANTITY {
        return Err(AppError::Validation(format!(
            "{field} exceeds maximum allowed ({MAX_LINE_QUANTITY}), got {quantity}"
        )));
    }
    Ok(())
}
