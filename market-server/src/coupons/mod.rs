//! Coupon subsystem
//!
//! Eligibility validation and discount computation. Redemption (consuming a
//! use) belongs to the order builder's transaction, not to this module.

pub mod validator;

pub use validator::{CouponAssessment, compute_discount, validate_coupon};
