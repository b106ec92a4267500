//! Minimal buyer profile slice
//!
//! Authentication lives elsewhere; the order core only needs payer contact
//! info for invoices and the membership flags the coupon checks read.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub is_plus_member: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ShippingAddress {
    pub id: i64,
    pub user_id: i64,
    pub recipient: String,
    pub phone: String,
    pub line1: String,
    pub city: String,
    pub created_at: i64,
}
