//! Product stock slice owned by the order core

use serde::{Deserialize, Serialize};

/// The inventory view of a product.
///
/// Available stock is `stock_on_hand - stock_reserved`; the pair is only
/// ever mutated by single conditional UPDATE statements so the invariant
/// `stock_on_hand - stock_reserved >= 0` holds under concurrent checkouts.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub store_id: i64,
    pub name: String,
    pub price: i64,
    pub stock_on_hand: i64,
    pub stock_reserved: i64,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Product {
    pub fn available_stock(&self) -> i64 {
        self.stock_on_hand - self.stock_reserved
    }
}
