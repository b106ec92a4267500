//! Shipping fee policy
//!
//! Rate computation is an external concern (carrier contracts, zones); the
//! order builder only needs a quote. The default implementation is a flat
//! fee configured by environment.

pub trait ShippingRatePolicy: Send + Sync {
    /// Fee in integer currency units for a cart of `subtotal` shipped from
    /// `store_id`.
    fn quote(&self, store_id: i64, subtotal: i64) -> i64;
}

/// Flat fee per order, regardless of store or cart size.
pub struct FlatRateShipping {
    fee: i64,
}

impl FlatRateShipping {
    pub fn new(fee: i64) -> Self {
        Self { fee }
    }
}

impl ShippingRatePolicy for FlatRateShipping {
    fn quote(&self, _store_id: i64, _subtotal: i64) -> i64 {
        self.fee
    }
}
