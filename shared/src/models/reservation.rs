//! Stock reservations: tentative holds against unconfirmed orders

use serde::{Deserialize, Serialize};

/// Reservation lifecycle. Exactly one terminal transition per reservation:
/// `active → confirmed` (payment settled) or `active → released | expired`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ReservationStatus {
    Active,
    Confirmed,
    Released,
    Expired,
}

/// A tentative hold of N units of a product against one order line.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StockReservation {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub status: ReservationStatus,
    pub reserved_at: i64,
    /// After this instant the sweeper may expire an `active` hold.
    pub expires_at: i64,
}
