//! Payment settlement records and the provider callback wire type

use serde::{Deserialize, Serialize};

use super::order::{PaymentMethod, PaymentStatus};

/// Financial settlement record for an order. At most one row per order;
/// the webhook processor upserts keyed by `order_id`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaymentTransaction {
    pub id: i64,
    pub order_id: i64,
    pub method: PaymentMethod,
    /// Provider invoice reference (mirrors `orders.invoice_id`).
    pub invoice_id: Option<String>,
    /// Provider-side payment identifier reported by the callback.
    pub provider_payment_id: Option<String>,
    pub amount: i64,
    pub status: PaymentStatus,
    pub paid_at: Option<i64>,
    /// Raw provider payload, retained verbatim for audit and debugging.
    pub raw_payload: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Typed form of the provider's invoice callback body.
///
/// The webhook boundary parses the untrusted JSON into this before anything
/// enters the settlement state machine; unknown fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceCallback {
    /// Our order id, echoed back from invoice creation.
    pub external_id: String,
    /// Provider-reported status string (`PAID`, `EXPIRED`, `FAILED`, ...).
    pub status: String,
    #[serde(default)]
    pub paid_amount: Option<i64>,
    #[serde(default)]
    pub payment_method: Option<String>,
    /// Provider-side payment/invoice identifier.
    #[serde(default)]
    pub id: Option<String>,
}
