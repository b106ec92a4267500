//! Order, order items and the status history trail

use serde::{Deserialize, Serialize};

/// Fulfilment axis of an order.
///
/// Orthogonal to [`PaymentStatus`]: a `pending` order may already be paid
/// (awaiting seller action) or still unpaid (awaiting buyer payment).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Completed,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }
}

/// Payment axis of an order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Expired,
    Refunded,
}

/// How the buyer pays: cash on delivery, or a hosted provider invoice.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cod,
    Invoice,
}

/// Who performed a status transition (recorded in the history trail).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ActorRole {
    Customer,
    Seller,
    Admin,
    System,
}

/// One checkout transaction against one store.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: i64,
    /// Human-readable number, `MKT-YYYYMMDD-NNNN`, unique.
    pub order_number: String,
    pub buyer_id: i64,
    pub store_id: i64,
    pub subtotal: i64,
    pub shipping_fee: i64,
    pub discount: i64,
    /// Always `subtotal + shipping_fee - discount`, floored at 0.
    pub total: i64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub shipping_address_id: i64,
    pub coupon_code: Option<String>,
    /// Provider invoice reference, set once by the invoice issuer.
    pub invoice_id: Option<String>,
    pub invoice_url: Option<String>,
    /// Epoch millis after which the hosted invoice is no longer payable.
    pub payment_deadline: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Order line item. Product name and unit price are snapshots taken at
/// checkout time; later catalog edits do not rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: i64,
    pub line_total: i64,
}

/// Append-only audit record of one order status transition.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderStatusHistoryEntry {
    pub id: i64,
    pub order_id: i64,
    pub old_status: OrderStatus,
    pub new_status: OrderStatus,
    pub changed_by_role: ActorRole,
    pub note: Option<String>,
    pub created_at: i64,
}

// =============================================================================
// API Request / Response Types
// =============================================================================

/// One cart line in an order-creation request. Unit prices are resolved
/// server-side from the product row, never trusted from the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: i64,
    pub quantity: i64,
}

/// Create order payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub buyer_id: i64,
    pub store_id: i64,
    pub items: Vec<CartItem>,
    pub shipping_address_id: i64,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub coupon_code: Option<String>,
}

/// Full order detail for the storefront order page.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payment: Option<super::payment::PaymentTransaction>,
    pub history: Vec<OrderStatusHistoryEntry>,
}
