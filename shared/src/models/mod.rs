//! Data models for the marketplace order core
//!
//! Each entity maps 1:1 onto a SQLite table (see `market-server/migrations/`).
//! Monetary amounts are integer currency units; timestamps are UTC epoch
//! milliseconds.

pub mod coupon;
pub mod order;
pub mod payment;
pub mod product;
pub mod reservation;
pub mod user;

pub use coupon::{
    Coupon, CouponUsage, DiscountType, ValidatedCoupon, VerifyCouponRequest,
};
pub use order::{
    ActorRole, CartItem, Order, OrderCreate, OrderDetail, OrderItem, OrderStatus,
    OrderStatusHistoryEntry, PaymentMethod, PaymentStatus,
};
pub use payment::{InvoiceCallback, PaymentTransaction};
pub use product::Product;
pub use reservation::{ReservationStatus, StockReservation};
pub use user::{ShippingAddress, User};
