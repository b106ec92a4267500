//! Coupon API module

pub mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/coupons/verify", post(handler::verify))
}
