//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::core::ServerState;
use crate::db::repository::{order, payment};
use crate::orders::builder;
use crate::payments::invoice::{self, InvoiceIssued};
use crate::utils::{AppError, AppResult};
use shared::models::{Order, OrderCreate, OrderDetail};

#[derive(serde::Deserialize)]
pub struct ListQuery {
    pub buyer_id: i64,
}

/// POST /api/orders - create an order from a cart
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<OrderCreate>,
) -> AppResult<Json<Order>> {
    let created = builder::create_order(&state, payload).await?;
    Ok(Json(created))
}

/// GET /api/orders?buyer_id=xxx - a buyer's orders, newest first
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Order>>> {
    let orders = order::list_by_buyer(state.pool(), query.buyer_id).await?;
    Ok(Json(orders))
}

/// GET /api/orders/:id - order detail with items, payment and history
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderDetail>> {
    let found = order::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {id} not found")))?;

    let items = order::find_items(state.pool(), id).await?;
    let payment = payment::find_by_order(state.pool(), id).await?;
    let history = order::find_history(state.pool(), id).await?;

    Ok(Json(OrderDetail {
        order: found,
        items,
        payment,
        history,
    }))
}

/// POST /api/orders/:id/invoice - issue (or re-read) the hosted invoice
pub async fn create_invoice(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<InvoiceIssued>> {
    let issued = invoice::issue_invoice(&state, id).await?;
    Ok(Json(issued))
}
