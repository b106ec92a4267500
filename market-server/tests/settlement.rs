//! Invoice issuance and webhook-driven settlement
//!
//! The webhook processor is exercised through `process_callback` (the state
//! machine) and through the axum handler (the token/ack boundary contract).

mod common;

use axum::extract::State;
use axum::http::HeaderMap;

use common::*;
use market_server::api;
use market_server::db::repository::{order, payment, product, reservation};
use market_server::orders::builder;
use market_server::payments::invoice;
use market_server::payments::webhook::{SettlementOutcome, process_callback};
use market_server::utils::AppError;
use shared::models::{
    ActorRole, InvoiceCallback, Order, OrderStatus, PaymentMethod, PaymentStatus,
    ReservationStatus,
};

const STORE: i64 = 7002;

async fn checkout_invoice_order(server: &TestServer, lines: &[(i64, i64)]) -> Order {
    let (buyer, address) = seed_buyer(server, false).await;
    builder::create_order(
        &server.state,
        order_payload(buyer, STORE, address, PaymentMethod::Invoice, None, lines),
    )
    .await
    .expect("create invoice order")
}

fn callback(order_id: i64, status: &str, paid_amount: Option<i64>) -> (InvoiceCallback, String) {
    let cb = InvoiceCallback {
        external_id: order_id.to_string(),
        status: status.to_string(),
        paid_amount,
        payment_method: Some("BANK_TRANSFER".into()),
        id: Some(format!("pay_{order_id}")),
    };
    let raw = serde_json::to_string(&cb).expect("serialize callback");
    (cb, raw)
}

// ── Invoice issuance ────────────────────────────────────────────────

#[tokio::test]
async fn invoice_issuance_is_idempotent() {
    let server = setup().await;
    let item = seed_product(&server, STORE, "Speaker", 2500, 4).await;
    let created = checkout_invoice_order(&server, &[(item.id, 1)]).await;

    let first = invoice::issue_invoice(&server.state, created.id)
        .await
        .expect("first issuance");
    assert_eq!(server.provider.call_count(), 1);

    let second = invoice::issue_invoice(&server.state, created.id)
        .await
        .expect("second issuance");
    assert_eq!(first.invoice_id, second.invoice_id);
    assert_eq!(first.invoice_url, second.invoice_url);
    assert_eq!(
        server.provider.call_count(),
        1,
        "repeat call must not hit the provider again"
    );

    // Exactly one pending payment row, deadline persisted on the order.
    assert_eq!(payment::count_for_order(server.pool(), created.id).await.unwrap(), 1);
    let row = payment::find_by_order(server.pool(), created.id).await.unwrap().unwrap();
    assert_eq!(row.status, PaymentStatus::Pending);
    let current = order::get(server.pool(), created.id).await.unwrap();
    assert_eq!(current.invoice_id.as_deref(), Some(first.invoice_id.as_str()));
    assert!(current.payment_deadline.is_some());
}

#[tokio::test]
async fn provider_failure_persists_nothing_and_retry_succeeds() {
    let server = setup().await;
    let item = seed_product(&server, STORE, "Headset", 1800, 4).await;
    let created = checkout_invoice_order(&server, &[(item.id, 1)]).await;

    server.provider.set_failing(true);
    let failed = invoice::issue_invoice(&server.state, created.id).await;
    assert!(matches!(failed, Err(AppError::PaymentProvider(_))));

    // No partial persistence: order untouched, no payment row.
    let current = order::get(server.pool(), created.id).await.unwrap();
    assert!(current.invoice_id.is_none());
    assert!(current.payment_deadline.is_none());
    assert_eq!(payment::count_for_order(server.pool(), created.id).await.unwrap(), 0);

    // Manual retry succeeds once the provider recovers.
    server.provider.set_failing(false);
    let issued = invoice::issue_invoice(&server.state, created.id).await.expect("retry");
    assert!(!issued.invoice_url.is_empty());
}

#[tokio::test]
async fn invoice_rejected_for_cod_orders() {
    let server = setup().await;
    let (buyer, address) = seed_buyer(&server, false).await;
    let item = seed_product(&server, STORE, "Charger", 600, 4).await;
    let created = builder::create_order(
        &server.state,
        order_payload(buyer, STORE, address, PaymentMethod::Cod, None, &[(item.id, 1)]),
    )
    .await
    .unwrap();

    let result = invoice::issue_invoice(&server.state, created.id).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(server.provider.call_count(), 0);
}

// ── Settlement state machine ────────────────────────────────────────

#[tokio::test]
async fn paid_webhook_settles_exactly_once_under_redelivery() {
    let server = setup().await;
    let rice = seed_product(&server, STORE, "Rice Sack", 1500, 10).await;
    let oil = seed_product(&server, STORE, "Oil Case", 900, 6).await;
    let created = checkout_invoice_order(&server, &[(rice.id, 2), (oil.id, 1)]).await;
    invoice::issue_invoice(&server.state, created.id).await.unwrap();

    let (cb, raw) = callback(created.id, "PAID", Some(created.total));
    let first = process_callback(server.pool(), &cb, &raw).await.unwrap();
    assert_eq!(first, SettlementOutcome::Applied);

    // Redelivery of the exact same payload.
    let replay = process_callback(server.pool(), &cb, &raw).await.unwrap();
    assert_eq!(replay, SettlementOutcome::Applied);

    // Each reservation confirmed exactly once; stock decremented once.
    let holds = reservation::find_by_order(server.pool(), created.id).await.unwrap();
    assert_eq!(holds.len(), 2);
    assert!(holds.iter().all(|r| r.status == ReservationStatus::Confirmed));

    let rice_now = product::find_by_id(server.pool(), rice.id).await.unwrap().unwrap();
    assert_eq!(rice_now.stock_on_hand, 8, "2 units leave once, not twice");
    assert_eq!(rice_now.stock_reserved, 0);
    let oil_now = product::find_by_id(server.pool(), oil.id).await.unwrap().unwrap();
    assert_eq!(oil_now.stock_on_hand, 5);
    assert_eq!(oil_now.stock_reserved, 0);

    // One payment row (upsert, not insert-duplicate), order paid but still
    // pending on the fulfilment axis.
    assert_eq!(payment::count_for_order(server.pool(), created.id).await.unwrap(), 1);
    let row = payment::find_by_order(server.pool(), created.id).await.unwrap().unwrap();
    assert_eq!(row.status, PaymentStatus::Paid);
    assert!(row.paid_at.is_some());
    assert_eq!(row.provider_payment_id.as_deref(), Some(format!("pay_{}", created.id).as_str()));

    let current = order::get(server.pool(), created.id).await.unwrap();
    assert_eq!(current.payment_status, PaymentStatus::Paid);
    assert_eq!(current.status, OrderStatus::Pending, "seller still has to process");
}

#[tokio::test]
async fn expired_webhook_releases_stock_and_cancels_order() {
    let server = setup().await;
    let a = seed_product(&server, STORE, "Shirt", 300, 10).await;
    let b = seed_product(&server, STORE, "Cap", 200, 10).await;
    let created = checkout_invoice_order(&server, &[(a.id, 1), (b.id, 2)]).await;
    invoice::issue_invoice(&server.state, created.id).await.unwrap();

    let (cb, raw) = callback(created.id, "EXPIRED", None);
    process_callback(server.pool(), &cb, &raw).await.unwrap();

    let holds = reservation::find_by_order(server.pool(), created.id).await.unwrap();
    assert_eq!(holds.len(), 2);
    assert!(holds.iter().all(|r| r.status == ReservationStatus::Released));

    let a_now = product::find_by_id(server.pool(), a.id).await.unwrap().unwrap();
    assert_eq!(a_now.stock_on_hand, 10);
    assert_eq!(a_now.stock_reserved, 0);

    let current = order::get(server.pool(), created.id).await.unwrap();
    assert_eq!(current.status, OrderStatus::Cancelled);
    assert_eq!(current.payment_status, PaymentStatus::Expired);

    // Exactly one system-actor history row, even after a replay.
    process_callback(server.pool(), &cb, &raw).await.unwrap();
    let history = order::find_history(server.pool(), created.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].changed_by_role, ActorRole::System);
    assert_eq!(history[0].old_status, OrderStatus::Pending);
    assert_eq!(history[0].new_status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn failed_webhook_touches_only_the_payment_axis() {
    let server = setup().await;
    let item = seed_product(&server, STORE, "Blender", 2200, 3).await;
    let created = checkout_invoice_order(&server, &[(item.id, 1)]).await;
    invoice::issue_invoice(&server.state, created.id).await.unwrap();

    let (cb, raw) = callback(created.id, "FAILED", None);
    process_callback(server.pool(), &cb, &raw).await.unwrap();

    let current = order::get(server.pool(), created.id).await.unwrap();
    assert_eq!(current.payment_status, PaymentStatus::Failed);
    assert_eq!(current.status, OrderStatus::Pending);

    // Holds stay active: the buyer may retry payment within the window.
    let holds = reservation::find_by_order(server.pool(), created.id).await.unwrap();
    assert!(holds.iter().all(|r| r.status == ReservationStatus::Active));
}

#[tokio::test]
async fn unknown_status_and_unknown_order_are_acknowledged_noops() {
    let server = setup().await;
    let item = seed_product(&server, STORE, "Kettle", 800, 3).await;
    let created = checkout_invoice_order(&server, &[(item.id, 1)]).await;

    let (cb, raw) = callback(created.id, "SETTLING", None);
    let outcome = process_callback(server.pool(), &cb, &raw).await.unwrap();
    assert_eq!(outcome, SettlementOutcome::Unrecognized);
    let current = order::get(server.pool(), created.id).await.unwrap();
    assert_eq!(current.payment_status, PaymentStatus::Pending);
    assert_eq!(payment::count_for_order(server.pool(), created.id).await.unwrap(), 0);

    // Webhook racing ahead of order persistence: ack + skip.
    let (cb, raw) = callback(999_999_999, "PAID", Some(100));
    let outcome = process_callback(server.pool(), &cb, &raw).await.unwrap();
    assert_eq!(outcome, SettlementOutcome::OrderMissing);
}

// ── Handler boundary contract ───────────────────────────────────────

fn token_headers(token: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(value) = token {
        headers.insert("x-callback-token", value.parse().unwrap());
    }
    headers
}

#[tokio::test]
async fn webhook_handler_rejects_bad_or_missing_token() {
    let server = setup().await;
    let body = r#"{"external_id":"1","status":"PAID"}"#.to_string();

    let wrong = api::payments::handler::webhook(
        State(server.state.clone()),
        token_headers(Some("wrong-token")),
        body.clone(),
    )
    .await;
    assert!(matches!(wrong, Err(AppError::Unauthorized)));

    let missing = api::payments::handler::webhook(
        State(server.state.clone()),
        token_headers(None),
        body,
    )
    .await;
    assert!(matches!(missing, Err(AppError::Unauthorized)));
}

#[tokio::test]
async fn webhook_handler_fails_closed_without_configured_token() {
    let mut server = setup().await;
    // Operator never set a token: every delivery is rejected.
    server.state.config.payment_callback_token = String::new();

    let result = api::payments::handler::webhook(
        State(server.state.clone()),
        token_headers(Some("anything")),
        r#"{"external_id":"1","status":"PAID"}"#.to_string(),
    )
    .await;
    assert!(matches!(result, Err(AppError::Unauthorized)));
}

#[tokio::test]
async fn webhook_handler_acks_malformed_and_unknown_payloads() {
    let server = setup().await;

    // Unparseable body: still 200 {received: true}.
    let ack = api::payments::handler::webhook(
        State(server.state.clone()),
        token_headers(Some(TEST_CALLBACK_TOKEN)),
        "not-json".to_string(),
    )
    .await
    .expect("must acknowledge");
    assert!(ack.0.received);

    // Valid body for a nonexistent order: still acknowledged.
    let ack = api::payments::handler::webhook(
        State(server.state.clone()),
        token_headers(Some(TEST_CALLBACK_TOKEN)),
        r#"{"external_id":"424242","status":"EXPIRED"}"#.to_string(),
    )
    .await
    .expect("must acknowledge");
    assert!(ack.0.received);
}
