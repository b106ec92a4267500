//! Order creation flow: totals, stock holds, atomic rollback

mod common;

use common::*;
use market_server::db::repository::{order, product, reservation};
use market_server::orders::builder;
use market_server::utils::AppError;
use shared::models::{OrderStatus, PaymentMethod, PaymentStatus, ReservationStatus};

const STORE: i64 = 7001;

#[tokio::test]
async fn create_order_computes_totals_and_holds_stock() {
    let server = setup().await;
    let (buyer, address) = seed_buyer(&server, false).await;
    let rice = seed_product(&server, STORE, "Jasmine Rice 5kg", 350, 20).await;
    let oil = seed_product(&server, STORE, "Coconut Oil 1L", 180, 10).await;

    let created = builder::create_order(
        &server.state,
        order_payload(
            buyer,
            STORE,
            address,
            PaymentMethod::Invoice,
            None,
            &[(rice.id, 2), (oil.id, 3)],
        ),
    )
    .await
    .expect("order should be created");

    // subtotal = 2*350 + 3*180 = 1240
    assert_eq!(created.subtotal, 1240);
    assert_eq!(created.shipping_fee, TEST_SHIPPING_FEE);
    assert_eq!(created.discount, 0);
    assert_eq!(
        created.total,
        created.subtotal + created.shipping_fee - created.discount
    );
    assert!(created.total >= 0);
    assert_eq!(created.status, OrderStatus::Pending);
    assert_eq!(created.payment_status, PaymentStatus::Pending);
    assert!(created.order_number.starts_with("MKT-"));
    assert!(created.invoice_id.is_none());
    assert!(created.payment_deadline.is_none());

    // One active hold per line, counters grown but physical stock untouched.
    let holds = reservation::find_by_order(server.pool(), created.id)
        .await
        .unwrap();
    assert_eq!(holds.len(), 2);
    assert!(holds.iter().all(|r| r.status == ReservationStatus::Active));

    let rice_now = product::find_by_id(server.pool(), rice.id).await.unwrap().unwrap();
    assert_eq!(rice_now.stock_on_hand, 20);
    assert_eq!(rice_now.stock_reserved, 2);
    let oil_now = product::find_by_id(server.pool(), oil.id).await.unwrap().unwrap();
    assert_eq!(oil_now.stock_on_hand, 10);
    assert_eq!(oil_now.stock_reserved, 3);

    let items = order::find_items(server.pool(), created.id).await.unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|i| i.line_total == i.unit_price * i.quantity));
}

#[tokio::test]
async fn reservation_failure_rolls_back_the_entire_order() {
    let server = setup().await;
    let (buyer, address) = seed_buyer(&server, false).await;
    let plenty = seed_product(&server, STORE, "Notebook", 120, 50).await;
    let scarce = seed_product(&server, STORE, "Limited Pen", 80, 2).await;

    let result = builder::create_order(
        &server.state,
        order_payload(
            buyer,
            STORE,
            address,
            PaymentMethod::Invoice,
            None,
            &[(plenty.id, 5), (scarce.id, 3)], // second line oversells
        ),
    )
    .await;

    match result {
        Err(AppError::InsufficientStock(msg)) => {
            assert!(msg.contains("Limited Pen"), "error names the product: {msg}");
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    // All-or-nothing: the first line's hold must be unwound too.
    let plenty_now = product::find_by_id(server.pool(), plenty.id).await.unwrap().unwrap();
    assert_eq!(plenty_now.stock_reserved, 0);
    let scarce_now = product::find_by_id(server.pool(), scarce.id).await.unwrap().unwrap();
    assert_eq!(scarce_now.stock_reserved, 0);

    let orders = order::list_by_buyer(server.pool(), buyer).await.unwrap();
    assert!(orders.is_empty(), "no order row may survive the rollback");
}

#[tokio::test]
async fn oversell_fails_once_stock_is_fully_reserved() {
    let server = setup().await;
    let (buyer, address) = seed_buyer(&server, false).await;
    let gadget = seed_product(&server, STORE, "Gadget", 999, 5).await;

    // First checkout takes every unit.
    builder::create_order(
        &server.state,
        order_payload(buyer, STORE, address, PaymentMethod::Invoice, None, &[(gadget.id, 5)]),
    )
    .await
    .expect("first reservation fits exactly");

    // A second checkout for a single unit must now fail.
    let result = builder::create_order(
        &server.state,
        order_payload(buyer, STORE, address, PaymentMethod::Invoice, None, &[(gadget.id, 1)]),
    )
    .await;
    assert!(matches!(result, Err(AppError::InsufficientStock(_))));

    let gadget_now = product::find_by_id(server.pool(), gadget.id).await.unwrap().unwrap();
    assert_eq!(gadget_now.stock_on_hand - gadget_now.stock_reserved, 0);
    assert_eq!(gadget_now.stock_on_hand, 5, "physical stock is untouched until settlement");
}

#[tokio::test]
async fn cod_orders_commit_stock_at_checkout() {
    let server = setup().await;
    let (buyer, address) = seed_buyer(&server, false).await;
    let item = seed_product(&server, STORE, "Desk Lamp", 450, 8).await;

    let created = builder::create_order(
        &server.state,
        order_payload(buyer, STORE, address, PaymentMethod::Cod, None, &[(item.id, 2)]),
    )
    .await
    .expect("cod order");

    let holds = reservation::find_by_order(server.pool(), created.id).await.unwrap();
    assert_eq!(holds.len(), 1);
    assert_eq!(holds[0].status, ReservationStatus::Confirmed);

    let item_now = product::find_by_id(server.pool(), item.id).await.unwrap().unwrap();
    assert_eq!(item_now.stock_on_hand, 6);
    assert_eq!(item_now.stock_reserved, 0);
}

#[tokio::test]
async fn validation_rejects_bad_payloads() {
    let server = setup().await;
    let (buyer, address) = seed_buyer(&server, false).await;
    let item = seed_product(&server, STORE, "Mug", 150, 10).await;

    // Empty cart
    let empty = builder::create_order(
        &server.state,
        order_payload(buyer, STORE, address, PaymentMethod::Invoice, None, &[]),
    )
    .await;
    assert!(matches!(empty, Err(AppError::Validation(_))));

    // Zero quantity
    let zero_qty = builder::create_order(
        &server.state,
        order_payload(buyer, STORE, address, PaymentMethod::Invoice, None, &[(item.id, 0)]),
    )
    .await;
    assert!(matches!(zero_qty, Err(AppError::Validation(_))));

    // Address belonging to someone else
    let (_, other_address) = seed_buyer(&server, false).await;
    let stolen = builder::create_order(
        &server.state,
        order_payload(buyer, STORE, other_address, PaymentMethod::Invoice, None, &[(item.id, 1)]),
    )
    .await;
    assert!(matches!(stolen, Err(AppError::Validation(_))));

    // Product from a different store
    let foreign = seed_product(&server, STORE + 1, "Foreign Item", 99, 10).await;
    let cross_store = builder::create_order(
        &server.state,
        order_payload(buyer, STORE, address, PaymentMethod::Invoice, None, &[(foreign.id, 1)]),
    )
    .await;
    assert!(matches!(cross_store, Err(AppError::Validation(_))));
}
