//! Expired-reservation sweeper: the safety net when no webhook ever arrives

mod common;

use common::*;
use market_server::db::repository::{order, product, reservation};
use market_server::orders::builder;
use market_server::stock::sweeper;
use shared::models::{ActorRole, OrderStatus, PaymentMethod, ReservationStatus};
use shared::util::now_millis;

const STORE: i64 = 7004;

async fn force_expire_reservations(server: &TestServer, order_id: i64) {
    sqlx::query("UPDATE stock_reservations SET expires_at = ? WHERE order_id = ?")
        .bind(now_millis() - 1000)
        .bind(order_id)
        .execute(server.pool())
        .await
        .expect("backdate reservations");
}

#[tokio::test]
async fn sweep_expires_overdue_holds_and_cancels_the_order() {
    let server = setup().await;
    let (buyer, address) = seed_buyer(&server, false).await;
    let a = seed_product(&server, STORE, "Backpack", 1200, 5).await;
    let b = seed_product(&server, STORE, "Bottle", 300, 8).await;

    let created = builder::create_order(
        &server.state,
        order_payload(
            buyer,
            STORE,
            address,
            PaymentMethod::Invoice,
            None,
            &[(a.id, 2), (b.id, 1)],
        ),
    )
    .await
    .unwrap();

    force_expire_reservations(&server, created.id).await;

    let released = sweeper::sweep_once(server.pool()).await.expect("sweep");
    assert_eq!(released, 2);

    let holds = reservation::find_by_order(server.pool(), created.id).await.unwrap();
    assert!(holds.iter().all(|r| r.status == ReservationStatus::Expired));

    // Quantity returned to the pool, physical stock untouched.
    let a_now = product::find_by_id(server.pool(), a.id).await.unwrap().unwrap();
    assert_eq!(a_now.stock_on_hand, 5);
    assert_eq!(a_now.stock_reserved, 0);

    // The never-settled order is cancelled with a system history row.
    let current = order::get(server.pool(), created.id).await.unwrap();
    assert_eq!(current.status, OrderStatus::Cancelled);
    let history = order::find_history(server.pool(), created.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].changed_by_role, ActorRole::System);

    // Idempotent: a second pass finds nothing.
    let again = sweeper::sweep_once(server.pool()).await.unwrap();
    assert_eq!(again, 0);
    let history = order::find_history(server.pool(), created.id).await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn sweep_ignores_fresh_holds() {
    let server = setup().await;
    let (buyer, address) = seed_buyer(&server, false).await;
    let item = seed_product(&server, STORE, "Monitor", 7000, 3).await;

    let created = builder::create_order(
        &server.state,
        order_payload(buyer, STORE, address, PaymentMethod::Invoice, None, &[(item.id, 1)]),
    )
    .await
    .unwrap();

    let released = sweeper::sweep_once(server.pool()).await.unwrap();
    assert_eq!(released, 0);

    let holds = reservation::find_by_order(server.pool(), created.id).await.unwrap();
    assert!(holds.iter().all(|r| r.status == ReservationStatus::Active));
    let current = order::get(server.pool(), created.id).await.unwrap();
    assert_eq!(current.status, OrderStatus::Pending);
}
