//! Shared fixtures for integration tests: a fully wired `ServerState` on a
//! temp-file SQLite database plus a mock invoice provider.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tempfile::TempDir;

use market_server::core::{Config, ServerState};
use market_server::db::DbService;
use market_server::db::repository::{coupon, product, user};
use market_server::orders::FlatRateShipping;
use market_server::payments::{
    CreateInvoiceRequest, InvoiceProvider, ProviderError, ProviderInvoice,
};
use shared::models::{
    CartItem, Coupon, DiscountType, OrderCreate, PaymentMethod, Product, ShippingAddress, User,
};
use shared::util::{now_millis, snowflake_id};

pub const TEST_CALLBACK_TOKEN: &str = "test-callback-token";
pub const TEST_SHIPPING_FEE: i64 = 50;

/// Invoice provider double: counts calls, optionally fails, never does I/O.
#[derive(Default)]
pub struct MockProvider {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl MockProvider {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl InvoiceProvider for MockProvider {
    async fn create_invoice(
        &self,
        request: &CreateInvoiceRequest,
    ) -> Result<ProviderInvoice, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ProviderError::Transport("connection refused".into()));
        }
        Ok(ProviderInvoice {
            id: format!("inv_{}", request.external_id),
            invoice_url: format!("https://pay.example.test/{}", request.external_id),
            expiry_date: None,
        })
    }
}

pub struct TestServer {
    pub state: ServerState,
    pub provider: Arc<MockProvider>,
    _dir: TempDir,
}

impl TestServer {
    pub fn pool(&self) -> &sqlx::SqlitePool {
        self.state.pool()
    }
}

/// Fresh database + state with the mock provider wired in.
pub async fn setup() -> TestServer {
    let dir = tempfile::tempdir().expect("create temp dir");
    let db_path = dir.path().join("market.db");
    let db_path = db_path.to_str().expect("utf-8 temp path");

    let mut config = Config::with_overrides(db_path, 0);
    config.payment_callback_token = TEST_CALLBACK_TOKEN.into();
    config.shipping_flat_fee = TEST_SHIPPING_FEE;
    config.invoice_duration_hours = 24;

    let db = DbService::new(db_path).await.expect("open test database");
    let provider = Arc::new(MockProvider::default());
    let shipping = Arc::new(FlatRateShipping::new(config.shipping_flat_fee));
    let state = ServerState::new(config, db, provider.clone(), shipping);

    TestServer {
        state,
        provider,
        _dir: dir,
    }
}

// ── Seed helpers ────────────────────────────────────────────────────

/// Insert a buyer plus one shipping address; returns (buyer_id, address_id).
pub async fn seed_buyer(server: &TestServer, is_plus_member: bool) -> (i64, i64) {
    let buyer = User {
        id: snowflake_id(),
        name: "Test Buyer".into(),
        email: "buyer@example.test".into(),
        phone: Some("0917-000-0000".into()),
        is_plus_member,
        created_at: now_millis(),
    };
    user::insert(server.pool(), &buyer).await.expect("seed user");

    let address = ShippingAddress {
        id: snowflake_id(),
        user_id: buyer.id,
        recipient: buyer.name.clone(),
        phone: "0917-000-0000".into(),
        line1: "1 Test Street".into(),
        city: "Quezon City".into(),
        created_at: now_millis(),
    };
    user::insert_address(server.pool(), &address)
        .await
        .expect("seed address");

    (buyer.id, address.id)
}

pub async fn seed_product(
    server: &TestServer,
    store_id: i64,
    name: &str,
    price: i64,
    stock_on_hand: i64,
) -> Product {
    let now = now_millis();
    let item = Product {
        id: snowflake_id(),
        store_id,
        name: name.into(),
        price,
        stock_on_hand,
        stock_reserved: 0,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    product::insert(server.pool(), &item)
        .await
        .expect("seed product");
    item
}

#[allow(clippy::too_many_arguments)]
pub async fn seed_coupon(
    server: &TestServer,
    code: &str,
    discount_type: DiscountType,
    discount_value: i64,
    min_purchase: i64,
    max_discount: Option<i64>,
    usage_limit: i64,
) -> Coupon {
    let now = now_millis();
    let promo = Coupon {
        id: snowflake_id(),
        code: code.into(),
        description: Some(format!("{code} promo")),
        discount_type,
        discount_value,
        min_purchase,
        max_discount,
        usage_limit,
        used_count: 0,
        for_plus_only: false,
        for_new_users: false,
        expires_at: now + 30 * 24 * 3_600_000,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    coupon::insert(server.pool(), &promo)
        .await
        .expect("seed coupon");
    promo
}

pub fn order_payload(
    buyer_id: i64,
    store_id: i64,
    shipping_address_id: i64,
    payment_method: PaymentMethod,
    coupon_code: Option<&str>,
    lines: &[(i64, i64)],
) -> OrderCreate {
    OrderCreate {
        buyer_id,
        store_id,
        items: lines
            .iter()
            .map(|&(product_id, quantity)| CartItem {
                product_id,
                quantity,
            })
            .collect(),
        shipping_address_id,
        payment_method,
        coupon_code: coupon_code.map(str::to_string),
    }
}
