use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::core::Config;
use crate::db::DbService;
use crate::orders::{FlatRateShipping, ShippingRatePolicy};
use crate::payments::{InvoiceProvider, XenditClient};
use crate::stock::ReservationSweeper;

/// Server state - shared handles to every service
///
/// Cloning is shallow (Arc / pool handles); handlers receive a clone per
/// request via axum's `State` extractor.
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Config,
    /// SQLite database service
    pub db: DbService,
    /// Hosted-invoice provider (HTTP client in production, mock in tests)
    pub invoice_provider: Arc<dyn InvoiceProvider>,
    /// Shipping fee policy
    pub shipping: Arc<dyn ShippingRatePolicy>,
    /// Cancellation for background tasks, triggered on shutdown
    pub shutdown: CancellationToken,
}

impl ServerState {
    /// Assemble state from parts (tests wire mocks in through here;
    /// production uses [`ServerState::initialize`]).
    pub fn new(
        config: Config,
        db: DbService,
        invoice_provider: Arc<dyn InvoiceProvider>,
        shipping: Arc<dyn ShippingRatePolicy>,
    ) -> Self {
        Self {
            config,
            db,
            invoice_provider,
            shipping,
            shutdown: CancellationToken::new(),
        }
    }

    /// Initialize production state: open the database, run migrations and
    /// wire the real provider client and shipping policy.
    ///
    /// # Panics
    ///
    /// Panics when the database cannot be opened or migrated.
    pub async fn initialize(config: &Config) -> Self {
        if let Some(parent) = std::path::Path::new(&config.database_path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).expect("Failed to create database directory");
        }

        let db = DbService::new(&config.database_path)
            .await
            .expect("Failed to initialize database");

        if config.payment_callback_token.is_empty() {
            tracing::warn!(
                "PAYMENT_CALLBACK_TOKEN is not set - every webhook delivery will be rejected"
            );
        }

        let invoice_provider: Arc<dyn InvoiceProvider> = Arc::new(XenditClient::new(
            config.payment_api_url.clone(),
            config.payment_api_key.clone(),
        ));
        let shipping: Arc<dyn ShippingRatePolicy> =
            Arc::new(FlatRateShipping::new(config.shipping_flat_fee));

        Self::new(config.clone(), db, invoice_provider, shipping)
    }

    /// Start background tasks. Must be called before `Server::run()`.
    ///
    /// Currently: the expired-reservation sweeper.
    pub fn start_background_tasks(&self) {
        let sweeper = ReservationSweeper::new(
            self.db.pool.clone(),
            self.config.sweep_interval_secs,
            self.shutdown.clone(),
        );
        tokio::spawn(sweeper.run());
    }

    /// Database pool handle.
    pub fn pool(&self) -> &sqlx::SqlitePool {
        &self.db.pool
    }
}
