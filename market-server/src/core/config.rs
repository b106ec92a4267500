/// Server configuration - all tunables of the order core
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | HTTP_PORT | 3000 | HTTP API port |
/// | DATABASE_PATH | data/market.db | SQLite database file |
/// | ENVIRONMENT | development | development \| staging \| production |
/// | PAYMENT_API_URL | https://api.xendit.co | Invoice provider base URL |
/// | PAYMENT_API_KEY | (empty) | Provider secret API key |
/// | PAYMENT_CALLBACK_TOKEN | (empty) | Webhook verification token; empty rejects every delivery |
/// | PAYMENT_SUCCESS_REDIRECT_URL | http://localhost:3000/payment/success | Buyer redirect after paying |
/// | PAYMENT_FAILURE_REDIRECT_URL | http://localhost:3000/payment/failure | Buyer redirect after failure |
/// | INVOICE_DURATION_HOURS | 24 | Hosted invoice validity window |
/// | SHIPPING_FLAT_FEE | 50 | Flat shipping fee (integer currency units) |
/// | SWEEP_INTERVAL_SECS | 60 | Expired-reservation sweep cadence |
///
/// # Example
///
/// ```ignore
/// DATABASE_PATH=/data/market.db HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API port
    pub http_port: u16,
    /// SQLite database file path
    pub database_path: String,
    /// Runtime environment: development | staging | production
    pub environment: String,

    // === Payment provider ===
    /// Invoice provider base URL
    pub payment_api_url: String,
    /// Provider secret API key
    pub payment_api_key: String,
    /// Shared webhook verification token. Verification is mandatory: an
    /// empty token fails closed and rejects every delivery.
    pub payment_callback_token: String,
    pub payment_success_redirect_url: String,
    pub payment_failure_redirect_url: String,
    /// Hosted invoice validity window (hours)
    pub invoice_duration_hours: i64,

    // === Order policy ===
    /// Flat shipping fee (integer currency units)
    pub shipping_flat_fee: i64,
    /// Expired-reservation sweep cadence (seconds)
    pub sweep_interval_secs: u64,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "data/market.db".into()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),

            payment_api_url: std::env::var("PAYMENT_API_URL")
                .unwrap_or_else(|_| "https://api.xendit.co".into()),
            payment_api_key: std::env::var("PAYMENT_API_KEY").unwrap_or_default(),
            payment_callback_token: std::env::var("PAYMENT_CALLBACK_TOKEN").unwrap_or_default(),
            payment_success_redirect_url: std::env::var("PAYMENT_SUCCESS_REDIRECT_URL")
                .unwrap_or_else(|_| "http://localhost:3000/payment/success".into()),
            payment_failure_redirect_url: std::env::var("PAYMENT_FAILURE_REDIRECT_URL")
                .unwrap_or_else(|_| "http://localhost:3000/payment/failure".into()),
            invoice_duration_hours: std::env::var("INVOICE_DURATION_HOURS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(24),

            shipping_flat_fee: std::env::var("SHIPPING_FLAT_FEE")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(50),
            sweep_interval_secs: std::env::var("SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(60),
        }
    }

    /// Override the values tests care about.
    pub fn with_overrides(database_path: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.database_path = database_path.into();
        config.http_port = http_port;
        config
    }

    /// How long a stock hold outlives its creation: the invoice validity
    /// window plus an hour of slack for late provider callbacks.
    pub fn reservation_ttl_millis(&self) -> i64 {
        (self.invoice_duration_hours + 1) * 3_600_000
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
