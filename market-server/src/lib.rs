//! Market Server - marketplace order lifecycle and payment settlement core
//!
//! # Architecture overview
//!
//! The service coordinates order creation, stock reservation, hosted-invoice
//! payment and asynchronous webhook settlement:
//!
//! - **Stock ledger** (`stock`): hold / confirm / release of product stock
//! - **Order builder** (`orders`): cart → order + items + holds, one transaction
//! - **Payments** (`payments`): invoice issuance and the settlement state machine
//! - **Coupons** (`coupons`): eligibility validation and discount computation
//! - **Database** (`db`): embedded SQLite via sqlx
//! - **HTTP API** (`api`): RESTful endpoints
//!
//! # Module structure
//!
//! ```text
//! market-server/src/
//! ├── core/          # configuration, state, server lifecycle
//! ├── api/           # HTTP routes and handlers
//! ├── orders/        # order builder, numbers, shipping policy
//! ├── stock/         # reservation ledger + expiry sweeper
//! ├── payments/      # provider client, invoice issuer, webhook processor
//! ├── coupons/       # coupon validator
//! ├── db/            # pool, migrations, repositories
//! └── utils/         # errors, logging, validation
//! ```

pub mod api;
pub mod core;
pub mod coupons;
pub mod db;
pub mod orders;
pub mod payments;
pub mod stock;
pub mod utils;

// Re-export common types
pub use crate::core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// Load `.env` and initialize logging. Call once at process start.
pub fn setup_environment() {
    dotenv::dotenv().ok();
    init_logger();
}

pub fn print_banner() {
    println!(
        r#"
    __  ___           __        __
   /  |/  /___ ______/ /_____  / /_
  / /|_/ / __ `/ ___/ //_/ _ \/ __/
 / /  / / /_/ / /  / ,< /  __/ /_
/_/  /_/\__,_/_/  /_/|_|\___/\__/
   _____
  / ___/___  ______   _____  _____
  \__ \/ _ \/ ___/ | / / _ \/ ___/
 ___/ /  __/ /   | |/ /  __/ /
/____/\___/_/    |___/\___/_/
    "#
    );
}
