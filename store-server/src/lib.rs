//! Bookstore Store Server
//!
//! Back-office and storefront service for the online bookstore. The core is
//! the checkout-and-inventory-reservation pipeline plus the asynchronous
//! search-index synchronization that keeps the external search engine
//! eventually consistent with catalog mutations.
//!
//! # Module structure
//!
//! ```text
//! store-server/src/
//! ├── core/      # Config, state, server assembly
//! ├── utils/     # Error types, logging
//! ├── db/        # SQLite pool + repositories
//! ├── stock/     # Stock ledger (per-key reservation locks)
//! ├── checkout/  # Order aggregator
//! ├── shipping/  # Shipping-rate client wrapper
//! ├── events/    # Post-commit catalog change events
//! ├── search/    # Search engine client, index synchronizer, fallback search
//! └── api/       # HTTP routes and handlers
//! ```

pub mod api;
pub mod checkout;
pub mod core;
pub mod db;
pub mod events;
pub mod search;
pub mod shipping;
pub mod stock;
pub mod utils;

// Re-export public types
pub use checkout::{CheckoutService, CreateOrderRequest, OrderReceipt};
pub use core::{Config, Server, ServerState};
pub use events::ChangeEventBus;
pub use search::{IndexSynchronizer, ReindexReport, SearchEngine, SearchService};
pub use shipping::{ShippingError, ShippingProvider};
pub use stock::StockLedger;
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

pub fn print_banner() {
    println!(
        r#"
   _____ __
  / ___// /_____  ________
  \__ \/ __/ __ \/ ___/ _ \
 ___/ / /_/ /_/ / /  /  __/
/____/\__/\____/_/   \___/
   _____
  / ___/___  ______   _____  _____
  \__ \/ _ \/ ___/ | / / _ \/ ___/
 ___/ /  __/ /   | |/ /  __/ /
/____/\___/_/    |___/\___/_/
    "#
    );
}
