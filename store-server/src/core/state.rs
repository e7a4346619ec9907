use std::sync::Arc;

use sqlx::SqlitePool;

use crate::checkout::CheckoutService;
use crate::core::Config;
use crate::db::DbService;
use crate::events::ChangeEventBus;
use crate::search::{HttpSearchEngine, SearchEngine, SearchService};
use crate::shipping::{HttpShippingProvider, ShippingProvider};
use crate::stock::StockLedger;

/// Server state — shared references to every service
///
/// Cloning is shallow (Arc), so handlers receive it by value.
///
/// | Field | Purpose |
/// |-------|---------|
/// | config | Immutable configuration |
/// | pool | SQLite connection pool |
/// | ledger | Per-(book, warehouse) reservation locks |
/// | checkout | Order aggregator |
/// | shipping | Shipping-rate provider client |
/// | search_engine | External search engine client |
/// | search | Query service with fallback scan |
/// | change_events | Post-commit catalog change bus |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub pool: SqlitePool,
    pub ledger: Arc<StockLedger>,
    pub checkout: Arc<CheckoutService>,
    pub shipping: Arc<dyn ShippingProvider>,
    pub search_engine: Arc<dyn SearchEngine>,
    pub search: Arc<SearchService>,
    pub change_events: ChangeEventBus,
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("config", &self.config)
            .field("pool", &"<SqlitePool>")
            .finish()
    }
}

impl ServerState {
    /// Initialize all services from configuration (production wiring).
    pub async fn initialize(config: &Config) -> Result<Self, crate::utils::AppError> {
        let db = DbService::new(&config.database_path).await?;
        let shipping: Arc<dyn ShippingProvider> = Arc::new(HttpShippingProvider::new(
            &config.shipping_api_url,
            config.shipping_timeout_ms,
        ));
        let search_engine: Arc<dyn SearchEngine> = Arc::new(HttpSearchEngine::new(
            &config.search_url,
            config.search_timeout_ms,
        ));
        Ok(Self::with_parts(
            config.clone(),
            db.pool,
            shipping,
            search_engine,
        ))
    }

    /// Assemble state from pre-built parts.
    ///
    /// Tests inject mock shipping providers and search engines here.
    pub fn with_parts(
        config: Config,
        pool: SqlitePool,
        shipping: Arc<dyn ShippingProvider>,
        search_engine: Arc<dyn SearchEngine>,
    ) -> Self {
        let ledger = Arc::new(StockLedger::new(pool.clone()));
        let checkout = Arc::new(CheckoutService::new(
            pool.clone(),
            ledger.clone(),
            shipping.clone(),
            config.default_warehouse_city.clone(),
        ));
        let search = Arc::new(SearchService::new(pool.clone(), search_engine.clone()));
        let change_events = ChangeEventBus::new();

        Self {
            config,
            pool,
            ledger,
            checkout,
            shipping,
            search_engine,
            search,
            change_events,
        }
    }
}
