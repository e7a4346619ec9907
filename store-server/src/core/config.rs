/// Server configuration — every knob of the store server
///
/// # Environment variables
///
/// All settings can be overridden via environment variables:
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | DATABASE_PATH | store.db | SQLite database file |
/// | HTTP_PORT | 3000 | HTTP API port |
/// | ENVIRONMENT | development | Runtime environment |
/// | SHIPPING_API_URL | http://localhost:3100 | Shipping-rate provider base URL |
/// | SHIPPING_TIMEOUT_MS | 5000 | Shipping call connect/read timeout |
/// | SEARCH_URL | http://localhost:9200 | External search engine base URL |
/// | SEARCH_TIMEOUT_MS | 5000 | Search engine call timeout |
/// | SEARCH_MAX_RETRIES | 3 | Index-sync retry attempts per event |
/// | SEARCH_RETRY_BASE_DELAY_MS | 500 | Initial retry backoff delay (doubles per attempt) |
/// | DEFAULT_WAREHOUSE_CITY | Hanoi | Fallback delivery city when the address province has no warehouse |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | Graceful shutdown window |
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file path
    pub database_path: String,
    /// HTTP API port
    pub http_port: u16,
    /// Runtime environment: development | staging | production
    pub environment: String,

    // === Shipping provider ===
    /// Shipping-rate provider base URL
    pub shipping_api_url: String,
    /// Connect/read timeout for the single shipping call per order attempt
    pub shipping_timeout_ms: u64,

    // === Search engine ===
    /// External search engine base URL
    pub search_url: String,
    /// Search engine call timeout
    pub search_timeout_ms: u64,
    /// Max attempts per index-sync event before giving up
    pub search_max_retries: u32,
    /// Initial backoff delay; doubles each attempt
    pub search_retry_base_delay_ms: u64,

    // === Fulfillment ===
    /// Fallback delivery city when the address province maps to no warehouse
    pub default_warehouse_city: String,

    /// Graceful shutdown window (milliseconds)
    pub shutdown_timeout_ms: u64,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            database_path: std::env::var("DATABASE_PATH").unwrap_or_else(|_| "store.db".into()),
            http_port: env_parse("HTTP_PORT", 3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            shipping_api_url: std::env::var("SHIPPING_API_URL")
                .unwrap_or_else(|_| "http://localhost:3100".into()),
            shipping_timeout_ms: env_parse("SHIPPING_TIMEOUT_MS", 5000),
            search_url: std::env::var("SEARCH_URL")
                .unwrap_or_else(|_| "http://localhost:9200".into()),
            search_timeout_ms: env_parse("SEARCH_TIMEOUT_MS", 5000),
            search_max_retries: env_parse("SEARCH_MAX_RETRIES", 3),
            search_retry_base_delay_ms: env_parse("SEARCH_RETRY_BASE_DELAY_MS", 500),
            default_warehouse_city: std::env::var("DEFAULT_WAREHOUSE_CITY")
                .unwrap_or_else(|_| "Hanoi".into()),
            shutdown_timeout_ms: env_parse("SHUTDOWN_TIMEOUT_MS", 10000),
        }
    }

    /// Override the volatile parts, keeping env-derived values for the rest.
    ///
    /// Commonly used in tests.
    pub fn with_overrides(database_path: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.database_path = database_path.into();
        config.http_port = http_port;
        config
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
