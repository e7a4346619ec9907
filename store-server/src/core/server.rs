//! Server Implementation
//!
//! HTTP server startup and background worker management.

use tokio_util::sync::CancellationToken;

use crate::core::{Config, ServerState};
use crate::search::IndexSynchronizer;
use crate::utils::AppError;

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state (tests wire mock providers this way)
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> Result<(), AppError> {
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config).await?,
        };

        let shutdown = CancellationToken::new();

        // Index synchronizer runs on its own task so a slow or failing search
        // engine never blocks a request that produced a catalog change.
        let synchronizer = IndexSynchronizer::new(
            state.pool.clone(),
            state.search_engine.clone(),
            state.change_events.subscribe(),
            crate::search::RetryPolicy {
                max_retries: self.config.search_max_retries,
                base_delay_ms: self.config.search_retry_base_delay_ms,
            },
            shutdown.clone(),
        );
        let sync_handle = tokio::spawn(synchronizer.run());

        let app = crate::api::router(state.clone());
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        tracing::info!("Store server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

        let shutdown_signal = shutdown.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Shutting down...");
                shutdown_signal.cancel();
            })
            .await
            .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

        // Give the synchronizer a bounded window to drain.
        let timeout = std::time::Duration::from_millis(self.config.shutdown_timeout_ms);
        if tokio::time::timeout(timeout, sync_handle).await.is_err() {
            tracing::warn!("Index synchronizer did not stop within shutdown window");
        }

        Ok(())
    }
}
