//! API routes
//!
//! # Structure
//!
//! - [`health`] - liveness and database health
//! - [`books`] - catalog management (writes emit change events)
//! - [`orders`] - checkout and order retrieval
//! - [`search`] - catalog search and the admin re-index sweep

pub mod books;
pub mod health;
pub mod orders;
pub mod search;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

// Re-export common types for handlers
pub use crate::utils::AppResult;

/// Assemble the full application router.
pub fn router(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(books::router())
        .merge(orders::router())
        .merge(search::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
