//! Search API

mod handler;

use axum::{
    routing::{get, post},
    Router,
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/search", get(handler::search))
        .route("/api/search/suggest", get(handler::suggest))
        .route("/api/admin/reindex", post(handler::reindex))
}
