//! Search API handlers

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use shared::models::BookFormat;

use crate::core::ServerState;
use crate::search::{reindex_all, ReindexReport, SearchQuery, SearchResults};
use crate::utils::AppResult;

const REINDEX_BATCH_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub language: Option<String>,
    pub format: Option<BookFormat>,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
}

/// GET /api/search - query the index, falling back to the catalog scan when
/// the engine is down
pub async fn search(
    State(state): State<ServerState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<SearchResults>> {
    let query = SearchQuery {
        q: params.q,
        language: params.language,
        format: params.format,
        page: params.page,
        page_size: params.page_size,
    };
    let results = state.search.search(&query).await?;
    Ok(Json(results))
}

#[derive(Debug, Deserialize)]
pub struct SuggestParams {
    pub prefix: String,
}

/// GET /api/search/suggest - title completions
pub async fn suggest(
    State(state): State<ServerState>,
    Query(params): Query<SuggestParams>,
) -> Json<Vec<String>> {
    Json(state.search.suggest(&params.prefix).await)
}

/// POST /api/admin/reindex - rebuild the whole index from the catalog
pub async fn reindex(State(state): State<ServerState>) -> AppResult<Json<ReindexReport>> {
    let report = reindex_all(
        &state.pool,
        state.search_engine.as_ref(),
        REINDEX_BATCH_SIZE,
    )
    .await?;
    Ok(Json(report))
}
