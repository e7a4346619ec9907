//! Book API handlers

use axum::{
    extract::{Path, State},
    Json,
};
use shared::models::{Book, BookCreate, BookUpdate, CatalogChange};

use crate::core::ServerState;
use crate::db::repository::book;
use crate::utils::{AppError, AppResult};

/// GET /api/books - list active books
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Book>>> {
    let books = book::find_all_active(&state.pool).await?;
    Ok(Json(books))
}

/// GET /api/books/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Book>> {
    let book = book::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Book {id} not found")))?;
    Ok(Json(book))
}

/// POST /api/books
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<BookCreate>,
) -> AppResult<Json<Book>> {
    let book = book::create(&state.pool, payload).await?;

    // The write is committed; index sync happens off the request path.
    state.change_events.publish(CatalogChange::created(book.clone()));

    Ok(Json(book))
}

/// PUT /api/books/:id
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<BookUpdate>,
) -> AppResult<Json<Book>> {
    let book = book::update(&state.pool, id, payload).await?;

    state.change_events.publish(CatalogChange::updated(book.clone()));

    Ok(Json(book))
}

/// DELETE /api/books/:id - soft delete
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    book::delete(&state.pool, id).await?;

    state.change_events.publish(CatalogChange::deleted(id));

    Ok(Json(serde_json::json!({ "deleted": true })))
}
