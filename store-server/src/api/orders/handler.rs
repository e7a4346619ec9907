//! Order API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use shared::models::OrderDetail;

use crate::checkout::{CreateOrderRequest, OrderReceipt};
use crate::core::ServerState;
use crate::db::repository::order;
use crate::utils::{AppError, AppResult};

/// POST /api/orders - run the checkout pipeline
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<OrderReceipt>)> {
    let receipt = state.checkout.create_order(payload).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// GET /api/orders/:id - order with entries and delivery info
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderDetail>> {
    let detail = order::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {id} not found")))?;
    Ok(Json(detail))
}

/// GET /api/orders/number/:number
pub async fn get_by_number(
    State(state): State<ServerState>,
    Path(number): Path<String>,
) -> AppResult<Json<OrderDetail>> {
    let detail = order::find_by_number(&state.pool, &number)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {number} not found")))?;
    Ok(Json(detail))
}
