use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use serde::Deserialize;
use validator::Validate;

use shared::error::{AppError, ErrorCode};
use shared::models::order::status;
use shared::models::{
    CreateOrderRequest, OrderResponse, PagedResult, UpdateOrderStatusRequest,
};

use crate::error::ServiceError;
use crate::state::AppState;

pub async fn create_order(
    State(state): State<AppState>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let created = state.orders.create_order(&req).await?;
    let location = format!("/api/orders/{}", created.order_number);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(created),
    ))
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub size: i64,
}

fn default_page_size() -> i64 {
    20
}

pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PagedResult<OrderResponse>>, ServiceError> {
    let page = state.store.list_orders(query.page, query.size).await?;
    Ok(Json(PagedResult {
        content: page.content.iter().map(OrderResponse::from).collect(),
        page: page.page,
        size: page.size,
        total_elements: page.total_elements,
    }))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<OrderResponse>, ServiceError> {
    let order = state
        .store
        .get_order(id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound).with_detail("id", id))?;
    Ok(Json(OrderResponse::from(&order)))
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateOrderStatusRequest>,
) -> Result<Json<OrderResponse>, ServiceError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let order = state
        .store
        .update_status(id, &req.status)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound).with_detail("id", id))?;
    Ok(Json(OrderResponse::from(&order)))
}

/// Soft delete: flips the status, the row stays
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServiceError> {
    state
        .store
        .update_status(id, status::DELETED)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound).with_detail("id", id))?;
    Ok(StatusCode::NO_CONTENT)
}
