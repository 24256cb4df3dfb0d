use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::controllers::order_controller::OrderController;
use crate::dto::api_response::ApiResponse;
use crate::dto::order_dto::{CreateOrderRequest, OrderFilters, QuoteRequest, QuoteResponse, TransitionRequest};
use crate::models::{HistoryEntry, Order};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_order_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route("/:code", get(get_order))
        .route("/:code/history", get(get_history))
        .route("/:code/status", post(transition_order))
}

pub fn create_quote_router() -> Router<AppState> {
    Router::new().route("/", post(quote))
}

async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Order>>), AppError> {
    let response = OrderController::new(&state).create(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_orders(
    State(state): State<AppState>,
    Query(filters): Query<OrderFilters>,
) -> Result<Json<ApiResponse<Vec<Order>>>, AppError> {
    Ok(Json(OrderController::new(&state).list(filters).await?))
}

async fn get_order(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<Order>>, AppError> {
    Ok(Json(OrderController::new(&state).get(&code).await?))
}

async fn get_history(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<Vec<HistoryEntry>>>, AppError> {
    Ok(Json(OrderController::new(&state).history(&code).await?))
}

async fn transition_order(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<ApiResponse<Order>>, AppError> {
    Ok(Json(OrderController::new(&state).transition(&code, request).await?))
}

async fn quote(
    State(state): State<AppState>,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<ApiResponse<QuoteResponse>>, AppError> {
    Ok(Json(OrderController::new(&state).quote(request).await?))
}
