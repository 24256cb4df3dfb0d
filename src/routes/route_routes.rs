use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::route_controller::RouteController;
use crate::dto::api_response::ApiResponse;
use crate::dto::route_dto::{ActivationReport, ClearReport, GenerateRouteRequest, OptimizedRouteRequest, RouteSheet};
use crate::models::{OptimizedRoute, Route};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_route_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_routes).post(generate_route).delete(clear_routes))
        .route("/optimized", post(generate_optimized_route))
        .route("/:id/activate", post(activate_route))
        .route("/:id/complete", post(complete_route))
        .route("/:id/sheet", get(route_sheet))
}

async fn list_routes(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Route>>>, AppError> {
    Ok(Json(RouteController::new(&state).list().await?))
}

async fn generate_route(
    State(state): State<AppState>,
    Json(request): Json<GenerateRouteRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Route>>), AppError> {
    let response = RouteController::new(&state).generate(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn generate_optimized_route(
    State(state): State<AppState>,
    Json(request): Json<OptimizedRouteRequest>,
) -> Result<Json<ApiResponse<Option<OptimizedRoute>>>, AppError> {
    Ok(Json(RouteController::new(&state).generate_optimized(request).await?))
}

async fn activate_route(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ActivationReport>>, AppError> {
    Ok(Json(RouteController::new(&state).activate(id).await?))
}

async fn complete_route(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Route>>, AppError> {
    Ok(Json(RouteController::new(&state).complete(id).await?))
}

async fn route_sheet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RouteSheet>>, AppError> {
    Ok(Json(RouteController::new(&state).sheet(id).await?))
}

async fn clear_routes(State(state): State<AppState>) -> Result<Json<ApiResponse<ClearReport>>, AppError> {
    Ok(Json(RouteController::new(&state).clear_all().await?))
}
