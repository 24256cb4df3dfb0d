use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::controllers::transportist_controller::TransportistController;
use crate::dto::api_response::ApiResponse;
use crate::models::{CarrierPayment, Transportist};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_transportist_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_transportists))
        .route("/:id/payments", get(transportist_payments))
}

async fn list_transportists(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Transportist>>>, AppError> {
    Ok(Json(TransportistController::new(&state).list().await?))
}

async fn transportist_payments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<CarrierPayment>>, AppError> {
    Ok(Json(TransportistController::new(&state).payments(&id).await?))
}
