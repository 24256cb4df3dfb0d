use axum::{extract::State, routing::get, Json, Router};

use crate::controllers::rate_controller::RateController;
use crate::dto::api_response::ApiResponse;
use crate::dto::rate_dto::{RateTableResponse, SetRateRequest};
use crate::models::RateEntry;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_rate_router() -> Router<AppState> {
    Router::new().route("/", get(list_rates).put(set_rate))
}

async fn list_rates(State(state): State<AppState>) -> Result<Json<ApiResponse<RateTableResponse>>, AppError> {
    Ok(Json(RateController::new(&state).list().await?))
}

async fn set_rate(
    State(state): State<AppState>,
    Json(request): Json<SetRateRequest>,
) -> Result<Json<ApiResponse<RateEntry>>, AppError> {
    Ok(Json(RateController::new(&state).set(request).await?))
}
