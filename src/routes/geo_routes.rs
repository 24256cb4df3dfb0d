use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::controllers::geo_controller::GeoController;
use crate::dto::api_response::ApiResponse;
use crate::dto::geo_dto::NearestAgencyQuery;
use crate::services::geo_service::NearestAgency;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_geo_router() -> Router<AppState> {
    Router::new()
        .route("/localities", get(localities))
        .route("/nearest-agency", get(nearest_agency))
}

async fn localities(State(state): State<AppState>) -> Json<ApiResponse<BTreeMap<String, Vec<String>>>> {
    Json(GeoController::new(&state).localities())
}

async fn nearest_agency(
    State(state): State<AppState>,
    Query(query): Query<NearestAgencyQuery>,
) -> Result<Json<ApiResponse<Option<NearestAgency>>>, AppError> {
    Ok(Json(GeoController::new(&state).nearest_agency(query).await?))
}
