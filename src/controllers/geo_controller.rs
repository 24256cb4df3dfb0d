use std::collections::BTreeMap;
use std::sync::Arc;

use crate::dto::api_response::ApiResponse;
use crate::dto::geo_dto::NearestAgencyQuery;
use crate::services::geo_service::NearestAgency;
use crate::services::GeoService;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct GeoController {
    geo: Arc<GeoService>,
}

impl GeoController {
    pub fn new(state: &AppState) -> Self {
        Self { geo: state.geo.clone() }
    }

    pub fn localities(&self) -> ApiResponse<BTreeMap<String, Vec<String>>> {
        ApiResponse::success(self.geo.localities())
    }

    pub async fn nearest_agency(&self, query: NearestAgencyQuery) -> Result<ApiResponse<Option<NearestAgency>>, AppError> {
        Ok(ApiResponse::success(
            self.geo.nearest_agency(query.lat, query.lng).await?,
        ))
    }
}
