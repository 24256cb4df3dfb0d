use std::sync::Arc;

use crate::dto::api_response::ApiResponse;
use crate::dto::rate_dto::{RateTableResponse, SetRateRequest};
use crate::models::RateEntry;
use crate::services::RateTableService;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct RateController {
    rates: Arc<RateTableService>,
}

impl RateController {
    pub fn new(state: &AppState) -> Self {
        Self {
            rates: state.rates.clone(),
        }
    }

    pub async fn list(&self) -> Result<ApiResponse<RateTableResponse>, AppError> {
        let table = self.rates.table().await?;
        Ok(ApiResponse::success(RateTableResponse {
            entries: table.to_entries(),
        }))
    }

    pub async fn set(&self, request: SetRateRequest) -> Result<ApiResponse<RateEntry>, AppError> {
        let entry = self
            .rates
            .set(&request.province, request.weight_bracket, request.price)
            .await?;
        Ok(ApiResponse::success_with_message(entry, "Tarifa actualizada".to_string()))
    }
}
