use std::sync::Arc;

use crate::dto::api_response::ApiResponse;
use crate::models::{CarrierPayment, Transportist};
use crate::repositories::Store;
use crate::services::PaymentService;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct TransportistController {
    store: Arc<dyn Store>,
    payments: Arc<PaymentService>,
}

impl TransportistController {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            payments: state.payments.clone(),
        }
    }

    pub async fn list(&self) -> Result<ApiResponse<Vec<Transportist>>, AppError> {
        let mut transportists = self.store.get_transportists().await?;
        transportists.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(ApiResponse::success(transportists))
    }

    pub async fn payments(&self, transportist_id: &str) -> Result<ApiResponse<CarrierPayment>, AppError> {
        Ok(ApiResponse::success(
            self.payments.compute_carrier_payment(transportist_id).await?,
        ))
    }
}
