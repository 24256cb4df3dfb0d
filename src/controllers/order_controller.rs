use std::sync::Arc;

use crate::dto::api_response::ApiResponse;
use crate::dto::order_dto::{CreateOrderRequest, OrderFilters, QuoteRequest, QuoteResponse, TransitionRequest};
use crate::models::{HistoryEntry, Order};
use crate::services::OrderService;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct OrderController {
    service: Arc<OrderService>,
}

impl OrderController {
    pub fn new(state: &AppState) -> Self {
        Self {
            service: state.orders.clone(),
        }
    }

    pub async fn create(&self, request: CreateOrderRequest) -> Result<ApiResponse<Order>, AppError> {
        let order = self.service.create(request).await?;
        let message = format!("Pedido {} creado exitosamente", order.tracking_code);
        Ok(ApiResponse::success_with_message(order, message))
    }

    pub async fn list(&self, filters: OrderFilters) -> Result<ApiResponse<Vec<Order>>, AppError> {
        Ok(ApiResponse::success(self.service.list(&filters).await?))
    }

    pub async fn get(&self, tracking_code: &str) -> Result<ApiResponse<Order>, AppError> {
        Ok(ApiResponse::success(self.service.get(tracking_code).await?))
    }

    pub async fn history(&self, tracking_code: &str) -> Result<ApiResponse<Vec<HistoryEntry>>, AppError> {
        Ok(ApiResponse::success(self.service.history(tracking_code).await?))
    }

    pub async fn transition(
        &self,
        tracking_code: &str,
        request: TransitionRequest,
    ) -> Result<ApiResponse<Order>, AppError> {
        let order = self.service.transition(tracking_code, request).await?;
        let message = format!("Pedido {} ahora está {}", order.tracking_code, order.status.label());
        Ok(ApiResponse::success_with_message(order, message))
    }

    pub async fn quote(&self, request: QuoteRequest) -> Result<ApiResponse<QuoteResponse>, AppError> {
        Ok(ApiResponse::success(self.service.quote(request).await?))
    }
}
