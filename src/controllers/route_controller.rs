use std::sync::Arc;

use uuid::Uuid;

use crate::dto::api_response::ApiResponse;
use crate::dto::route_dto::{ActivationReport, ClearReport, GenerateRouteRequest, OptimizedRouteRequest, RouteSheet};
use crate::models::{OptimizedRoute, Route};
use crate::services::RouteAllocator;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct RouteController {
    allocator: Arc<RouteAllocator>,
}

impl RouteController {
    pub fn new(state: &AppState) -> Self {
        Self {
            allocator: state.routes.clone(),
        }
    }

    pub async fn list(&self) -> Result<ApiResponse<Vec<Route>>, AppError> {
        Ok(ApiResponse::success(self.allocator.list().await?))
    }

    pub async fn generate(&self, request: GenerateRouteRequest) -> Result<ApiResponse<Route>, AppError> {
        let route = self.allocator.generate(request).await?;
        let message = format!("Ruta {} generada con {} pedidos", route.code, route.order_ids.len());
        Ok(ApiResponse::success_with_message(route, message))
    }

    /// `data: null` cuando el transportista no tiene pedidos para el tramo
    pub async fn generate_optimized(
        &self,
        request: OptimizedRouteRequest,
    ) -> Result<ApiResponse<Option<OptimizedRoute>>, AppError> {
        let optimized = self
            .allocator
            .generate_optimized_route_for_transportist(request.transportist_id.trim(), request.leg_type)
            .await?;

        let message = match &optimized {
            Some(route) => format!("Ruta {} con {} paradas", route.code, route.stops.len()),
            None => "No hay pedidos para optimizar".to_string(),
        };
        Ok(ApiResponse::success_with_message(optimized, message))
    }

    pub async fn activate(&self, route_id: Uuid) -> Result<ApiResponse<ActivationReport>, AppError> {
        Ok(ApiResponse::success(self.allocator.activate(route_id).await?))
    }

    pub async fn complete(&self, route_id: Uuid) -> Result<ApiResponse<Route>, AppError> {
        Ok(ApiResponse::success(self.allocator.complete(route_id).await?))
    }

    pub async fn sheet(&self, route_id: Uuid) -> Result<ApiResponse<RouteSheet>, AppError> {
        Ok(ApiResponse::success(self.allocator.route_sheet(route_id).await?))
    }

    pub async fn clear_all(&self) -> Result<ApiResponse<ClearReport>, AppError> {
        let report = self.allocator.clear_all().await?;
        let message = format!("{} rutas eliminadas", report.routes_removed);
        Ok(ApiResponse::success_with_message(report, message))
    }
}
