//! DTOs para hojas de ruta
//!
//! Este módulo contiene las estructuras de request/response de generación,
//! activación y limpieza de rutas, y la vista imprimible de la hoja de ruta.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{OrderStatus, Route, RouteLeg, ServiceType, Transportist};

/// Request para generar una ruta manual
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateRouteRequest {
    pub origin: String,
    pub destination: String,
    pub stops: Vec<String>,
    pub transportist_id: String,
}

/// Request para generar la ruta optimizada de un transportista
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizedRouteRequest {
    pub transportist_id: String,
    #[serde(default = "default_leg")]
    pub leg_type: RouteLeg,
}

fn default_leg() -> RouteLeg {
    RouteLeg::Collection
}

/// Pedido que quedó fuera de la ruta al activarla
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DroppedOrder {
    pub order_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_code: Option<String>,
    pub reason: String,
}

/// Resultado de activar una ruta
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationReport {
    pub route: Route,
    pub activated: Vec<String>,
    pub dropped: Vec<DroppedOrder>,
}

/// Resultado de la limpieza administrativa
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClearReport {
    pub routes_removed: usize,
    pub orders_reset: usize,
    pub reverted_to_pending: usize,
}

/// Pedido tal como aparece en la hoja impresa
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSheetOrder {
    pub tracking_code: String,
    pub status: OrderStatus,
    pub sender_name: String,
    pub sender_address: String,
    pub sender_city: String,
    pub recipient_name: String,
    pub recipient_address: String,
    pub recipient_city: String,
    pub weight: Decimal,
    pub quantity: u32,
    pub service_type: ServiceType,
}

/// Vista imprimible/exportable de una hoja de ruta
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSheet {
    pub route: Route,
    pub transportist: Option<Transportist>,
    pub orders: Vec<RouteSheetOrder>,
    pub total_weight: Decimal,
    pub map_url: String,
}
