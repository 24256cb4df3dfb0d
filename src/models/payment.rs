//! Modelo de pagos a transportistas

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Liquidación de una hoja de ruta completada
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouteSheetPayment {
    pub route_id: Uuid,
    pub code: String,
    pub order_count: u32,
    pub total_weight: Decimal,
    pub amount: Decimal,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Total a pagar a un transportista con su desglose por hoja de ruta
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CarrierPayment {
    pub transportist_id: String,
    pub total: Decimal,
    pub sheets: Vec<RouteSheetPayment>,
}
