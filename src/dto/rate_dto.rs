use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{RateEntry, WeightBracket};

// Request para sobrescribir una celda del tarifario
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRateRequest {
    pub province: String,
    pub weight_bracket: WeightBracket,
    pub price: Decimal,
}

// Tarifario completo como lista plana
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateTableResponse {
    pub entries: Vec<RateEntry>,
}
