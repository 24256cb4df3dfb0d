//! Modelo del tarifario
//!
//! Precio de flete por (provincia de destino, franja de peso).

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::package::WeightBracket;

/// Entrada de respaldo para provincias sin tarifa propia
pub const DEFAULT_PROVINCE: &str = "Otras provincias";

/// Tarifario completo
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RateTable {
    pub entries: BTreeMap<String, BTreeMap<WeightBracket, Decimal>>,
}

/// Una celda del tarifario
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RateEntry {
    pub province: String,
    pub weight_bracket: WeightBracket,
    pub price: Decimal,
}

impl RateTable {
    /// Construye una fila por provincia con los cinco precios en orden de franja
    pub fn from_rows(rows: &[(&str, [i64; 5])]) -> Self {
        let entries = rows
            .iter()
            .map(|(province, prices)| {
                let row = WeightBracket::ALL
                    .iter()
                    .zip(prices.iter())
                    .map(|(bracket, price)| (*bracket, Decimal::from(*price)))
                    .collect();
                (province.to_string(), row)
            })
            .collect();
        Self { entries }
    }

    /// Fila de la provincia (sin distinguir mayúsculas) o la de respaldo
    pub fn row_for(&self, province: &str) -> Option<&BTreeMap<WeightBracket, Decimal>> {
        let wanted = province.trim().to_lowercase();
        self.entries
            .iter()
            .find(|(name, _)| name.to_lowercase() == wanted)
            .map(|(_, row)| row)
            .or_else(|| self.entries.get(DEFAULT_PROVINCE))
    }

    /// Precio de la celda; si la fila de la provincia no tiene esa franja
    /// se usa la celda de "Otras provincias"
    pub fn price(&self, province: &str, bracket: WeightBracket) -> Option<Decimal> {
        self.row_for(province)
            .and_then(|row| row.get(&bracket))
            .or_else(|| self.entries.get(DEFAULT_PROVINCE).and_then(|row| row.get(&bracket)))
            .copied()
    }

    /// Sobrescribe una celda; conserva la clave existente si difiere sólo en mayúsculas
    pub fn set(&mut self, province: &str, bracket: WeightBracket, price: Decimal) {
        let wanted = province.trim().to_lowercase();
        let key = self
            .entries
            .keys()
            .find(|name| name.to_lowercase() == wanted)
            .cloned()
            .unwrap_or_else(|| province.trim().to_string());
        self.entries.entry(key).or_default().insert(bracket, price);
    }

    pub fn to_entries(&self) -> Vec<RateEntry> {
        self.entries
            .iter()
            .flat_map(|(province, row)| {
                row.iter().map(move |(bracket, price)| RateEntry {
                    province: province.clone(),
                    weight_bracket: *bracket,
                    price: *price,
                })
            })
            .collect()
    }

    /// Precios no decrecientes con el peso en todas las filas
    pub fn is_monotonic(&self) -> bool {
        self.entries.values().all(|row| {
            let prices: Vec<&Decimal> = row.values().collect();
            prices.windows(2).all(|w| w[0] <= w[1])
        })
    }
}
