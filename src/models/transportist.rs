//! Modelo de Transportist
//!
//! Transportista con su vehículo y las zonas que atiende.

use serde::{Deserialize, Serialize};

use crate::utils::matching::any_zone_matches;

/// Alcance del transportista
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TransportistType {
    /// Retiro y entrega dentro de sus zonas
    Local,
    /// Tramos entre provincias
    LongDistance,
}

/// Transportista
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transportist {
    pub id: String,
    pub name: String,
    pub vehicle: String,
    #[serde(rename = "type")]
    pub transportist_type: TransportistType,
    pub zones: Vec<String>,
}

impl Transportist {
    /// Ciudad o provincia dentro de alguna de sus zonas (subcadena, sin mayúsculas)
    pub fn serves(&self, city: &str, province: &str) -> bool {
        any_zone_matches(city, province, &self.zones)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_field_name() {
        let t = Transportist {
            id: "T-001".to_string(),
            name: "Logística Centro".to_string(),
            vehicle: "Fiat Fiorino".to_string(),
            transportist_type: TransportistType::LongDistance,
            zones: vec!["Córdoba".to_string()],
        };
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["type"], "long-distance");
        assert!(t.serves("Río Cuarto", "Córdoba"));
        assert!(!t.serves("Godoy Cruz", "Mendoza"));
    }
}
