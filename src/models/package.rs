//! Modelo de Package
//!
//! Bulto de un pedido: peso, cantidad, valor declarado y tipo de servicio,
//! junto con las franjas de peso que indexan el tarifario.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Franja de peso con límite superior inclusivo
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WeightBracket {
    #[serde(rename = "0-5")]
    UpTo5,
    #[serde(rename = "5-10")]
    UpTo10,
    #[serde(rename = "10-15")]
    UpTo15,
    #[serde(rename = "15-20")]
    UpTo20,
    #[serde(rename = "20-25")]
    UpTo25,
}

impl WeightBracket {
    pub const ALL: [WeightBracket; 5] = [
        WeightBracket::UpTo5,
        WeightBracket::UpTo10,
        WeightBracket::UpTo15,
        WeightBracket::UpTo20,
        WeightBracket::UpTo25,
    ];

    /// Límite superior en kg
    pub fn upper_bound(&self) -> Decimal {
        match self {
            WeightBracket::UpTo5 => Decimal::from(5),
            WeightBracket::UpTo10 => Decimal::from(10),
            WeightBracket::UpTo15 => Decimal::from(15),
            WeightBracket::UpTo20 => Decimal::from(20),
            WeightBracket::UpTo25 => Decimal::from(25),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WeightBracket::UpTo5 => "0-5",
            WeightBracket::UpTo10 => "5-10",
            WeightBracket::UpTo15 => "10-15",
            WeightBracket::UpTo20 => "15-20",
            WeightBracket::UpTo25 => "20-25",
        }
    }

    /// Franja para un peso. Los pesos por encima de 25 kg caen en la última
    /// franja; el segundo valor indica ese desborde.
    pub fn for_weight(weight_kg: Decimal) -> (WeightBracket, bool) {
        Self::ALL
            .iter()
            .find(|bracket| weight_kg <= bracket.upper_bound())
            .map(|bracket| (*bracket, false))
            .unwrap_or((WeightBracket::UpTo25, true))
    }
}

impl fmt::Display for WeightBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeightBracket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|bracket| bracket.as_str() == s.trim())
            .copied()
            .ok_or_else(|| format!("unknown weight bracket '{}'", s))
    }
}

/// Tipo de servicio contratado
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceType {
    /// Retiro en origen y entrega en agencia de destino
    Standard,
    /// Igual que estándar, con prioridad de despacho
    Express,
    /// Retiro y entrega en domicilio, sin paso por agencia
    DoorToDoor,
}

impl ServiceType {
    pub fn skips_agency(&self) -> bool {
        matches!(self, ServiceType::DoorToDoor)
    }
}

/// Forma de pago del envío
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentType {
    Origin,
    Destination,
}

/// Bulto de un pedido
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    /// Peso en kg
    pub weight: Decimal,
    pub quantity: u32,
    pub declared_value: Decimal,
    pub service_type: ServiceType,
}

impl Package {
    pub fn weight_bracket(&self) -> WeightBracket {
        WeightBracket::for_weight(self.weight).0
    }
}
