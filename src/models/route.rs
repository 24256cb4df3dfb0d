//! Modelo de Route
//!
//! Este módulo contiene la hoja de ruta persistida y las estructuras derivadas
//! de la optimización por transportista (paradas con prioridad).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Estado de la ruta
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RouteStatus {
    Planned,
    #[serde(alias = "in-curso")]
    InProgress,
    Completed,
}

impl RouteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteStatus::Planned => "planned",
            RouteStatus::InProgress => "in-progress",
            RouteStatus::Completed => "completed",
        }
    }

    /// Siguiente estado; las rutas sólo avanzan
    pub fn next(&self) -> Option<RouteStatus> {
        match self {
            RouteStatus::Planned => Some(RouteStatus::InProgress),
            RouteStatus::InProgress => Some(RouteStatus::Completed),
            RouteStatus::Completed => None,
        }
    }
}

impl fmt::Display for RouteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tramo que cubre la ruta
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RouteLeg {
    Collection,
    Delivery,
}

impl fmt::Display for RouteLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteLeg::Collection => f.write_str("collection"),
            RouteLeg::Delivery => f.write_str("delivery"),
        }
    }
}

/// Hoja de ruta asignable a un transportista
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: Uuid,
    pub code: String,
    pub origin: String,
    pub destination: String,
    pub stops: Vec<String>,
    pub transportist_id: String,
    pub order_ids: Vec<Uuid>,
    pub status: RouteStatus,
    pub leg_type: RouteLeg,
    #[serde(default)]
    pub optimized: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Route {
    pub fn contains_order(&self, order_id: Uuid) -> bool {
        self.order_ids.contains(&order_id)
    }

    /// Origen, paradas y destino en orden de recorrido
    pub fn waypoints(&self) -> Vec<&str> {
        std::iter::once(self.origin.as_str())
            .chain(self.stops.iter().map(String::as_str))
            .chain(std::iter::once(self.destination.as_str()))
            .collect()
    }
}

/// Prioridad de una parada
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StopPriority {
    High,
    Medium,
    Low,
}

impl StopPriority {
    pub fn weight(&self) -> u8 {
        match self {
            StopPriority::High => 3,
            StopPriority::Medium => 2,
            StopPriority::Low => 1,
        }
    }
}

/// Parada derivada: pedidos que comparten dirección
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptimizedStop {
    pub address: String,
    pub order_ids: Vec<Uuid>,
    /// Minutos
    pub estimated_duration: u32,
    pub priority: StopPriority,
}

/// Resultado de la optimización para un transportista
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptimizedRoute {
    pub route_id: Uuid,
    pub code: String,
    pub transportist_id: String,
    pub leg_type: RouteLeg,
    pub stops: Vec<OptimizedStop>,
    /// Aproximación: 5 unidades por parada
    pub total_distance: u32,
    /// Minutos
    pub estimated_time: u32,
    pub created_at: DateTime<Utc>,
}

impl OptimizedRoute {
    pub fn order_count(&self) -> usize {
        self.stops.iter().map(|s| s.order_ids.len()).sum()
    }
}
