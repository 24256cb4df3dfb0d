//! Modelo de Order
//!
//! Pedido de envío con su desglose de costos, su estado y el historial de
//! eventos. Los nombres de campo en JSON son los que consumen las vistas
//! de impresión y exportación existentes.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::package::{Package, PaymentType, ServiceType};
use crate::utils::matching::same_location;

/// Remitente o destinatario
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    pub name: String,
    pub national_id: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub address: String,
    pub city: String,
    pub province: String,
    #[serde(default)]
    pub postal_code: String,
}

impl Party {
    /// Ciudad o provincia igual a `location`
    pub fn is_located_in(&self, location: &str) -> bool {
        same_location(&self.city, location) || same_location(&self.province, location)
    }
}

/// Desglose de costos de un envío. Todos los importes son derivados.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub freight: Decimal,
    pub insurance: Decimal,
    pub admin_fees: Decimal,
    pub iva: Decimal,
    pub thermoseal: Decimal,
    pub total: Decimal,
}

impl CostBreakdown {
    /// Flete + seguro + gastos administrativos (base del IVA)
    pub fn subtotal(&self) -> Decimal {
        self.freight + self.insurance + self.admin_fees
    }

    /// `total` coincide con la suma de sus cinco componentes
    pub fn is_consistent(&self) -> bool {
        self.total == self.subtotal() + self.iva + self.thermoseal
    }
}

/// Estado de un pedido
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    PendingCollection,
    InTransit,
    AtDestinationAgency,
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::PendingCollection,
        OrderStatus::InTransit,
        OrderStatus::AtDestinationAgency,
        OrderStatus::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PendingCollection => "pending-collection",
            OrderStatus::InTransit => "in-transit",
            OrderStatus::AtDestinationAgency => "at-destination-agency",
            OrderStatus::Delivered => "delivered",
        }
    }

    /// Etiqueta legible que se guarda en el historial
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::PendingCollection => "Pendiente de retiro",
            OrderStatus::InTransit => "En tránsito",
            OrderStatus::AtDestinationAgency => "En agencia de destino",
            OrderStatus::Delivered => "Entregado",
        }
    }

    /// Tabla de transiciones. `in-transit -> delivered` sólo para puerta a puerta.
    pub fn successors(&self, service: ServiceType) -> &'static [OrderStatus] {
        match (self, service.skips_agency()) {
            (OrderStatus::PendingCollection, _) => &[OrderStatus::InTransit],
            (OrderStatus::InTransit, true) => &[OrderStatus::AtDestinationAgency, OrderStatus::Delivered],
            (OrderStatus::InTransit, false) => &[OrderStatus::AtDestinationAgency],
            (OrderStatus::AtDestinationAgency, _) => &[OrderStatus::Delivered],
            (OrderStatus::Delivered, _) => &[],
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus, service: ServiceType) -> bool {
        self.successors(service).contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|status| status.as_str() == s.trim())
            .copied()
            .ok_or_else(|| format!("unknown order status '{}'", s))
    }
}

/// Evento del historial de un pedido
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub date: DateTime<Utc>,
    pub status: String,
    pub location: String,
    pub description: String,
}

impl HistoryEntry {
    pub fn new(status: OrderStatus, location: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            date: Utc::now(),
            status: status.label().to_string(),
            location: location.into(),
            description: description.into(),
        }
    }
}

/// Historial de sólo-agregado, ordenado del más reciente al más antiguo
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct History(Vec<HistoryEntry>);

impl History {
    pub fn seeded(entry: HistoryEntry) -> Self {
        Self(vec![entry])
    }

    /// Registra un evento; queda primero en la lista
    pub fn record(&mut self, entry: HistoryEntry) {
        self.0.insert(0, entry);
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.0
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.0.first()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Pedido
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub tracking_code: String,
    pub sender: Party,
    pub recipient: Party,
    pub package: Package,
    pub payment_type: PaymentType,
    pub thermoseal: Decimal,
    pub costs: CostBreakdown,
    pub status: OrderStatus,
    pub history: History,
    #[serde(default)]
    pub assigned_transportist: Option<String>,
    #[serde(default)]
    pub assigned_route: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    /// Contador de concurrencia optimista, lo incrementa el store
    #[serde(default)]
    pub version: u64,
}

impl Order {
    /// Remitente o destinatario ubicados en `location`
    pub fn touches(&self, location: &str) -> bool {
        self.sender.is_located_in(location) || self.recipient.is_located_in(location)
    }

    /// Antigüedad del pedido al instante `now`
    pub fn age_at(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.created_at
    }

    pub fn is_assigned(&self) -> bool {
        self.assigned_transportist.is_some()
    }

    /// Quita transportista y ruta asignados
    pub fn clear_assignment(&mut self) {
        self.assigned_transportist = None;
        self.assigned_route = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_only_moves_to_in_transit() {
        for service in [ServiceType::Standard, ServiceType::Express, ServiceType::DoorToDoor] {
            assert_eq!(
                OrderStatus::PendingCollection.successors(service),
                &[OrderStatus::InTransit]
            );
        }
    }

    #[test]
    fn test_delivered_is_terminal() {
        for next in OrderStatus::ALL {
            assert!(!OrderStatus::Delivered.can_transition_to(next, ServiceType::DoorToDoor));
        }
        assert!(OrderStatus::Delivered.is_terminal());
    }

    #[test]
    fn test_door_to_door_skips_agency() {
        assert!(OrderStatus::InTransit.can_transition_to(OrderStatus::Delivered, ServiceType::DoorToDoor));
        assert!(!OrderStatus::InTransit.can_transition_to(OrderStatus::Delivered, ServiceType::Standard));
        assert!(OrderStatus::InTransit.can_transition_to(OrderStatus::AtDestinationAgency, ServiceType::Standard));
    }

    #[test]
    fn test_no_backward_transitions() {
        assert!(!OrderStatus::InTransit.can_transition_to(OrderStatus::PendingCollection, ServiceType::Standard));
        assert!(!OrderStatus::AtDestinationAgency.can_transition_to(OrderStatus::InTransit, ServiceType::Standard));
    }

    #[test]
    fn test_status_parse_rejects_unknown() {
        assert_eq!("in-transit".parse::<OrderStatus>(), Ok(OrderStatus::InTransit));
        assert!("lost".parse::<OrderStatus>().is_err());
        assert!("In-Transit".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_history_is_newest_first() {
        let mut history = History::seeded(HistoryEntry::new(OrderStatus::PendingCollection, "Córdoba", "Pedido creado"));
        history.record(HistoryEntry::new(OrderStatus::InTransit, "Córdoba", "Retirado"));

        assert_eq!(history.len(), 2);
        assert_eq!(history.latest().map(|e| e.description.as_str()), Some("Retirado"));
        assert_eq!(history.entries()[1].description, "Pedido creado");
        assert_eq!(history.entries()[0].status, "En tránsito");
    }

    #[test]
    fn test_party_location_match() {
        let party = Party {
            city: "Villa María".to_string(),
            province: "Córdoba".to_string(),
            ..Party::default()
        };
        assert!(party.is_located_in("córdoba"));
        assert!(party.is_located_in("VILLA MARÍA"));
        assert!(!party.is_located_in("Villa"));
    }
}
