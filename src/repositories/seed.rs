//! Datos iniciales
//!
//! Tarifario vigente, transportistas y agencias de demostración.

use crate::models::{Agency, RateTable, Transportist, TransportistType, DEFAULT_PROVINCE};
use crate::repositories::memory_store::Dataset;

/// Tarifario por defecto (ARS), franjas 0-5 / 5-10 / 10-15 / 15-20 / 20-25 kg
pub fn default_rate_table() -> RateTable {
    RateTable::from_rows(&[
        ("Buenos Aires", [2500, 3000, 3500, 4000, 4500]),
        ("CABA", [2200, 2700, 3200, 3700, 4200]),
        ("Córdoba", [2800, 3300, 3800, 4300, 4800]),
        ("Santa Fe", [2800, 3300, 3800, 4300, 4800]),
        ("Mendoza", [3200, 3800, 4400, 5000, 5600]),
        (DEFAULT_PROVINCE, [3500, 4200, 4900, 5600, 6300]),
    ])
}

pub fn demo_transportists() -> Vec<Transportist> {
    vec![
        Transportist {
            id: "T-001".to_string(),
            name: "Logística Centro".to_string(),
            vehicle: "Fiat Fiorino AB123CD".to_string(),
            transportist_type: TransportistType::Local,
            zones: vec!["Córdoba".to_string()],
        },
        Transportist {
            id: "T-002".to_string(),
            name: "Cuyo Express".to_string(),
            vehicle: "Renault Kangoo AC456EF".to_string(),
            transportist_type: TransportistType::Local,
            zones: vec!["Mendoza".to_string(), "San Juan".to_string()],
        },
        Transportist {
            id: "T-003".to_string(),
            name: "Transporte Federal".to_string(),
            vehicle: "Mercedes-Benz Atego AD789GH".to_string(),
            transportist_type: TransportistType::LongDistance,
            zones: vec![
                "Buenos Aires".to_string(),
                "Córdoba".to_string(),
                "Santa Fe".to_string(),
                "Mendoza".to_string(),
            ],
        },
    ]
}

pub fn demo_agencies() -> Vec<Agency> {
    let agency = |id: &str, name: &str, address: &str, city: &str, province: &str, lat: f64, lng: f64| Agency {
        id: id.to_string(),
        name: name.to_string(),
        address: address.to_string(),
        city: city.to_string(),
        province: province.to_string(),
        lat,
        lng,
    };

    vec![
        agency("A-CBA", "Agencia Córdoba Centro", "Av. Colón 1200", "Córdoba", "Córdoba", -31.4135, -64.1970),
        agency("A-MZA", "Agencia Mendoza", "Av. San Martín 900", "Mendoza", "Mendoza", -32.8895, -68.8458),
        agency("A-ROS", "Agencia Rosario", "Bv. Oroño 500", "Rosario", "Santa Fe", -32.9442, -60.6505),
        agency("A-CABA", "Agencia Once", "Av. Rivadavia 2800", "CABA", "CABA", -34.6097, -58.4044),
    ]
}

/// Dataset inicial para el store en memoria
pub fn demo_dataset() -> Dataset {
    Dataset {
        transportists: demo_transportists().into_iter().map(|t| (t.id.clone(), t)).collect(),
        agencies: demo_agencies().into_iter().map(|a| (a.id.clone(), a)).collect(),
        rate_table: default_rate_table(),
        ..Dataset::default()
    }
}

#[cfg(test)]
pub fn sample_order(tracking_code: &str, sender_province: &str) -> crate::models::Order {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use crate::models::{
        CostBreakdown, History, HistoryEntry, Order, OrderStatus, Package, Party, PaymentType, ServiceType,
    };

    let party = |name: &str, province: &str| Party {
        name: name.to_string(),
        national_id: "30123456".to_string(),
        phone: "3514567890".to_string(),
        email: None,
        address: format!("Calle {} 100", name),
        city: province.to_string(),
        province: province.to_string(),
        postal_code: "5000".to_string(),
    };

    Order {
        id: Uuid::new_v4(),
        tracking_code: tracking_code.to_string(),
        sender: party("Remitente", sender_province),
        recipient: party("Destinatario", "Buenos Aires"),
        package: Package {
            weight: Decimal::from(3),
            quantity: 1,
            declared_value: Decimal::from(5000),
            service_type: ServiceType::Standard,
        },
        payment_type: PaymentType::Origin,
        thermoseal: Decimal::ZERO,
        costs: CostBreakdown {
            freight: Decimal::from(2500),
            insurance: Decimal::from(500),
            admin_fees: Decimal::from(375),
            iva: Decimal::new(70875, 2),
            thermoseal: Decimal::ZERO,
            total: Decimal::new(408375, 2),
        },
        status: OrderStatus::PendingCollection,
        history: History::seeded(HistoryEntry::new(OrderStatus::PendingCollection, sender_province, "Pedido creado")),
        assigned_transportist: None,
        assigned_route: None,
        created_at: Utc::now(),
        version: 0,
    }
}

#[cfg(test)]
pub fn sample_route(transportist_id: &str) -> crate::models::Route {
    use chrono::Utc;
    use uuid::Uuid;

    use crate::models::{Route, RouteLeg, RouteStatus};

    Route {
        id: Uuid::new_v4(),
        code: format!("HR-TEST-{}", transportist_id),
        origin: "Córdoba".to_string(),
        destination: "Rosario".to_string(),
        stops: Vec::new(),
        transportist_id: transportist_id.to_string(),
        order_ids: Vec::new(),
        status: RouteStatus::Planned,
        leg_type: RouteLeg::Collection,
        optimized: false,
        created_at: Utc::now(),
        activated_at: None,
        completed_at: None,
    }
}
