//! Liquidación a transportistas
//!
//! Suma una tarifa por pedido más una tarifa por kg sobre los pedidos de las
//! hojas de ruta completadas del transportista. La agregación es determinista:
//! las hojas se ordenan por fecha de creación y código.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::PaymentPolicy;
use crate::models::{CarrierPayment, Order, Route, RouteSheetPayment, RouteStatus};
use crate::repositories::Store;
use crate::utils::errors::{not_found_error, AppResult};
use crate::utils::money::round_money;

/// Liquidación a partir de rutas y pedidos ya leídos
pub fn accrue(transportist_id: &str, routes: &[Route], orders: &[Order], policy: &PaymentPolicy) -> CarrierPayment {
    let by_id: HashMap<Uuid, &Order> = orders.iter().map(|o| (o.id, o)).collect();

    let mut completed: Vec<&Route> = routes
        .iter()
        .filter(|r| r.transportist_id == transportist_id && r.status == RouteStatus::Completed)
        .collect();
    completed.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.code.cmp(&b.code)));

    let sheets: Vec<RouteSheetPayment> = completed
        .into_iter()
        .map(|route| {
            let sheet_orders: Vec<&Order> = route.order_ids.iter().filter_map(|id| by_id.get(id).copied()).collect();
            let order_count = sheet_orders.len() as u32;
            let total_weight: Decimal = sheet_orders.iter().map(|o| o.package.weight).sum();
            let amount = round_money(policy.per_order * Decimal::from(order_count) + policy.per_kg * total_weight);

            RouteSheetPayment {
                route_id: route.id,
                code: route.code.clone(),
                order_count,
                total_weight,
                amount,
                completed_at: route.completed_at,
            }
        })
        .collect();

    CarrierPayment {
        transportist_id: transportist_id.to_string(),
        total: sheets.iter().map(|s| s.amount).sum(),
        sheets,
    }
}

pub struct PaymentService {
    store: Arc<dyn Store>,
    policy: PaymentPolicy,
}

impl PaymentService {
    pub fn new(store: Arc<dyn Store>, policy: PaymentPolicy) -> Self {
        Self { store, policy }
    }

    pub async fn compute_carrier_payment(&self, transportist_id: &str) -> AppResult<CarrierPayment> {
        if self.store.get_transportist(transportist_id).await?.is_none() {
            return Err(not_found_error("Transportist", transportist_id));
        }

        let routes = self.store.get_routes().await?;
        let orders = self.store.get_orders().await?;
        let payment = accrue(transportist_id, &routes, &orders, &self.policy);

        log::info!(
            "💰 Liquidación {}: {} hojas, total {}",
            transportist_id,
            payment.sheets.len(),
            payment.total
        );
        Ok(payment)
    }
}
