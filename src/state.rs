//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum. Todos los servicios comparten el mismo store.

use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::Store;
use crate::services::{
    CostCalculator, GeoService, OrderService, PaymentService, RateTableService, RouteAllocator, TrackingCodeIssuer,
};

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub store: Arc<dyn Store>,
    pub rates: Arc<RateTableService>,
    pub orders: Arc<OrderService>,
    pub routes: Arc<RouteAllocator>,
    pub payments: Arc<PaymentService>,
    pub geo: Arc<GeoService>,
}

impl AppState {
    pub fn new(config: EnvironmentConfig, store: Arc<dyn Store>) -> Self {
        let rates = Arc::new(RateTableService::new(store.clone()));
        let costs = Arc::new(CostCalculator::new(rates.clone()));
        let codes = Arc::new(TrackingCodeIssuer::new(store.clone()));

        Self {
            orders: Arc::new(OrderService::new(store.clone(), costs, codes)),
            routes: Arc::new(RouteAllocator::new(store.clone(), config.allocation.clone())),
            payments: Arc::new(PaymentService::new(store.clone(), config.payment.clone())),
            geo: Arc::new(GeoService::new(store.clone())),
            rates,
            store,
            config,
        }
    }
}
