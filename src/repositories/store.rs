//! Contrato del store
//!
//! El motor no conoce el almacenamiento concreto: todo pasa por este trait.
//! Las escrituras de pedidos usan concurrencia optimista sobre `Order::version`.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Agency, Order, RateTable, Route, RouteStatus, Transportist};
use crate::utils::errors::AppResult;

/// Pedido a escribir junto con la versión leída
#[derive(Debug, Clone)]
pub struct VersionedOrder {
    pub order: Order,
    pub expected_version: u64,
}

impl From<Order> for VersionedOrder {
    fn from(order: Order) -> Self {
        let expected_version = order.version;
        Self { order, expected_version }
    }
}

/// Ruta leída con su estado: al confirmar debe seguir existiendo así
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteGuard {
    pub route_id: Uuid,
    pub status: RouteStatus,
}

impl From<&Route> for RouteGuard {
    fn from(route: &Route) -> Self {
        Self {
            route_id: route.id,
            status: route.status,
        }
    }
}

/// Escritura atómica de varios pedidos y rutas
#[derive(Debug, Clone, Default)]
pub struct StoreBatch {
    pub orders: Vec<VersionedOrder>,
    pub routes: Vec<Route>,
    /// Si alguna ruta ya no existe o cambió de estado, `Conflict` y nada cambia.
    /// Con `clear_routes` tampoco puede haber rutas fuera de esta lista.
    pub route_guards: Vec<RouteGuard>,
    /// Borra todas las rutas antes de escribir `routes`
    pub clear_routes: bool,
}

impl StoreBatch {
    /// Sin escrituras ni verificaciones
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty() && self.routes.is_empty() && self.route_guards.is_empty() && !self.clear_routes
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn get_orders(&self) -> AppResult<Vec<Order>>;

    async fn get_order(&self, tracking_code: &str) -> AppResult<Option<Order>>;

    async fn get_order_by_id(&self, id: Uuid) -> AppResult<Option<Order>>;

    /// Alta de un pedido nuevo. `Conflict` si el código o el id ya existen.
    async fn insert_order(&self, order: &Order) -> AppResult<Order>;

    /// Escribe el pedido si su versión almacenada sigue siendo `expected_version`;
    /// si no, `Conflict` y nada cambia. Devuelve el pedido con la versión nueva.
    async fn save_order(&self, order: &Order, expected_version: u64) -> AppResult<Order>;

    async fn get_routes(&self) -> AppResult<Vec<Route>>;

    async fn get_route(&self, id: Uuid) -> AppResult<Option<Route>>;

    async fn save_route(&self, route: &Route) -> AppResult<()>;

    /// Reemplaza el conjunto completo de rutas
    async fn save_routes(&self, routes: &[Route]) -> AppResult<()>;

    async fn get_transportists(&self) -> AppResult<Vec<Transportist>>;

    async fn get_transportist(&self, id: &str) -> AppResult<Option<Transportist>>;

    async fn save_transportist(&self, transportist: &Transportist) -> AppResult<()>;

    async fn get_agencies(&self) -> AppResult<Vec<Agency>>;

    async fn save_agency(&self, agency: &Agency) -> AppResult<()>;

    async fn get_rate_table(&self) -> AppResult<RateTable>;

    async fn save_rate_table(&self, table: &RateTable) -> AppResult<()>;

    /// Registra un código emitido. `false` si ya había sido emitido alguna vez.
    async fn reserve_tracking_code(&self, code: &str) -> AppResult<bool>;

    /// Aplica el lote completo o nada
    async fn commit(&self, batch: StoreBatch) -> AppResult<()>;
}
