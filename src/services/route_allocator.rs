//! Asignación de pedidos a rutas
//!
//! Generación de rutas manuales (por coincidencia de localidad), rutas
//! optimizadas por transportista (agrupación por dirección y prioridad de
//! paradas), activación, finalización y limpieza administrativa.
//!
//! Todas las operaciones trabajan sobre una foto de los pedidos leída del
//! store; las escrituras de varios pedidos van en un único `StoreBatch` con
//! la versión leída de cada pedido, así que un cambio concurrente aborta el
//! lote completo con `Conflict`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::AllocationPolicy;
use crate::dto::route_dto::{
    ActivationReport, ClearReport, DroppedOrder, GenerateRouteRequest, RouteSheet, RouteSheetOrder,
};
use crate::models::{
    HistoryEntry, OptimizedRoute, OptimizedStop, Order, OrderStatus, Route, RouteLeg, RouteStatus,
    StopPriority, Transportist,
};
use crate::repositories::{RouteGuard, Store, StoreBatch};
use crate::services::geo_service::route_map_url;
use crate::utils::errors::{invalid_transition, not_found_error, AppError, AppResult, FieldError};

/// Minutos de traslado que se suman por cada parada
pub const INTER_STOP_MINUTES: u32 = 15;
/// Distancia nominal por parada (aproximación, no es una distancia real)
pub const DISTANCE_PER_STOP: u32 = 5;
const MIN_STOP_MINUTES: u32 = 10;
const MINUTES_PER_ORDER: u32 = 5;

/// Código legible de hoja de ruta: `HR-AAAAMMDD-XXXX`
pub fn route_code(id: Uuid, created_at: DateTime<Utc>) -> String {
    let suffix = id.simple().to_string()[..4].to_uppercase();
    format!("HR-{}-{}", created_at.format("%Y%m%d"), suffix)
}

/// Pedidos candidatos de un transportista para un tramo
pub fn select_orders<'a>(transportist: &Transportist, leg: RouteLeg, orders: &'a [Order]) -> Vec<&'a Order> {
    orders
        .iter()
        .filter(|order| match leg {
            RouteLeg::Collection => {
                order.status == OrderStatus::PendingCollection
                    && !order.is_assigned()
                    && transportist.serves(&order.sender.city, &order.sender.province)
            }
            RouteLeg::Delivery => {
                matches!(order.status, OrderStatus::InTransit | OrderStatus::AtDestinationAgency)
                    && order.assigned_transportist.as_deref() == Some(transportist.id.as_str())
                    && transportist.serves(&order.recipient.city, &order.recipient.province)
            }
        })
        .collect()
}

fn stop_address(order: &Order, leg: RouteLeg) -> &str {
    match leg {
        RouteLeg::Collection => &order.sender.address,
        RouteLeg::Delivery => &order.recipient.address,
    }
}

/// Prioridad de una parada según antigüedad y valor declarado total
pub fn stop_priority(orders: &[&Order], now: DateTime<Utc>, policy: &AllocationPolicy) -> StopPriority {
    let max_age = Duration::days(policy.high_priority_age_days);
    let value: Decimal = orders.iter().map(|o| o.package.declared_value).sum();

    if orders.iter().any(|o| o.age_at(now) > max_age) || value > policy.high_value_threshold {
        StopPriority::High
    } else if value < policy.low_value_threshold {
        StopPriority::Low
    } else {
        StopPriority::Medium
    }
}

/// Arma la ruta optimizada a partir de los pedidos seleccionados.
/// `None` si no hay pedidos: no hay nada que recorrer.
pub fn build_optimized_route(
    transportist_id: &str,
    leg: RouteLeg,
    selected: &[&Order],
    now: DateTime<Utc>,
    policy: &AllocationPolicy,
) -> Option<OptimizedRoute> {
    if selected.is_empty() {
        return None;
    }

    // orden estable de entrada: antigüedad y luego código
    let mut selected = selected.to_vec();
    selected.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.tracking_code.cmp(&b.tracking_code))
    });

    let mut groups: Vec<(String, Vec<&Order>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for order in selected {
        let address = stop_address(order, leg);
        match index.get(address) {
            Some(&i) => groups[i].1.push(order),
            None => {
                index.insert(address, groups.len());
                groups.push((address.to_string(), vec![order]));
            }
        }
    }

    let mut stops: Vec<OptimizedStop> = groups
        .into_iter()
        .map(|(address, orders)| {
            let count = orders.len() as u32;
            OptimizedStop {
                priority: stop_priority(&orders, now, policy),
                order_ids: orders.iter().map(|o| o.id).collect(),
                estimated_duration: MIN_STOP_MINUTES.max(count * MINUTES_PER_ORDER),
                address,
            }
        })
        .collect();

    stops.sort_by(|a, b| {
        b.priority
            .weight()
            .cmp(&a.priority.weight())
            .then_with(|| b.order_ids.len().cmp(&a.order_ids.len()))
    });

    let stop_count = stops.len() as u32;
    let estimated_time = stops.iter().map(|s| s.estimated_duration).sum::<u32>() + INTER_STOP_MINUTES * stop_count;
    let route_id = Uuid::new_v4();

    Some(OptimizedRoute {
        route_id,
        code: route_code(route_id, now),
        transportist_id: transportist_id.to_string(),
        leg_type: leg,
        total_distance: stop_count * DISTANCE_PER_STOP,
        estimated_time,
        stops,
        created_at: now,
    })
}

/// Motivo por el que un pedido ya no puede activarse en la ruta
fn ineligibility(order: &Order, route: &Route) -> Option<String> {
    if let Some(assigned) = order.assigned_transportist.as_deref() {
        if assigned != route.transportist_id {
            return Some(format!("assigned to transportist {}", assigned));
        }
    }
    let expected = match route.leg_type {
        RouteLeg::Collection => order.status == OrderStatus::PendingCollection,
        RouteLeg::Delivery => matches!(order.status, OrderStatus::InTransit | OrderStatus::AtDestinationAgency),
    };
    if !expected {
        return Some(format!("status is {}", order.status));
    }
    None
}

pub struct RouteAllocator {
    store: Arc<dyn Store>,
    policy: AllocationPolicy,
}

impl RouteAllocator {
    pub fn new(store: Arc<dyn Store>, policy: AllocationPolicy) -> Self {
        Self { store, policy }
    }

    async fn transportist(&self, id: &str) -> AppResult<Transportist> {
        self.store
            .get_transportist(id)
            .await?
            .ok_or_else(|| not_found_error("Transportist", id))
    }

    async fn route(&self, id: Uuid) -> AppResult<Route> {
        self.store
            .get_route(id)
            .await?
            .ok_or_else(|| not_found_error("Route", &id.to_string()))
    }

    pub async fn list(&self) -> AppResult<Vec<Route>> {
        let mut routes = self.store.get_routes().await?;
        routes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.code.cmp(&b.code)));
        Ok(routes)
    }

    /// Genera una ruta manual con los pedidos pendientes que tocan origen,
    /// alguna parada o destino. La membresía queda fija desde acá.
    pub async fn generate(&self, request: GenerateRouteRequest) -> AppResult<Route> {
        let mut errors = Vec::new();
        if request.origin.trim().is_empty() {
            errors.push(FieldError::new("origin", "required", "El origen es obligatorio"));
        }
        if request.destination.trim().is_empty() {
            errors.push(FieldError::new("destination", "required", "El destino es obligatorio"));
        }
        if request.transportist_id.trim().is_empty() {
            errors.push(FieldError::new("transportistId", "required", "El transportista es obligatorio"));
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let transportist = self.transportist(request.transportist_id.trim()).await?;

        let origin = request.origin.trim().to_string();
        let destination = request.destination.trim().to_string();
        let stops: Vec<String> = request
            .stops
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let orders = self.store.get_orders().await?;
        let order_ids: Vec<Uuid> = orders
            .iter()
            .filter(|o| o.status == OrderStatus::PendingCollection)
            .filter(|o| {
                o.touches(&origin) || o.touches(&destination) || stops.iter().any(|s| o.touches(s))
            })
            .map(|o| o.id)
            .collect();

        let id = Uuid::new_v4();
        let created_at = Utc::now();
        let route = Route {
            id,
            code: route_code(id, created_at),
            origin,
            destination,
            stops,
            transportist_id: transportist.id.clone(),
            order_ids,
            status: RouteStatus::Planned,
            leg_type: RouteLeg::Collection,
            optimized: false,
            created_at,
            activated_at: None,
            completed_at: None,
        };

        self.store.save_route(&route).await?;
        log::info!(
            "🗺️ Ruta {} generada para {}: {} -> {} con {} pedidos",
            route.code,
            transportist.name,
            route.origin,
            route.destination,
            route.order_ids.len()
        );
        Ok(route)
    }

    /// Ruta optimizada para un transportista y un tramo; se persiste como
    /// hoja planificada. `None` cuando no hay pedidos que recorrer.
    pub async fn generate_optimized_route_for_transportist(
        &self,
        transportist_id: &str,
        leg: RouteLeg,
    ) -> AppResult<Option<OptimizedRoute>> {
        let transportist = self.transportist(transportist_id).await?;
        let orders = self.store.get_orders().await?;
        let selected = select_orders(&transportist, leg, &orders);

        let optimized = match build_optimized_route(&transportist.id, leg, &selected, Utc::now(), &self.policy) {
            Some(optimized) => optimized,
            None => {
                log::info!("📭 Sin pedidos de {} para {}", leg, transportist.name);
                return Ok(None);
            }
        };

        let addresses: Vec<String> = optimized.stops.iter().map(|s| s.address.clone()).collect();
        let (origin, destination) = match (addresses.first(), addresses.last()) {
            (Some(first), Some(last)) => (first.clone(), last.clone()),
            _ => return Err(AppError::Internal("optimized route without stops".into())),
        };
        let middle = if addresses.len() > 2 {
            addresses[1..addresses.len() - 1].to_vec()
        } else {
            Vec::new()
        };

        let route = Route {
            id: optimized.route_id,
            code: optimized.code.clone(),
            origin,
            destination,
            stops: middle,
            transportist_id: transportist.id.clone(),
            order_ids: optimized.stops.iter().flat_map(|s| s.order_ids.iter().copied()).collect(),
            status: RouteStatus::Planned,
            leg_type: leg,
            optimized: true,
            created_at: optimized.created_at,
            activated_at: None,
            completed_at: None,
        };
        self.store.save_route(&route).await?;

        log::info!(
            "🚚 Ruta optimizada {} ({}) para {}: {} paradas, {} pedidos, {} min",
            optimized.code,
            leg,
            transportist.name,
            optimized.stops.len(),
            optimized.order_count(),
            optimized.estimated_time
        );
        Ok(Some(optimized))
    }

    /// planned -> in-progress. Asigna el transportista a cada pedido
    /// elegible y, en retiros, los pasa a en tránsito. Los pedidos que dejaron
    /// de ser elegibles se quitan de la ruta y se informan.
    pub async fn activate(&self, route_id: Uuid) -> AppResult<ActivationReport> {
        let mut route = self.route(route_id).await?;
        if route.status.next() != Some(RouteStatus::InProgress) {
            return Err(invalid_transition(route.status, RouteStatus::InProgress));
        }
        let transportist = self.transportist(&route.transportist_id).await?;

        let snapshot: HashMap<Uuid, Order> = self
            .store
            .get_orders()
            .await?
            .into_iter()
            .map(|o| (o.id, o))
            .collect();

        let mut batch = StoreBatch {
            route_guards: vec![RouteGuard::from(&route)],
            ..StoreBatch::default()
        };
        let mut activated = Vec::new();
        let mut dropped = Vec::new();
        let mut kept = Vec::new();

        for order_id in &route.order_ids {
            let order = match snapshot.get(order_id) {
                Some(order) => order,
                None => {
                    dropped.push(DroppedOrder {
                        order_id: *order_id,
                        tracking_code: None,
                        reason: "order not found".to_string(),
                    });
                    continue;
                }
            };

            if let Some(reason) = ineligibility(order, &route) {
                log::warn!("⚠️ Pedido {} excluido de la ruta {}: {}", order.tracking_code, route.code, reason);
                dropped.push(DroppedOrder {
                    order_id: *order_id,
                    tracking_code: Some(order.tracking_code.clone()),
                    reason,
                });
                continue;
            }

            let mut updated = order.clone();
            updated.assigned_transportist = Some(transportist.id.clone());
            updated.assigned_route = Some(route.id);
            let entry = match route.leg_type {
                RouteLeg::Collection => {
                    updated.status = OrderStatus::InTransit;
                    HistoryEntry::new(
                        OrderStatus::InTransit,
                        route.origin.clone(),
                        format!("Retirado por {} (hoja {})", transportist.name, route.code),
                    )
                }
                RouteLeg::Delivery => HistoryEntry::new(
                    updated.status,
                    route.destination.clone(),
                    format!("Asignado a reparto con {} (hoja {})", transportist.name, route.code),
                ),
            };
            updated.history.record(entry);

            activated.push(updated.tracking_code.clone());
            kept.push(*order_id);
            batch.orders.push(updated.into());
        }

        route.order_ids = kept;
        route.status = RouteStatus::InProgress;
        route.activated_at = Some(Utc::now());
        batch.routes.push(route.clone());

        self.store.commit(batch).await?;
        log::info!(
            "▶️ Ruta {} activada: {} pedidos, {} excluidos",
            route.code,
            activated.len(),
            dropped.len()
        );

        Ok(ActivationReport {
            route,
            activated,
            dropped,
        })
    }

    /// in-progress -> completed
    pub async fn complete(&self, route_id: Uuid) -> AppResult<Route> {
        let mut route = self.route(route_id).await?;
        if route.status.next() != Some(RouteStatus::Completed) {
            return Err(invalid_transition(route.status, RouteStatus::Completed));
        }

        // si otra operación borró o movió la ruta, `Conflict`
        let guard = RouteGuard::from(&route);
        route.status = RouteStatus::Completed;
        route.completed_at = Some(Utc::now());
        self.store
            .commit(StoreBatch {
                routes: vec![route.clone()],
                route_guards: vec![guard],
                ..StoreBatch::default()
            })
            .await?;

        log::info!("🏁 Ruta {} completada", route.code);
        Ok(route)
    }

    /// Borra todas las rutas y libera los pedidos asignados; los que estaban
    /// en tránsito vuelven a pendientes de retiro. Todo o nada.
    pub async fn clear_all(&self) -> AppResult<ClearReport> {
        let routes = self.store.get_routes().await?;
        let orders = self.store.get_orders().await?;

        // una activación o cierre concurrente cambia el estado de alguna ruta
        // leída y hace fallar el lote completo
        let mut batch = StoreBatch {
            route_guards: routes.iter().map(RouteGuard::from).collect(),
            clear_routes: true,
            ..StoreBatch::default()
        };
        let mut report = ClearReport {
            routes_removed: routes.len(),
            ..ClearReport::default()
        };

        for order in orders {
            if !order.is_assigned() && order.assigned_route.is_none() {
                continue;
            }

            let mut updated = order;
            updated.clear_assignment();
            let location = updated.sender.city.clone();
            if updated.status == OrderStatus::InTransit {
                updated.status = OrderStatus::PendingCollection;
                report.reverted_to_pending += 1;
            }
            updated.history.record(HistoryEntry::new(
                updated.status,
                location,
                "Asignación reiniciada por limpieza de rutas",
            ));

            report.orders_reset += 1;
            batch.orders.push(updated.into());
        }

        self.store.commit(batch).await?;
        log::warn!(
            "🧹 Rutas eliminadas: {}, pedidos liberados: {}, vueltos a pendiente: {}",
            report.routes_removed,
            report.orders_reset,
            report.reverted_to_pending
        );
        Ok(report)
    }

    /// Vista imprimible de la hoja de ruta
    pub async fn route_sheet(&self, route_id: Uuid) -> AppResult<RouteSheet> {
        let route = self.route(route_id).await?;
        let transportist = self.store.get_transportist(&route.transportist_id).await?;

        let mut orders = Vec::with_capacity(route.order_ids.len());
        for id in &route.order_ids {
            if let Some(order) = self.store.get_order_by_id(*id).await? {
                orders.push(RouteSheetOrder {
                    tracking_code: order.tracking_code,
                    status: order.status,
                    sender_name: order.sender.name,
                    sender_address: order.sender.address,
                    sender_city: order.sender.city,
                    recipient_name: order.recipient.name,
                    recipient_address: order.recipient.address,
                    recipient_city: order.recipient.city,
                    weight: order.package.weight,
                    quantity: order.package.quantity,
                    service_type: order.package.service_type,
                });
            }
        }

        let total_weight: Decimal = orders.iter().map(|o| o.weight).sum();
        let map_url = route_map_url(&route.waypoints());

        Ok(RouteSheet {
            route,
            transportist,
            orders,
            total_weight,
            map_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{seed::demo_dataset, seed::sample_order, InMemoryStore};

    fn allocator() -> (Arc<InMemoryStore>, RouteAllocator) {
        let store = Arc::new(InMemoryStore::with_dataset(demo_dataset()));
        (store.clone(), RouteAllocator::new(store, AllocationPolicy::default()))
    }

    fn order_at(code: &str, address: &str, value: i64, age_days: i64) -> Order {
        let mut order = sample_order(code, "Córdoba");
        order.sender.address = address.to_string();
        order.package.declared_value = Decimal::from(value);
        order.created_at = Utc::now() - Duration::days(age_days);
        order
    }

    #[test]
    fn test_route_code_format() {
        let id = Uuid::parse_str("abcdef12-0000-0000-0000-000000000000").unwrap();
        let at = DateTime::parse_from_rfc3339("2024-03-05T10:00:00Z").unwrap().with_timezone(&Utc);
        assert_eq!(route_code(id, at), "HR-20240305-ABCD");
    }

    #[test]
    fn test_stop_priority_rules() {
        let policy = AllocationPolicy::default();
        let now = Utc::now();

        let old = order_at("ENV-AAAA-AAAA", "Calle 1", 100, 3);
        assert_eq!(stop_priority(&[&old], now, &policy), StopPriority::High);

        let valuable = order_at("ENV-AAAA-AAAB", "Calle 1", 60_000, 0);
        assert_eq!(stop_priority(&[&valuable], now, &policy), StopPriority::High);

        let cheap = order_at("ENV-AAAA-AAAC", "Calle 1", 9_000, 0);
        assert_eq!(stop_priority(&[&cheap], now, &policy), StopPriority::Low);

        let middle = order_at("ENV-AAAA-AAAD", "Calle 1", 20_000, 1);
        assert_eq!(stop_priority(&[&middle], now, &policy), StopPriority::Medium);

        // el valor se suma por parada
        let a = order_at("ENV-AAAA-AAAE", "Calle 1", 6_000, 0);
        let b = order_at("ENV-AAAA-AAAF", "Calle 1", 6_000, 0);
        assert_eq!(stop_priority(&[&a, &b], now, &policy), StopPriority::Medium);
    }

    #[test]
    fn test_build_groups_and_sorts_stops() {
        let orders = vec![
            order_at("ENV-AAAA-AAA2", "Calle Baja 1", 1_000, 0),
            order_at("ENV-AAAA-AAA3", "Calle Media 2", 20_000, 0),
            order_at("ENV-AAAA-AAA4", "Calle Media 3", 15_000, 0),
            order_at("ENV-AAAA-AAA5", "Calle Media 3", 15_000, 0),
            order_at("ENV-AAAA-AAA6", "Calle Alta 4", 1_000, 5),
        ];
        let refs: Vec<&Order> = orders.iter().collect();
        let route =
            build_optimized_route("T-001", RouteLeg::Collection, &refs, Utc::now(), &AllocationPolicy::default()).unwrap();

        let addresses: Vec<&str> = route.stops.iter().map(|s| s.address.as_str()).collect();
        assert_eq!(addresses, vec!["Calle Alta 4", "Calle Media 3", "Calle Media 2", "Calle Baja 1"]);
        assert_eq!(route.stops[1].order_ids.len(), 2);
        assert_eq!(route.stops[1].estimated_duration, 10);
        assert_eq!(route.total_distance, 20);
        assert_eq!(route.estimated_time, 4 * 10 + 4 * 15);
        assert_eq!(route.order_count(), 5);
    }

    #[test]
    fn test_build_duration_grows_with_orders() {
        let orders: Vec<Order> = (0..3)
            .map(|i| order_at(&format!("ENV-AAAA-BBB{}", i + 2), "Calle 9", 20_000, 0))
            .collect();
        let refs: Vec<&Order> = orders.iter().collect();
        let route =
            build_optimized_route("T-001", RouteLeg::Collection, &refs, Utc::now(), &AllocationPolicy::default()).unwrap();
        assert_eq!(route.stops.len(), 1);
        assert_eq!(route.stops[0].estimated_duration, 15);
        assert_eq!(route.estimated_time, 30);
    }

    #[test]
    fn test_build_without_orders_is_none() {
        assert!(build_optimized_route("T-001", RouteLeg::Delivery, &[], Utc::now(), &AllocationPolicy::default()).is_none());
    }

    #[tokio::test]
    async fn test_optimized_collection_only_serves_zones() {
        let (store, routes) = allocator();
        let cordoba = store.insert_order(&sample_order("ENV-CCCC-CCCC", "Córdoba")).await.unwrap();
        store.insert_order(&sample_order("ENV-MMMM-MMMM", "Mendoza")).await.unwrap();

        let optimized = routes
            .generate_optimized_route_for_transportist("T-001", RouteLeg::Collection)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(optimized.stops.len(), 1);
        assert_eq!(optimized.stops[0].order_ids, vec![cordoba.id]);

        let persisted = store.get_route(optimized.route_id).await.unwrap().unwrap();
        assert!(persisted.optimized);
        assert_eq!(persisted.status, RouteStatus::Planned);
    }

    #[tokio::test]
    async fn test_optimized_without_matches_is_none() {
        let (store, routes) = allocator();
        store.insert_order(&sample_order("ENV-MMMM-MMMM", "Mendoza")).await.unwrap();
        let result = routes
            .generate_optimized_route_for_transportist("T-001", RouteLeg::Collection)
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(store.get_routes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_optimized_unknown_transportist() {
        let (_, routes) = allocator();
        let err = routes
            .generate_optimized_route_for_transportist("T-999", RouteLeg::Collection)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_generate_requires_fields() {
        let (_, routes) = allocator();
        let err = routes.generate(GenerateRouteRequest::default()).await.unwrap_err();
        assert_eq!(err.invalid_fields(), vec!["origin", "destination", "transportistId"]);
    }

    #[tokio::test]
    async fn test_generate_matches_by_location() {
        let (store, routes) = allocator();
        let cordoba = store.insert_order(&sample_order("ENV-CCCC-CCCC", "Córdoba")).await.unwrap();
        let mendoza = store.insert_order(&sample_order("ENV-MMMM-MMMM", "Mendoza")).await.unwrap();

        let route = routes
            .generate(GenerateRouteRequest {
                origin: "córdoba".to_string(),
                destination: "Rosario".to_string(),
                stops: vec!["Villa María".to_string(), " ".to_string()],
                transportist_id: "T-003".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(route.order_ids, vec![cordoba.id]);
        assert!(!route.contains_order(mendoza.id));
        assert_eq!(route.stops, vec!["Villa María".to_string()]);
        assert_eq!(route.status, RouteStatus::Planned);
    }

    #[tokio::test]
    async fn test_activate_assigns_and_moves_to_transit() {
        let (store, routes) = allocator();
        let order = store.insert_order(&sample_order("ENV-CCCC-CCCC", "Córdoba")).await.unwrap();
        let optimized = routes
            .generate_optimized_route_for_transportist("T-001", RouteLeg::Collection)
            .await
            .unwrap()
            .unwrap();

        let report = routes.activate(optimized.route_id).await.unwrap();
        assert_eq!(report.activated, vec!["ENV-CCCC-CCCC".to_string()]);
        assert!(report.dropped.is_empty());
        assert_eq!(report.route.status, RouteStatus::InProgress);

        let reloaded = store.get_order_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, OrderStatus::InTransit);
        assert_eq!(reloaded.assigned_transportist.as_deref(), Some("T-001"));
        assert_eq!(reloaded.assigned_route, Some(optimized.route_id));
        assert_eq!(reloaded.history.len(), 2);

        let err = routes.activate(optimized.route_id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_activate_drops_orders_taken_by_another_route() {
        let (store, routes) = allocator();
        store.insert_order(&sample_order("ENV-CCCC-CCCC", "Córdoba")).await.unwrap();

        let request = GenerateRouteRequest {
            origin: "Córdoba".to_string(),
            destination: "Buenos Aires".to_string(),
            stops: vec![],
            transportist_id: "T-003".to_string(),
        };
        let first = routes.generate(request.clone()).await.unwrap();
        let second = routes
            .generate(GenerateRouteRequest {
                transportist_id: "T-001".to_string(),
                ..request
            })
            .await
            .unwrap();

        routes.activate(first.id).await.unwrap();
        let report = routes.activate(second.id).await.unwrap();

        assert!(report.activated.is_empty());
        assert_eq!(report.dropped.len(), 1);
        assert!(report.route.order_ids.is_empty());
    }

    #[tokio::test]
    async fn test_complete_only_from_in_progress() {
        let (store, routes) = allocator();
        store.insert_order(&sample_order("ENV-CCCC-CCCC", "Córdoba")).await.unwrap();
        let route = routes
            .generate(GenerateRouteRequest {
                origin: "Córdoba".to_string(),
                destination: "Buenos Aires".to_string(),
                stops: vec![],
                transportist_id: "T-003".to_string(),
            })
            .await
            .unwrap();

        assert!(matches!(routes.complete(route.id).await.unwrap_err(), AppError::InvalidTransition { .. }));
        routes.activate(route.id).await.unwrap();
        let completed = routes.complete(route.id).await.unwrap();
        assert_eq!(completed.status, RouteStatus::Completed);
        assert!(completed.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_clear_all_resets_assignments() {
        let (store, routes) = allocator();
        let order = store.insert_order(&sample_order("ENV-CCCC-CCCC", "Córdoba")).await.unwrap();
        let untouched = store.insert_order(&sample_order("ENV-MMMM-MMMM", "Mendoza")).await.unwrap();
        let optimized = routes
            .generate_optimized_route_for_transportist("T-001", RouteLeg::Collection)
            .await
            .unwrap()
            .unwrap();
        routes.activate(optimized.route_id).await.unwrap();

        let report = routes.clear_all().await.unwrap();
        assert_eq!(
            report,
            ClearReport {
                routes_removed: 1,
                orders_reset: 1,
                reverted_to_pending: 1,
            }
        );

        assert!(store.get_routes().await.unwrap().is_empty());
        let reloaded = store.get_order_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, OrderStatus::PendingCollection);
        assert!(!reloaded.is_assigned());
        assert!(reloaded.assigned_route.is_none());
        assert_eq!(reloaded.history.len(), 3);

        let other = store.get_order_by_id(untouched.id).await.unwrap().unwrap();
        assert_eq!(other.version, untouched.version);
    }

    #[tokio::test]
    async fn test_route_sheet_resolves_orders() {
        let (store, routes) = allocator();
        store.insert_order(&sample_order("ENV-CCCC-CCCC", "Córdoba")).await.unwrap();
        let route = routes
            .generate(GenerateRouteRequest {
                origin: "Córdoba".to_string(),
                destination: "Buenos Aires".to_string(),
                stops: vec![],
                transportist_id: "T-003".to_string(),
            })
            .await
            .unwrap();

        let sheet = routes.route_sheet(route.id).await.unwrap();
        assert_eq!(sheet.orders.len(), 1);
        assert_eq!(sheet.orders[0].tracking_code, "ENV-CCCC-CCCC");
        assert_eq!(sheet.total_weight, Decimal::from(3));
        assert_eq!(sheet.transportist.map(|t| t.id), Some("T-003".to_string()));
        assert_eq!(sheet.map_url, "https://www.google.com/maps/dir/C%C3%B3rdoba/Buenos%20Aires");
    }

    /// Store que se detiene una vez después de una lectura elegida, para
    /// intercalar otra operación antes de que la primera confirme
    struct PausingStore {
        inner: Arc<InMemoryStore>,
        pause_after: std::sync::Mutex<Option<&'static str>>,
        reached: tokio::sync::Notify,
        resume: tokio::sync::Notify,
    }

    impl PausingStore {
        fn new(inner: Arc<InMemoryStore>) -> Self {
            Self {
                inner,
                pause_after: std::sync::Mutex::new(None),
                reached: tokio::sync::Notify::new(),
                resume: tokio::sync::Notify::new(),
            }
        }

        fn pause_after(&self, method: &'static str) {
            *self.pause_after.lock().unwrap() = Some(method);
        }

        async fn checkpoint(&self, method: &'static str) {
            let hit = {
                let mut armed = self.pause_after.lock().unwrap();
                if *armed == Some(method) {
                    *armed = None;
                    true
                } else {
                    false
                }
            };
            if hit {
                self.reached.notify_one();
                self.resume.notified().await;
            }
        }
    }

    #[async_trait::async_trait]
    impl Store for PausingStore {
        async fn get_orders(&self) -> AppResult<Vec<Order>> {
            let orders = self.inner.get_orders().await?;
            self.checkpoint("get_orders").await;
            Ok(orders)
        }
        async fn get_order(&self, tracking_code: &str) -> AppResult<Option<Order>> {
            self.inner.get_order(tracking_code).await
        }
        async fn get_order_by_id(&self, id: Uuid) -> AppResult<Option<Order>> {
            self.inner.get_order_by_id(id).await
        }
        async fn insert_order(&self, order: &Order) -> AppResult<Order> {
            self.inner.insert_order(order).await
        }
        async fn save_order(&self, order: &Order, expected_version: u64) -> AppResult<Order> {
            self.inner.save_order(order, expected_version).await
        }
        async fn get_routes(&self) -> AppResult<Vec<Route>> {
            self.inner.get_routes().await
        }
        async fn get_route(&self, id: Uuid) -> AppResult<Option<Route>> {
            let route = self.inner.get_route(id).await?;
            self.checkpoint("get_route").await;
            Ok(route)
        }
        async fn save_route(&self, route: &Route) -> AppResult<()> {
            self.inner.save_route(route).await
        }
        async fn save_routes(&self, routes: &[Route]) -> AppResult<()> {
            self.inner.save_routes(routes).await
        }
        async fn get_transportists(&self) -> AppResult<Vec<Transportist>> {
            self.inner.get_transportists().await
        }
        async fn get_transportist(&self, id: &str) -> AppResult<Option<Transportist>> {
            self.inner.get_transportist(id).await
        }
        async fn save_transportist(&self, transportist: &Transportist) -> AppResult<()> {
            self.inner.save_transportist(transportist).await
        }
        async fn get_agencies(&self) -> AppResult<Vec<crate::models::Agency>> {
            self.inner.get_agencies().await
        }
        async fn save_agency(&self, agency: &crate::models::Agency) -> AppResult<()> {
            self.inner.save_agency(agency).await
        }
        async fn get_rate_table(&self) -> AppResult<crate::models::RateTable> {
            self.inner.get_rate_table().await
        }
        async fn save_rate_table(&self, table: &crate::models::RateTable) -> AppResult<()> {
            self.inner.save_rate_table(table).await
        }
        async fn reserve_tracking_code(&self, code: &str) -> AppResult<bool> {
            self.inner.reserve_tracking_code(code).await
        }
        async fn commit(&self, batch: StoreBatch) -> AppResult<()> {
            self.inner.commit(batch).await
        }
    }

    fn pausing_allocator() -> (Arc<InMemoryStore>, Arc<PausingStore>, Arc<RouteAllocator>) {
        let inner = Arc::new(InMemoryStore::with_dataset(demo_dataset()));
        let store = Arc::new(PausingStore::new(inner.clone()));
        let routes = Arc::new(RouteAllocator::new(store.clone(), AllocationPolicy::default()));
        (inner, store, routes)
    }

    #[tokio::test]
    async fn test_clear_all_conflicts_with_activation_in_between() {
        let (inner, store, routes) = pausing_allocator();
        let order = inner.insert_order(&sample_order("ENV-CCCC-CCCC", "Córdoba")).await.unwrap();
        let optimized = routes
            .generate_optimized_route_for_transportist("T-001", RouteLeg::Collection)
            .await
            .unwrap()
            .unwrap();

        // clear_all ya leyó la ruta planificada y el pedido libre
        store.pause_after("get_orders");
        let clearing = tokio::spawn({
            let routes = routes.clone();
            async move { routes.clear_all().await }
        });
        store.reached.notified().await;

        routes.activate(optimized.route_id).await.unwrap();
        store.resume.notify_one();

        let err = clearing.await.unwrap().unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // ninguna asignación apunta a una ruta borrada
        let route = inner.get_route(optimized.route_id).await.unwrap().unwrap();
        assert_eq!(route.status, RouteStatus::InProgress);
        let reloaded = inner.get_order_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(reloaded.assigned_route, Some(route.id));

        // reintentado sin interferencia, limpia todo
        let report = routes.clear_all().await.unwrap();
        assert_eq!(report.orders_reset, 1);
        let reloaded = inner.get_order_by_id(order.id).await.unwrap().unwrap();
        assert!(!reloaded.is_assigned());
        assert!(inner.get_routes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_complete_does_not_restore_cleared_route() {
        let (inner, store, routes) = pausing_allocator();
        inner.insert_order(&sample_order("ENV-CCCC-CCCC", "Córdoba")).await.unwrap();
        let optimized = routes
            .generate_optimized_route_for_transportist("T-001", RouteLeg::Collection)
            .await
            .unwrap()
            .unwrap();
        routes.activate(optimized.route_id).await.unwrap();

        // complete ya leyó la ruta en curso
        store.pause_after("get_route");
        let completing = tokio::spawn({
            let routes = routes.clone();
            async move { routes.complete(optimized.route_id).await }
        });
        store.reached.notified().await;

        routes.clear_all().await.unwrap();
        store.resume.notify_one();

        let err = completing.await.unwrap().unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(inner.get_routes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_second_activation_is_rejected() {
        let (store, routes) = allocator();
        store.insert_order(&sample_order("ENV-CCCC-CCCC", "Córdoba")).await.unwrap();
        let optimized = routes
            .generate_optimized_route_for_transportist("T-001", RouteLeg::Collection)
            .await
            .unwrap()
            .unwrap();

        routes.activate(optimized.route_id).await.unwrap();
        let err = routes.activate(optimized.route_id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }
}
