//! Ciclo de vida de pedidos
//!
//! Alta (validación completa, costos, código de seguimiento) y transiciones
//! de estado con su registro en el historial. Cada transición es una
//! lectura-validación-escritura atómica por pedido: si otro proceso cambió el
//! pedido en el medio, el store rechaza la escritura con `Conflict`.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::order_dto::{CreateOrderRequest, OrderFilters, QuoteRequest, QuoteResponse, TransitionRequest};
use crate::models::{History, HistoryEntry, Order, OrderStatus, Package, Party, WeightBracket};
use crate::repositories::Store;
use crate::services::cost_calculator::{thermoseal_cap, CostCalculator};
use crate::services::tracking_code_service::TrackingCodeIssuer;
use crate::utils::errors::{
    invalid_transition, not_found_error, validation_error, AppError, AppResult, FieldError,
};

pub struct OrderService {
    store: Arc<dyn Store>,
    costs: Arc<CostCalculator>,
    codes: Arc<TrackingCodeIssuer>,
}

impl OrderService {
    pub fn new(store: Arc<dyn Store>, costs: Arc<CostCalculator>, codes: Arc<TrackingCodeIssuer>) -> Self {
        Self { store, costs, codes }
    }

    /// Crea un pedido. Los errores de validación se devuelven todos juntos.
    pub async fn create(&self, request: CreateOrderRequest) -> AppResult<Order> {
        request.validate()?;

        let (service_type, payment_type) = match (request.package.service_type, request.payment_type) {
            (Some(service), Some(payment)) => (service, payment),
            _ => return Err(AppError::Internal("validated request without service or payment type".into())),
        };

        let sender: Party = request.sender.into();
        let recipient: Party = request.recipient.into();
        let package = Package {
            weight: request.package.weight,
            quantity: request.package.quantity,
            declared_value: request.package.declared_value,
            service_type,
        };

        // costos antes que el código: un rechazo por tope no consume códigos
        let costs = self
            .costs
            .compute(package.weight, &recipient.province, package.declared_value, request.thermoseal)
            .await?;

        let tracking_code = self.codes.generate().await?;
        let origin = sender.city.clone();

        let order = Order {
            id: Uuid::new_v4(),
            tracking_code,
            sender,
            recipient,
            package,
            payment_type,
            thermoseal: costs.thermoseal,
            costs,
            status: OrderStatus::PendingCollection,
            history: History::seeded(HistoryEntry::new(
                OrderStatus::PendingCollection,
                origin,
                "Pedido creado",
            )),
            assigned_transportist: None,
            assigned_route: None,
            created_at: Utc::now(),
            version: 0,
        };

        let stored = self.store.insert_order(&order).await?;
        log::info!(
            "📦 Pedido {} creado: {} -> {} total {}",
            stored.tracking_code,
            stored.sender.city,
            stored.recipient.city,
            stored.costs.total
        );
        Ok(stored)
    }

    /// Cotización sin crear el pedido; mismas reglas que el alta
    pub async fn quote(&self, request: QuoteRequest) -> AppResult<QuoteResponse> {
        let costs = self
            .costs
            .compute(request.weight, &request.province, request.declared_value, request.thermoseal)
            .await?;
        let (bracket, _) = WeightBracket::for_weight(request.weight);

        Ok(QuoteResponse {
            weight_bracket: bracket.to_string(),
            subtotal: costs.subtotal(),
            thermoseal_cap: thermoseal_cap(costs.freight),
            costs,
        })
    }

    pub async fn get(&self, tracking_code: &str) -> AppResult<Order> {
        self.store
            .get_order(tracking_code.trim())
            .await?
            .ok_or_else(|| not_found_error("Order", tracking_code))
    }

    pub async fn list(&self, filters: &OrderFilters) -> AppResult<Vec<Order>> {
        let status = match &filters.status {
            Some(raw) => Some(parse_status(raw)?),
            None => None,
        };

        let orders = self.store.get_orders().await?;
        Ok(orders
            .into_iter()
            .filter(|o| status.map_or(true, |s| o.status == s))
            .filter(|o| {
                filters
                    .transportist_id
                    .as_deref()
                    .map_or(true, |t| o.assigned_transportist.as_deref() == Some(t))
            })
            .collect())
    }

    /// Historial del pedido, del evento más reciente al más antiguo
    pub async fn history(&self, tracking_code: &str) -> AppResult<Vec<HistoryEntry>> {
        Ok(self.get(tracking_code).await?.history.entries().to_vec())
    }

    /// Aplica una transición de estado
    pub async fn transition(&self, tracking_code: &str, request: TransitionRequest) -> AppResult<Order> {
        let mut errors = Vec::new();
        let next = match parse_status(&request.status) {
            Ok(status) => Some(status),
            Err(AppError::Validation(mut e)) => {
                errors.append(&mut e);
                None
            }
            Err(e) => return Err(e),
        };
        if request.location.trim().is_empty() {
            errors.push(FieldError::new("location", "required", "La ubicación es obligatoria"));
        }
        if request.description.trim().is_empty() {
            errors.push(FieldError::new("description", "required", "La descripción es obligatoria"));
        }
        let next = match next {
            Some(next) if errors.is_empty() => next,
            _ => return Err(AppError::Validation(errors)),
        };

        let current = self.get(tracking_code).await?;
        if current.status.is_terminal() {
            log::warn!("⛔ Pedido {} ya está {}, no admite cambios", current.tracking_code, current.status);
            return Err(invalid_transition(current.status, next));
        }
        if !current.status.can_transition_to(next, current.package.service_type) {
            return Err(invalid_transition(current.status, next));
        }

        let expected_version = current.version;
        let mut updated = current;
        updated.status = next;
        updated.history.record(HistoryEntry::new(
            next,
            request.location.trim(),
            request.description.trim(),
        ));

        let stored = self.store.save_order(&updated, expected_version).await?;
        log::info!("🔄 Pedido {} -> {}", stored.tracking_code, stored.status);
        Ok(stored)
    }
}

/// Convierte el estado recibido en el enum cerrado; cualquier otro valor es inválido
pub fn parse_status(raw: &str) -> AppResult<OrderStatus> {
    raw.parse::<OrderStatus>()
        .map_err(|e| validation_error("status", "enum", &e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::order_dto::{PackageInput, PartyInput};
    use crate::models::{PaymentType, ServiceType};
    use crate::repositories::{seed::demo_dataset, InMemoryStore};
    use crate::services::rate_table_service::RateTableService;
    use crate::services::tracking_code_service::is_valid_tracking_code;
    use rust_decimal::Decimal;

    fn service() -> OrderService {
        let store: Arc<dyn Store> = Arc::new(InMemoryStore::with_dataset(demo_dataset()));
        let rates = Arc::new(RateTableService::new(store.clone()));
        OrderService::new(
            store.clone(),
            Arc::new(CostCalculator::new(rates)),
            Arc::new(TrackingCodeIssuer::new(store)),
        )
    }

    fn party(city: &str, province: &str) -> PartyInput {
        PartyInput {
            name: "Ana Pérez".to_string(),
            national_id: "30123456".to_string(),
            phone: "351 456-7890".to_string(),
            email: Some("ana@example.com".to_string()),
            address: "Av. Colón 100".to_string(),
            city: city.to_string(),
            province: province.to_string(),
            postal_code: "5000".to_string(),
        }
    }

    fn request(service_type: ServiceType) -> CreateOrderRequest {
        CreateOrderRequest {
            sender: party("Mendoza", "Mendoza"),
            recipient: party("Córdoba", "Córdoba"),
            package: PackageInput {
                weight: Decimal::from(7),
                quantity: 1,
                declared_value: Decimal::from(10_000),
                service_type: Some(service_type),
            },
            payment_type: Some(PaymentType::Origin),
            thermoseal: Decimal::ZERO,
        }
    }

    fn step(status: &str) -> TransitionRequest {
        TransitionRequest {
            status: status.to_string(),
            location: "Córdoba".to_string(),
            description: format!("Cambio a {}", status),
        }
    }

    #[tokio::test]
    async fn test_create_order() {
        let orders = service();
        let order = orders.create(request(ServiceType::Standard)).await.unwrap();

        assert!(is_valid_tracking_code(&order.tracking_code));
        assert_eq!(order.status, OrderStatus::PendingCollection);
        assert_eq!(order.costs.total, Decimal::new(580195, 2));
        assert_eq!(order.history.len(), 1);
        assert_eq!(order.history.latest().unwrap().description, "Pedido creado");
        assert_eq!(orders.get(&order.tracking_code).await.unwrap(), order);
    }

    #[tokio::test]
    async fn test_create_collects_every_violation() {
        let mut req = request(ServiceType::Standard);
        req.sender.national_id = "12.345".to_string();
        req.recipient.name = String::new();
        req.package.quantity = 0;
        req.payment_type = None;

        let err = service().create(req).await.unwrap_err();
        let fields = err.invalid_fields();
        assert!(fields.contains(&"sender.nationalId"), "{:?}", fields);
        assert!(fields.contains(&"recipient.name"));
        assert!(fields.contains(&"package.quantity"));
        assert!(fields.contains(&"paymentType"));
        assert!(!fields.contains(&"recipient.nationalId"));
    }

    #[tokio::test]
    async fn test_thermoseal_cap_on_create() {
        let orders = service();

        let mut at_cap = request(ServiceType::Standard);
        at_cap.thermoseal = Decimal::from(330);
        let order = orders.create(at_cap).await.unwrap();
        assert_eq!(order.costs.thermoseal, Decimal::from(330));
        assert!(order.costs.is_consistent());

        let mut over_cap = request(ServiceType::Standard);
        over_cap.thermoseal = Decimal::new(33001, 2);
        assert!(matches!(orders.create(over_cap).await.unwrap_err(), AppError::Policy(_)));
    }

    #[tokio::test]
    async fn test_full_lifecycle_history_is_newest_first() {
        let orders = service();
        let order = orders.create(request(ServiceType::Standard)).await.unwrap();
        let code = order.tracking_code.clone();

        orders.transition(&code, step("in-transit")).await.unwrap();
        orders.transition(&code, step("at-destination-agency")).await.unwrap();
        let delivered = orders.transition(&code, step("delivered")).await.unwrap();

        assert_eq!(delivered.status, OrderStatus::Delivered);
        let history = orders.history(&code).await.unwrap();
        let labels: Vec<&str> = history.iter().map(|h| h.status.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Entregado", "En agencia de destino", "En tránsito", "Pendiente de retiro"]
        );
    }

    #[tokio::test]
    async fn test_illegal_transitions_leave_order_unchanged() {
        let orders = service();
        let order = orders.create(request(ServiceType::Standard)).await.unwrap();
        let code = order.tracking_code.clone();

        let err = orders.transition(&code, step("delivered")).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));

        orders.transition(&code, step("in-transit")).await.unwrap();
        let err = orders.transition(&code, step("delivered")).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));

        let reloaded = orders.get(&code).await.unwrap();
        assert_eq!(reloaded.status, OrderStatus::InTransit);
        assert_eq!(reloaded.history.len(), 2);
    }

    #[tokio::test]
    async fn test_door_to_door_delivers_from_transit() {
        let orders = service();
        let order = orders.create(request(ServiceType::DoorToDoor)).await.unwrap();
        orders.transition(&order.tracking_code, step("in-transit")).await.unwrap();
        let delivered = orders.transition(&order.tracking_code, step("delivered")).await.unwrap();
        assert_eq!(delivered.status, OrderStatus::Delivered);

        let err = orders.transition(&order.tracking_code, step("in-transit")).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_unknown_status_is_validation_error() {
        let orders = service();
        let order = orders.create(request(ServiceType::Standard)).await.unwrap();
        let err = orders.transition(&order.tracking_code, step("lost")).await.unwrap_err();
        assert_eq!(err.invalid_fields(), vec!["status"]);
    }

    #[tokio::test]
    async fn test_quote_matches_create() {
        let orders = service();
        let quote = orders
            .quote(QuoteRequest {
                weight: Decimal::from(7),
                province: "Córdoba".to_string(),
                declared_value: Decimal::from(10_000),
                thermoseal: Decimal::ZERO,
            })
            .await
            .unwrap();

        assert_eq!(quote.weight_bracket, "5-10");
        assert_eq!(quote.subtotal, Decimal::from(4795));
        assert_eq!(quote.thermoseal_cap, Decimal::from(330));
        assert_eq!(quote.costs.total, Decimal::new(580195, 2));
        assert!(orders.list(&OrderFilters::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let orders = service();
        let first = orders.create(request(ServiceType::Standard)).await.unwrap();
        orders.create(request(ServiceType::Express)).await.unwrap();
        orders.transition(&first.tracking_code, step("in-transit")).await.unwrap();

        let filters = OrderFilters {
            status: Some("in-transit".to_string()),
            transportist_id: None,
        };
        let in_transit = orders.list(&filters).await.unwrap();
        assert_eq!(in_transit.len(), 1);
        assert_eq!(in_transit[0].tracking_code, first.tracking_code);

        let bad = OrderFilters {
            status: Some("perdido".to_string()),
            transportist_id: None,
        };
        assert!(matches!(orders.list(&bad).await.unwrap_err(), AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_unknown_tracking_code() {
        let err = service().transition("ENV-ZZZZ-ZZZZ", step("in-transit")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_concurrent_transitions_apply_once() {
        let orders = Arc::new(service());
        let order = orders.create(request(ServiceType::Standard)).await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let orders = orders.clone();
                let code = order.tracking_code.clone();
                tokio::spawn(async move { orders.transition(&code, step("in-transit")).await })
            })
            .collect();

        let mut ok = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(AppError::Conflict(_)) | Err(AppError::InvalidTransition { .. }) => {}
                Err(e) => panic!("unexpected error {:?}", e),
            }
        }

        assert_eq!(ok, 1);
        assert_eq!(orders.get(&order.tracking_code).await.unwrap().history.len(), 2);
    }
}
