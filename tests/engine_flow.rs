use std::collections::HashSet;
use std::sync::Arc;

use rust_decimal::Decimal;

use parcel_routing::config::EnvironmentConfig;
use parcel_routing::dto::order_dto::{CreateOrderRequest, PackageInput, PartyInput, TransitionRequest};
use parcel_routing::dto::route_dto::GenerateRouteRequest;
use parcel_routing::models::{Order, OrderStatus, PaymentType, RouteLeg, ServiceType};
use parcel_routing::repositories::{seed::demo_dataset, InMemoryStore, Store};
use parcel_routing::services::tracking_code_service::is_valid_tracking_code;
use parcel_routing::utils::errors::AppError;
use parcel_routing::AppState;

fn engine() -> (Arc<InMemoryStore>, AppState) {
    let store = Arc::new(InMemoryStore::with_dataset(demo_dataset()));
    let state = AppState::new(EnvironmentConfig::default(), store.clone());
    (store, state)
}

fn party(city: &str, province: &str, address: &str) -> PartyInput {
    PartyInput {
        name: "Juan Gómez".to_string(),
        national_id: "28999111".to_string(),
        phone: "0261 423-1111".to_string(),
        email: None,
        address: address.to_string(),
        city: city.to_string(),
        province: province.to_string(),
        postal_code: "5500".to_string(),
    }
}

fn request(sender_province: &str, service_type: ServiceType) -> CreateOrderRequest {
    CreateOrderRequest {
        sender: party(sender_province, sender_province, &format!("Calle {} 1", sender_province)),
        recipient: party("Córdoba", "Córdoba", "Av. Colón 100"),
        package: PackageInput {
            weight: Decimal::from(7),
            quantity: 1,
            declared_value: Decimal::from(10_000),
            service_type: Some(service_type),
        },
        payment_type: Some(PaymentType::Destination),
        thermoseal: Decimal::ZERO,
    }
}

fn step(status: &str) -> TransitionRequest {
    TransitionRequest {
        status: status.to_string(),
        location: "Córdoba".to_string(),
        description: "Actualización".to_string(),
    }
}

async fn create(state: &AppState, sender_province: &str) -> Order {
    state.orders.create(request(sender_province, ServiceType::Standard)).await.unwrap()
}

#[tokio::test]
async fn test_cordoba_cost_example() {
    let (_, state) = engine();
    let order = create(&state, "Mendoza").await;

    assert_eq!(order.costs.freight, Decimal::from(3300));
    assert_eq!(order.costs.insurance, Decimal::from(1000));
    assert_eq!(order.costs.admin_fees, Decimal::from(495));
    assert_eq!(order.costs.iva, Decimal::new(100695, 2));
    assert_eq!(order.costs.total, Decimal::new(580195, 2));
}

#[tokio::test]
async fn test_national_id_error_names_the_field() {
    let (_, state) = engine();
    let mut req = request("Mendoza", ServiceType::Standard);
    req.recipient.national_id = "123456789".to_string();

    let err = state.orders.create(req).await.unwrap_err();
    assert_eq!(err.invalid_fields(), vec!["recipient.nationalId"]);
}

#[tokio::test]
async fn test_concurrent_creates_get_distinct_codes() {
    let (_, state) = engine();
    let handles: Vec<_> = (0..32)
        .map(|_| {
            let state = state.clone();
            tokio::spawn(async move { create(&state, "Mendoza").await.tracking_code })
        })
        .collect();

    let mut codes = HashSet::new();
    for handle in handles {
        let code = handle.await.unwrap();
        assert!(is_valid_tracking_code(&code));
        assert!(codes.insert(code));
    }
    assert_eq!(codes.len(), 32);
}

#[tokio::test]
async fn test_delivered_is_terminal() {
    let (_, state) = engine();
    let order = create(&state, "Mendoza").await;
    let code = order.tracking_code.as_str();

    for status in ["in-transit", "at-destination-agency", "delivered"] {
        state.orders.transition(code, step(status)).await.unwrap();
    }
    for status in ["pending-collection", "in-transit", "at-destination-agency", "delivered"] {
        let err = state.orders.transition(code, step(status)).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }), "{}", status);
    }
    assert_eq!(state.orders.history(code).await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_carrier_zone_example() {
    let (_, state) = engine();
    let cordoba = create(&state, "Córdoba").await;
    create(&state, "Mendoza").await;

    let optimized = state
        .routes
        .generate_optimized_route_for_transportist("T-001", RouteLeg::Collection)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(optimized.stops.len(), 1);
    assert_eq!(optimized.stops[0].order_ids, vec![cordoba.id]);
    assert_eq!(optimized.stops[0].address, "Calle Córdoba 1");
}

#[tokio::test]
async fn test_delivery_leg_uses_assigned_orders() {
    let (_, state) = engine();
    let order = create(&state, "Córdoba").await;

    let collection = state
        .routes
        .generate_optimized_route_for_transportist("T-001", RouteLeg::Collection)
        .await
        .unwrap()
        .unwrap();
    state.routes.activate(collection.route_id).await.unwrap();

    let delivery = state
        .routes
        .generate_optimized_route_for_transportist("T-001", RouteLeg::Delivery)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(delivery.stops.len(), 1);
    assert_eq!(delivery.stops[0].address, "Av. Colón 100");
    assert_eq!(delivery.stops[0].order_ids, vec![order.id]);

    // otro transportista no ve pedidos ajenos en reparto
    let other = state
        .routes
        .generate_optimized_route_for_transportist("T-003", RouteLeg::Delivery)
        .await
        .unwrap();
    assert!(other.is_none());
}

#[tokio::test]
async fn test_clear_all_leaves_no_stale_assignment() {
    let (store, state) = engine();
    let first = create(&state, "Córdoba").await;
    let second = create(&state, "Córdoba").await;
    let mendoza = create(&state, "Mendoza").await;

    // los tres se entregan en Córdoba, así que la ruta toma a todos
    let route = state
        .routes
        .generate(GenerateRouteRequest {
            origin: "Córdoba".to_string(),
            destination: "Buenos Aires".to_string(),
            stops: vec![],
            transportist_id: "T-003".to_string(),
        })
        .await
        .unwrap();
    state.routes.activate(route.id).await.unwrap();

    // una de las dos avanza a agencia: no vuelve a pendiente
    state.orders.transition(&second.tracking_code, step("at-destination-agency")).await.unwrap();

    let report = state.routes.clear_all().await.unwrap();
    assert_eq!(report.orders_reset, 3);
    assert_eq!(report.reverted_to_pending, 2);

    for order in store.get_orders().await.unwrap() {
        assert!(order.assigned_transportist.is_none(), "{}", order.tracking_code);
        assert!(order.assigned_route.is_none());
    }

    let reloaded = |code: String| {
        let store = store.clone();
        async move { store.get_order(&code).await.unwrap().unwrap() }
    };
    assert_eq!(reloaded(first.tracking_code).await.status, OrderStatus::PendingCollection);
    assert_eq!(reloaded(second.tracking_code).await.status, OrderStatus::AtDestinationAgency);
    assert_eq!(reloaded(mendoza.tracking_code).await.status, OrderStatus::PendingCollection);
    assert!(store.get_routes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_payment_only_after_completion() {
    let (_, state) = engine();
    create(&state, "Córdoba").await;

    let optimized = state
        .routes
        .generate_optimized_route_for_transportist("T-001", RouteLeg::Collection)
        .await
        .unwrap()
        .unwrap();
    state.routes.activate(optimized.route_id).await.unwrap();

    let pending = state.payments.compute_carrier_payment("T-001").await.unwrap();
    assert_eq!(pending.total, Decimal::ZERO);

    state.routes.complete(optimized.route_id).await.unwrap();
    let paid = state.payments.compute_carrier_payment("T-001").await.unwrap();
    assert_eq!(paid.sheets.len(), 1);
    assert_eq!(paid.total, Decimal::from(850));
}
