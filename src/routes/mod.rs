//! Router HTTP
//!
//! Arma el router completo de la API con sus capas compartidas.

pub mod geo_routes;
pub mod order_routes;
pub mod rate_routes;
pub mod route_routes;
pub mod transportist_routes;

use axum::{response::Json, routing::get, Router};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::cors::cors_for;
use crate::state::AppState;

pub fn create_app_router(state: AppState) -> Router {
    let cors = cors_for(&state.config.cors_origins);

    Router::new()
        .route("/health", get(health))
        .nest("/api/orders", order_routes::create_order_router())
        .nest("/api/quote", order_routes::create_quote_router())
        .nest("/api/rates", rate_routes::create_rate_router())
        .nest("/api/transportists", transportist_routes::create_transportist_router())
        .nest("/api/routes", route_routes::create_route_router())
        .nest("/api/geo", geo_routes::create_geo_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "parcel_routing",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
