//! Services module
//!
//! Este módulo contiene la lógica de negocio de la aplicación: tarifario,
//! costos, ciclo de vida de pedidos, asignación de rutas y liquidaciones.
//! Los servicios sólo hablan con el store a través del trait `Store`.

pub mod cost_calculator;
pub mod geo_service;
pub mod order_service;
pub mod payment_service;
pub mod rate_table_service;
pub mod route_allocator;
pub mod tracking_code_service;

pub use cost_calculator::CostCalculator;
pub use geo_service::GeoService;
pub use order_service::OrderService;
pub use payment_service::PaymentService;
pub use rate_table_service::RateTableService;
pub use route_allocator::RouteAllocator;
pub use tracking_code_service::TrackingCodeIssuer;
