//! DTOs (Data Transfer Objects)
//!
//! Este módulo contiene las estructuras de request/response de la API.

pub mod api_response;
pub mod geo_dto;
pub mod order_dto;
pub mod rate_dto;
pub mod route_dto;

pub use api_response::ApiResponse;
