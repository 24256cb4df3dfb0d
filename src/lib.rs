//! Motor de pedidos y rutas de una operación de encomiendas
//!
//! Pedidos con costos derivados del tarifario, ciclo de vida con historial,
//! asignación de pedidos a hojas de ruta por transportista y liquidación de
//! las hojas completadas. El binario expone todo por HTTP.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub use routes::create_app_router;
pub use state::AppState;
