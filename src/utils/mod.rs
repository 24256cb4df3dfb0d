//! Utilidades del sistema
//!
//! Este módulo contiene utilidades para manejo de errores, validación,
//! redondeo monetario y comparación de localidades.

pub mod errors;
pub mod matching;
pub mod money;
pub mod validation;

pub use errors::{AppError, AppResult, FieldError};
