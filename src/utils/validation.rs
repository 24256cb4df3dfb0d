//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos de entrada
//! y la conversión de los errores de `validator` a la lista plana de campos.

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::utils::errors::FieldError;

lazy_static! {
    /// DNI argentino: 7 u 8 dígitos, sin puntos
    pub static ref NATIONAL_ID_RE: Regex = Regex::new(r"^\d{7,8}$").unwrap();
}

fn with_message(mut error: ValidationError, message: &'static str) -> ValidationError {
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Validar que un string no esté vacío
pub fn validate_not_empty(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("required");
        error.add_param("value".into(), &value.to_string());
        return Err(with_message(error, "El campo es obligatorio"));
    }
    Ok(())
}

/// Validar formato de DNI
pub fn validate_national_id(value: &str) -> Result<(), ValidationError> {
    if !NATIONAL_ID_RE.is_match(value) {
        let mut error = ValidationError::new("national_id");
        error.add_param("value".into(), &value.to_string());
        return Err(with_message(error, "El DNI debe tener 7 u 8 dígitos"));
    }
    Ok(())
}

/// Validar formato de teléfono (básico)
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let clean_phone = value.chars().filter(|c| c.is_ascii_digit()).collect::<String>();
    if clean_phone.len() < 6 || clean_phone.len() > 15 {
        let mut error = ValidationError::new("phone");
        error.add_param("value".into(), &value.to_string());
        return Err(with_message(error, "El teléfono debe tener entre 6 y 15 dígitos"));
    }
    Ok(())
}

/// Validar formato de email (vacío se acepta: el campo es opcional)
pub fn validate_email(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(());
    }
    if !value.contains('@') || !value.contains('.') {
        let mut error = ValidationError::new("email");
        error.add_param("value".into(), &value.to_string());
        return Err(with_message(error, "El email no es válido"));
    }
    Ok(())
}

/// Validar que un valor sea positivo
pub fn validate_positive<T: PartialOrd + std::fmt::Display + num_traits::Zero + Serialize>(
    value: T,
) -> Result<(), ValidationError> {
    if value <= T::zero() {
        let mut error = ValidationError::new("positive");
        error.add_param("value".into(), &value);
        return Err(with_message(error, "El valor debe ser mayor a cero"));
    }
    Ok(())
}

/// Validar que un valor sea no negativo
pub fn validate_non_negative<T: PartialOrd + std::fmt::Display + num_traits::Zero + Serialize>(
    value: T,
) -> Result<(), ValidationError> {
    if value < T::zero() {
        let mut error = ValidationError::new("non_negative");
        error.add_param("value".into(), &value);
        return Err(with_message(error, "El valor no puede ser negativo"));
    }
    Ok(())
}

/// Variante para `#[validate(custom)]` sobre montos
pub fn validate_positive_amount(value: &Decimal) -> Result<(), ValidationError> {
    validate_positive(*value)
}

/// Variante para `#[validate(custom)]` sobre montos opcionales en cero
pub fn validate_non_negative_amount(value: &Decimal) -> Result<(), ValidationError> {
    validate_non_negative(*value)
}

/// Convierte `national_id` en `nationalId`
pub fn to_camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Aplana los errores anidados de `validator` en una lista ordenada por campo
pub fn flatten_validation_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out = Vec::new();
    collect_errors(None, errors, &mut out);
    out.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.code.cmp(&b.code)));
    out
}

fn collect_errors(prefix: Option<&str>, errors: &ValidationErrors, out: &mut Vec<FieldError>) {
    for (field, kind) in errors.errors() {
        let name = match prefix {
            Some(p) => format!("{}.{}", p, to_camel_case(field)),
            None => to_camel_case(field),
        };

        match kind {
            ValidationErrorsKind::Field(list) => {
                for error in list {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Valor inválido ({})", error.code));
                    out.push(FieldError::new(name.clone(), error.code.to_string(), message));
                }
            }
            ValidationErrorsKind::Struct(inner) => collect_errors(Some(&name), inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_errors(Some(&format!("{}[{}]", name, index)), inner, out);
                }
            }
        }
    }
}
