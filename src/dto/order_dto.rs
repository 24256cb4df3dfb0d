use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{CostBreakdown, Party, PaymentType, ServiceType};
use crate::utils::validation::{
    validate_email, validate_national_id, validate_non_negative_amount, validate_not_empty, validate_phone,
    validate_positive_amount,
};

// Remitente o destinatario tal como llega del formulario
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct PartyInput {
    #[validate(custom = "validate_not_empty")]
    pub name: String,
    #[validate(custom = "validate_national_id")]
    pub national_id: String,
    #[validate(custom = "validate_phone")]
    pub phone: String,
    #[validate(custom = "validate_email")]
    pub email: Option<String>,
    pub address: String,
    #[validate(custom = "validate_not_empty")]
    pub city: String,
    #[validate(custom = "validate_not_empty")]
    pub province: String,
    pub postal_code: String,
}

impl From<PartyInput> for Party {
    fn from(input: PartyInput) -> Self {
        Self {
            name: input.name.trim().to_string(),
            national_id: input.national_id,
            phone: input.phone.trim().to_string(),
            email: input.email.filter(|e| !e.trim().is_empty()),
            address: input.address.trim().to_string(),
            city: input.city.trim().to_string(),
            province: input.province.trim().to_string(),
            postal_code: input.postal_code.trim().to_string(),
        }
    }
}

// Bulto tal como llega del formulario
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct PackageInput {
    #[validate(custom = "validate_positive_amount")]
    pub weight: Decimal,
    #[validate(range(min = 1, message = "La cantidad debe ser al menos 1"))]
    pub quantity: u32,
    #[validate(custom = "validate_positive_amount")]
    pub declared_value: Decimal,
    #[validate(required)]
    pub service_type: Option<ServiceType>,
}

// Request para crear un pedido
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateOrderRequest {
    #[validate]
    pub sender: PartyInput,
    #[validate]
    pub recipient: PartyInput,
    #[validate]
    pub package: PackageInput,
    #[validate(required)]
    pub payment_type: Option<PaymentType>,
    #[validate(custom = "validate_non_negative_amount")]
    pub thermoseal: Decimal,
}

// Request para cotizar sin crear el pedido
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub weight: Decimal,
    pub province: String,
    pub declared_value: Decimal,
    #[serde(default)]
    pub thermoseal: Decimal,
}

// Response de cotización
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub weight_bracket: String,
    pub subtotal: Decimal,
    pub thermoseal_cap: Decimal,
    pub costs: CostBreakdown,
}

// Request para cambiar el estado de un pedido
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TransitionRequest {
    pub status: String,
    pub location: String,
    pub description: String,
}

// Filtros para listar pedidos
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderFilters {
    pub status: Option<String>,
    pub transportist_id: Option<String>,
}
