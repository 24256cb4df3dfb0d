//! Cálculo de costos de envío
//!
//! flete (tarifario) -> seguro 10% del valor declarado -> gastos
//! administrativos 15% del flete -> IVA 21% sobre el subtotal -> termosellado
//! (tope 10% del flete) -> total. Cada componente se redondea a centavos
//! antes de sumar, así el total es exactamente la suma de sus partes.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::models::CostBreakdown;
use crate::services::rate_table_service::RateTableService;
use crate::utils::errors::{AppError, AppResult, FieldError};
use crate::utils::money::{basis_points, round_money};

pub const INSURANCE_RATE: Decimal = basis_points(1000);
pub const ADMIN_FEE_RATE: Decimal = basis_points(1500);
pub const IVA_RATE: Decimal = basis_points(2100);
pub const THERMOSEAL_CAP_RATE: Decimal = basis_points(1000);

/// Tope de termosellado para un flete dado
pub fn thermoseal_cap(freight: Decimal) -> Decimal {
    round_money(freight * THERMOSEAL_CAP_RATE)
}

/// Desglose a partir de un flete ya resuelto. Un termosellado por encima
/// del tope se rechaza; exactamente el tope se acepta.
pub fn breakdown(freight: Decimal, declared_value: Decimal, thermoseal: Decimal) -> AppResult<CostBreakdown> {
    let freight = round_money(freight);
    let cap = thermoseal_cap(freight);

    // se compara el valor recibido, antes de redondear
    if thermoseal > cap {
        return Err(AppError::Policy(format!(
            "thermoseal {} exceeds the cap of {} (10% of freight {})",
            thermoseal, cap, freight
        )));
    }

    let insurance = round_money(declared_value * INSURANCE_RATE);
    let admin_fees = round_money(freight * ADMIN_FEE_RATE);
    let subtotal = freight + insurance + admin_fees;
    let iva = round_money(subtotal * IVA_RATE);
    let thermoseal = round_money(thermoseal);
    let total = subtotal + iva + thermoseal;

    Ok(CostBreakdown {
        freight,
        insurance,
        admin_fees,
        iva,
        thermoseal,
        total,
    })
}

pub struct CostCalculator {
    rates: Arc<RateTableService>,
}

impl CostCalculator {
    pub fn new(rates: Arc<RateTableService>) -> Self {
        Self { rates }
    }

    pub async fn compute(
        &self,
        weight_kg: Decimal,
        destination_province: &str,
        declared_value: Decimal,
        thermoseal: Decimal,
    ) -> AppResult<CostBreakdown> {
        let mut errors = Vec::new();
        if weight_kg < Decimal::ZERO {
            errors.push(FieldError::new("weight", "non_negative", "El peso no puede ser negativo"));
        }
        if declared_value < Decimal::ZERO {
            errors.push(FieldError::new("declaredValue", "non_negative", "El valor declarado no puede ser negativo"));
        }
        if thermoseal < Decimal::ZERO {
            errors.push(FieldError::new("thermoseal", "non_negative", "El termosellado no puede ser negativo"));
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let freight = self.rates.lookup(destination_province, weight_kg).await?;
        let costs = breakdown(freight, declared_value, thermoseal)?;

        log::debug!(
            "🧮 Costo para {} kg a {}: flete {} total {}",
            weight_kg,
            destination_province,
            costs.freight,
            costs.total
        );

        Ok(costs)
    }
}
