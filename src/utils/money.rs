//! Aritmética monetaria en punto fijo (2 decimales)

use rust_decimal::{Decimal, RoundingStrategy};

/// Escala de todos los importes
pub const MONEY_SCALE: u32 = 2;

/// Redondea un importe a centavos (mitad hacia arriba, lejos de cero)
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Construye un porcentaje a partir de puntos básicos (`1000` = 10%)
pub const fn basis_points(bps: i64) -> Decimal {
    Decimal::from_parts(bps as u32, 0, 0, false, 4)
}
