//! Servicio del tarifario
//!
//! Lectura y edición del tarifario a través del store. Cada consulta lee el
//! tarifario vigente, así que una edición aplica a todos los cálculos
//! siguientes sin recalcular pedidos existentes.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::models::{RateEntry, RateTable, WeightBracket};
use crate::repositories::Store;
use crate::utils::errors::{validation_error, AppError, AppResult};
use crate::utils::money::round_money;

pub struct RateTableService {
    store: Arc<dyn Store>,
    // serializa lectura-modificación-escritura de `set`
    write_lock: Mutex<()>,
}

impl RateTableService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn table(&self) -> AppResult<RateTable> {
        self.store.get_rate_table().await
    }

    /// Precio del flete para una provincia y un peso en kg.
    /// Provincias desconocidas usan la fila "Otras provincias"; pesos sobre
    /// 25 kg usan la última franja (se deja constancia en el log).
    pub async fn lookup(&self, province: &str, weight_kg: Decimal) -> AppResult<Decimal> {
        let (bracket, overflow) = WeightBracket::for_weight(weight_kg);
        if overflow {
            log::warn!(
                "⚖️ Peso {} kg supera la franja máxima, se cobra la franja {}",
                weight_kg,
                bracket
            );
        }

        let table = self.store.get_rate_table().await?;
        table.price(province, bracket).ok_or_else(|| {
            AppError::Internal(format!(
                "rate table has no entry for '{}' nor a fallback row for bracket {}",
                province, bracket
            ))
        })
    }

    /// Sobrescribe una celda del tarifario
    pub async fn set(&self, province: &str, bracket: WeightBracket, price: Decimal) -> AppResult<RateEntry> {
        if province.trim().is_empty() {
            return Err(validation_error("province", "required", "La provincia es obligatoria"));
        }
        if price <= Decimal::ZERO {
            return Err(validation_error("price", "positive", "El precio debe ser mayor a cero"));
        }

        let price = round_money(price);
        let _guard = self.write_lock.lock().await;
        let mut table = self.store.get_rate_table().await?;
        table.set(province, bracket, price);
        if !table.is_monotonic() {
            log::warn!("⚠️ El tarifario quedó con precios que bajan al subir el peso ({})", province.trim());
        }
        self.store.save_rate_table(&table).await?;

        log::info!("💲 Tarifa actualizada: {} / {} = {}", province.trim(), bracket, price);

        Ok(RateEntry {
            province: province.trim().to_string(),
            weight_bracket: bracket,
            price,
        })
    }
}
