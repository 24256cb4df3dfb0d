//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno, el backend de
//! almacenamiento y los parámetros de negocio ajustables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use rust_decimal::Decimal;

/// Backend del store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Postgres,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "postgres" => Ok(StoreBackend::Postgres),
            other => Err(anyhow!("STORE_BACKEND must be 'memory' or 'postgres', got '{}'", other)),
        }
    }
}

/// Umbrales de prioridad de paradas
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationPolicy {
    /// Pedidos más viejos que esto suben la parada a prioridad alta
    pub high_priority_age_days: i64,
    /// Valor declarado total por encima del cual la parada es alta
    pub high_value_threshold: Decimal,
    /// Valor declarado total por debajo del cual la parada es baja
    pub low_value_threshold: Decimal,
}

impl Default for AllocationPolicy {
    fn default() -> Self {
        Self {
            high_priority_age_days: 2,
            high_value_threshold: Decimal::from(50_000),
            low_value_threshold: Decimal::from(10_000),
        }
    }
}

/// Tarifas de liquidación a transportistas
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentPolicy {
    pub per_order: Decimal,
    pub per_kg: Decimal,
}

impl Default for PaymentPolicy {
    fn default() -> Self {
        Self {
            per_order: Decimal::from(500),
            per_kg: Decimal::from(50),
        }
    }
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub cors_origins: Vec<String>,
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub snapshot_path: Option<PathBuf>,
    pub seed_demo_data: bool,
    pub allocation: AllocationPolicy,
    pub payment: PaymentPolicy,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 3000,
            host: "0.0.0.0".to_string(),
            cors_origins: Vec::new(),
            store_backend: StoreBackend::Memory,
            database_url: None,
            snapshot_path: None,
            seed_demo_data: true,
            allocation: AllocationPolicy::default(),
            payment: PaymentPolicy::default(),
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{} must be a valid value: {}", name, e)),
        _ => Ok(default),
    }
}

impl EnvironmentConfig {
    /// Lee la configuración de las variables de entorno
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let store_backend: StoreBackend = parse_var("STORE_BACKEND", StoreBackend::Memory)?;
        let database_url = env::var("DATABASE_URL").ok().filter(|s| !s.trim().is_empty());

        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(anyhow!("DATABASE_URL must be set when STORE_BACKEND=postgres"));
        }

        let config = Self {
            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            port: parse_var("PORT", defaults.port)?,
            host: env::var("HOST").unwrap_or(defaults.host),
            cors_origins: env::var("CORS_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            store_backend,
            database_url,
            snapshot_path: env::var("SNAPSHOT_PATH").ok().filter(|s| !s.trim().is_empty()).map(PathBuf::from),
            seed_demo_data: parse_var("SEED_DEMO_DATA", defaults.seed_demo_data)?,
            allocation: AllocationPolicy {
                high_priority_age_days: parse_var("PRIORITY_AGE_DAYS", defaults.allocation.high_priority_age_days)?,
                high_value_threshold: parse_var("PRIORITY_HIGH_VALUE", defaults.allocation.high_value_threshold)?,
                low_value_threshold: parse_var("PRIORITY_LOW_VALUE", defaults.allocation.low_value_threshold)?,
            },
            payment: PaymentPolicy {
                per_order: parse_var("PAYMENT_PER_ORDER", defaults.payment.per_order)?,
                per_kg: parse_var("PAYMENT_PER_KG", defaults.payment.per_kg)?,
            },
        };

        if config.allocation.low_value_threshold > config.allocation.high_value_threshold {
            return Err(anyhow!("PRIORITY_LOW_VALUE must not exceed PRIORITY_HIGH_VALUE"));
        }

        Ok(config)
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_backend_parse() {
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!("Postgres".parse::<StoreBackend>().unwrap(), StoreBackend::Postgres);
        assert!("redis".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_defaults() {
        let config = EnvironmentConfig::default();
        assert!(config.is_development());
        assert_eq!(config.server_url(), "0.0.0.0:3000");
        assert_eq!(config.allocation.high_value_threshold, Decimal::from(50_000));
        assert_eq!(config.allocation.low_value_threshold, Decimal::from(10_000));
        assert_eq!(config.allocation.high_priority_age_days, 2);
    }
}
