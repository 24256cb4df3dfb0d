//! Conexión a PostgreSQL
//!
//! Crea el pool y asegura el esquema de documentos JSONB del store.

use anyhow::Result;
use sqlx::PgPool;

use crate::config::database::{mask_database_url, DatabaseConfig};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        id UUID PRIMARY KEY,
        tracking_code TEXT NOT NULL UNIQUE,
        version BIGINT NOT NULL,
        doc JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS routes (
        id UUID PRIMARY KEY,
        doc JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS transportists (
        id TEXT PRIMARY KEY,
        doc JSONB NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS agencies (
        id TEXT PRIMARY KEY,
        doc JSONB NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS rate_table (
        province TEXT NOT NULL,
        bracket TEXT NOT NULL,
        price NUMERIC(12, 2) NOT NULL,
        PRIMARY KEY (province, bracket)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tracking_codes (
        code TEXT PRIMARY KEY,
        issued_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
];

/// Crear un pool de conexiones a la base de datos
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    log::info!("🐘 Conectando a {}", mask_database_url(&config.url));
    let pool = config.create_pool().await?;
    Ok(pool)
}

/// Ejecutar migraciones de la base de datos
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    log::info!("✅ Esquema verificado ({} tablas)", SCHEMA.len());
    Ok(())
}
