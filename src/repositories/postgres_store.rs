//! Store sobre PostgreSQL
//!
//! Cada agregado se guarda como documento JSONB con sus columnas de búsqueda.
//! La versión del pedido vive en su propia columna para el `UPDATE ... WHERE
//! version = $n` de la concurrencia optimista.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{Agency, Order, RateTable, Route, Transportist, WeightBracket};
use crate::repositories::memory_store::Dataset;
use crate::repositories::store::{RouteGuard, Store, StoreBatch};
use crate::utils::errors::{conflict_error, not_found_error, AppError, AppResult};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Carga transportistas, agencias y tarifario si las tablas están vacías
    pub async fn seed_if_empty(&self, seed: &Dataset) -> AppResult<()> {
        let (transportists,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transportists")
            .fetch_one(&self.pool)
            .await?;
        if transportists == 0 {
            for transportist in seed.transportists.values() {
                self.save_transportist(transportist).await?;
            }
            log::info!("🚚 {} transportistas iniciales cargados", seed.transportists.len());
        }

        let (agencies,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM agencies")
            .fetch_one(&self.pool)
            .await?;
        if agencies == 0 {
            for agency in seed.agencies.values() {
                self.save_agency(agency).await?;
            }
        }

        let (rates,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM rate_table")
            .fetch_one(&self.pool)
            .await?;
        if rates == 0 {
            self.save_rate_table(&seed.rate_table).await?;
            log::info!("💲 Tarifario inicial cargado");
        }

        Ok(())
    }
}

async fn write_order(conn: &mut PgConnection, order: &Order, expected_version: u64) -> AppResult<Order> {
    let mut stored = order.clone();
    stored.version = expected_version + 1;

    let result = sqlx::query("UPDATE orders SET doc = $1, version = $2 WHERE id = $3 AND version = $4")
        .bind(Json(&stored))
        .bind(stored.version as i64)
        .bind(stored.id)
        .bind(expected_version as i64)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        let exists: Option<(i64,)> = sqlx::query_as("SELECT version FROM orders WHERE id = $1")
            .bind(stored.id)
            .fetch_optional(&mut *conn)
            .await?;
        return Err(match exists {
            Some(_) => conflict_error("Order", &stored.tracking_code),
            None => not_found_error("Order", &stored.tracking_code),
        });
    }

    Ok(stored)
}

async fn upsert_route(conn: &mut PgConnection, route: &Route) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO routes (id, doc, created_at)
        VALUES ($1, $2, $3)
        ON CONFLICT (id) DO UPDATE SET doc = EXCLUDED.doc
        "#,
    )
    .bind(route.id)
    .bind(Json(route))
    .bind(route.created_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Bloquea las rutas vigiladas y verifica que sigan con el estado leído
async fn check_route_guards(conn: &mut PgConnection, guards: &[RouteGuard], exhaustive: bool) -> AppResult<()> {
    for guard in guards {
        let row: Option<(Json<Route>,)> = sqlx::query_as("SELECT doc FROM routes WHERE id = $1 FOR UPDATE")
            .bind(guard.route_id)
            .fetch_optional(&mut *conn)
            .await?;
        match row {
            Some((doc,)) if doc.0.status == guard.status => {}
            Some((doc,)) => return Err(conflict_error("Route", &doc.0.code)),
            None => return Err(conflict_error("Route", &guard.route_id.to_string())),
        }
    }

    if exhaustive {
        let ids: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM routes FOR UPDATE")
            .fetch_all(&mut *conn)
            .await?;
        if let Some((extra,)) = ids.iter().find(|(id,)| !guards.iter().any(|g| g.route_id == *id)) {
            return Err(conflict_error("Route", &extra.to_string()));
        }
    }
    Ok(())
}

#[async_trait]
impl Store for PgStore {
    async fn get_orders(&self) -> AppResult<Vec<Order>> {
        let rows: Vec<(Json<Order>,)> =
            sqlx::query_as("SELECT doc FROM orders ORDER BY created_at, tracking_code")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(doc,)| doc.0).collect())
    }

    async fn get_order(&self, tracking_code: &str) -> AppResult<Option<Order>> {
        let row: Option<(Json<Order>,)> = sqlx::query_as("SELECT doc FROM orders WHERE tracking_code = $1")
            .bind(tracking_code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(doc,)| doc.0))
    }

    async fn get_order_by_id(&self, id: Uuid) -> AppResult<Option<Order>> {
        let row: Option<(Json<Order>,)> = sqlx::query_as("SELECT doc FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(doc,)| doc.0))
    }

    async fn insert_order(&self, order: &Order) -> AppResult<Order> {
        let mut stored = order.clone();
        stored.version = 1;

        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO tracking_codes (code) VALUES ($1) ON CONFLICT (code) DO NOTHING")
            .bind(&stored.tracking_code)
            .execute(&mut *tx)
            .await?;

        let inserted = sqlx::query(
            "INSERT INTO orders (id, tracking_code, version, doc, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(stored.id)
        .bind(&stored.tracking_code)
        .bind(stored.version as i64)
        .bind(Json(&stored))
        .bind(stored.created_at)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                return Err(AppError::Conflict(format!("Order '{}' already exists", stored.tracking_code)));
            }
            Err(e) => return Err(e.into()),
        }

        tx.commit().await?;
        Ok(stored)
    }

    async fn save_order(&self, order: &Order, expected_version: u64) -> AppResult<Order> {
        let mut conn = self.pool.acquire().await?;
        write_order(&mut conn, order, expected_version).await
    }

    async fn get_routes(&self) -> AppResult<Vec<Route>> {
        let rows: Vec<(Json<Route>,)> = sqlx::query_as("SELECT doc FROM routes ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(doc,)| doc.0).collect())
    }

    async fn get_route(&self, id: Uuid) -> AppResult<Option<Route>> {
        let row: Option<(Json<Route>,)> = sqlx::query_as("SELECT doc FROM routes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(doc,)| doc.0))
    }

    async fn save_route(&self, route: &Route) -> AppResult<()> {
        let mut conn = self.pool.acquire().await?;
        upsert_route(&mut conn, route).await
    }

    async fn save_routes(&self, routes: &[Route]) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM routes").execute(&mut *tx).await?;
        for route in routes {
            upsert_route(&mut tx, route).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get_transportists(&self) -> AppResult<Vec<Transportist>> {
        let rows: Vec<(Json<Transportist>,)> = sqlx::query_as("SELECT doc FROM transportists ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(doc,)| doc.0).collect())
    }

    async fn get_transportist(&self, id: &str) -> AppResult<Option<Transportist>> {
        let row: Option<(Json<Transportist>,)> = sqlx::query_as("SELECT doc FROM transportists WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(doc,)| doc.0))
    }

    async fn save_transportist(&self, transportist: &Transportist) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO transportists (id, doc) VALUES ($1, $2) ON CONFLICT (id) DO UPDATE SET doc = EXCLUDED.doc",
        )
        .bind(&transportist.id)
        .bind(Json(transportist))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_agencies(&self) -> AppResult<Vec<Agency>> {
        let rows: Vec<(Json<Agency>,)> = sqlx::query_as("SELECT doc FROM agencies ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(doc,)| doc.0).collect())
    }

    async fn save_agency(&self, agency: &Agency) -> AppResult<()> {
        sqlx::query("INSERT INTO agencies (id, doc) VALUES ($1, $2) ON CONFLICT (id) DO UPDATE SET doc = EXCLUDED.doc")
            .bind(&agency.id)
            .bind(Json(agency))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_rate_table(&self) -> AppResult<RateTable> {
        let rows: Vec<(String, String, Decimal)> =
            sqlx::query_as("SELECT province, bracket, price FROM rate_table")
                .fetch_all(&self.pool)
                .await?;

        let mut table = RateTable::default();
        for (province, bracket, price) in rows {
            let bracket: WeightBracket = bracket
                .parse()
                .map_err(|e: String| AppError::Storage(format!("rate_table: {}", e)))?;
            table.entries.entry(province).or_default().insert(bracket, price);
        }
        Ok(table)
    }

    async fn save_rate_table(&self, table: &RateTable) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM rate_table").execute(&mut *tx).await?;
        for entry in table.to_entries() {
            sqlx::query("INSERT INTO rate_table (province, bracket, price) VALUES ($1, $2, $3)")
                .bind(&entry.province)
                .bind(entry.weight_bracket.as_str())
                .bind(entry.price)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn reserve_tracking_code(&self, code: &str) -> AppResult<bool> {
        let result = sqlx::query("INSERT INTO tracking_codes (code) VALUES ($1) ON CONFLICT (code) DO NOTHING")
            .bind(code)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn commit(&self, batch: StoreBatch) -> AppResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        check_route_guards(&mut tx, &batch.route_guards, batch.clear_routes).await?;
        for entry in &batch.orders {
            write_order(&mut tx, &entry.order, entry.expected_version).await?;
        }
        if batch.clear_routes {
            sqlx::query("DELETE FROM routes").execute(&mut *tx).await?;
        }
        for route in &batch.routes {
            upsert_route(&mut tx, route).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
