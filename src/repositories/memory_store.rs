//! Store en memoria
//!
//! Todo el dataset vive detrás de un único `RwLock`. Cada mutación trabaja
//! sobre una copia y la publica sólo si tuvo éxito (y, con snapshot, si se
//! pudo escribir a disco), así que ningún lector ve estados parciales.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Agency, Order, RateTable, Route, Transportist};
use crate::repositories::store::{RouteGuard, Store, StoreBatch};
use crate::utils::errors::{conflict_error, not_found_error, AppError, AppResult};

/// Contenido completo del store, también formato del snapshot JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(default)]
    pub orders: BTreeMap<Uuid, Order>,
    #[serde(default)]
    pub routes: BTreeMap<Uuid, Route>,
    #[serde(default)]
    pub transportists: BTreeMap<String, Transportist>,
    #[serde(default)]
    pub agencies: BTreeMap<String, Agency>,
    #[serde(default)]
    pub rate_table: RateTable,
    #[serde(default)]
    pub issued_codes: BTreeSet<String>,
}

impl Dataset {
    fn find_by_code(&self, tracking_code: &str) -> Option<&Order> {
        self.orders.values().find(|o| o.tracking_code == tracking_code)
    }

    fn apply_order(&mut self, order: &Order, expected_version: u64) -> AppResult<Order> {
        let current = self
            .orders
            .get(&order.id)
            .ok_or_else(|| not_found_error("Order", &order.tracking_code))?;

        if current.version != expected_version {
            return Err(conflict_error("Order", &order.tracking_code));
        }

        let mut stored = order.clone();
        stored.version = expected_version + 1;
        self.orders.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn check_route_guards(&self, guards: &[RouteGuard], exhaustive: bool) -> AppResult<()> {
        for guard in guards {
            match self.routes.get(&guard.route_id) {
                Some(route) if route.status == guard.status => {}
                Some(route) => return Err(conflict_error("Route", &route.code)),
                None => return Err(conflict_error("Route", &guard.route_id.to_string())),
            }
        }
        if exhaustive {
            if let Some(extra) = self
                .routes
                .values()
                .find(|r| !guards.iter().any(|g| g.route_id == r.id))
            {
                return Err(conflict_error("Route", &extra.code));
            }
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct InMemoryStore {
    data: Arc<RwLock<Dataset>>,
    snapshot_path: Option<PathBuf>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_dataset(Dataset::default())
    }

    pub fn with_dataset(dataset: Dataset) -> Self {
        Self {
            data: Arc::new(RwLock::new(dataset)),
            snapshot_path: None,
        }
    }

    /// Abre un store respaldado por un snapshot JSON. Si el archivo no existe
    /// se inicializa con `seed` y se escribe.
    pub async fn open(path: PathBuf, seed: Dataset) -> AppResult<Self> {
        let dataset = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let dataset: Dataset = serde_json::from_slice(&bytes)?;
                log::info!(
                    "📂 Snapshot cargado desde {}: {} pedidos, {} rutas, {} códigos emitidos",
                    path.display(),
                    dataset.orders.len(),
                    dataset.routes.len(),
                    dataset.issued_codes.len()
                );
                dataset
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("🆕 Snapshot inexistente, inicializando {}", path.display());
                seed
            }
            Err(e) => return Err(e.into()),
        };

        let store = Self {
            data: Arc::new(RwLock::new(dataset)),
            snapshot_path: Some(path),
        };
        store.persist(&*store.data.read().await).await?;
        Ok(store)
    }

    async fn persist(&self, dataset: &Dataset) -> AppResult<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        let bytes = serde_json::to_vec_pretty(dataset)?;
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    async fn mutate<T>(&self, f: impl FnOnce(&mut Dataset) -> AppResult<T>) -> AppResult<T> {
        let mut guard = self.data.write().await;
        let mut next = guard.clone();
        let out = f(&mut next)?;
        self.persist(&next).await?;
        *guard = next;
        Ok(out)
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get_orders(&self) -> AppResult<Vec<Order>> {
        let data = self.data.read().await;
        let mut orders: Vec<Order> = data.orders.values().cloned().collect();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.tracking_code.cmp(&b.tracking_code)));
        Ok(orders)
    }

    async fn get_order(&self, tracking_code: &str) -> AppResult<Option<Order>> {
        Ok(self.data.read().await.find_by_code(tracking_code).cloned())
    }

    async fn get_order_by_id(&self, id: Uuid) -> AppResult<Option<Order>> {
        Ok(self.data.read().await.orders.get(&id).cloned())
    }

    async fn insert_order(&self, order: &Order) -> AppResult<Order> {
        self.mutate(|data| {
            if data.orders.contains_key(&order.id) || data.find_by_code(&order.tracking_code).is_some() {
                return Err(AppError::Conflict(format!(
                    "Order '{}' already exists",
                    order.tracking_code
                )));
            }
            let mut stored = order.clone();
            stored.version = 1;
            data.issued_codes.insert(stored.tracking_code.clone());
            data.orders.insert(stored.id, stored.clone());
            Ok(stored)
        })
        .await
    }

    async fn save_order(&self, order: &Order, expected_version: u64) -> AppResult<Order> {
        self.mutate(|data| data.apply_order(order, expected_version)).await
    }

    async fn get_routes(&self) -> AppResult<Vec<Route>> {
        let data = self.data.read().await;
        let mut routes: Vec<Route> = data.routes.values().cloned().collect();
        routes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.code.cmp(&b.code)));
        Ok(routes)
    }

    async fn get_route(&self, id: Uuid) -> AppResult<Option<Route>> {
        Ok(self.data.read().await.routes.get(&id).cloned())
    }

    async fn save_route(&self, route: &Route) -> AppResult<()> {
        self.mutate(|data| {
            data.routes.insert(route.id, route.clone());
            Ok(())
        })
        .await
    }

    async fn save_routes(&self, routes: &[Route]) -> AppResult<()> {
        self.mutate(|data| {
            data.routes = routes.iter().map(|r| (r.id, r.clone())).collect();
            Ok(())
        })
        .await
    }

    async fn get_transportists(&self) -> AppResult<Vec<Transportist>> {
        Ok(self.data.read().await.transportists.values().cloned().collect())
    }

    async fn get_transportist(&self, id: &str) -> AppResult<Option<Transportist>> {
        Ok(self.data.read().await.transportists.get(id).cloned())
    }

    async fn save_transportist(&self, transportist: &Transportist) -> AppResult<()> {
        self.mutate(|data| {
            data.transportists.insert(transportist.id.clone(), transportist.clone());
            Ok(())
        })
        .await
    }

    async fn get_agencies(&self) -> AppResult<Vec<Agency>> {
        Ok(self.data.read().await.agencies.values().cloned().collect())
    }

    async fn save_agency(&self, agency: &Agency) -> AppResult<()> {
        self.mutate(|data| {
            data.agencies.insert(agency.id.clone(), agency.clone());
            Ok(())
        })
        .await
    }

    async fn get_rate_table(&self) -> AppResult<RateTable> {
        Ok(self.data.read().await.rate_table.clone())
    }

    async fn save_rate_table(&self, table: &RateTable) -> AppResult<()> {
        self.mutate(|data| {
            data.rate_table = table.clone();
            Ok(())
        })
        .await
    }

    async fn reserve_tracking_code(&self, code: &str) -> AppResult<bool> {
        self.mutate(|data| Ok(data.issued_codes.insert(code.to_string()))).await
    }

    async fn commit(&self, batch: StoreBatch) -> AppResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        self.mutate(|data| {
            data.check_route_guards(&batch.route_guards, batch.clear_routes)?;
            for entry in &batch.orders {
                data.apply_order(&entry.order, entry.expected_version)?;
            }
            if batch.clear_routes {
                data.routes.clear();
            }
            for route in &batch.routes {
                data.routes.insert(route.id, route.clone());
            }
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RouteStatus;
    use crate::repositories::seed::{demo_dataset, sample_order, sample_route};
    use crate::repositories::store::VersionedOrder;

    #[tokio::test]
    async fn test_save_order_rejects_stale_version() {
        let store = InMemoryStore::new();
        let stored = store.insert_order(&sample_order("ENV-AAAA-AAAA", "Córdoba")).await.unwrap();
        assert_eq!(stored.version, 1);

        let updated = store.save_order(&stored, 1).await.unwrap();
        assert_eq!(updated.version, 2);

        let err = store.save_order(&stored, 1).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_code() {
        let store = InMemoryStore::new();
        store.insert_order(&sample_order("ENV-AAAA-AAAA", "Córdoba")).await.unwrap();
        let err = store
            .insert_order(&sample_order("ENV-AAAA-AAAA", "Mendoza"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_commit_is_all_or_nothing() {
        let store = InMemoryStore::new();
        let a = store.insert_order(&sample_order("ENV-AAAA-AAAA", "Córdoba")).await.unwrap();
        let b = store.insert_order(&sample_order("ENV-BBBB-BBBB", "Córdoba")).await.unwrap();

        let mut a2 = a.clone();
        a2.assigned_transportist = Some("T-001".to_string());
        let mut b2 = b.clone();
        b2.assigned_transportist = Some("T-001".to_string());

        let batch = StoreBatch {
            orders: vec![
                VersionedOrder { order: a2, expected_version: 1 },
                VersionedOrder { order: b2, expected_version: 7 },
            ],
            ..StoreBatch::default()
        };
        assert!(store.commit(batch).await.is_err());

        let reloaded = store.get_order("ENV-AAAA-AAAA").await.unwrap().unwrap();
        assert_eq!(reloaded.assigned_transportist, None);
        assert_eq!(reloaded.version, 1);
    }

    #[tokio::test]
    async fn test_reserve_tracking_code_once() {
        let store = InMemoryStore::new();
        assert!(store.reserve_tracking_code("ENV-CCCC-CCCC").await.unwrap());
        assert!(!store.reserve_tracking_code("ENV-CCCC-CCCC").await.unwrap());
    }

    #[tokio::test]
    async fn test_snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = InMemoryStore::open(path.clone(), demo_dataset()).await.unwrap();
        store.reserve_tracking_code("ENV-DDDD-DDDD").await.unwrap();
        drop(store);

        let reopened = InMemoryStore::open(path, Dataset::default()).await.unwrap();
        assert!(!reopened.reserve_tracking_code("ENV-DDDD-DDDD").await.unwrap());
        assert!(!reopened.get_transportists().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_commit_rejects_moved_route() {
        let mut dataset = demo_dataset();
        let route = sample_route("T-001");
        dataset.routes.insert(route.id, route.clone());
        let store = InMemoryStore::with_dataset(dataset);

        let mut moved = route.clone();
        moved.status = RouteStatus::InProgress;
        store.save_route(&moved).await.unwrap();

        let batch = StoreBatch {
            route_guards: vec![RouteGuard::from(&route)],
            clear_routes: true,
            ..StoreBatch::default()
        };
        let err = store.commit(batch).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.get_routes().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_clearing_routes_requires_every_route_guarded() {
        let mut dataset = demo_dataset();
        let known = sample_route("T-001");
        let unseen = sample_route("T-002");
        dataset.routes.insert(known.id, known.clone());
        dataset.routes.insert(unseen.id, unseen);
        let store = InMemoryStore::with_dataset(dataset);

        let batch = StoreBatch {
            route_guards: vec![RouteGuard::from(&known)],
            clear_routes: true,
            ..StoreBatch::default()
        };
        assert!(matches!(store.commit(batch).await, Err(AppError::Conflict(_))));
        assert_eq!(store.get_routes().await.unwrap().len(), 2);
    }
}
