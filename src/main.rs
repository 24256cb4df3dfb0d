use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use parcel_routing::config::database::DatabaseConfig;
use parcel_routing::config::{EnvironmentConfig, StoreBackend};
use parcel_routing::database::{create_pool, run_migrations};
use parcel_routing::repositories::{seed, Dataset, InMemoryStore, PgStore, Store};
use parcel_routing::{create_app_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging (los registros de `log` pasan por el mismo subscriber)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🚚 Parcel Routing - pedidos, rutas y liquidaciones");
    info!("================================================");

    let config = EnvironmentConfig::from_env()?;
    let store = build_store(&config).await?;

    let app = create_app_router(AppState::new(config.clone(), store));
    let addr: SocketAddr = config.server_url().parse()?;

    info!("🌐 Servidor iniciando en http://{} ({})", addr, config.environment);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Estado del servicio");
    info!("📦 Pedidos:");
    info!("   POST /api/orders - Crear pedido");
    info!("   GET  /api/orders - Listar pedidos (?status=&transportistId=)");
    info!("   GET  /api/orders/:code - Obtener pedido");
    info!("   GET  /api/orders/:code/history - Historial");
    info!("   POST /api/orders/:code/status - Cambiar estado");
    info!("   POST /api/quote - Cotizar envío");
    info!("💲 Tarifario:");
    info!("   GET  /api/rates - Ver tarifario");
    info!("   PUT  /api/rates - Actualizar tarifa");
    info!("🚛 Transportistas:");
    info!("   GET  /api/transportists - Listar transportistas");
    info!("   GET  /api/transportists/:id/payments - Liquidación");
    info!("🗺️ Rutas:");
    info!("   GET  /api/routes - Listar rutas");
    info!("   POST /api/routes - Generar ruta");
    info!("   POST /api/routes/optimized - Ruta optimizada por transportista");
    info!("   POST /api/routes/:id/activate - Activar ruta");
    info!("   POST /api/routes/:id/complete - Completar ruta");
    info!("   GET  /api/routes/:id/sheet - Hoja de ruta imprimible");
    info!("   DELETE /api/routes - Limpiar rutas");
    info!("📍 Geo:");
    info!("   GET  /api/geo/localities - Localidades por provincia");
    info!("   GET  /api/geo/nearest-agency?lat=&lng= - Agencia más cercana");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            e
        })?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Arma el store según la configuración
async fn build_store(config: &EnvironmentConfig) -> Result<Arc<dyn Store>> {
    let seed_data = if config.seed_demo_data {
        seed::demo_dataset()
    } else {
        Dataset {
            rate_table: seed::default_rate_table(),
            ..Dataset::default()
        }
    };

    match config.store_backend {
        StoreBackend::Memory => {
            let store = match &config.snapshot_path {
                Some(path) => {
                    info!("💾 Store en memoria con snapshot en {}", path.display());
                    InMemoryStore::open(path.clone(), seed_data).await?
                }
                None => {
                    warn!("⚠️ Store en memoria sin snapshot: los datos se pierden al reiniciar");
                    InMemoryStore::with_dataset(seed_data)
                }
            };
            Ok(Arc::new(store))
        }
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .clone()
                .ok_or_else(|| anyhow!("DATABASE_URL is required for the postgres backend"))?;
            let pool = create_pool(&DatabaseConfig::new(url)).await?;
            run_migrations(&pool).await?;

            let store = PgStore::new(pool);
            store.seed_if_empty(&seed_data).await?;
            info!("✅ Base de datos lista");
            Ok(Arc::new(store))
        }
    }
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo escuchar Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo escuchar SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
