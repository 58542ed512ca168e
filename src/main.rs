use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use glamfeed_server::config::{Config, StoreBackendKind};
use glamfeed_server::store::{MemoryStore, RedbStore, Store, StoreBackend};
use glamfeed_server::{AppState, build_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "glamfeed_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Glamfeed Server...");

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "Environment: {}, Server: {}",
        config.environment,
        config.server_address()
    );

    let backend: Arc<dyn StoreBackend> = match config.store_backend {
        StoreBackendKind::Redb => Arc::new(RedbStore::open(&config.database_path)?),
        StoreBackendKind::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };
    let store = Store::new(backend, config.timeouts());

    let state = AppState::new(store, config.clone()).map_err(|e| anyhow::anyhow!(e))?;
    let app = build_router(state);

    // Start server
    let addr: SocketAddr = config.server_address().parse()?;
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
