//! Gateway server setup
//!
//! Provides the WebSocket server configuration and routes.

mod handler;
mod state;

pub use handler::gateway_handler;
pub use state::{
    GatewaySettings, GatewayState, HEARTBEAT_INTERVAL_MS, HEARTBEAT_TIMEOUT_MS,
    MESSAGE_BUFFER_SIZE,
};

use axum::{routing::get, Router};
use confession_cache::{LocalBroadcastChannel, RedisBroadcastChannel, RedisPool};
use confession_common::{AppConfig, AppError, BroadcastBackend, StoreBackend};
use confession_core::{BroadcastChannel, ChangeFeed, PostStore};
use confession_db::{MemoryPostStore, PgChangeFeed, PgPostStore, PoolConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Create the gateway router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/gateway", get(gateway_handler))
        .route("/health", get(health_check))
}

async fn health_check() -> &'static str {
    "OK"
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    create_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Connect the store and channel backends selected by the configuration
pub async fn create_gateway_state(config: &AppConfig) -> Result<GatewayState, AppError> {
    let (store, change_feed): (Arc<dyn PostStore>, Arc<dyn ChangeFeed>) = match config.store.backend
    {
        StoreBackend::Postgres => {
            let db = config
                .database
                .as_ref()
                .ok_or_else(|| AppError::Config("database settings missing".to_string()))?;

            tracing::info!("Connecting to PostgreSQL...");
            let pool = confession_db::create_pool(&PoolConfig::from(db))
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            confession_db::run_migrations(&pool)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            tracing::info!("PostgreSQL connection established");

            (
                Arc::new(PgPostStore::new(pool.clone())),
                Arc::new(PgChangeFeed::new(pool, config.store.change_buffer)),
            )
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory post store; posts are lost on restart");
            let store = Arc::new(MemoryPostStore::new(config.store.change_buffer));
            (store.clone(), store)
        }
    };

    let broadcast: Arc<dyn BroadcastChannel> = match config.broadcast.backend {
        BroadcastBackend::Redis => {
            let redis = config
                .redis
                .as_ref()
                .ok_or_else(|| AppError::Config("redis settings missing".to_string()))?;

            tracing::info!("Connecting to Redis...");
            let pool = RedisPool::from_config(redis).map_err(|e| AppError::Cache(e.to_string()))?;
            let channel = RedisBroadcastChannel::from_config(pool, &config.broadcast)
                .await
                .map_err(|e| AppError::Cache(e.to_string()))?;
            tracing::info!("Redis connection established");

            Arc::new(channel)
        }
        BroadcastBackend::Local => Arc::new(LocalBroadcastChannel::new(config.broadcast.buffer)),
    };

    Ok(GatewayState::new(store, change_feed, broadcast).with_settings(config.into()))
}

/// Serve the gateway on an already bound listener
pub async fn serve(listener: TcpListener, state: GatewayState) -> Result<(), AppError> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Gateway listening on ws://{}/gateway", addr);
    }

    let sweep = tokio::spawn(sweep_connections(state.clone()));
    let result = axum::serve(listener, create_app(state))
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")));
    sweep.abort();
    result
}

/// Drop registered connections whose socket task is gone, once per heartbeat interval
async fn sweep_connections(state: GatewayState) {
    let period = state.settings().heartbeat_interval.max(Duration::from_millis(10));
    let mut ticker = tokio::time::interval(period);
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let manager = state.connection_manager();
        let removed = manager.cleanup_closed_connections();
        tracing::debug!(
            connections = manager.connection_count(),
            joined = manager.joined_count(),
            removed,
            "Connection sweep"
        );
    }
}

/// Run the complete gateway server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr = config.gateway.address();
    let state = create_gateway_state(&config).await?;

    tracing::info!("Starting Gateway server on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    serve(listener, state).await
}
