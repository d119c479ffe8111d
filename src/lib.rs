//! Library crate for medapp-back, exposing modules for binaries and integration tests.

use std::sync::Arc;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

pub mod config;
/// Persistence: entities, the store trait and its backends.
pub mod dao;
/// Request and response payloads exposed over HTTP.
pub mod dto;
/// HTTP-facing error types.
pub mod error;
/// Axum route trees.
pub mod routes;
/// Business logic between routes and storage.
pub mod services;
/// Shared application state.
pub mod state;

use config::AppConfig;
use dao::med_store::{MedStore, MemoryMedStore};
use state::{AppState, SharedState};

/// Build the top-level router and attach cross-cutting middleware layers.
pub fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Shared state backed by the in-memory store, ready to serve requests.
pub async fn in_memory_state(config: AppConfig) -> SharedState {
    info!("no MONGO_URI configured; using the in-memory store");
    let store: Arc<dyn MedStore> = Arc::new(MemoryMedStore::new());
    AppState::with_store(config, store).await
}

/// Configure tracing subscribers so logs include spans by default.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
