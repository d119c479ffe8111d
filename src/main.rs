//! MedApp Back binary entrypoint wiring configuration, storage and the REST layer.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use medapp_back::{
    build_router, config::AppConfig, in_memory_state, init_tracing, state::SharedState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let port = config.port;

    let app_state = start_storage(config).await;
    app_state
        .uploads()
        .ensure_dir()
        .await
        .with_context(|| format!("creating {}", app_state.uploads().dir().display()))?;

    let app = build_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Spawn the MongoDB supervisor when a URI is configured, else fall back to memory.
#[cfg(feature = "mongo-store")]
async fn start_storage(config: AppConfig) -> SharedState {
    use std::sync::Arc;

    use medapp_back::{
        dao::{
            med_store::{
                MedStore,
                mongodb::{MongoConfig, MongoMedStore},
            },
            storage::StorageError,
        },
        services::storage_supervisor,
        state::AppState,
    };

    let Some(uri) = config.mongo_uri.clone() else {
        return in_memory_state(config).await;
    };
    let db_name = config.mongo_db.clone();
    let state = AppState::new(config);

    tokio::spawn(storage_supervisor::run(state.clone(), move || {
        let uri = uri.clone();
        let db_name = db_name.clone();
        async move {
            let config = MongoConfig::from_uri(&uri, Some(&db_name)).await?;
            let store = MongoMedStore::connect(config).await?;
            Ok::<_, StorageError>(Arc::new(store) as Arc<dyn MedStore>)
        }
    }));

    state
}

#[cfg(not(feature = "mongo-store"))]
async fn start_storage(config: AppConfig) -> SharedState {
    if config.mongo_uri.is_some() {
        tracing::warn!("MONGO_URI is set but the mongo-store feature is disabled");
    }
    in_memory_state(config).await
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("shutdown signal received");
}
