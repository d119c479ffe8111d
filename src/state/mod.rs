use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{
    config::AppConfig,
    dao::med_store::MedStore,
    error::ServiceError,
    services::{auth_service::TokenKeys, upload_storage::UploadStorage},
};

/// Reference-counted [`AppState`] handed to every handler.
pub type SharedState = Arc<AppState>;

/// Central application state: the storage handle, token keys and upload area.
pub struct AppState {
    med_store: RwLock<Option<Arc<dyn MedStore>>>,
    degraded: watch::Sender<bool>,
    config: AppConfig,
    tokens: TokenKeys,
    uploads: UploadStorage,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let tokens = TokenKeys::from_config(&config);
        let uploads = UploadStorage::new(config.upload_dir.clone());
        Arc::new(Self {
            med_store: RwLock::new(None),
            degraded: degraded_tx,
            config,
            tokens,
            uploads,
        })
    }

    /// Build a state with `store` already installed.
    pub async fn with_store(config: AppConfig, store: Arc<dyn MedStore>) -> SharedState {
        let state = Self::new(config);
        state.install_med_store(store).await;
        state
    }

    /// Obtain a handle to the current store, if one is installed.
    pub async fn med_store(&self) -> Option<Arc<dyn MedStore>> {
        let guard = self.med_store.read().await;
        guard.as_ref().cloned()
    }

    /// Current store, or [`ServiceError::Degraded`] when none is usable.
    pub async fn require_med_store(&self) -> Result<Arc<dyn MedStore>, ServiceError> {
        if *self.degraded.borrow() {
            return Err(ServiceError::Degraded);
        }
        self.med_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new store implementation and leave degraded mode.
    pub async fn install_med_store(&self, store: Arc<dyn MedStore>) {
        {
            let mut guard = self.med_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current store and enter degraded mode.
    pub async fn clear_med_store(&self) {
        {
            let mut guard = self.med_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Configuration the state was built from.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Keys used to sign and verify access tokens.
    pub fn tokens(&self) -> &TokenKeys {
        &self.tokens
    }

    /// Filesystem area where photos are written.
    pub fn uploads(&self) -> &UploadStorage {
        &self.uploads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::med_store::MemoryMedStore;

    #[tokio::test]
    async fn test_starts_degraded_until_store_installed() {
        let state = AppState::new(AppConfig::default());
        assert!(state.is_degraded());
        assert!(matches!(
            state.require_med_store().await,
            Err(ServiceError::Degraded)
        ));

        let mut watcher = state.degraded_watcher();
        state
            .install_med_store(Arc::new(MemoryMedStore::new()))
            .await;
        assert!(!state.is_degraded());
        assert!(watcher.has_changed().unwrap());
        assert!(!*watcher.borrow_and_update());
        assert!(state.require_med_store().await.is_ok());

        state.clear_med_store().await;
        assert!(state.is_degraded());
        assert!(state.med_store().await.is_none());
    }

    #[tokio::test]
    async fn test_degraded_flag_blocks_installed_store() {
        let state = AppState::with_store(AppConfig::default(), Arc::new(MemoryMedStore::new())).await;
        state.update_degraded(true);
        assert!(state.med_store().await.is_some());
        assert!(matches!(
            state.require_med_store().await,
            Err(ServiceError::Degraded)
        ));
    }
}
