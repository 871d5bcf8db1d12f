// membership-service/src/lib.rs
use std::sync::Arc;

use crate::config::{AppConfig, AuthSettings, StorageBackend};
use crate::store::{FileStore, MemoryStore, Storage};

pub mod config;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod utils;

#[cfg(test)]
mod tests;

/// Shared by every worker through `web::Data`.
pub struct AppState {
    pub store: Arc<dyn Storage>,
    pub auth: AuthSettings,
}

impl AppState {
    pub fn new(store: Arc<dyn Storage>, auth: AuthSettings) -> Self {
        Self { store, auth }
    }

    // Opens the configured backend
    pub fn from_config(config: &AppConfig) -> std::io::Result<Self> {
        let store: Arc<dyn Storage> = match config.storage_backend {
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
            StorageBackend::File => Arc::new(FileStore::open(&config.storage_dir)?),
        };
        Ok(Self::new(store, config.auth.clone()))
    }
}
