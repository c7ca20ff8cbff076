use std::sync::Arc;

use spectrum_core::config::{AppConfig, ConfigError};
use spectrum_core::{ModelStore, QueryEngine, StartupError};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub engine: QueryEngine,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("model store failed to load: {0}")]
    Startup(#[from] StartupError),
}

/// Loads every artifact eagerly; the server never starts half-initialized.
pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        model_dir = %config.artifacts.model_dir.display(),
        catalog = %config.artifacts.catalog.display(),
        "starting application bootstrap"
    );

    let store = ModelStore::initialize(&config.artifacts.locations())?;
    let summary = store.summary();
    info!(
        event_name = "system.bootstrap.store_ready",
        correlation_id = "bootstrap",
        clusters = summary.clusters,
        similarity_products = summary.similarity_products,
        catalog_products = summary.catalog_products,
        name_collisions = summary.name_collisions,
        "model store initialized"
    );

    Ok(Application { config, engine: QueryEngine::new(Arc::new(store)) })
}
