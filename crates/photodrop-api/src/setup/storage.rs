//! Storage setup and initialization

use anyhow::{Context, Result};
use photodrop_core::Config;
use photodrop_storage::{create_storage, Storage};
use std::sync::Arc;

/// Open the configured backend, creating the storage directory when absent.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    tracing::info!("Initializing storage...");
    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage")?;

    tracing::info!(
        backend = %storage.backend_type(),
        path = %config.storage_path(),
        "Storage initialized successfully"
    );
    Ok(storage)
}
