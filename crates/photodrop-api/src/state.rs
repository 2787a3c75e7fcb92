//! Application state shared by every handler.
//!
//! Handlers take `State<Arc<AppState>>`, or extract just the relay through
//! Axum's `FromRef`.

use crate::services::relay::RelayService;
use photodrop_core::Config;
use photodrop_storage::Storage;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn Storage>,
    pub relay: RelayService,
}

impl AppState {
    pub fn new(config: Config, storage: Arc<dyn Storage>) -> Self {
        let relay = RelayService::new(storage.clone(), config.upload_field());
        Self {
            config,
            storage,
            relay,
        }
    }
}

impl axum::extract::FromRef<Arc<AppState>> for RelayService {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.relay.clone()
    }
}
