use std::sync::Arc;

use tracing::info;

use shared_config::AppConfig;

use crate::day_locks::DayLocks;
use crate::memory::MemoryStore;
use crate::rest::RestStore;
use crate::store::{PatientStore, VisitStore};

/// Shared application state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub patients: Arc<dyn PatientStore>,
    pub visits: Arc<dyn VisitStore>,
    pub day_locks: DayLocks,
}

impl AppState {
    /// Pick the storage backend from configuration: the REST backend when
    /// one is configured, the in-process store otherwise.
    pub fn from_config(config: AppConfig) -> Self {
        if config.has_rest_backend() {
            info!("Using REST storage backend at {}", config.backend_url);
            let store = Arc::new(RestStore::new(&config));
            Self {
                config,
                patients: store.clone(),
                visits: store,
                day_locks: DayLocks::new(),
            }
        } else {
            info!("Using in-memory storage backend");
            Self::in_memory(config)
        }
    }

    pub fn in_memory(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            config,
            patients: store.clone(),
            visits: store,
            day_locks: DayLocks::new(),
        }
    }
}
