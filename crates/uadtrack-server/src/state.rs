use std::sync::Arc;

use uadtrack_core::{config::Config, store::DeviceStore};
use uadtrack_duckdb::DuckDbBackend;

/// Shared application state injected into every Axum handler via
/// [`axum::extract::State`].
pub struct AppState {
    /// The DuckDB backend, kept concrete for tests that need the raw
    /// connection.
    pub db: Arc<DuckDbBackend>,

    /// The same backend behind the storage trait. Handlers and the tracking
    /// layer only go through this.
    pub store: Arc<dyn DeviceStore>,

    /// Parsed configuration, loaded once at startup from environment variables.
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: DuckDbBackend, config: Config) -> Self {
        let db = Arc::new(db);
        let store: Arc<dyn DeviceStore> = db.clone();
        Self {
            db,
            store,
            config: Arc::new(config),
        }
    }
}
