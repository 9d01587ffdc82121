//! Shared application state.

use findoc_core::AppConfig;
use findoc_store::SqliteStore;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: AppConfig,
    pub store: SqliteStore,
    /// One HTTP client for all outbound remote-analysis calls.
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: AppConfig, store: SqliteStore) -> Self {
        Self {
            config,
            store,
            http: reqwest::Client::new(),
        }
    }
}
