//! Application state for the web server.

use std::sync::Arc;
use tokio::sync::RwLock;

use datamend::DatasetStore;

/// Shared application state.
///
/// Uploads, detection and treatment take the write lock; reads (columns,
/// prompts, downloads) share the read lock.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<DatasetStore>>,
}

impl AppState {
    pub fn new(store: DatasetStore) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
        }
    }
}
