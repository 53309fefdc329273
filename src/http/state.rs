//! Shared handler state

use std::sync::Arc;

use super::error::ApiError;
use crate::storage::{StorageBackend, StorageError};

/// State cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    /// The one storage handle opened at startup
    pub storage: Arc<dyn StorageBackend>,
    /// Whether storage error detail may be returned to clients
    pub expose_errors: bool,
}

impl AppState {
    /// Create handler state.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>, expose_errors: bool) -> Self {
        Self {
            storage,
            expose_errors,
        }
    }

    pub(crate) fn api_error(&self, err: StorageError) -> ApiError {
        ApiError::from_storage(err, self.expose_errors)
    }
}
