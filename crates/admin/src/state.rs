//! Application state shared across handlers.

use std::sync::Arc;

use fashion_store_data::{DataClient, DataError};

use crate::config::AdminConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    data: DataClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the data service client cannot be built.
    pub fn new(config: AdminConfig) -> Result<Self, DataError> {
        let data = DataClient::new(&config.data_service)?;

        Ok(Self {
            inner: Arc::new(AppStateInner { config, data }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Anonymous data service client. Dashboard handlers scope it to the
    /// signed-in admin with [`DataClient::as_user`].
    #[must_use]
    pub fn data(&self) -> &DataClient {
        &self.inner.data
    }
}
