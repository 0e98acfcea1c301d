//! Application state shared across handlers.

use std::sync::Arc;

use fashion_store_data::{DataClient, DataError};

use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the configuration and the data service client.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    data: DataClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the data service client cannot be built from the
    /// configuration.
    pub fn new(config: StorefrontConfig) -> Result<Self, DataError> {
        let data = DataClient::new(&config.data_service)?;

        Ok(Self {
            inner: Arc::new(AppStateInner { config, data }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the data service client (anonymous access).
    #[must_use]
    pub fn data(&self) -> &DataClient {
        &self.inner.data
    }
}
