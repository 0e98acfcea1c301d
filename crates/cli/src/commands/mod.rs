//! CLI subcommands.

pub mod seed;
pub mod stats;

use std::time::Duration;

use fashion_store_data::{DataClient, DataServiceConfig};
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Errors reading the connection settings.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(&'static str, String),

    #[error(transparent)]
    Data(#[from] fashion_store_data::DataError),
}

/// Build a data client with the service key.
///
/// # Errors
///
/// Returns an error if a variable is missing or malformed.
pub fn connect() -> Result<DataClient, ConnectError> {
    dotenvy::dotenv().ok();

    let url = std::env::var("DATA_SERVICE_URL")
        .map_err(|_| ConnectError::MissingEnvVar("DATA_SERVICE_URL"))?;
    let url = Url::parse(&url)
        .map_err(|e| ConnectError::InvalidEnvVar("DATA_SERVICE_URL", e.to_string()))?;

    let api_key = std::env::var("DATA_SERVICE_SERVICE_KEY")
        .map(SecretString::from)
        .map_err(|_| ConnectError::MissingEnvVar("DATA_SERVICE_SERVICE_KEY"))?;

    let timeout = std::env::var("DATA_SERVICE_TIMEOUT_SECS")
        .unwrap_or_else(|_| "10".to_string())
        .parse::<u64>()
        .map_err(|e| ConnectError::InvalidEnvVar("DATA_SERVICE_TIMEOUT_SECS", e.to_string()))?;

    let client = DataClient::new(&DataServiceConfig {
        url,
        api_key,
        timeout: Duration::from_secs(timeout),
    })?;
    Ok(client)
}
