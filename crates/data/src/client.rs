//! HTTP plumbing shared by every data service call.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use crate::DataError;
use crate::query::{Query, Table};

/// Header carrying the project API key on every request.
const API_KEY_HEADER: &str = "apikey";

/// Connection settings for the hosted data service.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct DataServiceConfig {
    /// Project URL, e.g. `https://abc.supabase.co`
    pub url: Url,
    /// Project API key (anon key for the web services, service key for the CLI)
    pub api_key: SecretString,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for DataServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataServiceConfig")
            .field("url", &self.url.as_str())
            .field("api_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Client for the hosted data service.
///
/// Cheap to clone. A client obtained through [`DataClient::as_user`] sends
/// the user's access token instead of the bare API key, so the service
/// evaluates its row policies for that user.
#[derive(Clone)]
pub struct DataClient {
    inner: Arc<DataClientInner>,
    access_token: Option<SecretString>,
}

struct DataClientInner {
    http: reqwest::Client,
    rest_url: Url,
    auth_url: Url,
    api_key: SecretString,
}

impl DataClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the service URL cannot be extended with the REST
    /// and auth paths, or if the HTTP client fails to build.
    pub fn new(config: &DataServiceConfig) -> Result<Self, DataError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            inner: Arc::new(DataClientInner {
                http,
                rest_url: endpoint(&config.url, "rest/v1/")?,
                auth_url: endpoint(&config.url, "auth/v1/")?,
                api_key: config.api_key.clone(),
            }),
            access_token: None,
        })
    }

    /// A client that acts on behalf of the user owning `access_token`.
    #[must_use]
    pub fn as_user(&self, access_token: &SecretString) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            access_token: Some(access_token.clone()),
        }
    }

    /// Start a query against `table`.
    pub const fn table(&self, table: Table) -> Query<'_> {
        Query::new(self, table)
    }

    /// Check that the service answers.
    ///
    /// # Errors
    ///
    /// Returns an error if the service is unreachable or rejects the key.
    pub async fn ping(&self) -> Result<(), DataError> {
        self.table(Table::Categories).limit(1).count().await.map(|_| ())
    }

    /// Insert `rows` (one object or an array) and return the stored rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the service rejects the rows or the response does
    /// not deserialize.
    #[instrument(skip(self, rows))]
    pub async fn insert<B, T>(&self, table: Table, rows: &B) -> Result<Vec<T>, DataError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut url = self.table_url(table)?;
        url.query_pairs_mut().append_pair("select", "*");

        let response = self
            .request(Method::POST, url)
            .header("prefer", "return=representation")
            .json(rows)
            .send()
            .await?;
        let response = self.check(response).await?;

        response
            .json()
            .await
            .map_err(|e| DataError::Parse(format!("{table} inserted rows: {e}")))
    }

    pub(crate) fn table_url(&self, table: Table) -> Result<Url, DataError> {
        Ok(self.inner.rest_url.join(table.as_str())?)
    }

    pub(crate) fn auth_url(&self, path: &str) -> Result<Url, DataError> {
        Ok(self.inner.auth_url.join(path)?)
    }

    /// Build a request carrying the API key and the caller's bearer token.
    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let bearer = self
            .access_token
            .as_ref()
            .unwrap_or(&self.inner.api_key);
        self.request_with_bearer(method, url, bearer)
    }

    /// Build a request with an explicit bearer token (auth endpoints).
    pub(crate) fn request_with_bearer(
        &self,
        method: Method,
        url: Url,
        bearer: &SecretString,
    ) -> RequestBuilder {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(self.inner.api_key.expose_secret()) {
            headers.insert(API_KEY_HEADER, value);
        }
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", bearer.expose_secret())) {
            headers.insert(AUTHORIZATION, value);
        }

        self.inner.http.request(method, url).headers(headers)
    }

    /// Turn a non-success response into a [`DataError`].
    pub(crate) async fn check(&self, response: Response) -> Result<Response, DataError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(DataError::RateLimited(retry_after));
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(DataError::Unauthorized);
        }

        let url = response.url().path().to_string();
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(
            status = %status,
            path = %url,
            body = %body.chars().take(500).collect::<String>(),
            "Data service returned non-success status"
        );

        if status == StatusCode::NOT_FOUND {
            return Err(DataError::NotFound(url));
        }

        Err(api_error(status.as_u16(), &body))
    }
}

impl std::fmt::Debug for DataClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataClient")
            .field("rest_url", &self.inner.rest_url.as_str())
            .field("as_user", &self.access_token.is_some())
            .finish_non_exhaustive()
    }
}

/// Append `path` to the project URL, keeping any path prefix it already has.
fn endpoint(base: &Url, path: &str) -> Result<Url, url::ParseError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.join(path)
}

/// Build an API error from an error body.
///
/// The REST surface answers `{code, message}`, the auth surface either
/// `{error, error_description}` or `{error_code, msg}`.
fn api_error(status: u16, body: &str) -> DataError {
    let json: serde_json::Value = serde_json::from_str(body).unwrap_or_default();
    let pick = |keys: &[&str]| {
        keys.iter()
            .find_map(|key| json.get(*key))
            .map(|value| match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
    };

    DataError::Api {
        status,
        code: pick(&["code", "error_code", "error"]).unwrap_or_default(),
        message: pick(&["message", "msg", "error_description"])
            .unwrap_or_else(|| body.chars().take(200).collect()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(url: &str) -> DataServiceConfig {
        DataServiceConfig {
            url: Url::parse(url).unwrap(),
            api_key: SecretString::from("anon-key-value"),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_endpoint_without_trailing_slash() {
        let base = Url::parse("https://abc.supabase.co").unwrap();
        assert_eq!(
            endpoint(&base, "rest/v1/").unwrap().as_str(),
            "https://abc.supabase.co/rest/v1/"
        );
    }

    #[test]
    fn test_endpoint_keeps_path_prefix() {
        let base = Url::parse("http://localhost:8000/project").unwrap();
        assert_eq!(
            endpoint(&base, "auth/v1/").unwrap().as_str(),
            "http://localhost:8000/project/auth/v1/"
        );
    }

    #[test]
    fn test_table_url() {
        let client = DataClient::new(&config("https://abc.supabase.co")).unwrap();
        assert_eq!(
            client.table_url(Table::OrderItems).unwrap().as_str(),
            "https://abc.supabase.co/rest/v1/order_items"
        );
    }

    #[test]
    fn test_api_error_rest_body() {
        let err = api_error(
            400,
            r#"{"code":"23502","message":"null value in column \"name\"","details":null}"#,
        );
        match err {
            DataError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 400);
                assert_eq!(code, "23502");
                assert_eq!(message, "null value in column \"name\"");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_api_error_auth_body() {
        let err = api_error(
            422,
            r#"{"error_code":"weak_password","msg":"Password should be at least 6 characters"}"#,
        );
        assert_eq!(
            err.to_string(),
            "API error: 422 weak_password - Password should be at least 6 characters"
        );
    }

    #[test]
    fn test_api_error_plain_text_body() {
        let err = api_error(502, "bad gateway");
        assert_eq!(err.to_string(), "API error: 502  - bad gateway");
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = config("https://abc.supabase.co");
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("anon-key-value"));

        let client = DataClient::new(&config).unwrap();
        assert!(!format!("{client:?}").contains("anon-key-value"));
    }
}
