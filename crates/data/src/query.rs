//! Table query builder.
//!
//! A [`Query`] collects a column selection, equality filters, ordering and a
//! row limit, then runs one of the terminal operations against the REST
//! surface. Filters render as `column=eq.value`, ordering as
//! `order=column.asc|desc`, exactly as the service expects them.

use std::fmt::Display;

use reqwest::Method;
use reqwest::header::{CONTENT_RANGE, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use crate::{DataClient, DataError};

/// Header asking the service to echo written rows or count matches.
const PREFER: &str = "prefer";

/// Tables exposed by the data service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Products,
    Categories,
    Customers,
    Orders,
    OrderItems,
}

impl Table {
    /// Table name as used in the REST path.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Categories => "categories",
            Self::Customers => "customers",
            Self::Orders => "orders",
            Self::OrderItems => "order_items",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction for [`Query::order`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

/// A pending query against one table.
#[must_use = "a query does nothing until a terminal operation is awaited"]
pub struct Query<'a> {
    client: &'a DataClient,
    table: Table,
    columns: String,
    filters: Vec<(String, String)>,
    order: Vec<(String, Direction)>,
    limit: Option<usize>,
}

impl<'a> Query<'a> {
    pub(crate) const fn new(client: &'a DataClient, table: Table) -> Self {
        Self {
            client,
            table,
            columns: String::new(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    /// Restrict the returned columns (`*` when never called).
    pub fn select(mut self, columns: &str) -> Self {
        columns.clone_into(&mut self.columns);
        self
    }

    /// Keep rows where `column` equals `value`.
    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.filters.push((column.to_string(), format!("eq.{value}")));
        self
    }

    /// Sort by `column`. Later calls break ties of earlier ones.
    pub fn order(mut self, column: &str, direction: Direction) -> Self {
        self.order.push((column.to_string(), direction));
        self
    }

    /// Return at most `n` rows.
    pub const fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Query string pairs in the order they are sent.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.filters.len() + 3);

        let columns = if self.columns.is_empty() {
            "*"
        } else {
            self.columns.as_str()
        };
        pairs.push(("select".to_string(), columns.to_string()));
        pairs.extend(self.filters.iter().cloned());

        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(|(column, direction)| format!("{column}.{}", direction.as_str()))
                .collect::<Vec<_>>()
                .join(",");
            pairs.push(("order".to_string(), order));
        }

        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }

        pairs
    }

    fn url(&self) -> Result<Url, DataError> {
        let mut url = self.client.table_url(self.table)?;
        url.query_pairs_mut().extend_pairs(self.query_pairs());
        Ok(url)
    }

    fn require_filter(&self, operation: &'static str) -> Result<(), DataError> {
        if self.filters.is_empty() {
            return Err(DataError::MissingFilter {
                operation,
                table: self.table.as_str(),
            });
        }
        Ok(())
    }

    /// Fetch every matching row.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or a row does not deserialize.
    #[instrument(skip_all, fields(table = %self.table))]
    pub async fn fetch<T: DeserializeOwned>(self) -> Result<Vec<T>, DataError> {
        let url = self.url()?;
        let response = self.client.request(Method::GET, url).send().await?;
        let response = self.client.check(response).await?;

        let rows: Vec<T> = response
            .json()
            .await
            .map_err(|e| DataError::Parse(format!("{} rows: {e}", self.table)))?;

        tracing::debug!(rows = rows.len(), "Fetched rows");
        Ok(rows)
    }

    /// Fetch zero or one row.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::MultipleRows`] if more than one row matches, or
    /// any error of [`Query::fetch`].
    pub async fn maybe_single<T: DeserializeOwned>(self) -> Result<Option<T>, DataError> {
        let table = self.table.as_str();
        let mut rows: Vec<T> = self.fetch().await?;

        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            count => Err(DataError::MultipleRows { table, count }),
        }
    }

    /// Count matching rows without transferring them.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the service omits a usable
    /// `Content-Range` header.
    #[instrument(skip_all, fields(table = %self.table))]
    pub async fn count(self) -> Result<u64, DataError> {
        let url = self.url()?;
        let response = self
            .client
            .request(Method::HEAD, url)
            .header(PREFER, HeaderValue::from_static("count=exact"))
            .send()
            .await?;
        let response = self.client.check(response).await?;

        response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| DataError::Parse(format!("{} count: missing Content-Range", self.table)))
    }

    /// Apply `patch` to every matching row and return the updated rows.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::MissingFilter`] when no filter was given, or any
    /// request/parse error.
    #[instrument(skip_all, fields(table = %self.table))]
    pub async fn update<B, T>(self, patch: &B) -> Result<Vec<T>, DataError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.require_filter("update")?;

        let url = self.url()?;
        let response = self
            .client
            .request(Method::PATCH, url)
            .header(PREFER, HeaderValue::from_static("return=representation"))
            .json(patch)
            .send()
            .await?;
        let response = self.client.check(response).await?;

        response
            .json()
            .await
            .map_err(|e| DataError::Parse(format!("{} updated rows: {e}", self.table)))
    }

    /// Delete every matching row.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::MissingFilter`] when no filter was given, or any
    /// request error.
    #[instrument(skip_all, fields(table = %self.table))]
    pub async fn delete(self) -> Result<(), DataError> {
        self.require_filter("delete")?;

        let url = self.url()?;
        let response = self.client.request(Method::DELETE, url).send().await?;
        self.client.check(response).await?;
        Ok(())
    }
}

/// Total row count from a `Content-Range` value such as `0-9/42` or `*/0`.
#[must_use]
pub fn parse_content_range(value: &str) -> Option<u64> {
    let (_, total) = value.trim().rsplit_once('/')?;
    total.parse().ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;

    use super::*;
    use crate::DataServiceConfig;

    fn client() -> DataClient {
        DataClient::new(&DataServiceConfig {
            url: Url::parse("https://abc.supabase.co").unwrap(),
            api_key: SecretString::from("anon"),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_default_selects_everything() {
        let client = client();
        let query = client.table(Table::Categories);
        assert_eq!(
            query.url().unwrap().as_str(),
            "https://abc.supabase.co/rest/v1/categories?select=*"
        );
    }

    #[test]
    fn test_filters_order_and_limit() {
        let client = client();
        let query = client
            .table(Table::Products)
            .eq("category_id", "c1")
            .order("created_at", Direction::Descending)
            .order("name", Direction::Ascending)
            .limit(5);

        assert_eq!(
            query.query_pairs(),
            vec![
                ("select".to_string(), "*".to_string()),
                ("category_id".to_string(), "eq.c1".to_string()),
                ("order".to_string(), "created_at.desc,name.asc".to_string()),
                ("limit".to_string(), "5".to_string()),
            ]
        );
    }

    #[test]
    fn test_select_columns() {
        let client = client();
        let query = client.table(Table::Orders).select("total_amount");
        assert_eq!(
            query.url().unwrap().query(),
            Some("select=total_amount")
        );
    }

    #[test]
    fn test_filter_values_are_encoded() {
        let client = client();
        let query = client.table(Table::Customers).eq("email", "a+b@example.com");
        assert_eq!(
            query.url().unwrap().query(),
            Some("select=*&email=eq.a%2Bb%40example.com")
        );
    }

    #[tokio::test]
    async fn test_unfiltered_delete_is_refused() {
        let client = client();
        let err = client.table(Table::Products).delete().await.unwrap_err();
        assert!(matches!(
            err,
            DataError::MissingFilter {
                operation: "delete",
                table: "products"
            }
        ));
    }

    #[tokio::test]
    async fn test_unfiltered_update_is_refused() {
        let client = client();
        let err = client
            .table(Table::Orders)
            .update::<_, serde_json::Value>(&serde_json::json!({"status": "shipped"}))
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::MissingFilter { operation: "update", .. }));
    }

    #[test]
    fn test_parse_content_range() {
        assert_eq!(parse_content_range("0-9/42"), Some(42));
        assert_eq!(parse_content_range("*/0"), Some(0));
        assert_eq!(parse_content_range(" 0-0/1 "), Some(1));
        assert_eq!(parse_content_range("0-9/*"), None);
        assert_eq!(parse_content_range("garbage"), None);
    }
}
