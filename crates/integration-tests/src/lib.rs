//! Integration tests for Fashion Store.
//!
//! The storefront and the admin dashboard are started on ephemeral ports
//! against [`FakeDataService`], an in-memory stand-in for the hosted data
//! service that speaks the subset of its REST and auth surface the apps use.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p fashion-store-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use fashion_store_admin::config::AdminConfig;
use fashion_store_data::DataServiceConfig;
use fashion_store_storefront::config::StorefrontConfig;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use url::Url;

/// A user known to the fake auth service.
#[derive(Debug, Clone)]
struct FakeUser {
    id: String,
    email: String,
    password: String,
    role: Option<String>,
}

impl FakeUser {
    fn to_json(&self) -> Value {
        let mut app_metadata = json!({ "provider": "email" });
        if let Some(role) = &self.role {
            app_metadata["role"] = json!(role);
        }
        json!({
            "id": self.id,
            "email": self.email,
            "app_metadata": app_metadata,
        })
    }
}

#[derive(Default)]
struct Store {
    tables: HashMap<String, Vec<Value>>,
    users: Vec<FakeUser>,
    /// Access token to user ID.
    tokens: HashMap<String, String>,
    /// Answer sign-out with 503 instead of revoking.
    logout_unavailable: bool,
}

/// In-memory data service.
///
/// Supports `eq.` filters, `order`, `limit` and `select` on reads, counting
/// through `Content-Range`, inserts, patches and deletes, plus password
/// sign-in, user lookup and sign-out. Sign-out can be made to fail with
/// [`FakeDataService::set_logout_unavailable`].
#[derive(Clone)]
pub struct FakeDataService {
    store: Arc<Mutex<Store>>,
    url: Url,
}

impl FakeDataService {
    /// Start the service on an ephemeral port.
    pub async fn start() -> Self {
        let store = Arc::new(Mutex::new(Store::default()));

        let router = Router::new()
            .route(
                "/rest/v1/{table}",
                get(select_rows)
                    .post(insert_rows)
                    .patch(update_rows)
                    .delete(delete_rows),
            )
            .route("/auth/v1/token", post(token))
            .route("/auth/v1/user", get(user))
            .route("/auth/v1/logout", post(logout))
            .with_state(Arc::clone(&store));

        let addr = serve(router).await;
        Self {
            store,
            url: Url::parse(&format!("http://{addr}")).unwrap(),
        }
    }

    /// Base URL of the service.
    #[must_use]
    pub fn url(&self) -> Url {
        self.url.clone()
    }

    /// Client settings pointing at this service.
    #[must_use]
    pub fn config(&self) -> DataServiceConfig {
        DataServiceConfig {
            url: self.url(),
            api_key: SecretString::from("anon-key"),
            timeout: Duration::from_secs(5),
        }
    }

    /// Register a user. `role` is stored in the app metadata.
    pub fn add_user(&self, email: &str, password: &str, role: Option<&str>) {
        self.store.lock().unwrap().users.push(FakeUser {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: role.map(str::to_string),
        });
    }

    /// Make sign-out answer 503 Service Unavailable while `unavailable`.
    pub fn set_logout_unavailable(&self, unavailable: bool) {
        self.store.lock().unwrap().logout_unavailable = unavailable;
    }

    /// Insert a row as is and return it with `id` and `created_at` filled.
    pub fn insert(&self, table: &str, row: Value) -> Value {
        let row = with_defaults(row);
        self.store
            .lock()
            .unwrap()
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        row
    }

    /// Current rows of `table`.
    #[must_use]
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.store
            .lock()
            .unwrap()
            .tables
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Insert a product with sizes and colors and return its ID.
    pub fn add_product(
        &self,
        name: &str,
        price: &str,
        sizes: &[&str],
        colors: &[&str],
        stock: i32,
    ) -> String {
        let row = self.insert(
            "products",
            json!({
                "name": name,
                "description": "",
                "price": price,
                "image_url": "",
                "sizes": sizes,
                "colors": colors,
                "stock": stock,
                "featured": false,
                "category_id": null,
            }),
        );
        row["id"].as_str().unwrap().to_string()
    }
}

fn with_defaults(row: Value) -> Value {
    let mut row = match row {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    row.entry("id")
        .or_insert_with(|| json!(uuid::Uuid::new_v4().to_string()));
    row.entry("created_at")
        .or_insert_with(|| json!(chrono::Utc::now().to_rfc3339()));
    Value::Object(row)
}

/// Text form of a cell as compared by `eq.` filters.
fn cell(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "null".to_string(),
        Some(other) => other.to_string(),
    }
}

/// Parsed query string of a REST call.
struct RowQuery {
    filters: Vec<(String, String)>,
    order: Vec<(String, bool)>,
    limit: Option<usize>,
    select: Vec<String>,
}

impl RowQuery {
    fn parse(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self {
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
            select: Vec::new(),
        };

        for (key, value) in pairs {
            match key.as_str() {
                "select" if value != "*" => {
                    query.select = value.split(',').map(str::to_string).collect();
                }
                "select" => {}
                "order" => {
                    query.order = value
                        .split(',')
                        .filter_map(|part| part.rsplit_once('.'))
                        .map(|(column, direction)| (column.to_string(), direction == "desc"))
                        .collect();
                }
                "limit" => query.limit = value.parse().ok(),
                _ => {
                    if let Some(expected) = value.strip_prefix("eq.") {
                        query.filters.push((key, expected.to_string()));
                    }
                }
            }
        }

        query
    }

    fn matches(&self, row: &Value) -> bool {
        self.filters
            .iter()
            .all(|(column, expected)| cell(row.get(column)) == *expected)
    }

    fn apply(&self, rows: &[Value]) -> Vec<Value> {
        let mut rows: Vec<Value> = rows.iter().filter(|row| self.matches(row)).cloned().collect();

        rows.sort_by(|a, b| {
            for (column, descending) in &self.order {
                let ordering = cell(a.get(column)).cmp(&cell(b.get(column)));
                let ordering = if *descending { ordering.reverse() } else { ordering };
                if ordering.is_ne() {
                    return ordering;
                }
            }
            std::cmp::Ordering::Equal
        });

        if let Some(limit) = self.limit {
            rows.truncate(limit);
        }

        if !self.select.is_empty() {
            rows = rows
                .into_iter()
                .map(|row| {
                    let projected: Map<String, Value> = self
                        .select
                        .iter()
                        .filter_map(|column| row.get(column).map(|v| (column.clone(), v.clone())))
                        .collect();
                    Value::Object(projected)
                })
                .collect();
        }

        rows
    }
}

type Shared = Arc<Mutex<Store>>;

/// GET (and HEAD) on a table. The total number of matches is always sent in
/// `Content-Range`.
async fn select_rows(
    State(store): State<Shared>,
    Path(table): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let query = RowQuery::parse(pairs);
    let store = store.lock().unwrap();
    let all = store.tables.get(&table).map_or(&[][..], Vec::as_slice);

    let total = all.iter().filter(|row| query.matches(row)).count();
    let rows = query.apply(all);
    let range = if rows.is_empty() {
        format!("*/{total}")
    } else {
        format!("0-{}/{total}", rows.len() - 1)
    };

    ([(header::CONTENT_RANGE, range)], Json(rows)).into_response()
}

async fn insert_rows(
    State(store): State<Shared>,
    Path(table): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let rows = match body {
        Value::Array(rows) => rows,
        row => vec![row],
    };
    let rows: Vec<Value> = rows.into_iter().map(with_defaults).collect();

    store
        .lock()
        .unwrap()
        .tables
        .entry(table)
        .or_default()
        .extend(rows.iter().cloned());

    (StatusCode::CREATED, Json(rows)).into_response()
}

async fn update_rows(
    State(store): State<Shared>,
    Path(table): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
    Json(patch): Json<Map<String, Value>>,
) -> Response {
    let query = RowQuery::parse(pairs);
    let mut store = store.lock().unwrap();
    let mut updated = Vec::new();

    for row in store.tables.entry(table).or_default().iter_mut() {
        if !query.matches(row) {
            continue;
        }
        if let Value::Object(fields) = row {
            fields.extend(patch.clone());
            updated.push(Value::Object(fields.clone()));
        }
    }

    Json(updated).into_response()
}

async fn delete_rows(
    State(store): State<Shared>,
    Path(table): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> StatusCode {
    let query = RowQuery::parse(pairs);
    store
        .lock()
        .unwrap()
        .tables
        .entry(table)
        .or_default()
        .retain(|row| !query.matches(row));
    StatusCode::NO_CONTENT
}

#[derive(Deserialize)]
struct PasswordGrant {
    email: String,
    password: String,
}

async fn token(State(store): State<Shared>, Json(grant): Json<PasswordGrant>) -> Response {
    let mut store = store.lock().unwrap();
    let Some(user) = store
        .users
        .iter()
        .find(|u| u.email.eq_ignore_ascii_case(&grant.email) && u.password == grant.password)
        .cloned()
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_grant", "error_description": "Invalid login credentials" })),
        )
            .into_response();
    };

    let access_token = uuid::Uuid::new_v4().to_string();
    store.tokens.insert(access_token.clone(), user.id.clone());

    Json(json!({
        "access_token": access_token,
        "token_type": "bearer",
        "expires_in": 3600,
        "user": user.to_json(),
    }))
    .into_response()
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

async fn user(State(store): State<Shared>, headers: HeaderMap) -> Response {
    let store = store.lock().unwrap();
    let found = bearer(&headers)
        .and_then(|token| store.tokens.get(&token).cloned())
        .and_then(|id| store.users.iter().find(|u| u.id == id).cloned());

    match found {
        Some(user) => Json(user.to_json()).into_response(),
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn logout(State(store): State<Shared>, headers: HeaderMap) -> StatusCode {
    let mut store = store.lock().unwrap();
    if store.logout_unavailable {
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    if let Some(token) = bearer(&headers) {
        store.tokens.remove(&token);
    }
    StatusCode::NO_CONTENT
}

/// Serve `router` on an ephemeral local port.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Start the storefront against `data` and return its base URL.
pub async fn spawn_storefront(data: &FakeDataService) -> String {
    let config = StorefrontConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        base_url: "http://127.0.0.1".to_string(),
        admin_url: None,
        data_service: data.config(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    };
    let state = fashion_store_storefront::state::AppState::new(config).unwrap();
    let addr = serve(fashion_store_storefront::app(state)).await;
    format!("http://{addr}")
}

/// Start the admin dashboard against `data` and return its base URL.
pub async fn spawn_admin(data: &FakeDataService) -> String {
    let config = AdminConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        base_url: "http://127.0.0.1".to_string(),
        storefront_url: Some("http://127.0.0.1:3000".to_string()),
        data_service: data.config(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    };
    let state = fashion_store_admin::state::AppState::new(config).unwrap();
    let addr = serve(fashion_store_admin::app(state)).await;
    format!("http://{addr}")
}

/// HTTP client keeping cookies and not following redirects.
#[must_use]
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
