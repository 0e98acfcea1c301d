//! Client tests against an in-process fake of the data service.
//!
//! The fake records every request and answers from a fixed script keyed on
//! method and path, so each test checks both what went over the wire and how
//! the answer was interpreted.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::http::{Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use fashion_store_core::{CategoryId, Email, OrderId, OrderStatus, Price, ProductId};
use fashion_store_data::{DataClient, DataError, DataServiceConfig, ProductInput};
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;

const CATEGORY_ID: &str = "11111111-1111-1111-1111-111111111111";
const PRODUCT_ID: &str = "22222222-2222-2222-2222-222222222222";
const ORDER_ID: &str = "33333333-3333-3333-3333-333333333333";

#[derive(Debug, Clone)]
struct Recorded {
    method: Method,
    path: String,
    query: String,
    apikey: String,
    authorization: String,
    prefer: String,
    body: Value,
}

type Log = Arc<Mutex<Vec<Recorded>>>;

fn product_row() -> Value {
    json!({
        "id": PRODUCT_ID,
        "name": "Veste en jean",
        "description": "Coupe droite",
        "price": 79.9,
        "image_url": "https://images.example.com/veste.jpg",
        "sizes": ["S", "M", "L"],
        "colors": ["bleu"],
        "stock": 3,
        "featured": false,
        "category_id": CATEGORY_ID,
        "created_at": "2024-04-02T09:00:00Z"
    })
}

async fn script(State(log): State<Log>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let header_value = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    let bytes = to_bytes(body, usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    let query = parts.uri.query().unwrap_or_default().to_string();

    log.lock().unwrap().push(Recorded {
        method: parts.method.clone(),
        path: parts.uri.path().to_string(),
        query: query.clone(),
        apikey: header_value("apikey"),
        authorization: header_value("authorization"),
        prefer: header_value("prefer"),
        body: body.clone(),
    });

    match (parts.method, parts.uri.path()) {
        (Method::GET, "/rest/v1/products") => axum::Json(json!([product_row()])).into_response(),
        (Method::POST, "/rest/v1/products") => {
            let mut row = product_row();
            row["name"] = body["name"].clone();
            axum::Json(json!([row])).into_response()
        }
        (Method::PATCH, "/rest/v1/orders") => axum::Json(json!([])).into_response(),
        (Method::HEAD, "/rest/v1/customers") => Response::builder()
            .header(header::CONTENT_RANGE, "0-2/3")
            .body(Body::empty())
            .unwrap(),
        (Method::GET, "/rest/v1/customers") => axum::Json(json!([
            {"id": "44444444-4444-4444-4444-444444444444", "name": "A", "email": "a@example.com"},
            {"id": "55555555-5555-5555-5555-555555555555", "name": "B", "email": "b@example.com"}
        ]))
        .into_response(),
        (Method::GET, "/rest/v1/categories") => Response::builder()
            .status(StatusCode::TOO_MANY_REQUESTS)
            .header(header::RETRY_AFTER, "7")
            .body(Body::empty())
            .unwrap(),
        (Method::DELETE, "/rest/v1/products") => Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"code":"23503","message":"product is referenced by order_items"}"#,
            ))
            .unwrap(),
        (Method::POST, "/auth/v1/token") => {
            if body["password"] == "correct horse" {
                axum::Json(json!({
                    "access_token": "user-token",
                    "token_type": "bearer",
                    "expires_in": 3600,
                    "refresh_token": "refresh",
                    "user": {
                        "id": "66666666-6666-6666-6666-666666666666",
                        "email": body["email"],
                        "app_metadata": {"role": "admin"}
                    }
                }))
                .into_response()
            } else {
                (
                    StatusCode::BAD_REQUEST,
                    axum::Json(json!({"error": "invalid_grant", "error_description": "Invalid login credentials"})),
                )
                    .into_response()
            }
        }
        (Method::GET, "/auth/v1/user") => (
            StatusCode::UNAUTHORIZED,
            axum::Json(json!({"msg": "invalid JWT"})),
        )
            .into_response(),
        (Method::POST, "/auth/v1/logout") => StatusCode::NO_CONTENT.into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn fake_service() -> (DataClient, Log) {
    let log: Log = Arc::default();
    let app = Router::new().fallback(script).with_state(Arc::clone(&log));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = DataClient::new(&DataServiceConfig {
        url: Url::parse(&format!("http://{addr}")).unwrap(),
        api_key: SecretString::from("anon-key"),
        timeout: Duration::from_secs(5),
    })
    .unwrap();

    (client, log)
}

fn last(log: &Log) -> Recorded {
    log.lock().unwrap().last().cloned().expect("no request recorded")
}

// ============================================================================
// Reads
// ============================================================================

#[tokio::test]
async fn test_list_products_by_category() {
    let (client, log) = fake_service().await;
    let category: CategoryId = CATEGORY_ID.parse().unwrap();

    let products = client.list_products(Some(category)).await.unwrap();

    assert_eq!(products.len(), 1);
    assert_eq!(products[0].price, Price::from_cents(7990));
    assert_eq!(products[0].default_size(), "S");

    let request = last(&log);
    assert_eq!(request.method, Method::GET);
    assert_eq!(
        request.query,
        format!("select=*&category_id=eq.{CATEGORY_ID}&order=created_at.desc")
    );
    assert_eq!(request.apikey, "anon-key");
    assert_eq!(request.authorization, "Bearer anon-key");
}

#[tokio::test]
async fn test_count_reads_content_range() {
    let (client, log) = fake_service().await;

    assert_eq!(client.count_customers().await.unwrap(), 3);

    let request = last(&log);
    assert_eq!(request.method, Method::HEAD);
    assert_eq!(request.prefer, "count=exact");
}

#[tokio::test]
async fn test_maybe_single_rejects_many_rows() {
    let (client, _log) = fake_service().await;

    let err = client
        .get_customer("44444444-4444-4444-4444-444444444444".parse().unwrap())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DataError::MultipleRows {
            table: "customers",
            count: 2
        }
    ));
}

#[tokio::test]
async fn test_rate_limit_carries_retry_after() {
    let (client, _log) = fake_service().await;

    let err = client.list_categories().await.unwrap_err();

    assert!(matches!(err, DataError::RateLimited(7)));
}

// ============================================================================
// Writes
// ============================================================================

#[tokio::test]
async fn test_create_product_as_user() {
    let (client, log) = fake_service().await;
    let admin = client.as_user(&SecretString::from("admin-token"));

    let input = ProductInput {
        name: "Pull marin".to_string(),
        description: String::new(),
        price: Price::from_cents(4500),
        image_url: String::new(),
        sizes: vec!["M".to_string()],
        colors: vec![],
        stock: 10,
        featured: true,
        category_id: None,
    };
    let product = admin.create_product(&input).await.unwrap();

    assert_eq!(product.name, "Pull marin");

    let request = last(&log);
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.apikey, "anon-key");
    assert_eq!(request.authorization, "Bearer admin-token");
    assert_eq!(request.prefer, "return=representation");
    assert_eq!(request.body["price"], "45.00");
    assert_eq!(request.body["featured"], true);
}

#[tokio::test]
async fn test_update_status_of_missing_order() {
    let (client, log) = fake_service().await;
    let order: OrderId = ORDER_ID.parse().unwrap();

    let err = client
        .update_order_status(order, OrderStatus::Shipped)
        .await
        .unwrap_err();

    assert!(matches!(err, DataError::NotFound(_)));

    let request = last(&log);
    assert_eq!(request.method, Method::PATCH);
    assert_eq!(request.query, format!("select=*&id=eq.{ORDER_ID}"));
    assert_eq!(request.body, json!({"status": "shipped"}));
}

#[tokio::test]
async fn test_delete_rejected_by_constraint() {
    let (client, _log) = fake_service().await;
    let product: ProductId = PRODUCT_ID.parse().unwrap();

    let err = client.delete_product(product).await.unwrap_err();

    match err {
        DataError::Api { status, code, .. } => {
            assert_eq!(status, 400);
            assert_eq!(code, "23503");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
async fn test_sign_in_success() {
    let (client, log) = fake_service().await;
    let email = Email::parse("Boss@Boutique.fr").unwrap();

    let session = client
        .sign_in_with_password(&email, &SecretString::from("correct horse"))
        .await
        .unwrap();

    assert!(session.identity.is_admin());
    assert_eq!(session.identity.email.as_str(), "boss@boutique.fr");
    assert!(session.expires_at > chrono::Utc::now());

    let request = last(&log);
    assert_eq!(request.path, "/auth/v1/token");
    assert_eq!(request.query, "grant_type=password");
}

#[tokio::test]
async fn test_sign_in_wrong_password() {
    let (client, _log) = fake_service().await;
    let email = Email::parse("boss@boutique.fr").unwrap();

    let err = client
        .sign_in_with_password(&email, &SecretString::from("wrong"))
        .await
        .unwrap_err();

    assert!(matches!(err, DataError::InvalidCredentials));
}

#[tokio::test]
async fn test_expired_token_lookup() {
    let (client, _log) = fake_service().await;

    let err = client
        .get_user(&SecretString::from("expired"))
        .await
        .unwrap_err();

    assert!(matches!(err, DataError::Unauthorized));
}

#[tokio::test]
async fn test_sign_out_sends_user_token() {
    let (client, log) = fake_service().await;

    client
        .sign_out(&SecretString::from("user-token"))
        .await
        .unwrap();

    let request = last(&log);
    assert_eq!(request.path, "/auth/v1/logout");
    assert_eq!(request.authorization, "Bearer user-token");
}
