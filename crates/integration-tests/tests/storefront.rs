//! Storefront flows against the in-memory data service.

#![allow(clippy::unwrap_used)]

use fashion_store_integration_tests::{FakeDataService, browser, spawn_storefront};
use reqwest::StatusCode;
use serde_json::json;

async fn add_to_cart(
    client: &reqwest::Client,
    base: &str,
    product_id: &str,
    size: &str,
    color: &str,
) {
    let resp = client
        .post(format!("{base}/cart/add"))
        .form(&[("product_id", product_id), ("size", size), ("color", color)])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
}

async fn page(client: &reqwest::Client, url: &str) -> String {
    let resp = client.get(url).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    resp.text().await.unwrap()
}

#[tokio::test]
async fn test_same_variant_twice_is_one_line() {
    let data = FakeDataService::start().await;
    let product = data.add_product("Robe Midi", "49.00", &["S", "M"], &["Noir"], 5);
    let base = spawn_storefront(&data).await;
    let client = browser();

    add_to_cart(&client, &base, &product, "M", "Noir").await;
    add_to_cart(&client, &base, &product, "M", "Noir").await;

    let cart = page(&client, &format!("{base}/cart")).await;
    assert_eq!(cart.matches(r#"class="cart-line""#).count(), 1);
    assert!(cart.contains(r#"<span class="quantity">2</span>"#));
    assert!(cart.contains("98.00 €"));
    assert!(cart.contains(r#"<span class="cart-badge">2</span>"#));

    // Another size is another line
    add_to_cart(&client, &base, &product, "S", "Noir").await;
    let cart = page(&client, &format!("{base}/cart")).await;
    assert_eq!(cart.matches(r#"class="cart-line""#).count(), 2);
    assert!(cart.contains("147.00 €"));
}

#[tokio::test]
async fn test_out_of_stock_is_not_added() {
    let data = FakeDataService::start().await;
    let product = data.add_product("Foulard", "25.00", &[], &[], 0);
    let base = spawn_storefront(&data).await;
    let client = browser();

    add_to_cart(&client, &base, &product, "", "").await;

    let shop = page(&client, &format!("{base}/")).await;
    assert!(shop.contains("Rupture de stock"));
    assert!(!shop.contains("cart-badge"));

    let cart = page(&client, &format!("{base}/cart")).await;
    assert!(cart.contains("Votre panier est vide"));
}

#[tokio::test]
async fn test_unoffered_size_is_refused() {
    let data = FakeDataService::start().await;
    let product = data.add_product("Chemise", "39.90", &["M"], &["Blanc"], 3);
    let base = spawn_storefront(&data).await;
    let client = browser();

    add_to_cart(&client, &base, &product, "XXL", "Blanc").await;

    let cart = page(&client, &format!("{base}/cart")).await;
    assert!(cart.contains("Votre panier est vide"));
}

#[tokio::test]
async fn test_quantity_zero_removes_line() {
    let data = FakeDataService::start().await;
    let product = data.add_product("Jupe", "29.90", &["S"], &["Vert"], 2);
    let base = spawn_storefront(&data).await;
    let client = browser();

    add_to_cart(&client, &base, &product, "S", "Vert").await;
    let resp = client
        .post(format!("{base}/cart/update"))
        .form(&[
            ("product_id", product.as_str()),
            ("size", "S"),
            ("color", "Vert"),
            ("quantity", "0"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let cart = page(&client, &format!("{base}/cart")).await;
    assert!(cart.contains("Votre panier est vide"));
}

#[tokio::test]
async fn test_category_filter() {
    let data = FakeDataService::start().await;
    let robes = data.insert("categories", json!({ "name": "Robes" }));
    let robes_id = robes["id"].as_str().unwrap();
    data.insert(
        "products",
        json!({
            "name": "Robe Portefeuille",
            "price": "59.00",
            "stock": 4,
            "category_id": robes_id,
        }),
    );
    data.add_product("Pantalon Large", "45.00", &[], &[], 4);
    let base = spawn_storefront(&data).await;
    let client = browser();

    let all = page(&client, &format!("{base}/")).await;
    assert!(all.contains("Robe Portefeuille"));
    assert!(all.contains("Pantalon Large"));

    let filtered = page(&client, &format!("{base}/?category={robes_id}")).await;
    assert!(filtered.contains("Robe Portefeuille"));
    assert!(!filtered.contains("Pantalon Large"));
}

#[tokio::test]
async fn test_sign_in_and_out() {
    let data = FakeDataService::start().await;
    data.add_user("lea@example.com", "motdepasse", None);
    let base = spawn_storefront(&data).await;
    let client = browser();

    let resp = client
        .post(format!("{base}/auth/login"))
        .form(&[("email", "lea@example.com"), ("password", "mauvais")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = client
        .post(format!("{base}/auth/login"))
        .form(&[("email", "lea@example.com"), ("password", "motdepasse")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let shop = page(&client, &format!("{base}/")).await;
    assert!(shop.contains("lea@example.com"));

    let resp = client
        .post(format!("{base}/auth/logout"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let shop = page(&client, &format!("{base}/")).await;
    assert!(!shop.contains("lea@example.com"));
}

#[tokio::test]
async fn test_failed_sign_out_keeps_session() {
    let data = FakeDataService::start().await;
    data.add_user("lea@example.com", "motdepasse", None);
    let base = spawn_storefront(&data).await;
    let client = browser();

    let resp = client
        .post(format!("{base}/auth/login"))
        .form(&[("email", "lea@example.com"), ("password", "motdepasse")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    data.set_logout_unavailable(true);
    let resp = client
        .post(format!("{base}/auth/logout"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let shop = page(&client, &format!("{base}/")).await;
    assert!(shop.contains("lea@example.com"));
    assert!(shop.contains("La déconnexion a échoué"));

    data.set_logout_unavailable(false);
    client
        .post(format!("{base}/auth/logout"))
        .send()
        .await
        .unwrap();
    let shop = page(&client, &format!("{base}/")).await;
    assert!(!shop.contains("lea@example.com"));
}
