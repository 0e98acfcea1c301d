//! Rows of the data service tables.

use chrono::{DateTime, Utc};
use fashion_store_core::{CategoryId, CustomerId, OrderId, OrderItemId, OrderStatus, Price, ProductId};
use serde::{Deserialize, Deserializer, Serialize};

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    pub price: Price,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image_url: String,
    /// Offered sizes, in display order. Empty when the product has none.
    #[serde(default, deserialize_with = "null_as_default")]
    pub sizes: Vec<String>,
    /// Offered colors, in display order. Empty when the product has none.
    #[serde(default, deserialize_with = "null_as_default")]
    pub colors: Vec<String>,
    pub stock: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub featured: bool,
    pub category_id: Option<CategoryId>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// First offered size, or the empty string.
    #[must_use]
    pub fn default_size(&self) -> &str {
        self.sizes.first().map_or("", String::as_str)
    }

    /// First offered color, or the empty string.
    #[must_use]
    pub fn default_color(&self) -> &str {
        self.colors.first().map_or("", String::as_str)
    }

    /// Whether `size` is a valid choice: one of the offered sizes, or empty
    /// when the product offers none.
    #[must_use]
    pub fn offers_size(&self, size: &str) -> bool {
        offers(&self.sizes, size)
    }

    /// Same as [`Product::offers_size`] for colors.
    #[must_use]
    pub fn offers_color(&self, color: &str) -> bool {
        offers(&self.colors, color)
    }
}

fn offers(options: &[String], choice: &str) -> bool {
    if options.is_empty() {
        choice.is_empty()
    } else {
        options.iter().any(|option| option == choice)
    }
}

/// Writable product fields, used for both insert and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub image_url: String,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub stock: i32,
    #[serde(default)]
    pub featured: bool,
    pub category_id: Option<CategoryId>,
}

impl From<&Product> for ProductInput {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            image_url: product.image_url.clone(),
            sizes: product.sizes.clone(),
            colors: product.colors.clone(),
            stock: product.stock,
            featured: product.featured,
            category_id: product.category_id,
        }
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// Writable category fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryInput {
    pub name: String,
}

/// A customer record. The email is kept as stored, unvalidated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
}

/// An order header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: Option<CustomerId>,
    pub total_amount: Price,
    pub status: OrderStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub shipping_address: String,
    pub created_at: DateTime<Utc>,
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: Option<ProductId>,
    pub quantity: i32,
    /// Unit price at the time of the order.
    pub price: Price,
    #[serde(default, deserialize_with = "null_as_default")]
    pub size: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub color: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product_json(sizes: &str, colors: &str) -> String {
        format!(
            r#"{{
                "id": "6a1f8a52-6c1e-4b4f-9d47-2f7a9c2a8b11",
                "name": "Robe lin",
                "description": null,
                "price": "59.90",
                "image_url": "https://images.example.com/robe.jpg",
                "sizes": {sizes},
                "colors": {colors},
                "stock": 4,
                "featured": true,
                "category_id": null,
                "created_at": "2024-03-01T10:00:00+00:00"
            }}"#
        )
    }

    #[test]
    fn test_product_nulls_become_defaults() {
        let product: Product = serde_json::from_str(&product_json("null", "[]")).unwrap();
        assert_eq!(product.description, "");
        assert!(product.sizes.is_empty());
        assert_eq!(product.price, Price::from_cents(5990));
        assert_eq!(product.default_size(), "");
        assert!(product.offers_size(""));
        assert!(!product.offers_size("M"));
    }

    #[test]
    fn test_product_defaults_and_choices() {
        let product: Product =
            serde_json::from_str(&product_json(r#"["S","M"]"#, r#"["noir"]"#)).unwrap();
        assert_eq!(product.default_size(), "S");
        assert_eq!(product.default_color(), "noir");
        assert!(product.offers_size("M"));
        assert!(!product.offers_size("XL"));
        assert!(!product.offers_color(""));
        assert!(product.in_stock());
    }

    #[test]
    fn test_numeric_price_accepted() {
        let json = product_json("[]", "[]").replace("\"59.90\"", "59.9");
        let product: Product = serde_json::from_str(&json).unwrap();
        assert_eq!(product.price, Price::from_cents(5990));
    }

    #[test]
    fn test_order_row() {
        let order: Order = serde_json::from_str(
            r#"{
                "id": "0b6b0f8e-2a52-4bd3-9f55-0f5c4c9a1d20",
                "customer_id": null,
                "total_amount": 120.5,
                "status": "shipped",
                "shipping_address": null,
                "created_at": "2024-05-12T08:30:00Z"
            }"#,
        )
        .unwrap();
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.total_amount, Price::from_cents(12050));
        assert!(order.customer_id.is_none());
    }
}
