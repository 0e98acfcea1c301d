//! Shop listing route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use fashion_store_core::CategoryId;
use fashion_store_data::{Category, Product};
use serde::Deserialize;
use tracing::instrument;

use super::Layout;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{OptionalAuth, SessionCart};
use crate::state::AppState;

/// Query parameters for the shop listing.
#[derive(Debug, Deserialize)]
pub struct ShopQuery {
    pub category: Option<String>,
}

/// Category filter button.
#[derive(Clone)]
pub struct CategoryView {
    pub id: String,
    pub name: String,
    pub selected: bool,
}

/// Product card display data.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub image_url: String,
    pub stock: i32,
    pub in_stock: bool,
    pub featured: bool,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub default_size: String,
    pub default_color: String,
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.to_string(),
            image_url: product.image_url.clone(),
            stock: product.stock,
            in_stock: product.in_stock(),
            featured: product.featured,
            sizes: product.sizes.clone(),
            colors: product.colors.clone(),
            default_size: product.default_size().to_string(),
            default_color: product.default_color().to_string(),
        }
    }
}

/// Shop page template.
#[derive(Template, WebTemplate)]
#[template(path = "shop.html")]
pub struct ShopTemplate {
    pub layout: Layout,
    pub categories: Vec<CategoryView>,
    pub all_selected: bool,
    /// Selected category ID, echoed into add-to-cart forms.
    pub selected_category: String,
    pub products: Vec<ProductCardView>,
}

/// Parse the `category` query value. Missing, empty and `all` mean no filter.
///
/// # Errors
///
/// Returns `BadRequest` when the value is not a category ID.
pub fn parse_category(raw: Option<&str>) -> Result<Option<CategoryId>> {
    match raw.map(str::trim) {
        None | Some("" | "all") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("invalid category: {value}"))),
    }
}

fn category_views(categories: &[Category], selected: Option<CategoryId>) -> Vec<CategoryView> {
    categories
        .iter()
        .map(|category| CategoryView {
            id: category.id.to_string(),
            name: category.name.clone(),
            selected: Some(category.id) == selected,
        })
        .collect()
}

/// Display the shop listing.
///
/// Categories and products are fetched concurrently; a failed fetch shows as
/// an empty list.
#[instrument(skip(state, user, cart))]
pub async fn shop(
    State(state): State<AppState>,
    Query(query): Query<ShopQuery>,
    OptionalAuth(user): OptionalAuth,
    cart: SessionCart,
) -> Result<ShopTemplate> {
    let category = parse_category(query.category.as_deref())?;

    let (categories, products) = tokio::join!(
        state.data().list_categories(),
        state.data().list_products(category),
    );

    let categories = categories.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to fetch categories");
        Vec::new()
    });
    let products = products.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to fetch products");
        Vec::new()
    });

    Ok(ShopTemplate {
        layout: Layout::new(&state, user.as_ref(), &cart).await,
        categories: category_views(&categories, category),
        all_selected: category.is_none(),
        selected_category: category.map(|c| c.to_string()).unwrap_or_default(),
        products: products.iter().map(ProductCardView::from).collect(),
    })
}
