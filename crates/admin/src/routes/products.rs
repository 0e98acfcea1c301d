//! Product management route handlers.
//!
//! Every mutation redirects back to the listing, which refetches from the
//! data service.

use std::collections::HashMap;
use std::str::FromStr;

use askama::Template;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use fashion_store_core::{CategoryId, Price, ProductId};
use fashion_store_data::{Category, DataError, Product, ProductInput};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{AdminLayout, render};
use crate::{
    error::{AppError, Result},
    filters,
    middleware::RequireAdmin,
    models::{Flash, session::set_flash},
    state::AppState,
};

/// Product row for the listing.
#[derive(Debug, Clone)]
pub struct ProductRowView {
    pub id: String,
    pub name: String,
    pub image_url: String,
    pub category: String,
    pub price: String,
    pub stock: i32,
    pub featured: bool,
}

impl ProductRowView {
    fn new(product: &Product, categories: &HashMap<CategoryId, String>) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            image_url: product.image_url.clone(),
            category: product
                .category_id
                .and_then(|id| categories.get(&id).cloned())
                .unwrap_or_default(),
            price: product.price.to_string(),
            stock: product.stock,
            featured: product.featured,
        }
    }
}

/// Category choice in the product form.
#[derive(Debug, Clone)]
pub struct CategoryOption {
    pub id: String,
    pub name: String,
}

/// Raw product form as posted. Sizes and colors are comma-separated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub sizes: String,
    #[serde(default)]
    pub colors: String,
    #[serde(default)]
    pub stock: String,
    /// Present (as `on`) only when the checkbox is ticked.
    pub featured: Option<String>,
    #[serde(default)]
    pub category_id: String,
}

impl From<&Product> for ProductForm {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: format!("{:.2}", product.price.amount()),
            image_url: product.image_url.clone(),
            sizes: product.sizes.join(", "),
            colors: product.colors.join(", "),
            stock: product.stock.to_string(),
            featured: product.featured.then(|| "on".to_string()),
            category_id: product
                .category_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
        }
    }
}

impl ProductForm {
    /// Validate the form into writable product fields.
    ///
    /// # Errors
    ///
    /// Returns one message per invalid field.
    pub fn validate(&self) -> std::result::Result<ProductInput, Vec<&'static str>> {
        let mut errors = Vec::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push("Le nom est requis");
        }

        let price = parse_price(&self.price);
        if price.is_none() {
            errors.push("Prix invalide (ex. 29.90)");
        }

        let stock = self.stock.trim().parse::<i32>().ok().filter(|s| *s >= 0);
        if stock.is_none() {
            errors.push("Stock invalide");
        }

        let category_id = match self.category_id.trim() {
            "" => Ok(None),
            raw => raw.parse::<CategoryId>().map(Some),
        };
        if category_id.is_err() {
            errors.push("Catégorie invalide");
        }

        let image_url = self.image_url.trim();
        if !image_url.is_empty()
            && !(image_url.starts_with("https://") || image_url.starts_with("http://"))
        {
            errors.push("L'URL de l'image doit commencer par http:// ou https://");
        }

        match (price, stock, category_id) {
            (Some(price), Some(stock), Ok(category_id)) if errors.is_empty() => Ok(ProductInput {
                name: name.to_string(),
                description: self.description.trim().to_string(),
                price,
                image_url: image_url.to_string(),
                sizes: split_options(&self.sizes),
                colors: split_options(&self.colors),
                stock,
                featured: self.featured.is_some(),
                category_id,
            }),
            _ => Err(errors),
        }
    }
}

/// Parse a listable euro amount with at most two decimals. A decimal comma
/// is accepted.
fn parse_price(raw: &str) -> Option<Price> {
    let amount = Decimal::from_str(&raw.trim().replace(',', ".")).ok()?;
    let price = Price::new(amount);
    (amount.scale() <= 2 && price.is_listable()).then_some(price)
}

/// Split a comma-separated option list, dropping blanks.
fn split_options(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|option| !option.is_empty())
        .map(String::from)
        .collect()
}

/// Products list page template.
#[derive(Template)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: AdminLayout,
    pub products: Vec<ProductRowView>,
}

/// New/edit product form template.
#[derive(Template)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub layout: AdminLayout,
    pub heading: &'static str,
    pub action: String,
    pub form: ProductForm,
    pub categories: Vec<CategoryOption>,
    pub errors: Vec<&'static str>,
}

impl ProductFormTemplate {
    fn featured(&self) -> bool {
        self.form.featured.is_some()
    }
}

async fn category_options(state: &AppState, admin: &crate::models::CurrentUser) -> Vec<Category> {
    admin
        .data(state.data())
        .list_categories()
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to fetch categories");
            Vec::new()
        })
}

fn to_options(categories: &[Category]) -> Vec<CategoryOption> {
    categories
        .iter()
        .map(|c| CategoryOption {
            id: c.id.to_string(),
            name: c.name.clone(),
        })
        .collect()
}

/// Products list page handler.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
) -> Html<String> {
    let data = admin.data(state.data());
    let (products, categories) = tokio::join!(data.list_products(None), data.list_categories());

    let products = products.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to fetch products");
        Vec::new()
    });
    let categories: HashMap<CategoryId, String> = categories
        .unwrap_or_default()
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    render(&ProductsIndexTemplate {
        layout: AdminLayout::new(&state, &admin, &session, "/products").await,
        products: products
            .iter()
            .map(|p| ProductRowView::new(p, &categories))
            .collect(),
    })
}

/// GET /products/new
#[instrument(skip(admin, state, session))]
pub async fn new_form(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
) -> Html<String> {
    let categories = category_options(&state, &admin).await;

    render(&ProductFormTemplate {
        layout: AdminLayout::new(&state, &admin, &session, "/products").await,
        heading: "Nouveau produit",
        action: "/products/new".to_string(),
        form: ProductForm::default(),
        categories: to_options(&categories),
        errors: Vec::new(),
    })
}

/// POST /products/new
#[instrument(skip(admin, state, session, form), fields(name = %form.name))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return Ok(rerender(&state, &admin, &session, FormTarget::New, form, errors).await);
        }
    };

    match admin.data(state.data()).create_product(&input).await {
        Ok(product) => {
            tracing::info!(product_id = %product.id, "Product created");
            set_flash(&session, Flash::success("Produit créé")).await?;
            Ok(Redirect::to("/products").into_response())
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to create product");
            Ok(rerender(
                &state,
                &admin,
                &session,
                FormTarget::New,
                form,
                vec![save_error(&e)],
            )
            .await)
        }
    }
}

/// GET /products/{id}/edit
#[instrument(skip(admin, state, session))]
pub async fn edit_form(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
) -> Result<Html<String>> {
    let data = admin.data(state.data());
    let (product, categories) = tokio::join!(data.get_product(id), category_options(&state, &admin));
    let product = product?.ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    Ok(render(&ProductFormTemplate {
        layout: AdminLayout::new(&state, &admin, &session, "/products").await,
        heading: "Modifier le produit",
        action: format!("/products/{id}/edit"),
        form: ProductForm::from(&product),
        categories: to_options(&categories),
        errors: Vec::new(),
    }))
}

/// POST /products/{id}/edit
#[instrument(skip(admin, state, session, form))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return Ok(rerender(&state, &admin, &session, FormTarget::Edit(id), form, errors).await);
        }
    };

    match admin.data(state.data()).update_product(id, &input).await {
        Ok(_) => {
            set_flash(&session, Flash::success("Produit mis à jour")).await?;
            Ok(Redirect::to("/products").into_response())
        }
        Err(DataError::NotFound(_)) => Err(AppError::NotFound(format!("product {id}"))),
        Err(e) => {
            tracing::error!(error = %e, "Failed to update product");
            Ok(rerender(
                &state,
                &admin,
                &session,
                FormTarget::Edit(id),
                form,
                vec![save_error(&e)],
            )
            .await)
        }
    }
}

/// POST /products/{id}/delete
#[instrument(skip(admin, state, session))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
) -> Result<Redirect> {
    let flash = match admin.data(state.data()).delete_product(id).await {
        Ok(()) => {
            tracing::info!(product_id = %id, "Product deleted");
            Flash::success("Produit supprimé")
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to delete product");
            Flash::error("Impossible de supprimer ce produit (il figure peut-être dans une commande)")
        }
    };

    set_flash(&session, flash).await?;
    Ok(Redirect::to("/products"))
}

/// Which form a failed submission came from.
#[derive(Debug, Clone, Copy)]
enum FormTarget {
    New,
    Edit(ProductId),
}

fn save_error(error: &DataError) -> &'static str {
    match error {
        DataError::Unauthorized => "Session expirée ou droits insuffisants",
        _ => "Enregistrement impossible, réessayez",
    }
}

/// Show the form again with the submitted values and the errors.
async fn rerender(
    state: &AppState,
    admin: &crate::models::CurrentUser,
    session: &Session,
    target: FormTarget,
    form: ProductForm,
    errors: Vec<&'static str>,
) -> Response {
    let categories = category_options(state, admin).await;
    let (heading, action) = match target {
        FormTarget::New => ("Nouveau produit", "/products/new".to_string()),
        FormTarget::Edit(id) => ("Modifier le produit", format!("/products/{id}/edit")),
    };

    let page = render(&ProductFormTemplate {
        layout: AdminLayout::new(state, admin, session, "/products").await,
        heading,
        action,
        form,
        categories: to_options(&categories),
        errors,
    });
    (StatusCode::UNPROCESSABLE_ENTITY, page).into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_form() -> ProductForm {
        ProductForm {
            name: "  Robe midi ".to_string(),
            description: "Viscose fluide".to_string(),
            price: "59,90".to_string(),
            image_url: "https://images.example.com/robe.jpg".to_string(),
            sizes: "S, M, ,L".to_string(),
            colors: "noir,bordeaux".to_string(),
            stock: "12".to_string(),
            featured: Some("on".to_string()),
            category_id: String::new(),
        }
    }

    #[test]
    fn test_validate_valid_form() {
        let input = valid_form().validate().unwrap();

        assert_eq!(input.name, "Robe midi");
        assert_eq!(input.price, Price::from_cents(5990));
        assert_eq!(input.sizes, vec!["S", "M", "L"]);
        assert_eq!(input.colors, vec!["noir", "bordeaux"]);
        assert_eq!(input.stock, 12);
        assert!(input.featured);
        assert_eq!(input.category_id, None);
    }

    #[test]
    fn test_validate_collects_every_error() {
        let form = ProductForm {
            name: " ".to_string(),
            price: "-3".to_string(),
            stock: "beaucoup".to_string(),
            category_id: "robes".to_string(),
            image_url: "ftp://example.com/a.jpg".to_string(),
            ..ProductForm::default()
        };

        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("19.9"), Some(Price::from_cents(1990)));
        assert_eq!(parse_price(" 0 "), Some(Price::ZERO));
        assert_eq!(parse_price("19.999"), None);
        assert_eq!(parse_price("gratuit"), None);
        assert_eq!(parse_price("1000000"), Some(Price::MAX_UNIT));
        assert_eq!(parse_price("1000000.01"), None);
        assert_eq!(parse_price("79228162514264337593543950335"), None);
    }

    #[test]
    fn test_form_prefill_from_product() {
        let product = Product {
            id: ProductId::new(uuid::Uuid::nil()),
            name: "Pull".to_string(),
            description: String::new(),
            price: Price::from_cents(4500),
            image_url: String::new(),
            sizes: vec!["M".to_string(), "L".to_string()],
            colors: vec![],
            stock: 3,
            featured: false,
            category_id: None,
            created_at: chrono::Utc::now(),
        };

        let form = ProductForm::from(&product);
        assert_eq!(form.price, "45.00");
        assert_eq!(form.sizes, "M, L");
        assert_eq!(form.featured, None);
        assert_eq!(form.validate().unwrap(), ProductInput::from(&product));
    }
}
