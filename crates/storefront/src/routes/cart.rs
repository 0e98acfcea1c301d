//! Cart route handlers.
//!
//! The cart lives in the visitor's session. Every mutation is a form post
//! that redirects back to a page (post/redirect/get), with a one-shot notice
//! describing the outcome.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect},
};
use fashion_store_core::{Cart, CartItem, CategoryId, ProductId};
use serde::Deserialize;
use tracing::instrument;

use super::Layout;
use crate::error::Result;
use crate::filters;
use crate::middleware::{OptionalAuth, SessionCart};
use crate::models::{Flash, session::set_flash};
use crate::state::AppState;

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub product_id: String,
    pub name: String,
    pub image_url: String,
    pub size: String,
    pub color: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
    /// Quantity posted by the "-" button (0 removes the line).
    pub decrement: i64,
    /// Quantity posted by the "+" button.
    pub increment: i64,
}

impl From<&CartItem> for CartLineView {
    fn from(item: &CartItem) -> Self {
        let quantity = i64::from(item.quantity);
        Self {
            product_id: item.product_id.to_string(),
            name: item.name.clone(),
            image_url: item.image_url.clone(),
            size: item.size.clone(),
            color: item.color.clone(),
            quantity: item.quantity,
            unit_price: item.price.to_string(),
            line_total: item.line_total().to_string(),
            decrement: quantity - 1,
            increment: quantity + 1,
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub total: String,
    pub item_count: u64,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            lines: cart.items().iter().map(CartLineView::from).collect(),
            total: cart.total_price().to_string(),
            item_count: cart.total_items(),
        }
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
    /// Category filter of the page the form was posted from.
    #[serde(default)]
    pub category: String,
}

/// Update quantity form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: ProductId,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
    pub quantity: i64,
}

/// Remove line form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: ProductId,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub layout: Layout,
    pub cart: CartView,
}

/// Cart count badge fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u64,
}

/// Shop URL to return to after adding, keeping a valid category filter.
fn shop_url(category: &str) -> String {
    category
        .parse::<CategoryId>()
        .map_or_else(|_| "/".to_string(), |id| format!("/?category={id}"))
}

/// Display cart page.
#[instrument(skip(state, user, cart))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    cart: SessionCart,
) -> CartShowTemplate {
    CartShowTemplate {
        cart: CartView::from(&cart.cart),
        layout: Layout::new(&state, user.as_ref(), &cart).await,
    }
}

/// Add one unit of a product variant to the cart.
///
/// Name, price and image come from a fresh read of the product, never from
/// the form. Unknown products, sold-out products and options the product
/// does not offer are turned away with a notice.
#[instrument(skip(state, cart), fields(product_id = %form.product_id))]
pub async fn add(
    State(state): State<AppState>,
    mut cart: SessionCart,
    Form(form): Form<AddToCartForm>,
) -> Result<Redirect> {
    let back = shop_url(&form.category);

    let flash = match state.data().get_product(form.product_id).await {
        Err(e) => {
            tracing::error!(error = %e, "Failed to load product for cart");
            Flash::error("Impossible d'ajouter ce produit pour le moment")
        }
        Ok(None) => Flash::error("Ce produit n'est plus disponible"),
        Ok(Some(product)) if !product.in_stock() => Flash::error("Rupture de stock"),
        Ok(Some(product))
            if !product.offers_size(&form.size) || !product.offers_color(&form.color) =>
        {
            Flash::error("Taille ou couleur indisponible pour ce produit")
        }
        Ok(Some(product)) => {
            cart.cart.add_item(CartItem {
                product_id: product.id,
                name: product.name,
                price: product.price,
                quantity: 1,
                size: form.size,
                color: form.color,
                image_url: product.image_url,
            });
            cart.save().await?;
            tracing::info!(items = cart.cart.total_items(), "Added to cart");
            Flash::success("Ajouté au panier!")
        }
    };

    set_flash(cart.session(), flash).await?;
    Ok(Redirect::to(&back))
}

/// Set the quantity of a cart line.
#[instrument(skip(cart))]
pub async fn update(mut cart: SessionCart, Form(form): Form<UpdateCartForm>) -> Result<Redirect> {
    cart.cart
        .update_quantity(form.product_id, &form.size, &form.color, form.quantity);
    cart.save().await?;
    Ok(Redirect::to("/cart"))
}

/// Remove a cart line.
#[instrument(skip(cart))]
pub async fn remove(
    mut cart: SessionCart,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Redirect> {
    cart.cart
        .remove_item(form.product_id, &form.size, &form.color);
    cart.save().await?;
    Ok(Redirect::to("/cart"))
}

/// Empty the cart.
#[instrument(skip(cart))]
pub async fn clear(mut cart: SessionCart) -> Result<Redirect> {
    cart.cart.clear();
    cart.save().await?;
    Ok(Redirect::to("/cart"))
}

/// Cart count badge.
pub async fn count(cart: SessionCart) -> impl IntoResponse {
    CartCountTemplate {
        count: cart.cart.total_items(),
    }
}

/// Placing orders is not available yet: the cart is kept as is and the
/// visitor is told so.
#[instrument(skip(cart))]
pub async fn checkout(cart: SessionCart) -> Result<Redirect> {
    let flash = if cart.cart.is_empty() {
        Flash::info("Votre panier est vide")
    } else {
        Flash::info("La commande en ligne n'est pas encore disponible. Votre panier est conservé.")
    };

    set_flash(cart.session(), flash).await?;
    Ok(Redirect::to("/cart"))
}
