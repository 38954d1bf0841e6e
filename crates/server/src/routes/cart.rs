//! Cart and checkout route handlers.
//!
//! Every cart mutation answers with the full cart so the browser can
//! re-render without a second request. The same [`Shop`] handle backs the
//! chat tools, so changes made by the assistant show up here too.
//!
//! [`Shop`]: shopdesk_agent::Shop

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use shopdesk_agent::Shop;
use shopdesk_core::{CartItem, Order, ProductId};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Cart line display data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemView {
    pub product_id: ProductId,
    pub name: String,
    pub price: String,
    pub quantity: u32,
    pub line_price: String,
}

/// Cart display data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u32,
    pub subtotal: String,
}

impl From<&CartItem> for CartItemView {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product.id,
            name: item.product.name.clone(),
            price: item.product.price.to_string(),
            quantity: item.quantity,
            line_price: item.line_total().to_string(),
        }
    }
}

impl CartView {
    fn of(shop: &Shop) -> Self {
        let cart = shop.cart();
        Self {
            items: cart.items().iter().map(CartItemView::from).collect(),
            item_count: cart.item_count(),
            subtotal: cart.subtotal().to_string(),
        }
    }
}

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    /// Defaults to 1; non-positive values also mean 1.
    pub quantity: Option<i64>,
}

/// Update-quantity request body.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

/// Show the cart.
pub async fn show(State(state): State<AppState>) -> Json<CartView> {
    Json(CartView::of(state.context().shop()))
}

/// Add a product to the cart.
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    Json(req): Json<AddToCartRequest>,
) -> Result<Json<CartView>> {
    let shop = state.context().shop();
    shop.add_product(req.product_id, req.quantity)?;
    Ok(Json(CartView::of(shop)))
}

/// Replace a line's quantity.
///
/// Quantities below 1 leave the cart unchanged; use `DELETE` to remove a
/// line.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    Json(req): Json<UpdateQuantityRequest>,
) -> Result<Json<CartView>> {
    let shop = state.context().shop();
    if req.quantity >= 1 && !shop.update_quantity(product_id, req.quantity) {
        return Err(AppError::NotFound(format!("product {product_id} in cart")));
    }
    Ok(Json(CartView::of(shop)))
}

/// Remove a line from the cart.
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<CartView>> {
    let shop = state.context().shop();
    if !shop.remove_from_cart(product_id) {
        return Err(AppError::NotFound(format!("product {product_id} in cart")));
    }
    Ok(Json(CartView::of(shop)))
}

pub async fn clear(State(state): State<AppState>) -> Json<CartView> {
    let shop = state.context().shop();
    shop.clear_cart();
    Json(CartView::of(shop))
}

/// Place an order from the current cart.
#[instrument(skip(state))]
pub async fn checkout(State(state): State<AppState>) -> Result<(StatusCode, Json<Order>)> {
    let order = state.context().shop().place_order()?;
    Ok((StatusCode::CREATED, Json(order)))
}
