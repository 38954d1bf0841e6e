//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                       - Liveness check
//!
//! # Catalog
//! GET    /api/products?query=&category= - Catalog search (max 5 results)
//! GET    /api/orders                   - Active customer's order history
//! GET    /api/customers                - Demo customers
//!
//! # Cart
//! GET    /api/cart                     - Cart lines and total
//! POST   /api/cart/items               - Add a product
//! PATCH  /api/cart/items/{product_id}  - Replace a line's quantity
//! DELETE /api/cart/items/{product_id}  - Remove a line
//! DELETE /api/cart                     - Clear the cart
//! POST   /api/checkout                 - Place an order from the cart
//!
//! # Conversation
//! POST   /api/session                  - Switch customer and/or language
//! POST   /api/chat                     - One text chat turn
//! POST   /api/escalations              - Open a support ticket
//! POST   /api/surveys                  - Submit a satisfaction survey
//! ```

pub mod cart;
pub mod catalog;
pub mod chat;
pub mod support;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route(
            "/items/{product_id}",
            patch(cart::update).delete(cart::remove),
        )
}

/// Create all `/api` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(catalog::search))
        .route("/orders", get(catalog::orders))
        .route("/customers", get(catalog::customers))
        .nest("/cart", cart_routes())
        .route("/checkout", post(cart::checkout))
        .route("/session", post(chat::switch_session))
        .route("/chat", post(chat::send))
        .route("/escalations", post(support::escalate))
        .route("/surveys", post(support::survey))
}

/// Create all routes for the server.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes())
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}
