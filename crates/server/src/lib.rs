//! Shopdesk Server - JSON API for the demo store and its text assistant.
//!
//! Serves the product browser, the cart, direct checkout, and the text chat
//! channel over one shared [`AppContext`](shopdesk_agent::AppContext), so
//! the assistant and the UI always see the same cart.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
pub use error::AppError;
pub use state::AppState;

/// Build the application router with request tracing.
///
/// Sentry layers are added by the binary, outermost.
pub fn app(state: AppState) -> Router {
    routes::routes()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
