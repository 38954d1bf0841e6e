//! Catalog and customer route handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use shopdesk_core::{Customer, Order, Product};
use tracing::instrument;

use crate::state::AppState;

/// Search query parameters. Blank values are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    pub category: Option<String>,
}

/// Catalog search.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<Product>> {
    Json(
        state
            .context()
            .catalog()
            .search(params.query.as_deref(), params.category.as_deref()),
    )
}

/// Order history of the active customer, most recent first.
pub async fn orders(State(state): State<AppState>) -> Json<Vec<Order>> {
    let context = state.context();
    Json(context.catalog().order_history(context.shop().active_customer()))
}

pub async fn customers(State(state): State<AppState>) -> Json<Vec<Customer>> {
    Json(state.context().catalog().customers())
}
