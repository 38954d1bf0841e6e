//! Read-only catalog queries over a pluggable repository.
//!
//! The repository owns the data; [`CatalogService`] owns the query rules
//! (umbrella categories, result limits, name matching) so every channel
//! searches the same way.

mod memory;

use std::sync::Arc;

use shopdesk_core::{Customer, CustomerId, Order, Product, ProductId};
use thiserror::Error;

pub use memory::InMemoryCatalog;

/// Maximum number of products a search returns.
pub const MAX_SEARCH_RESULTS: usize = 5;

/// Category terms that mean "anything we sell".
const UMBRELLA_CATEGORIES: &[&str] = &["apparel", "clothing", "clothes", "fashion", "all", "everything"];

/// Errors raised by a catalog repository.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("customer {0} not found")]
    UnknownCustomer(CustomerId),
}

/// Source of products, customers, and order history.
pub trait CatalogRepository: Send + Sync {
    /// Every product in insertion order.
    fn products(&self) -> Vec<Product>;

    fn product(&self, id: ProductId) -> Option<Product>;

    fn customers(&self) -> Vec<Customer>;

    fn customer(&self, id: CustomerId) -> Option<Customer>;

    /// Orders of a customer, most recent first. Empty for unknown ids.
    fn orders_for(&self, id: CustomerId) -> Vec<Order>;

    /// Prepend an order to a customer's history.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::UnknownCustomer` if the customer does not exist.
    fn record_order(&self, customer_id: CustomerId, order: Order) -> Result<(), CatalogError>;
}

/// Query rules over a [`CatalogRepository`].
#[derive(Clone)]
pub struct CatalogService {
    repo: Arc<dyn CatalogRepository>,
}

impl CatalogService {
    #[must_use]
    pub fn new(repo: Arc<dyn CatalogRepository>) -> Self {
        Self { repo }
    }

    /// Service over the seeded demo catalog.
    #[must_use]
    pub fn demo() -> Self {
        Self::new(Arc::new(InMemoryCatalog::demo()))
    }

    /// The underlying repository.
    #[must_use]
    pub fn repository(&self) -> &Arc<dyn CatalogRepository> {
        &self.repo
    }

    /// Search by name and category, returning at most [`MAX_SEARCH_RESULTS`].
    ///
    /// Blank filters are ignored. An umbrella category such as "clothing"
    /// disables category filtering entirely.
    #[must_use]
    pub fn search(&self, query: Option<&str>, category: Option<&str>) -> Vec<Product> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());
        let category = category
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty() && !is_umbrella_category(c));

        self.repo
            .products()
            .into_iter()
            .filter(|p| {
                category
                    .as_deref()
                    .is_none_or(|c| p.category.as_str().to_lowercase().contains(c))
            })
            .filter(|p| query.is_none_or(|q| p.name_matches(q)))
            .take(MAX_SEARCH_RESULTS)
            .collect()
    }

    /// Order history of a customer; empty for unknown ids.
    #[must_use]
    pub fn order_history(&self, customer_id: CustomerId) -> Vec<Order> {
        self.repo.orders_for(customer_id)
    }

    /// First product whose name contains `name`, ignoring case.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<Product> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        self.repo.products().into_iter().find(|p| p.name_matches(name))
    }

    #[must_use]
    pub fn product(&self, id: ProductId) -> Option<Product> {
        self.repo.product(id)
    }

    /// First in-stock product of the category that complements `product`.
    #[must_use]
    pub fn recommendation_for(&self, product: &Product) -> Option<Product> {
        let target = product.category.complement();
        self.repo
            .products()
            .into_iter()
            .find(|p| p.category == target && p.in_stock && p.id != product.id)
    }

    #[must_use]
    pub fn customers(&self) -> Vec<Customer> {
        self.repo.customers()
    }

    #[must_use]
    pub fn customer(&self, id: CustomerId) -> Option<Customer> {
        self.repo.customer(id)
    }
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService").finish_non_exhaustive()
    }
}

fn is_umbrella_category(category: &str) -> bool {
    UMBRELLA_CATEGORIES.contains(&category)
}
