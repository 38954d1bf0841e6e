//! Shared cart and checkout state.
//!
//! [`Shop`] is the single owner of the cart and the active customer. Every
//! channel (text, voice, HTTP) holds a clone of the same handle, so tool
//! handlers always act on live state rather than a snapshot taken when a
//! session started.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use shopdesk_core::{
    Cart, CartItem, Customer, CustomerId, Order, OrderId, OrderLine, OrderStatus, Price, Product,
    ProductId,
};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::catalog::{CatalogError, CatalogService};

const EVENT_CAPACITY: usize = 64;

/// Change notifications for UI channels.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShopEvent {
    /// Cart contents changed. `open_cart` asks the UI to reveal the cart.
    CartUpdated { open_cart: bool },
    OrderPlaced { order_id: OrderId, total: Price },
    CustomerSwitched { customer_id: CustomerId },
}

/// Checkout failures.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,
    #[error("could not record order: {0}")]
    Catalog(#[from] CatalogError),
}

/// Cart and session failures outside checkout.
#[derive(Debug, Error)]
pub enum ShopError {
    #[error("customer {0} not found")]
    UnknownCustomer(CustomerId),
    #[error("product {0} not found")]
    UnknownProduct(ProductId),
}

#[derive(Debug)]
struct ShopState {
    cart: Cart,
    active_customer: CustomerId,
}

struct ShopInner {
    catalog: CatalogService,
    state: Mutex<ShopState>,
    events: broadcast::Sender<ShopEvent>,
}

/// Cloneable handle to the shared cart/order state.
#[derive(Clone)]
pub struct Shop {
    inner: Arc<ShopInner>,
}

impl Shop {
    #[must_use]
    pub fn new(catalog: CatalogService, active_customer: CustomerId) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(ShopInner {
                catalog,
                state: Mutex::new(ShopState {
                    cart: Cart::new(),
                    active_customer,
                }),
                events,
            }),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// Add `quantity` units (default 1) of a product, merging with an
    /// existing line. Returns the line's new quantity.
    pub fn add_to_cart(&self, product: &Product, quantity: Option<i64>) -> u32 {
        let quantity = Cart::normalize_quantity(quantity);
        let line_quantity = self.inner.state.lock().cart.add(product, quantity);
        tracing::debug!(product_id = %product.id, quantity, line_quantity, "added to cart");
        self.publish(ShopEvent::CartUpdated { open_cart: true });
        line_quantity
    }

    /// Add a product by id.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::UnknownProduct` if the id is not in the catalog.
    pub fn add_product(&self, product_id: ProductId, quantity: Option<i64>) -> Result<u32, ShopError> {
        let product = self
            .inner
            .catalog
            .product(product_id)
            .ok_or(ShopError::UnknownProduct(product_id))?;
        Ok(self.add_to_cart(&product, quantity))
    }

    /// Replace a line's quantity. Quantities below 1 are a no-op.
    ///
    /// Returns `true` if the cart changed.
    pub fn update_quantity(&self, product_id: ProductId, quantity: i64) -> bool {
        let changed = self.inner.state.lock().cart.update_quantity(product_id, quantity);
        if changed {
            self.publish(ShopEvent::CartUpdated { open_cart: false });
        }
        changed
    }

    /// Remove a product's line. Returns `true` if a line was removed.
    pub fn remove_from_cart(&self, product_id: ProductId) -> bool {
        let removed = self.inner.state.lock().cart.remove(product_id);
        if removed {
            self.publish(ShopEvent::CartUpdated { open_cart: false });
        }
        removed
    }

    pub fn clear_cart(&self) {
        self.inner.state.lock().cart.clear();
        self.publish(ShopEvent::CartUpdated { open_cart: false });
    }

    /// Place an order for the active customer from the current cart.
    ///
    /// Lines are priced from the live catalog. The order is recorded and the
    /// cart cleared under one lock, so no caller can observe one without
    /// the other.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if there is nothing to order, or
    /// `CheckoutError::Catalog` if the order could not be recorded; the cart
    /// is untouched in both cases.
    pub fn place_order(&self) -> Result<Order, CheckoutError> {
        let order = {
            let mut state = self.inner.state.lock();
            if state.cart.is_empty() {
                return Err(CheckoutError::EmptyCart);
            }

            let order = Order {
                id: OrderId::generate(),
                created_at: Utc::now(),
                status: OrderStatus::Processing,
                items: state
                    .cart
                    .items()
                    .iter()
                    .map(|item| OrderLine {
                        product_id: item.product.id,
                        quantity: item.quantity,
                    })
                    .collect(),
                total: self.price_items(state.cart.items()),
            };

            self.inner
                .catalog
                .repository()
                .record_order(state.active_customer, order.clone())?;
            state.cart.clear();
            order
        };

        tracing::info!(order_id = %order.id, total = %order.total, items = order.item_count(), "order placed");
        self.publish(ShopEvent::OrderPlaced {
            order_id: order.id.clone(),
            total: order.total,
        });
        self.publish(ShopEvent::CartUpdated { open_cart: false });
        Ok(order)
    }

    /// Snapshot of the cart.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.inner.state.lock().cart.clone()
    }

    /// Cart subtotal at the prices captured when items were added.
    #[must_use]
    pub fn cart_total(&self) -> Price {
        self.inner.state.lock().cart.subtotal()
    }

    #[must_use]
    pub fn active_customer(&self) -> CustomerId {
        self.inner.state.lock().active_customer
    }

    /// Make another customer active. The cart is kept.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::UnknownCustomer` if the id is not known.
    pub fn switch_customer(&self, customer_id: CustomerId) -> Result<Customer, ShopError> {
        let customer = self
            .inner
            .catalog
            .customer(customer_id)
            .ok_or(ShopError::UnknownCustomer(customer_id))?;
        self.inner.state.lock().active_customer = customer_id;
        tracing::info!(customer_id = %customer_id, "active customer switched");
        self.publish(ShopEvent::CustomerSwitched { customer_id });
        Ok(customer)
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ShopEvent> {
        self.inner.events.subscribe()
    }

    fn price_items(&self, items: &[CartItem]) -> Price {
        items
            .iter()
            .map(|item| {
                let unit = self
                    .inner
                    .catalog
                    .product(item.product.id)
                    .map_or(item.product.price, |live| live.price);
                unit.times(item.quantity)
            })
            .sum()
    }

    fn publish(&self, event: ShopEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }
}

impl std::fmt::Debug for Shop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shop")
            .field("state", &*self.inner.state.lock())
            .finish_non_exhaustive()
    }
}
