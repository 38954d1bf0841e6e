//! Shopping cart contents and their invariants.
//!
//! The cart keeps one line per product and never holds a quantity below 1.
//! Sharing and checkout live in `shopdesk-agent`; this type only guards the
//! line-level rules.

use serde::{Deserialize, Serialize};

use super::catalog::Product;
use super::id::ProductId;
use super::price::{CurrencyCode, Price};

/// One cart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    /// Line total at the product's listed price.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price.times(self.quantity)
    }
}

/// Ordered cart lines, unique by product id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Quantity used when a caller supplies none, or a non-positive one.
    #[must_use]
    pub fn normalize_quantity(requested: Option<i64>) -> u32 {
        match requested {
            Some(q) if q > 0 => u32::try_from(q).unwrap_or(u32::MAX),
            _ => 1,
        }
    }

    /// Add `quantity` units of `product`, merging with an existing line.
    ///
    /// Returns the line's quantity after the add.
    pub fn add(&mut self, product: &Product, quantity: u32) -> u32 {
        let quantity = quantity.max(1);
        if let Some(item) = self.items.iter_mut().find(|i| i.product.id == product.id) {
            item.quantity = item.quantity.saturating_add(quantity);
            return item.quantity;
        }
        self.items.push(CartItem {
            product: product.clone(),
            quantity,
        });
        quantity
    }

    /// Replace a line's quantity.
    ///
    /// Quantities below 1 are rejected and leave the cart unchanged; use
    /// [`Cart::remove`] to drop a line. Returns `true` if a line changed.
    pub fn update_quantity(&mut self, product_id: ProductId, quantity: i64) -> bool {
        if quantity < 1 {
            return false;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        self.items
            .iter_mut()
            .find(|i| i.product.id == product_id)
            .is_some_and(|item| {
                item.quantity = quantity;
                true
            })
    }

    /// Remove a product's line. Returns `true` if a line was removed.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.product.id != product_id);
        self.items.len() != before
    }

    /// Drop every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Cart lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Quantity of a product, if it is in the cart.
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> Option<u32> {
        self.items
            .iter()
            .find(|i| i.product.id == product_id)
            .map(|i| i.quantity)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Total units across all lines, saturating at `u32::MAX`.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0_u32, |acc, i| acc.saturating_add(i.quantity))
    }

    /// Subtotal at the prices captured when each product was added.
    ///
    /// Display only; checkout reprices against the live catalog.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.items
            .iter()
            .map(CartItem::line_total)
            .fold(Price::zero(CurrencyCode::USD), |acc, p| acc + p)
    }
}
