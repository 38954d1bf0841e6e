//! Placed orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{OrderId, ProductId};
use super::price::Price;
use super::status::OrderStatus;

/// One product line of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A placed order. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub items: Vec<OrderLine>,
    /// Sum of price x quantity, priced when the order was placed.
    pub total: Price,
}

impl Order {
    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0_u32, |acc, line| acc.saturating_add(line.quantity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_count_saturates() {
        let line = |id, quantity| OrderLine {
            product_id: ProductId::new(id),
            quantity,
        };
        let order = Order {
            id: OrderId::generate(),
            created_at: Utc::now(),
            status: OrderStatus::Processing,
            items: vec![line(1, 3_000_000_000), line(2, 3_000_000_000)],
            total: Price::usd_cents(0),
        };
        assert_eq!(order.item_count(), u32::MAX);

        let small = Order {
            items: vec![line(1, 2), line(2, 1)],
            ..order
        };
        assert_eq!(small.item_count(), 3);
    }
}
