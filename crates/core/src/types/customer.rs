//! Demo customer accounts.

use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::CustomerId;
use super::order::Order;
use super::status::CustomerRole;

/// A customer and their order history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: Email,
    pub role: CustomerRole,
    /// Most recent first.
    pub orders: Vec<Order>,
}

impl Customer {
    /// Record a new order at the front of the history.
    pub fn record_order(&mut self, order: Order) {
        self.orders.insert(0, order);
    }

    /// First name, used for greetings.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}
