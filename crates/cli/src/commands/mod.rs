//! Command implementations and their plain-text rendering.

pub mod catalog;
pub mod chat;

use std::fmt::Write as _;

use shopdesk_agent::claude::ClaudeError;
use shopdesk_agent::{ConfigError, ShopError};
use shopdesk_core::{Cart, Customer, Order, Product};
use thiserror::Error;

/// Errors that end a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Shop(#[from] ShopError),

    #[error("could not set up chat: {0}")]
    Chat(#[from] ClaudeError),

    #[error("text chat needs CLAUDE_API_KEY to be set")]
    ChatDisabled,

    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// One product per line: id, name, category, price, stock.
pub fn render_products(products: &[Product]) -> String {
    if products.is_empty() {
        return "No matching products.\n".to_string();
    }
    let mut out = String::new();
    for p in products {
        let stock = if p.in_stock { "in stock" } else { "out of stock" };
        let _ = writeln!(
            out,
            "#{:<3} {:<22} {:<12} {:>8}  {} ({:.1}/5, {} reviews)",
            p.id.as_i32(),
            p.name,
            p.category.as_str(),
            p.price.to_string(),
            stock,
            p.rating,
            p.review_count
        );
    }
    out
}

pub fn render_orders(orders: &[Order]) -> String {
    if orders.is_empty() {
        return "No orders yet.\n".to_string();
    }
    let mut out = String::new();
    for order in orders {
        let _ = writeln!(
            out,
            "{}  {}  {:<10} {} item(s)  {}",
            order.id,
            order.created_at.format("%Y-%m-%d"),
            order.status.to_string(),
            order.item_count(),
            order.total
        );
    }
    out
}

pub fn render_customers(customers: &[Customer], active: Option<shopdesk_core::CustomerId>) -> String {
    let mut out = String::new();
    for c in customers {
        let marker = if Some(c.id) == active { "*" } else { " " };
        let _ = writeln!(
            out,
            "{marker} #{:<3} {:<16} {:<32} {}",
            c.id.as_i32(),
            c.name,
            c.email.as_str(),
            c.role
        );
    }
    out
}

/// Cart lines followed by the subtotal.
pub fn render_cart(cart: &Cart) -> String {
    if cart.is_empty() {
        return "Your cart is empty.\n".to_string();
    }
    let mut out = String::new();
    for item in cart.items() {
        let _ = writeln!(
            out,
            "{:>3} x {:<22} {:>8}",
            item.quantity,
            item.product.name,
            item.line_total().to_string()
        );
    }
    let _ = writeln!(out, "Subtotal: {}", cart.subtotal());
    out
}
