//! Core types for Shopdesk.
//!
//! This module provides type-safe wrappers for the support demo's domain.

pub mod cart;
pub mod catalog;
pub mod customer;
pub mod email;
pub mod id;
pub mod locale;
pub mod order;
pub mod price;
pub mod status;

pub use cart::{Cart, CartItem};
pub use catalog::{Category, Product};
pub use customer::Customer;
pub use email::{Email, EmailError};
pub use id::*;
pub use locale::Language;
pub use order::{Order, OrderLine};
pub use price::{CurrencyCode, Price};
pub use status::*;
