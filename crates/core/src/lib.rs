//! Shopdesk Core - Shared domain types.
//!
//! This crate provides the types shared by every Shopdesk component:
//! - `agent` - Tool dispatch, cart state machine, text and voice session loops
//! - `server` - JSON API for the product/cart browser and text chat
//! - `cli` - Interactive chat and catalog inspection
//!
//! # Architecture
//!
//! The core crate contains only types and their invariants - no I/O, no
//! clients, no shared state. Anything that needs a lock or a network lives in
//! `shopdesk-agent`.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, prices, statuses, catalog, order, customer and cart types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
