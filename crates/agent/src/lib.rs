//! Shopdesk support assistant.
//!
//! Tool-calling orchestration between a conversational model and the demo
//! store: the shared cart and checkout ([`shop`]), the tools the model may
//! call ([`tools`]), the turn-based text channel ([`chat`]), and the
//! full-duplex voice channel ([`voice`]).
//!
//! # Example
//!
//! ```rust,ignore
//! use shopdesk_agent::{AgentConfig, AppContext, ChatChannel};
//!
//! let config = AgentConfig::from_env()?;
//! let context = AppContext::from_config(&config)?;
//! let mut chat = ChatChannel::from_config(context, &config)?;
//! let reply = chat.send("Do you have jeans?").await?;
//! println!("{}", reply.text);
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod chat;
pub mod claude;
pub mod config;
pub mod context;
pub mod prompt;
pub mod shop;
pub mod support;
pub mod tools;
pub mod voice;

pub use catalog::{CatalogRepository, CatalogService, InMemoryCatalog};
pub use chat::{ChatChannel, ChatError, ChatModel, ChatSession, TurnReply, TurnStatus};
pub use config::{AgentConfig, ConfigError};
pub use context::AppContext;
pub use shop::{CheckoutError, Shop, ShopError, ShopEvent};
pub use support::{SimulatedSupportDesk, SupportDesk};
pub use tools::{ToolDispatcher, ToolResult};
