//! Anthropic Messages API client for the text channel.
//!
//! Only the non-streaming endpoint is used: the tool loop in
//! [`crate::chat`] needs each complete response before it can dispatch the
//! tool calls it contains.

mod client;
mod error;
mod types;

pub use client::ClaudeClient;
pub use error::{ApiError, ApiErrorResponse, ClaudeError};
pub use types::{
    ChatRequest, ChatResponse, ContentBlock, Message, MessageContent, Role, StopReason, Tool,
    Usage,
};
