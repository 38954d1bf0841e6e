//! Application state shared across handlers.

use std::sync::Arc;

use shopdesk_agent::{AppContext, ChatChannel};
use tokio::sync::Mutex;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The chat channel sits behind an async mutex
/// because a turn holds it across model calls; everything else in
/// [`AppContext`] guards itself.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    context: AppContext,
    chat: Mutex<ChatChannel>,
}

impl AppState {
    /// Create a new application state around an existing chat channel.
    #[must_use]
    pub fn new(chat: ChatChannel) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                context: chat.context().clone(),
                chat: Mutex::new(chat),
            }),
        }
    }

    /// Shared catalog, cart, and session context.
    #[must_use]
    pub fn context(&self) -> &AppContext {
        &self.inner.context
    }

    /// The text chat channel. Hold the guard for the whole turn.
    #[must_use]
    pub fn chat(&self) -> &Mutex<ChatChannel> {
        &self.inner.chat
    }
}
