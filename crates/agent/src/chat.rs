//! Turn-based text channel.
//!
//! Each user message starts a turn: the model is called, any tool calls it
//! makes are executed and their results sent back, and this repeats until
//! the model answers in plain text or [`MAX_TOOL_ROUNDS`] rounds of tool
//! calls have been executed.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::claude::{
    ChatResponse, ClaudeClient, ClaudeError, ContentBlock, Message, MessageContent, Role, Tool,
};
use crate::config::AgentConfig;
use crate::context::AppContext;
use crate::prompt::Channel;
use crate::tools::{ToolDispatcher, ToolInvocation, ToolOutcome, support_tools};

/// Maximum rounds of tool execution per user message.
pub const MAX_TOOL_ROUNDS: usize = 5;

const EXHAUSTED_REPLY: &str = "I'm sorry, I wasn't able to finish that request. \
    Could you rephrase it, or would you like me to connect you with a human agent?";
const EMPTY_REPLY: &str = "I'm sorry, I don't have an answer for that. Could you rephrase it?";

/// A conversational model that can request tool calls.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send the conversation and get the model's next response.
    async fn chat(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        tools: Option<Vec<Tool>>,
    ) -> Result<ChatResponse, ClaudeError>;
}

/// Errors that end a turn without a reply.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// No model credentials were configured.
    #[error("chat model is not configured")]
    NotConfigured,

    /// The model could not be reached or rejected the request.
    #[error("chat model error: {0}")]
    Model(#[from] ClaudeError),

    #[error("message is empty")]
    EmptyMessage,
}

impl ChatError {
    /// Message safe to show to a customer. Never includes transport detail.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NotConfigured => {
                "Chat isn't available right now because the assistant hasn't been set up."
            }
            Self::Model(e) if e.is_auth() => {
                "The assistant couldn't sign in to its AI service. Please let the store team know."
            }
            Self::Model(e) if e.is_malformed_request() => {
                "The assistant couldn't process that request. Please try rephrasing your message."
            }
            Self::Model(ClaudeError::RateLimited(_)) => {
                "The assistant is very busy right now. Please try again in a moment."
            }
            Self::Model(_) => "Something went wrong while reaching the assistant. Please try again.",
            Self::EmptyMessage => "Please type a message first.",
        }
    }
}

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    /// The model answered in text.
    Completed,
    /// The tool round budget ran out.
    Exhausted,
    /// The session was reset mid-turn; the reply belongs to nobody.
    Discarded,
}

/// Result of one user message.
#[derive(Debug, Clone, Serialize)]
pub struct TurnReply {
    pub text: String,
    pub status: TurnStatus,
    /// Rounds of tool calls executed.
    pub rounds: usize,
    /// Every tool call executed during the turn, in order.
    pub tool_calls: Vec<ToolOutcome>,
}

/// One conversation with a fixed customer, language, and system prompt.
pub struct ChatSession {
    model: Arc<dyn ChatModel>,
    context: AppContext,
    dispatcher: ToolDispatcher,
    tools: Vec<Tool>,
    system_prompt: String,
    epoch: u64,
    history: Vec<Message>,
}

impl ChatSession {
    #[must_use]
    pub fn new(model: Arc<dyn ChatModel>, context: AppContext) -> Self {
        Self {
            dispatcher: context.dispatcher(),
            tools: support_tools(),
            system_prompt: context.system_prompt(Channel::Text),
            epoch: context.epoch(),
            history: Vec::new(),
            model,
            context,
        }
    }

    /// Whether the customer or language changed since this session began.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.epoch != self.context.epoch()
    }

    #[must_use]
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    #[must_use]
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Run one turn for a user message.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::EmptyMessage` for blank input and
    /// `ChatError::Model` if the model cannot be reached. A failed turn is
    /// removed from history.
    #[instrument(skip(self, text), fields(epoch = self.epoch))]
    pub async fn send_message(&mut self, text: &str) -> Result<TurnReply, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let checkpoint = self.history.len();
        self.history.push(Message::user_text(text));

        let mut rounds = 0;
        let mut trace = Vec::new();

        loop {
            let response = match self
                .model
                .chat(
                    self.history.clone(),
                    Some(self.system_prompt.clone()),
                    Some(self.tools.clone()),
                )
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    warn!(error = %e, rounds, "chat model call failed, rolling back turn");
                    self.history.truncate(checkpoint);
                    return Err(e.into());
                }
            };

            if self.is_stale() {
                return Ok(self.discard(checkpoint, rounds, trace));
            }

            let calls = tool_invocations(&response);
            if calls.is_empty() {
                let reply = response.text();
                let reply = if reply.trim().is_empty() {
                    EMPTY_REPLY.to_string()
                } else {
                    reply
                };
                if response.content.is_empty() {
                    self.push_assistant_text(&reply);
                } else {
                    self.history.push(Message::assistant_blocks(response.content));
                }
                info!(rounds, "turn completed");
                return Ok(TurnReply {
                    text: reply,
                    status: TurnStatus::Completed,
                    rounds,
                    tool_calls: trace,
                });
            }

            if rounds >= MAX_TOOL_ROUNDS {
                // Tool calls we will not answer cannot stay in history.
                let partial = response.text();
                let reply = if partial.trim().is_empty() {
                    EXHAUSTED_REPLY.to_string()
                } else {
                    partial
                };
                self.push_assistant_text(&reply);
                warn!(rounds, pending = calls.len(), "tool round budget exhausted");
                return Ok(TurnReply {
                    text: reply,
                    status: TurnStatus::Exhausted,
                    rounds,
                    tool_calls: trace,
                });
            }

            rounds += 1;
            self.history.push(Message::assistant_blocks(response.content));
            let outcomes = self.dispatcher.dispatch_batch(&calls).await;

            if self.is_stale() {
                return Ok(self.discard(checkpoint, rounds, trace));
            }

            self.history.push(Message::tool_results(
                outcomes.iter().map(tool_result_block).collect(),
            ));
            trace.extend(outcomes);
        }
    }

    fn push_assistant_text(&mut self, text: &str) {
        self.history.push(Message {
            role: Role::Assistant,
            content: MessageContent::Text(text.to_string()),
        });
    }

    fn discard(&mut self, checkpoint: usize, rounds: usize, trace: Vec<ToolOutcome>) -> TurnReply {
        info!(rounds, "session reset mid-turn, discarding reply");
        self.history.truncate(checkpoint);
        TurnReply {
            text: String::new(),
            status: TurnStatus::Discarded,
            rounds,
            tool_calls: trace,
        }
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("epoch", &self.epoch)
            .field("messages", &self.history.len())
            .finish_non_exhaustive()
    }
}

/// The text channel: owns the current session and replaces it when the
/// customer or language changes.
pub struct ChatChannel {
    context: AppContext,
    model: Option<Arc<dyn ChatModel>>,
    session: Option<ChatSession>,
}

impl ChatChannel {
    #[must_use]
    pub const fn new(context: AppContext, model: Option<Arc<dyn ChatModel>>) -> Self {
        Self {
            context,
            model,
            session: None,
        }
    }

    /// Channel backed by Claude when credentials are configured.
    ///
    /// # Errors
    ///
    /// Returns `ClaudeError::Configuration` if the client cannot be built.
    pub fn from_config(context: AppContext, config: &AgentConfig) -> Result<Self, ClaudeError> {
        let model = config
            .claude()
            .map(ClaudeClient::new)
            .transpose()?
            .map(|client| Arc::new(client) as Arc<dyn ChatModel>);
        if model.is_none() {
            warn!("CLAUDE_API_KEY not set, text chat disabled");
        }
        Ok(Self::new(context, model))
    }

    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.model.is_some()
    }

    #[must_use]
    pub const fn context(&self) -> &AppContext {
        &self.context
    }

    /// Current session, if one has been started and is still valid.
    #[must_use]
    pub fn session(&self) -> Option<&ChatSession> {
        self.session.as_ref().filter(|s| !s.is_stale())
    }

    /// Send a message on the current session, starting a fresh one if
    /// there is none or it is stale.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::NotConfigured` without a model, otherwise any
    /// error from [`ChatSession::send_message`].
    pub async fn send(&mut self, text: &str) -> Result<TurnReply, ChatError> {
        let model = self.model.clone().ok_or(ChatError::NotConfigured)?;
        let session = match self.session.take() {
            Some(session) if !session.is_stale() => session,
            previous => {
                if previous.is_some() {
                    info!("customer or language changed, starting new chat session");
                }
                ChatSession::new(model, self.context.clone())
            }
        };
        let session = self.session.insert(session);
        session.send_message(text).await
    }

    /// Forget the conversation.
    pub fn reset(&mut self) {
        self.session = None;
    }
}

fn tool_invocations(response: &ChatResponse) -> Vec<ToolInvocation> {
    response
        .content
        .iter()
        .filter_map(|block| match block {
            ContentBlock::ToolUse { id, name, input } => Some(ToolInvocation {
                id: id.clone(),
                name: name.clone(),
                input: input.clone(),
            }),
            _ => None,
        })
        .collect()
}

fn tool_result_block(outcome: &ToolOutcome) -> ContentBlock {
    ContentBlock::ToolResult {
        tool_use_id: outcome.id.clone(),
        content: outcome.result.to_json_string(),
        is_error: (!outcome.result.success).then_some(true),
    }
}
