//! Types for the Claude API.
//!
//! These types match the Anthropic Messages API format for tool use.

use serde::{Deserialize, Serialize};

/// Sender of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A message in a conversation with Claude.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender.
    pub role: Role,
    /// The content of the message.
    pub content: MessageContent,
}

impl Message {
    /// Plain-text message from the user.
    #[must_use]
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    /// Assistant message echoing the blocks of a model response.
    #[must_use]
    pub const fn assistant_blocks(blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Blocks(blocks),
        }
    }

    /// User message carrying one batch of tool results.
    #[must_use]
    pub const fn tool_results(results: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Blocks(results),
        }
    }
}

/// Content of a message - either plain text or a list of content blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Simple text content.
    Text(String),
    /// Multiple content blocks (for tool use).
    Blocks(Vec<ContentBlock>),
}

/// A content block within a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    /// Text content.
    #[serde(rename = "text")]
    Text {
        /// The text content.
        text: String,
    },
    /// Tool use request from Claude.
    #[serde(rename = "tool_use")]
    ToolUse {
        /// Unique ID for this tool use.
        id: String,
        /// Name of the tool to use.
        name: String,
        /// Input parameters for the tool.
        input: serde_json::Value,
    },
    /// Result of a tool invocation.
    #[serde(rename = "tool_result")]
    ToolResult {
        /// ID of the tool use this is responding to.
        tool_use_id: String,
        /// Result content from the tool.
        content: String,
        /// Whether the tool execution failed.
        #[serde(skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
}

/// A tool definition for Claude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Name of the tool.
    pub name: String,
    /// Description of what the tool does.
    pub description: String,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: serde_json::Value,
}

/// Request body for the Claude Messages API.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model to use (e.g., "claude-sonnet-4-20250514").
    pub model: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Conversation messages.
    pub messages: Vec<Message>,
    /// System prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Available tools.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
}

/// Response from the Claude Messages API (non-streaming).
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// Unique response ID.
    #[serde(default)]
    pub id: String,
    /// Model that generated the response.
    #[serde(default)]
    pub model: String,
    /// Reason the response stopped.
    pub stop_reason: Option<StopReason>,
    /// Response content blocks.
    pub content: Vec<ContentBlock>,
    /// Token usage information.
    #[serde(default)]
    pub usage: Usage,
}

impl ChatResponse {
    /// Build a response from content blocks, as a local model would return it.
    #[must_use]
    pub fn from_blocks(content: Vec<ContentBlock>, stop_reason: StopReason) -> Self {
        Self {
            id: String::new(),
            model: String::new(),
            stop_reason: Some(stop_reason),
            content,
            usage: Usage::default(),
        }
    }

    /// Concatenated text of every text block.
    #[must_use]
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Whether the response asks for at least one tool call.
    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        self.content
            .iter()
            .any(|block| matches!(block, ContentBlock::ToolUse { .. }))
    }
}

/// Reason the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural end of response.
    EndTurn,
    /// Max tokens reached.
    MaxTokens,
    /// Stop sequence encountered.
    StopSequence,
    /// Tool use requested.
    ToolUse,
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Usage {
    /// Number of input tokens.
    pub input_tokens: u32,
    /// Number of output tokens.
    pub output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_roles_serialize_lowercase() {
        let json = serde_json::to_value(Message::user_text("Hi")).expect("serialize");
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "Hi");
    }

    #[test]
    fn test_tool_result_omits_missing_error_flag() {
        let block = ContentBlock::ToolResult {
            tool_use_id: "toolu_1".to_string(),
            content: "{}".to_string(),
            is_error: None,
        };
        let json = serde_json::to_string(&block).expect("serialize");
        assert!(json.contains("\"type\":\"tool_result\""));
        assert!(!json.contains("is_error"));
    }

    #[test]
    fn test_response_deserialization() {
        let json = r#"{
            "id": "msg_01",
            "model": "claude-sonnet-4-20250514",
            "stop_reason": "tool_use",
            "content": [
                {"type": "text", "text": "Let me look."},
                {"type": "tool_use", "id": "toolu_1", "name": "search_products", "input": {"query": "jeans"}}
            ],
            "usage": {"input_tokens": 12, "output_tokens": 30}
        }"#;
        let response: ChatResponse = serde_json::from_str(json).expect("deserialize");
        assert_eq!(response.stop_reason, Some(StopReason::ToolUse));
        assert!(response.has_tool_calls());
        assert_eq!(response.text(), "Let me look.");
        assert_eq!(response.usage.output_tokens, 30);
    }

    #[test]
    fn test_text_joins_blocks() {
        let response = ChatResponse::from_blocks(
            vec![
                ContentBlock::Text {
                    text: "One".to_string(),
                },
                ContentBlock::Text {
                    text: "Two".to_string(),
                },
            ],
            StopReason::EndTurn,
        );
        assert_eq!(response.text(), "One\nTwo");
        assert!(!response.has_tool_calls());
    }
}
