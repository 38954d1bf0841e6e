//! Realtime model session seam.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::claude::Tool;
use crate::tools::{ToolInvocation, ToolOutcome};

use super::audio::AudioChunk;
use super::error::VoiceError;

/// What the model answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseModality {
    #[default]
    Audio,
    Text,
}

/// Parameters for opening a realtime session.
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    pub api_key: SecretString,
    pub model: String,
    pub voice_name: String,
    pub system_prompt: String,
    pub tools: Vec<Tool>,
    pub response_modality: ResponseModality,
    pub input_sample_rate: u32,
    pub output_sample_rate: u32,
}

/// A tool call issued by the realtime model.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub id: String,
    pub name: String,
    pub args: Value,
}

impl From<FunctionCall> for ToolInvocation {
    fn from(call: FunctionCall) -> Self {
        Self {
            id: call.id,
            name: call.name,
            input: call.args,
        }
    }
}

/// Result of a [`FunctionCall`], sent back to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionResponse {
    pub id: String,
    pub name: String,
    pub response: Value,
}

impl From<ToolOutcome> for FunctionResponse {
    fn from(outcome: ToolOutcome) -> Self {
        Self {
            response: outcome.result.to_value(),
            id: outcome.id,
            name: outcome.name,
        }
    }
}

/// Events delivered by an open realtime session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The session is ready for audio.
    Opened,
    /// A batch of tool calls to execute.
    ToolCalls(Vec<FunctionCall>),
    /// Base64 PCM16 audio at [`super::OUTPUT_SAMPLE_RATE`].
    Audio(String),
    /// The user started speaking over the model.
    Interrupted,
    /// The service closed the session normally.
    Closed,
    /// The service reported an error; the session is unusable.
    Error(String),
}

/// Outgoing half of an open session. Sends are fire-and-forget.
pub trait RealtimeSession: Send + Sync {
    /// Stream one chunk of microphone audio.
    ///
    /// # Errors
    ///
    /// Returns `VoiceError::Transport` if the session can no longer send.
    fn send_realtime_audio(&self, chunk: AudioChunk) -> Result<(), VoiceError>;

    /// Answer a batch of tool calls.
    ///
    /// # Errors
    ///
    /// Returns `VoiceError::Transport` if the session can no longer send.
    fn send_tool_results(&self, responses: Vec<FunctionResponse>) -> Result<(), VoiceError>;

    /// Close the session.
    ///
    /// # Errors
    ///
    /// Returns `VoiceError::Transport` if the close could not be sent.
    fn close(&self) -> Result<(), VoiceError>;
}

/// An open session and its event stream.
pub struct Connection {
    pub session: Arc<dyn RealtimeSession>,
    pub events: mpsc::Receiver<SessionEvent>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection").finish_non_exhaustive()
    }
}

/// Opens realtime sessions with the model vendor.
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    /// # Errors
    ///
    /// Returns a `VoiceError` if the session cannot be opened.
    async fn connect(&self, config: RealtimeConfig) -> Result<Connection, VoiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolResult;
    use serde_json::json;

    #[test]
    fn test_function_call_becomes_invocation() {
        let invocation: ToolInvocation = FunctionCall {
            id: "call-1".to_string(),
            name: "place_order".to_string(),
            args: json!({}),
        }
        .into();
        assert_eq!(invocation.id, "call-1");
        assert_eq!(invocation.name, "place_order");
    }

    #[test]
    fn test_outcome_becomes_response() {
        let response: FunctionResponse = ToolOutcome {
            id: "call-2".to_string(),
            name: "place_order".to_string(),
            result: ToolResult::failure("empty_cart", "The cart is empty."),
        }
        .into();
        assert_eq!(response.id, "call-2");
        assert_eq!(response.response["error"], "empty_cart");
    }

    #[test]
    fn test_modality_serializes_uppercase() {
        assert_eq!(
            serde_json::to_value(ResponseModality::Audio).expect("json"),
            json!("AUDIO")
        );
    }
}
