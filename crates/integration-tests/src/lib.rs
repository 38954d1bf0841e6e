//! Integration tests for Shopdesk.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopdesk-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `checkout_flow` - Cart and order state through the shared shop
//! - `tool_dispatch` - Tool calls from the model against live state
//! - `chat_loop` - Text channel turns, round budget, and session resets
//! - `voice_session` - Voice state machine, playback scheduling, teardown
//!
//! Nothing here talks to a network or an audio device. The fakes below stand
//! in for the model, the realtime transport, the microphone, and the
//! speaker.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use secrecy::SecretString;
use serde_json::Value;
use shopdesk_agent::claude::{ChatResponse, ClaudeError, ContentBlock, Message, StopReason, Tool};
use shopdesk_agent::config::VoiceConfig;
use shopdesk_agent::voice::{
    AudioCapture, AudioChunk, AudioPlayback, Connection, FunctionCall, FunctionResponse,
    RealtimeConfig, RealtimeSession, RealtimeTransport, SessionEvent, SourceId, VoiceError,
};
use shopdesk_agent::{AgentConfig, AppContext, ChatModel};
use tokio::sync::mpsc;

/// Demo context with no support latency.
///
/// # Panics
///
/// Panics if the demo catalog has no customers.
#[must_use]
#[allow(clippy::expect_used)]
pub fn demo_context() -> AppContext {
    AppContext::from_config(&AgentConfig::default()).expect("demo catalog has customers")
}

/// Voice credentials accepted by the fakes.
#[must_use]
pub fn voice_config() -> VoiceConfig {
    VoiceConfig {
        api_key: SecretString::from("vk-7Qm2xR9pLw4ZbN8c"),
        model: "realtime-test".to_string(),
        voice_name: "Puck".to_string(),
    }
}

// =============================================================================
// Chat model
// =============================================================================

/// Model reply asking for one tool call.
#[must_use]
pub fn tool_use(id: &str, name: &str, input: Value) -> ChatResponse {
    tool_uses(&[(id, name, input)])
}

/// Model reply asking for several tool calls in one round.
#[must_use]
pub fn tool_uses(calls: &[(&str, &str, Value)]) -> ChatResponse {
    ChatResponse::from_blocks(
        calls
            .iter()
            .map(|(id, name, input)| ContentBlock::ToolUse {
                id: (*id).to_string(),
                name: (*name).to_string(),
                input: input.clone(),
            })
            .collect(),
        StopReason::ToolUse,
    )
}

/// Plain text model reply.
#[must_use]
pub fn text(reply: &str) -> ChatResponse {
    ChatResponse::from_blocks(
        vec![ContentBlock::Text {
            text: reply.to_string(),
        }],
        StopReason::EndTurn,
    )
}

/// Replays scripted replies in order and records every request.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<ChatResponse, ClaudeError>>>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedModel {
    #[must_use]
    pub fn new(replies: impl IntoIterator<Item = ChatResponse>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().map(Ok).collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Queue a failure as the next reply.
    pub fn push_error(&self, error: ClaudeError) {
        self.replies.lock().push_back(Err(error));
    }

    pub fn push(&self, reply: ChatResponse) {
        self.replies.lock().push_back(Ok(reply));
    }

    /// Number of model calls made so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    /// Conversation sent on the most recent call.
    #[must_use]
    pub fn last_request(&self) -> Option<Vec<Message>> {
        self.requests.lock().last().cloned()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn chat(
        &self,
        messages: Vec<Message>,
        _system: Option<String>,
        _tools: Option<Vec<Tool>>,
    ) -> Result<ChatResponse, ClaudeError> {
        self.requests.lock().push(messages);
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ClaudeError::Parse("script exhausted".to_string())))
    }
}

// =============================================================================
// Realtime transport
// =============================================================================

/// Records what the assistant sent over an open realtime session.
#[derive(Debug, Default)]
pub struct FakeSession {
    audio_chunks: Mutex<Vec<AudioChunk>>,
    tool_results: Mutex<Vec<Vec<FunctionResponse>>>,
    closed: Mutex<bool>,
    fail_sends: AtomicBool,
}

impl FakeSession {
    #[must_use]
    pub fn audio_chunks(&self) -> usize {
        self.audio_chunks.lock().len()
    }

    #[must_use]
    pub fn tool_results(&self) -> Vec<Vec<FunctionResponse>> {
        self.tool_results.lock().clone()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        *self.closed.lock()
    }

    /// Make every send fail until switched back, as on a flaky link.
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    fn ensure_open(&self) -> Result<(), VoiceError> {
        if self.is_closed() {
            return Err(VoiceError::Transport("session closed".to_string()));
        }
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(VoiceError::Transport("send buffer full".to_string()));
        }
        Ok(())
    }
}

impl RealtimeSession for FakeSession {
    fn send_realtime_audio(&self, chunk: AudioChunk) -> Result<(), VoiceError> {
        self.ensure_open()?;
        self.audio_chunks.lock().push(chunk);
        Ok(())
    }

    fn send_tool_results(&self, responses: Vec<FunctionResponse>) -> Result<(), VoiceError> {
        self.ensure_open()?;
        self.tool_results.lock().push(responses);
        Ok(())
    }

    fn close(&self) -> Result<(), VoiceError> {
        *self.closed.lock() = true;
        Ok(())
    }
}

/// Transport whose sessions are driven by the test.
#[derive(Default)]
pub struct FakeTransport {
    fail_with: Mutex<Option<VoiceError>>,
    configs: Mutex<Vec<RealtimeConfig>>,
    session: Mutex<Option<Arc<FakeSession>>>,
    events: Mutex<Option<mpsc::Sender<SessionEvent>>>,
}

impl FakeTransport {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Transport whose `connect` always fails.
    #[must_use]
    pub fn failing(error: VoiceError) -> Arc<Self> {
        let transport = Self::default();
        *transport.fail_with.lock() = Some(error);
        Arc::new(transport)
    }

    /// Session returned by the most recent `connect`.
    #[must_use]
    pub fn session(&self) -> Option<Arc<FakeSession>> {
        self.session.lock().clone()
    }

    /// Configuration passed to the most recent `connect`.
    #[must_use]
    pub fn last_config(&self) -> Option<RealtimeConfig> {
        self.configs.lock().last().cloned()
    }

    #[must_use]
    pub fn connects(&self) -> usize {
        self.configs.lock().len()
    }

    /// Drop the event stream as if the connection vanished.
    pub fn hang_up(&self) {
        self.events.lock().take();
    }

    /// Deliver an event to the running session. Returns `false` if nobody
    /// is listening.
    pub async fn emit(&self, event: SessionEvent) -> bool {
        let sender = self.events.lock().clone();
        match sender {
            Some(tx) => tx.send(event).await.is_ok(),
            None => false,
        }
    }
}

#[async_trait]
impl RealtimeTransport for FakeTransport {
    async fn connect(&self, config: RealtimeConfig) -> Result<Connection, VoiceError> {
        self.configs.lock().push(config);
        if let Some(error) = self.fail_with.lock().clone() {
            return Err(error);
        }
        let (tx, rx) = mpsc::channel(32);
        let session = Arc::new(FakeSession::default());
        *self.session.lock() = Some(Arc::clone(&session));
        *self.events.lock() = Some(tx);
        Ok(Connection {
            session,
            events: rx,
        })
    }
}

/// Tool call as the realtime service would send it.
#[must_use]
pub fn function_call(id: &str, name: &str, args: Value) -> FunctionCall {
    FunctionCall {
        id: id.to_string(),
        name: name.to_string(),
        args,
    }
}

// =============================================================================
// Audio devices
// =============================================================================

/// Microphone fed by the test.
#[derive(Default)]
pub struct FakeCapture {
    deny: bool,
    frames: Mutex<Option<mpsc::Sender<Vec<f32>>>>,
    starts: AtomicU64,
    stops: AtomicU64,
}

impl FakeCapture {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Microphone that refuses access.
    #[must_use]
    pub fn denied() -> Arc<Self> {
        Arc::new(Self {
            deny: true,
            ..Self::default()
        })
    }

    /// Whether capture is currently running.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.frames.lock().is_some()
    }

    #[must_use]
    pub fn stops(&self) -> u64 {
        self.stops.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn starts(&self) -> u64 {
        self.starts.load(Ordering::SeqCst)
    }

    /// Push one frame of samples. Returns `false` if capture is stopped.
    pub async fn push(&self, frame: Vec<f32>) -> bool {
        let sender = self.frames.lock().clone();
        match sender {
            Some(tx) => tx.send(frame).await.is_ok(),
            None => false,
        }
    }
}

#[async_trait]
impl AudioCapture for FakeCapture {
    async fn start(&self, _sample_rate: u32) -> Result<mpsc::Receiver<Vec<f32>>, VoiceError> {
        if self.deny {
            return Err(VoiceError::Capture("permission denied".to_string()));
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(16);
        *self.frames.lock() = Some(tx);
        Ok(rx)
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        *self.frames.lock() = None;
    }
}

/// One fragment handed to the fake speaker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Played {
    pub id: SourceId,
    pub start_at: f64,
    pub samples: usize,
}

/// Speaker with a hand-driven clock.
#[derive(Default)]
pub struct FakePlayback {
    now: Mutex<f64>,
    next_id: AtomicU64,
    open: Mutex<bool>,
    played: Mutex<Vec<Played>>,
    stopped: Mutex<Vec<SourceId>>,
}

impl FakePlayback {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_time(&self, seconds: f64) {
        *self.now.lock() = seconds;
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        *self.open.lock()
    }

    #[must_use]
    pub fn played(&self) -> Vec<Played> {
        self.played.lock().clone()
    }

    #[must_use]
    pub fn stopped(&self) -> Vec<SourceId> {
        self.stopped.lock().clone()
    }
}

#[async_trait]
impl AudioPlayback for FakePlayback {
    async fn open(&self, _sample_rate: u32) -> Result<(), VoiceError> {
        *self.open.lock() = true;
        Ok(())
    }

    fn current_time(&self) -> f64 {
        *self.now.lock()
    }

    fn play(&self, samples: &[f32], start_at: f64) -> SourceId {
        let id = SourceId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.played.lock().push(Played {
            id,
            start_at,
            samples: samples.len(),
        });
        id
    }

    fn stop_source(&self, id: SourceId) {
        self.stopped.lock().push(id);
    }

    fn close(&self) {
        *self.open.lock() = false;
    }
}
