//! The voice session state machine.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, instrument, warn};

use crate::config::VoiceConfig;
use crate::context::AppContext;
use crate::prompt::Channel;
use crate::tools::{ToolInvocation, support_tools};

use super::audio::{
    AudioCapture, AudioChunk, INPUT_SAMPLE_RATE, OUTPUT_SAMPLE_RATE, decode_pcm16, rms_volume,
};
use super::error::VoiceError;
use super::playback::{AudioPlayback, PlaybackScheduler};
use super::state::ConnectionState;
use super::transport::{
    FunctionCall, FunctionResponse, RealtimeConfig, RealtimeSession, RealtimeTransport,
    ResponseModality, SessionEvent,
};

/// One voice conversation.
///
/// `Disconnected -> Connecting` on [`start`](Self::start),
/// `Connecting -> Connected` on [`SessionEvent::Opened`], and back to
/// `Disconnected` on [`stop`](Self::stop) or a normal close. Any failure
/// moves to `Error`. Every exit from an active state releases the
/// microphone, the playback device, and the realtime session.
///
/// A session belongs to the customer and language it was started under. Once
/// the context epoch moves it is stale: the next event, or [`run`](Self::run)
/// if it is waiting, stops it, and tool results still in flight are dropped.
pub struct VoiceSession {
    context: AppContext,
    config: Option<VoiceConfig>,
    transport: Arc<dyn RealtimeTransport>,
    capture: Arc<dyn AudioCapture>,
    playback: Arc<dyn AudioPlayback>,
    state: watch::Sender<ConnectionState>,
    volume: Arc<VolumeMeter>,
    epoch: u64,
    scheduler: PlaybackScheduler,
    session: Option<Arc<dyn RealtimeSession>>,
    events: Option<mpsc::Receiver<SessionEvent>>,
    frames: Option<mpsc::Receiver<Vec<f32>>>,
    capture_task: Option<JoinHandle<()>>,
    tool_tasks: JoinSet<()>,
    capture_open: bool,
    playback_open: bool,
    last_error: Option<VoiceError>,
}

impl VoiceSession {
    #[must_use]
    pub fn new(
        context: AppContext,
        config: Option<VoiceConfig>,
        transport: Arc<dyn RealtimeTransport>,
        capture: Arc<dyn AudioCapture>,
        playback: Arc<dyn AudioPlayback>,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            scheduler: PlaybackScheduler::new(Arc::clone(&playback), OUTPUT_SAMPLE_RATE),
            epoch: context.epoch(),
            context,
            config,
            transport,
            capture,
            playback,
            state,
            volume: Arc::new(VolumeMeter::new()),
            session: None,
            events: None,
            frames: None,
            capture_task: None,
            tool_tasks: JoinSet::new(),
            capture_open: false,
            playback_open: false,
            last_error: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Microphone level in `[0, 1]`, zero whenever not connected.
    #[must_use]
    pub fn subscribe_volume(&self) -> watch::Receiver<f32> {
        self.volume.subscribe()
    }

    /// Whether the customer or language changed since this session started.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.state().is_active() && self.context.epoch() != self.epoch
    }

    /// Error that moved the session to `Error`, if any.
    #[must_use]
    pub const fn last_error(&self) -> Option<&VoiceError> {
        self.last_error.as_ref()
    }

    #[must_use]
    pub const fn scheduler(&self) -> &PlaybackScheduler {
        &self.scheduler
    }

    /// Acquire audio resources and open the realtime session.
    ///
    /// Does nothing if the session is already connecting or connected.
    ///
    /// # Errors
    ///
    /// Returns `VoiceError::MissingCredentials` without a voice API key, or
    /// the error of whichever resource failed. The session is then in
    /// `Error` with everything released.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> Result<(), VoiceError> {
        if self.state().is_active() {
            debug!(state = %self.state(), "voice session already active");
            return Ok(());
        }
        self.last_error = None;

        let Some(config) = self.config.clone() else {
            return Err(self.fail(VoiceError::MissingCredentials));
        };

        self.epoch = self.context.epoch();
        self.set_state(ConnectionState::Connecting);
        match self.acquire(config).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn acquire(&mut self, config: VoiceConfig) -> Result<(), VoiceError> {
        let frames = self.capture.start(INPUT_SAMPLE_RATE).await?;
        self.capture_open = true;
        self.frames = Some(frames);

        self.playback.open(OUTPUT_SAMPLE_RATE).await?;
        self.playback_open = true;
        self.scheduler.reset();

        let realtime = RealtimeConfig {
            api_key: config.api_key,
            model: config.model,
            voice_name: config.voice_name,
            system_prompt: self.context.system_prompt(Channel::Voice),
            tools: support_tools(),
            response_modality: ResponseModality::Audio,
            input_sample_rate: INPUT_SAMPLE_RATE,
            output_sample_rate: OUTPUT_SAMPLE_RATE,
        };
        let connection = self.transport.connect(realtime).await?;
        self.session = Some(connection.session);
        self.events = Some(connection.events);
        Ok(())
    }

    /// Drive events until the session is no longer active.
    ///
    /// Also returns once the customer or language changes.
    pub async fn run(&mut self) {
        let mut epochs = self.context.subscribe_epoch();
        while self.state().is_active() {
            if self.is_stale() {
                self.end_stale();
                break;
            }
            let Some(events) = self.events.as_mut() else {
                break;
            };
            let next = tokio::select! {
                event = events.recv() => Some(event),
                Ok(()) = epochs.changed() => None,
            };
            match next {
                Some(Some(event)) => self.handle_event(event),
                Some(None) => {
                    let _ = self.fail(VoiceError::Transport(
                        "event stream ended unexpectedly".to_string(),
                    ));
                }
                None => {}
            }
        }
    }

    /// Apply one event from the realtime session.
    ///
    /// A stale session is stopped instead.
    pub fn handle_event(&mut self, event: SessionEvent) {
        if self.is_stale() {
            self.end_stale();
            return;
        }
        match event {
            SessionEvent::Opened => self.on_opened(),
            SessionEvent::ToolCalls(calls) => self.on_tool_calls(calls),
            SessionEvent::Audio(data) => self.on_audio(&data),
            SessionEvent::Interrupted => {
                if self.state() == ConnectionState::Connected {
                    debug!(pending = self.scheduler.pending(), "playback interrupted");
                    self.scheduler.interrupt();
                }
            }
            SessionEvent::Closed => {
                info!("voice session closed by service");
                self.teardown();
                self.set_state(ConnectionState::Disconnected);
            }
            SessionEvent::Error(message) => {
                let _ = self.fail(VoiceError::from_service_message(&message));
            }
        }
    }

    fn on_opened(&mut self) {
        if self.state() != ConnectionState::Connecting {
            return;
        }
        self.set_state(ConnectionState::Connected);

        let (Some(mut frames), Some(session)) = (self.frames.take(), self.session.clone()) else {
            return;
        };
        self.volume.open();
        let volume = Arc::clone(&self.volume);
        self.capture_task = Some(tokio::spawn(async move {
            while let Some(frame) = frames.recv().await {
                volume.publish(rms_volume(&frame));
                if let Err(e) = session.send_realtime_audio(AudioChunk::from_samples(&frame)) {
                    debug!(error = %e, "dropped audio chunk");
                }
            }
        }));
    }

    fn on_tool_calls(&mut self, calls: Vec<FunctionCall>) {
        if self.state() != ConnectionState::Connected {
            debug!(count = calls.len(), "ignoring tool calls outside a connected session");
            return;
        }
        let Some(session) = self.session.clone() else {
            return;
        };
        let context = self.context.clone();
        let epoch = self.epoch;
        let state = self.state.subscribe();
        let invocations: Vec<ToolInvocation> = calls.into_iter().map(Into::into).collect();

        self.tool_tasks.spawn(async move {
            let outcomes = context.dispatcher().dispatch_batch(&invocations).await;
            if *state.borrow() != ConnectionState::Connected {
                debug!(count = outcomes.len(), "session ended, discarding tool results");
                return;
            }
            if context.epoch() != epoch {
                debug!(count = outcomes.len(), "customer or language changed, discarding tool results");
                return;
            }
            let responses: Vec<FunctionResponse> = outcomes.into_iter().map(Into::into).collect();
            if let Err(e) = session.send_tool_results(responses) {
                debug!(error = %e, "tool results not delivered");
            }
        });
    }

    fn on_audio(&mut self, data: &str) {
        if self.state() != ConnectionState::Connected {
            return;
        }
        match decode_pcm16(data) {
            Ok(samples) if !samples.is_empty() => {
                self.scheduler.schedule(&samples);
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "skipping undecodable audio fragment"),
        }
    }

    /// Wait for in-flight tool batches to finish.
    pub async fn wait_for_tools(&mut self) {
        while self.tool_tasks.join_next().await.is_some() {}
    }

    /// Release everything and return to `Disconnected`. Safe in any state.
    pub fn stop(&mut self) {
        self.teardown();
        self.set_state(ConnectionState::Disconnected);
    }

    fn end_stale(&mut self) {
        info!(
            started = self.epoch,
            current = self.context.epoch(),
            "customer or language changed, ending voice session"
        );
        self.stop();
    }

    fn fail(&mut self, error: VoiceError) -> VoiceError {
        warn!(error = %error, "voice session failed");
        self.teardown();
        self.set_state(ConnectionState::Error);
        self.last_error = Some(error.clone());
        error
    }

    fn teardown(&mut self) {
        if let Some(task) = self.capture_task.take() {
            task.abort();
        }
        self.frames = None;
        if self.capture_open {
            self.capture.stop();
            self.capture_open = false;
        }
        if self.playback_open {
            self.scheduler.interrupt();
            self.playback.close();
            self.playback_open = false;
        }
        self.scheduler.reset();
        if let Some(session) = self.session.take() {
            if let Err(e) = session.close() {
                debug!(error = %e, "realtime session close failed");
            }
        }
        self.events = None;
        self.volume.close();
    }

    fn set_state(&self, next: ConnectionState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            info!(from = %previous, to = %next, "voice session state changed");
        }
    }
}

/// Microphone level, published only while the capture forwarder is live.
///
/// `close` and `publish` share a lock, so a forwarder that outlives its
/// abort cannot leave a level behind after the reset to zero.
#[derive(Debug)]
struct VolumeMeter {
    level: watch::Sender<f32>,
    live: Mutex<bool>,
}

impl VolumeMeter {
    fn new() -> Self {
        Self {
            level: watch::Sender::new(0.0),
            live: Mutex::new(false),
        }
    }

    fn subscribe(&self) -> watch::Receiver<f32> {
        self.level.subscribe()
    }

    fn open(&self) {
        *self.live.lock() = true;
    }

    fn publish(&self, level: f32) {
        let live = self.live.lock();
        if *live {
            self.level.send_replace(level);
        }
    }

    fn close(&self) {
        let mut live = self.live.lock();
        *live = false;
        self.level.send_replace(0.0);
    }
}

impl Drop for VoiceSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for VoiceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceSession")
            .field("state", &self.state())
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meter_ignores_levels_after_close() {
        let meter = VolumeMeter::new();
        let level = meter.subscribe();

        meter.publish(0.4);
        assert!(level.borrow().abs() < f32::EPSILON);

        meter.open();
        meter.publish(0.4);
        assert!((*level.borrow() - 0.4).abs() < f32::EPSILON);

        meter.close();
        meter.publish(0.7);
        assert!(level.borrow().abs() < f32::EPSILON);
    }
}
