//! Full-duplex voice channel.
//!
//! A voice session ties together three resources with separate lifecycles:
//! microphone capture, audio playback, and a realtime session with the
//! model. [`VoiceSession`] owns all three and drives the state machine in
//! [`ConnectionState`]. The realtime vendor protocol stays behind
//! [`RealtimeTransport`]; device access stays behind [`AudioCapture`] and
//! [`AudioPlayback`].

mod audio;
mod error;
mod playback;
mod session;
mod state;
mod transport;

pub use audio::{
    AudioCapture, AudioChunk, INPUT_SAMPLE_RATE, OUTPUT_SAMPLE_RATE, PCM_MIME_TYPE, decode_pcm16,
    encode_pcm16, rms_volume,
};
pub use error::VoiceError;
pub use playback::{AudioPlayback, PlaybackScheduler, SourceId};
pub use session::VoiceSession;
pub use state::ConnectionState;
pub use transport::{
    Connection, FunctionCall, FunctionResponse, RealtimeConfig, RealtimeSession,
    RealtimeTransport, ResponseModality, SessionEvent,
};
