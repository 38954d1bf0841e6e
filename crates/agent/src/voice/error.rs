use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VoiceError {
    #[error("voice API key is not configured")]
    MissingCredentials,

    #[error("microphone error: {0}")]
    Capture(String),

    #[error("playback error: {0}")]
    Playback(String),

    #[error("voice service rejected the credentials: {0}")]
    Unauthorized(String),

    #[error("voice service rejected the request: {0}")]
    InvalidRequest(String),

    #[error("voice transport error: {0}")]
    Transport(String),

    #[error("invalid audio data: {0}")]
    Decode(String),
}

impl VoiceError {
    /// Classify an error reported by the realtime service.
    #[must_use]
    pub fn from_service_message(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("401")
            || lower.contains("403")
            || lower.contains("unauthorized")
            || lower.contains("api key")
        {
            Self::Unauthorized(message.to_string())
        } else if lower.contains("400") || lower.contains("invalid") {
            Self::InvalidRequest(message.to_string())
        } else {
            Self::Transport(message.to_string())
        }
    }

    /// Message safe to show to a customer.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "Voice chat isn't available because it hasn't been set up yet.",
            Self::Capture(_) => {
                "We couldn't use your microphone. Please check that microphone access is allowed."
            }
            Self::Unauthorized(_) => {
                "The voice assistant couldn't sign in to its service. Please let the store team know."
            }
            Self::InvalidRequest(_) => {
                "The voice assistant couldn't start this conversation. Please try again later."
            }
            Self::Playback(_) | Self::Transport(_) | Self::Decode(_) => {
                "The voice connection was lost. Please try again."
            }
        }
    }
}
