//! Assistant configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional (text channel)
//! - `CLAUDE_API_KEY` - Anthropic API key; text chat is disabled without it
//! - `CLAUDE_MODEL` - Model ID (default: claude-sonnet-4-20250514)
//! - `CLAUDE_MAX_TOKENS` - Max tokens per response (default: 1024)
//!
//! ## Optional (voice channel)
//! - `VOICE_API_KEY` - Realtime voice API key; voice sessions fail to start without it
//! - `VOICE_MODEL` - Realtime model ID (default: gemini-2.5-flash-native-audio)
//! - `VOICE_NAME` - Prebuilt voice name (default: Puck)
//!
//! ## Optional (session)
//! - `SHOPDESK_CUSTOMER_ID` - Active customer at start-up (default: first seeded customer)
//! - `SHOPDESK_LANGUAGE` - Conversation language code (default: en)
//! - `SUPPORT_LATENCY_MS` - Simulated ticketing/CRM latency (default: 800)

use std::collections::HashMap;
use std::time::Duration;

use secrecy::SecretString;
use shopdesk_core::{CustomerId, Language};
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;
const DEFAULT_CLAUDE_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_CLAUDE_MAX_TOKENS: u32 = 1024;
const DEFAULT_VOICE_MODEL: &str = "gemini-2.5-flash-native-audio";
const DEFAULT_VOICE_NAME: &str = "Puck";
const DEFAULT_SUPPORT_LATENCY_MS: u64 = 800;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "xxx",
    "todo",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Assistant configuration shared by every front end.
#[derive(Debug, Clone, Default)]
pub struct AgentConfig {
    /// Claude configuration (text channel), if credentials were provided
    pub claude: Option<ClaudeConfig>,
    /// Realtime voice configuration, if credentials were provided
    pub voice: Option<VoiceConfig>,
    /// Customer active at start-up
    pub customer_id: Option<CustomerId>,
    /// Conversation language at start-up
    pub language: Language,
    /// Simulated latency of the ticketing and survey systems
    pub support_latency: Duration,
}

/// Claude AI API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct ClaudeConfig {
    /// Anthropic API key
    pub api_key: SecretString,
    /// Model ID (e.g., claude-sonnet-4-20250514)
    pub model: String,
    /// Maximum tokens per response
    pub max_tokens: u32,
}

impl std::fmt::Debug for ClaudeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Realtime voice API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct VoiceConfig {
    /// Realtime API key
    pub api_key: SecretString,
    /// Realtime model ID
    pub model: String,
    /// Prebuilt voice to answer with
    pub voice_name: String,
}

impl std::fmt::Debug for VoiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("voice_name", &self.voice_name)
            .finish()
    }
}

impl AgentConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but invalid, or if a
    /// provided API key looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let customer_id = get_optional_env("SHOPDESK_CUSTOMER_ID")
            .map(|raw| {
                raw.parse::<i32>().map(CustomerId::new).map_err(|e| {
                    ConfigError::InvalidEnvVar("SHOPDESK_CUSTOMER_ID".to_string(), e.to_string())
                })
            })
            .transpose()?;
        let language = get_env_or_default("SHOPDESK_LANGUAGE", "en")
            .parse::<Language>()
            .map_err(|e| ConfigError::InvalidEnvVar("SHOPDESK_LANGUAGE".to_string(), e))?;
        let support_latency_ms = get_env_or_default(
            "SUPPORT_LATENCY_MS",
            &DEFAULT_SUPPORT_LATENCY_MS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar("SUPPORT_LATENCY_MS".to_string(), e.to_string()))?;

        Ok(Self {
            claude: ClaudeConfig::from_env()?,
            voice: VoiceConfig::from_env()?,
            customer_id,
            language,
            support_latency: Duration::from_millis(support_latency_ms),
        })
    }

    /// Returns the Claude configuration, if the text channel is enabled.
    #[must_use]
    pub const fn claude(&self) -> Option<&ClaudeConfig> {
        self.claude.as_ref()
    }

    /// Returns the voice configuration, if the voice channel is enabled.
    #[must_use]
    pub const fn voice(&self) -> Option<&VoiceConfig> {
        self.voice.as_ref()
    }
}

impl ClaudeConfig {
    /// Returns `None` if `CLAUDE_API_KEY` is not set.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(api_key) = get_optional_secret("CLAUDE_API_KEY")? else {
            return Ok(None);
        };
        let max_tokens = get_env_or_default(
            "CLAUDE_MAX_TOKENS",
            &DEFAULT_CLAUDE_MAX_TOKENS.to_string(),
        )
        .parse::<u32>()
        .map_err(|e| ConfigError::InvalidEnvVar("CLAUDE_MAX_TOKENS".to_string(), e.to_string()))?;

        Ok(Some(Self {
            api_key,
            model: get_env_or_default("CLAUDE_MODEL", DEFAULT_CLAUDE_MODEL),
            max_tokens,
        }))
    }
}

impl VoiceConfig {
    /// Returns `None` if `VOICE_API_KEY` is not set.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(api_key) = get_optional_secret("VOICE_API_KEY")? else {
            return Ok(None);
        };
        Ok(Some(Self {
            api_key,
            model: get_env_or_default("VOICE_MODEL", DEFAULT_VOICE_MODEL),
            voice_name: get_env_or_default("VOICE_NAME", DEFAULT_VOICE_NAME),
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Load and validate an optional secret from environment.
fn get_optional_secret(key: &str) -> Result<Option<SecretString>, ConfigError> {
    get_optional_env(key)
        .map(|value| {
            validate_secret_strength(&value, key)?;
            Ok(SecretString::from(value))
        })
        .transpose()
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}
