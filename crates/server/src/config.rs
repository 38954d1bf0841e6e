//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! Everything read by [`AgentConfig::from_env`], plus:
//!
//! ## Optional
//! - `SHOPDESK_HOST` - Bind address (default: 127.0.0.1)
//! - `SHOPDESK_PORT` - Listen port (default: 3000)
//! - `SHOPDESK_LOG_JSON` - Emit JSON log lines when set to anything but `0`/`false`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 1.0)

use std::net::{IpAddr, SocketAddr};

use shopdesk_agent::{AgentConfig, ConfigError};

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Assistant configuration shared with the CLI
    pub agent: AgentConfig,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Emit logs as JSON lines
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the assistant configuration is invalid or the
    /// bind address cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let agent = AgentConfig::from_env()?;

        let host = get_env_or_default("SHOPDESK_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("SHOPDESK_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("SHOPDESK_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SHOPDESK_PORT".to_string(), e.to_string()))?;
        let log_json = get_optional_env("SHOPDESK_LOG_JSON").is_some_and(|v| is_truthy(&v));

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            agent,
            host,
            port,
            log_json,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

fn is_truthy(value: &str) -> bool {
    !matches!(value.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig {
            agent: AgentConfig::default(),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            log_json: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
        };
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy("1"));
        assert!(is_truthy("true"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("FALSE"));
        assert!(!is_truthy(" off "));
    }
}
