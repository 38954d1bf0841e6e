//! Error types for the Claude API client.

use thiserror::Error;

/// Errors that can occur when interacting with the Claude API.
#[derive(Debug, Error)]
pub enum ClaudeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Claude API returned an error.
    #[error("API error ({error_type}): {message}")]
    Api {
        /// Error type from the API.
        error_type: String,
        /// Error message.
        message: String,
    },

    /// Rate limited by the API.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication failed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Failed to parse response.
    #[error("parse error: {0}")]
    Parse(String),

    /// The client could not be built from the configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ClaudeError {
    /// Whether the failure was caused by the credentials.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        match self {
            Self::Unauthorized(_) => true,
            Self::Api { error_type, .. } => {
                error_type == "authentication_error" || error_type == "permission_error"
            }
            _ => false,
        }
    }

    /// Whether the request itself was rejected as malformed.
    #[must_use]
    pub fn is_malformed_request(&self) -> bool {
        match self {
            Self::Api { error_type, .. } => error_type == "invalid_request_error",
            Self::Parse(_) => true,
            _ => false,
        }
    }
}

/// API error response from Claude.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorResponse {
    /// Error type.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Nested error details.
    pub error: ApiError,
}

/// Nested error details.
#[derive(Debug, serde::Deserialize)]
pub struct ApiError {
    /// Error type.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Error message.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claude_error_display() {
        let err = ClaudeError::RateLimited(30);
        assert_eq!(err.to_string(), "rate limited, retry after 30 seconds");

        let err = ClaudeError::Api {
            error_type: "invalid_request_error".to_string(),
            message: "messages: must not be empty".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "API error (invalid_request_error): messages: must not be empty"
        );
    }

    #[test]
    fn test_error_classification() {
        assert!(ClaudeError::Unauthorized("Invalid API key".to_string()).is_auth());
        assert!(
            ClaudeError::Api {
                error_type: "authentication_error".to_string(),
                message: "invalid x-api-key".to_string(),
            }
            .is_auth()
        );
        assert!(ClaudeError::Parse("eof".to_string()).is_malformed_request());
        assert!(!ClaudeError::RateLimited(5).is_auth());
        assert!(!ClaudeError::RateLimited(5).is_malformed_request());
    }

    #[test]
    fn test_api_error_deserialization() {
        let json = r#"{
            "type": "error",
            "error": {
                "type": "authentication_error",
                "message": "invalid x-api-key"
            }
        }"#;

        let response: ApiErrorResponse = serde_json::from_str(json).expect("deserialize");
        assert_eq!(response.error_type, "error");
        assert_eq!(response.error.error_type, "authentication_error");
        assert_eq!(response.error.message, "invalid x-api-key");
    }
}
