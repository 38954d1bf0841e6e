//! Claude API client for chat interactions.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::instrument;

use crate::chat::ChatModel;
use crate::config::ClaudeConfig;

use super::error::{ApiErrorResponse, ClaudeError};
use super::types::{ChatRequest, ChatResponse, Message, Tool};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Claude API client.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct ClaudeClient {
    inner: Arc<ClaudeClientInner>,
}

struct ClaudeClientInner {
    client: reqwest::Client,
    model: String,
    max_tokens: u32,
}

impl ClaudeClient {
    /// Create a new Claude client.
    ///
    /// # Errors
    ///
    /// Returns `ClaudeError::Configuration` if the API key contains
    /// characters that are not valid in a header, or if the HTTP client
    /// cannot be built.
    pub fn new(config: &ClaudeConfig) -> Result<Self, ClaudeError> {
        let mut api_key = HeaderValue::from_str(config.api_key.expose_secret())
            .map_err(|_| ClaudeError::Configuration("API key is not a valid header".to_string()))?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-api-key", api_key);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ClaudeError::Configuration(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(ClaudeClientInner {
                client,
                model: config.model.clone(),
                max_tokens: config.max_tokens,
            }),
        })
    }

    /// Model this client sends requests to.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.inner.model
    }

    /// Send a chat request and get a complete response.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns an error response.
    #[instrument(skip(self, messages, system, tools), fields(model = %self.inner.model, messages = messages.len()))]
    pub async fn send_messages(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        tools: Option<Vec<Tool>>,
    ) -> Result<ChatResponse, ClaudeError> {
        let request = ChatRequest {
            model: self.inner.model.clone(),
            max_tokens: self.inner.max_tokens,
            messages,
            system,
            tools,
        };

        let response = self
            .inner
            .client
            .post(ANTHROPIC_API_URL)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(handle_error_status(status, response).await);
        }

        let body = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| ClaudeError::Parse(format!("Failed to parse response: {e}")))?;
        tracing::debug!(
            input_tokens = parsed.usage.input_tokens,
            output_tokens = parsed.usage.output_tokens,
            stop_reason = ?parsed.stop_reason,
            "Claude response received"
        );
        Ok(parsed)
    }
}

#[async_trait]
impl ChatModel for ClaudeClient {
    async fn chat(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        tools: Option<Vec<Tool>>,
    ) -> Result<ChatResponse, ClaudeError> {
        self.send_messages(messages, system, tools).await
    }
}

/// Map a non-success status code to an error.
async fn handle_error_status(
    status: reqwest::StatusCode,
    response: reqwest::Response,
) -> ClaudeError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);
        return ClaudeError::RateLimited(retry_after);
    }

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return ClaudeError::Unauthorized("Invalid API key".to_string());
    }

    match response.text().await {
        Ok(body) => parse_error_body(&body),
        Err(e) => ClaudeError::Http(e),
    }
}

fn parse_error_body(body: &str) -> ClaudeError {
    serde_json::from_str::<ApiErrorResponse>(body).map_or_else(
        |_| ClaudeError::Api {
            error_type: "unknown".to_string(),
            message: body.to_string(),
        },
        |api_error| ClaudeError::Api {
            error_type: api_error.error.error_type,
            message: api_error.error.message,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn config(key: &str) -> ClaudeConfig {
        ClaudeConfig {
            api_key: SecretString::from(key),
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 512,
        }
    }

    #[test]
    fn test_new_client_keeps_model() {
        let client = ClaudeClient::new(&config("sk-ant-api03-abcDEF123")).expect("client");
        assert_eq!(client.model(), "claude-sonnet-4-20250514");
    }

    #[test]
    fn test_new_client_rejects_header_breaking_key() {
        let result = ClaudeClient::new(&config("sk-ant\nInjected: yes"));
        assert!(matches!(result, Err(ClaudeError::Configuration(_))));
    }

    #[test]
    fn test_parse_error_body_structured() {
        let err = parse_error_body(
            r#"{"type":"error","error":{"type":"invalid_request_error","message":"bad tools"}}"#,
        );
        assert!(err.is_malformed_request());
        assert_eq!(err.to_string(), "API error (invalid_request_error): bad tools");
    }

    #[test]
    fn test_parse_error_body_unstructured() {
        let err = parse_error_body("upstream connect error");
        assert!(matches!(err, ClaudeError::Api { ref error_type, .. } if error_type == "unknown"));
    }
}
