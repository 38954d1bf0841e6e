//! Structured tool outcomes.

use serde::Serialize;
use serde_json::Value;

/// Outcome of one tool call, serialized as JSON for the model.
///
/// Failures are ordinary results: the model reads `error` and `message`
/// and decides what to tell the customer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub message: String,
}

impl ToolResult {
    #[must_use]
    pub fn ok(data: Value, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: message.into(),
        }
    }

    /// A business-rule or input failure with a short error code.
    #[must_use]
    pub fn failure(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: message.into(),
        }
    }

    /// JSON text sent back to the model.
    #[must_use]
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "tool result failed to serialize");
            r#"{"success":false,"error":"serialization_failed","message":"The tool result could not be encoded."}"#
                .to_string()
        })
    }

    /// JSON value sent back over the voice channel.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| {
            serde_json::json!({
                "success": false,
                "error": "serialization_failed",
                "message": "The tool result could not be encoded.",
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_omits_error() {
        let result = ToolResult::ok(json!({"count": 0}), "No products matched.");
        let value: Value = serde_json::from_str(&result.to_json_string()).expect("json");
        assert_eq!(value["success"], true);
        assert_eq!(value["data"]["count"], 0);
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_failure_omits_data() {
        let result = ToolResult::failure("empty_cart", "The cart is empty.");
        let value = result.to_value();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "empty_cart");
        assert!(value.get("data").is_none());
    }
}
