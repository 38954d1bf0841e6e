//! Decoding of raw tool calls into typed arguments.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use super::{ADD_TO_CART, ESCALATE_ISSUE, GET_MY_ORDERS, PLACE_ORDER, SEARCH_PRODUCTS};

/// A tool call whose arguments have been validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    SearchProducts(SearchProductsArgs),
    GetMyOrders,
    AddToCart(AddToCartArgs),
    PlaceOrder,
    EscalateIssue(EscalateIssueArgs),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchProductsArgs {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddToCartArgs {
    pub product_name: String,
    #[serde(default, deserialize_with = "lenient_quantity")]
    pub quantity: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EscalateIssueArgs {
    pub reason: String,
}

/// Tools without arguments accept any object and ignore its fields.
#[derive(Deserialize)]
struct NoArgs {}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ToolCallError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: &'static str, reason: String },
}

impl ToolCallError {
    /// Short machine-readable code reported to the model.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UnknownTool(_) => "unknown_tool",
            Self::InvalidArguments { .. } => "invalid_arguments",
        }
    }
}

impl ToolCall {
    /// Decode a tool call from its name and JSON input.
    ///
    /// A `null` input is treated as an empty object.
    ///
    /// # Errors
    ///
    /// Returns `ToolCallError::UnknownTool` for names outside the tool set
    /// and `ToolCallError::InvalidArguments` when the input does not match
    /// the tool's schema.
    pub fn decode(name: &str, input: &Value) -> Result<Self, ToolCallError> {
        match name {
            SEARCH_PRODUCTS => args(SEARCH_PRODUCTS, input).map(Self::SearchProducts),
            GET_MY_ORDERS => args::<NoArgs>(GET_MY_ORDERS, input).map(|_| Self::GetMyOrders),
            ADD_TO_CART => args(ADD_TO_CART, input).map(Self::AddToCart),
            PLACE_ORDER => args::<NoArgs>(PLACE_ORDER, input).map(|_| Self::PlaceOrder),
            ESCALATE_ISSUE => args(ESCALATE_ISSUE, input).map(Self::EscalateIssue),
            other => Err(ToolCallError::UnknownTool(other.to_string())),
        }
    }

    /// Name of the tool this call targets.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SearchProducts(_) => SEARCH_PRODUCTS,
            Self::GetMyOrders => GET_MY_ORDERS,
            Self::AddToCart(_) => ADD_TO_CART,
            Self::PlaceOrder => PLACE_ORDER,
            Self::EscalateIssue(_) => ESCALATE_ISSUE,
        }
    }
}

fn args<T: DeserializeOwned>(tool: &'static str, input: &Value) -> Result<T, ToolCallError> {
    let input = if input.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        input.clone()
    };
    serde_json::from_value(input).map_err(|e| ToolCallError::InvalidArguments {
        tool,
        reason: e.to_string(),
    })
}

/// Accept integers, whole floats, and numeric strings; models emit all three.
fn lenient_quantity<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < 1e15)
                    .map(|f| {
                        #[allow(clippy::cast_possible_truncation)] // whole and bounded above
                        let whole = f as i64;
                        whole
                    })
            })
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom("quantity must be a whole number")),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom("quantity must be a whole number")),
        Some(_) => Err(serde::de::Error::custom("quantity must be a whole number")),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_search_with_and_without_args() {
        assert_eq!(
            ToolCall::decode(SEARCH_PRODUCTS, &json!({"query": "jeans"})).unwrap(),
            ToolCall::SearchProducts(SearchProductsArgs {
                query: Some("jeans".to_string()),
                category: None,
            })
        );
        assert_eq!(
            ToolCall::decode(SEARCH_PRODUCTS, &Value::Null).unwrap(),
            ToolCall::SearchProducts(SearchProductsArgs::default())
        );
    }

    #[test]
    fn test_decode_add_to_cart_requires_name() {
        let err = ToolCall::decode(ADD_TO_CART, &json!({"quantity": 2})).unwrap_err();
        assert_eq!(err.code(), "invalid_arguments");
        assert!(err.to_string().contains("product_name"));
    }

    #[test]
    fn test_decode_quantity_forms() {
        for (input, expected) in [
            (json!({"product_name": "Jeans"}), None),
            (json!({"product_name": "Jeans", "quantity": 3}), Some(3)),
            (json!({"product_name": "Jeans", "quantity": 2.0}), Some(2)),
            (json!({"product_name": "Jeans", "quantity": "4"}), Some(4)),
            (json!({"product_name": "Jeans", "quantity": null}), None),
        ] {
            let ToolCall::AddToCart(args) = ToolCall::decode(ADD_TO_CART, &input).unwrap() else {
                panic!("expected add_to_cart");
            };
            assert_eq!(args.quantity, expected, "{input}");
        }
        assert!(
            ToolCall::decode(ADD_TO_CART, &json!({"product_name": "Jeans", "quantity": 1.5}))
                .is_err()
        );
    }

    #[test]
    fn test_decode_escalate_requires_reason() {
        assert!(ToolCall::decode(ESCALATE_ISSUE, &json!({})).is_err());
        assert_eq!(
            ToolCall::decode(ESCALATE_ISSUE, &json!({"reason": "late parcel"})).unwrap(),
            ToolCall::EscalateIssue(EscalateIssueArgs {
                reason: "late parcel".to_string()
            })
        );
    }

    #[test]
    fn test_decode_argless_tools() {
        assert_eq!(ToolCall::decode(PLACE_ORDER, &json!({})).unwrap(), ToolCall::PlaceOrder);
        assert_eq!(
            ToolCall::decode(GET_MY_ORDERS, &json!({"extra": true})).unwrap(),
            ToolCall::GetMyOrders
        );
        assert!(ToolCall::decode(PLACE_ORDER, &json!("now")).is_err());
    }

    #[test]
    fn test_decode_unknown_tool() {
        let err = ToolCall::decode("refund_everything", &json!({})).unwrap_err();
        assert_eq!(err, ToolCallError::UnknownTool("refund_everything".to_string()));
        assert_eq!(err.code(), "unknown_tool");
    }

    #[test]
    fn test_name_round_trips() {
        let call = ToolCall::decode(PLACE_ORDER, &Value::Null).unwrap();
        assert_eq!(call.name(), PLACE_ORDER);
    }
}
