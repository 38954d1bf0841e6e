//! Tools the assistant can call, and their dispatcher.
//!
//! The same five tools are offered on the text and voice channels. Calls
//! are decoded once into [`ToolCall`] and executed by [`ToolDispatcher`]
//! against the shared [`crate::shop::Shop`]; every outcome, including bad
//! input, comes back as a [`ToolResult`] the model can read.

mod call;
mod executor;
mod result;

pub use call::{AddToCartArgs, EscalateIssueArgs, SearchProductsArgs, ToolCall, ToolCallError};
pub use executor::{ToolDispatcher, ToolInvocation, ToolOutcome};
pub use result::ToolResult;

use serde_json::json;

use crate::claude::Tool;

pub const SEARCH_PRODUCTS: &str = "search_products";
pub const GET_MY_ORDERS: &str = "get_my_orders";
pub const ADD_TO_CART: &str = "add_to_cart";
pub const PLACE_ORDER: &str = "place_order";
pub const ESCALATE_ISSUE: &str = "escalate_issue";

/// Declarations of every support tool, in the order they are offered.
#[must_use]
pub fn support_tools() -> Vec<Tool> {
    vec![
        Tool {
            name: SEARCH_PRODUCTS.to_string(),
            description: "Search the store catalog by product name and/or category. \
                Returns up to 5 products with price, stock status, and rating. \
                Leave category empty for broad requests such as \"clothes\"."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Words from the product name, e.g. \"jeans\""
                    },
                    "category": {
                        "type": "string",
                        "description": "One of Tops, Bottoms, Footwear, Outerwear, Accessories"
                    }
                }
            }),
        },
        Tool {
            name: GET_MY_ORDERS.to_string(),
            description: "List the current customer's orders, most recent first, \
                with status, total, and items."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
        Tool {
            name: ADD_TO_CART.to_string(),
            description: "Add a product to the customer's cart by name. \
                Adding a product already in the cart increases its quantity."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "product_name": {
                        "type": "string",
                        "description": "Product name as shown in search results"
                    },
                    "quantity": {
                        "type": "integer",
                        "minimum": 1,
                        "description": "Units to add (default 1)"
                    }
                },
                "required": ["product_name"]
            }),
        },
        Tool {
            name: PLACE_ORDER.to_string(),
            description: "Check out the current cart and place an order. \
                Only call this when the customer explicitly asks to buy."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
        Tool {
            name: ESCALATE_ISSUE.to_string(),
            description: "Hand the conversation to a human agent by opening a support ticket. \
                Returns the ticket id to read back to the customer."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "reason": {
                        "type": "string",
                        "description": "Short summary of the customer's problem"
                    }
                },
                "required": ["reason"]
            }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_five_tools_with_unique_names() {
        let tools = support_tools();
        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![SEARCH_PRODUCTS, GET_MY_ORDERS, ADD_TO_CART, PLACE_ORDER, ESCALATE_ISSUE]
        );
    }

    #[test]
    fn test_required_arguments_declared() {
        let tools = support_tools();
        let required = |name: &str| {
            tools
                .iter()
                .find(|t| t.name == name)
                .and_then(|t| t.input_schema.get("required").cloned())
        };
        assert_eq!(required(ADD_TO_CART), Some(json!(["product_name"])));
        assert_eq!(required(ESCALATE_ISSUE), Some(json!(["reason"])));
        assert_eq!(required(SEARCH_PRODUCTS), None);
    }

    #[test]
    fn test_every_schema_is_an_object() {
        for tool in support_tools() {
            assert_eq!(tool.input_schema["type"], "object", "{}", tool.name);
            assert!(!tool.description.is_empty());
        }
    }
}
