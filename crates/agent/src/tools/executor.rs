//! Tool execution against the live shop.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, json};
use shopdesk_core::{Order, Product};
use tracing::instrument;

use crate::shop::{CheckoutError, Shop};
use crate::support::SupportDesk;

use super::call::{AddToCartArgs, EscalateIssueArgs, SearchProductsArgs, ToolCall};
use super::result::ToolResult;

/// A raw tool call as issued by a model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolInvocation {
    /// Model-assigned id, echoed back with the result.
    pub id: String,
    pub name: String,
    pub input: Value,
}

/// Result of one invocation in a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolOutcome {
    pub id: String,
    pub name: String,
    pub result: ToolResult,
}

/// Executes tool calls against the shared shop and support desk.
///
/// Holds handles, not snapshots: each call sees the cart and active
/// customer as they are when it runs.
#[derive(Clone)]
pub struct ToolDispatcher {
    shop: Shop,
    support: Arc<dyn SupportDesk>,
}

impl ToolDispatcher {
    #[must_use]
    pub fn new(shop: Shop, support: Arc<dyn SupportDesk>) -> Self {
        Self { shop, support }
    }

    /// Decode and execute one call. Never fails; bad input becomes a
    /// failure result.
    #[instrument(skip(self, input), fields(tool_name = %name))]
    pub async fn dispatch(&self, name: &str, input: &Value) -> ToolResult {
        match ToolCall::decode(name, input) {
            Ok(call) => self.execute(call).await,
            Err(e) => {
                tracing::warn!(error = %e, "rejected tool call");
                ToolResult::failure(e.code(), e.to_string())
            }
        }
    }

    /// Run a batch in order, collecting every result before returning.
    pub async fn dispatch_batch(&self, calls: &[ToolInvocation]) -> Vec<ToolOutcome> {
        let mut outcomes = Vec::with_capacity(calls.len());
        for call in calls {
            let result = self.dispatch(&call.name, &call.input).await;
            outcomes.push(ToolOutcome {
                id: call.id.clone(),
                name: call.name.clone(),
                result,
            });
        }
        outcomes
    }

    /// Execute an already decoded call.
    pub async fn execute(&self, call: ToolCall) -> ToolResult {
        let result = match call {
            ToolCall::SearchProducts(args) => self.search_products(&args),
            ToolCall::GetMyOrders => self.get_my_orders(),
            ToolCall::AddToCart(args) => self.add_to_cart(&args),
            ToolCall::PlaceOrder => self.place_order(),
            ToolCall::EscalateIssue(args) => self.escalate_issue(&args).await,
        };
        tracing::debug!(success = result.success, "tool executed");
        result
    }

    fn search_products(&self, args: &SearchProductsArgs) -> ToolResult {
        let products = self
            .shop
            .catalog()
            .search(args.query.as_deref(), args.category.as_deref());
        let message = if products.is_empty() {
            "No products matched. Try a broader search or no category.".to_string()
        } else {
            format!("Found {} matching products.", products.len())
        };
        ToolResult::ok(
            json!({
                "count": products.len(),
                "products": products.iter().map(product_summary).collect::<Vec<_>>(),
            }),
            message,
        )
    }

    fn get_my_orders(&self) -> ToolResult {
        let customer_id = self.shop.active_customer();
        let orders = self.shop.catalog().order_history(customer_id);
        let message = if orders.is_empty() {
            "This customer has no orders yet.".to_string()
        } else {
            format!("{} orders on file, most recent first.", orders.len())
        };
        ToolResult::ok(
            json!({
                "customer_id": customer_id,
                "orders": orders.iter().map(|o| self.order_summary(o)).collect::<Vec<_>>(),
            }),
            message,
        )
    }

    fn add_to_cart(&self, args: &AddToCartArgs) -> ToolResult {
        let catalog = self.shop.catalog();
        let Some(product) = catalog.find_by_name(&args.product_name) else {
            return ToolResult::failure(
                "product_not_found",
                format!(
                    "No product matches \"{}\". Search the catalog and use a listed name.",
                    args.product_name
                ),
            );
        };
        if !product.in_stock {
            return ToolResult::failure(
                "out_of_stock",
                format!("{} is out of stock and cannot be added.", product.name),
            );
        }

        let added = shopdesk_core::Cart::normalize_quantity(args.quantity);
        let line_quantity = self.shop.add_to_cart(&product, args.quantity);
        let cart = self.shop.cart();

        let mut message = format!(
            "Added {added} x {} to the cart ({line_quantity} in cart).",
            product.name
        );
        if let Some(rec) = catalog.recommendation_for(&product) {
            message.push_str(&format!(
                " Suggestion: {} ({}) from {} goes well with it.",
                rec.name, rec.price, rec.category
            ));
        }

        ToolResult::ok(
            json!({
                "product": product_summary(&product),
                "quantity_added": added,
                "line_quantity": line_quantity,
                "cart_item_count": cart.item_count(),
                "cart_total": cart.subtotal().to_string(),
            }),
            message,
        )
    }

    fn place_order(&self) -> ToolResult {
        match self.shop.place_order() {
            Ok(order) => ToolResult::ok(
                json!({
                    "order_id": order.id,
                    "total": order.total.to_string(),
                    "item_count": order.item_count(),
                }),
                format!("Order {} placed. Total {}.", order.id, order.total),
            ),
            Err(CheckoutError::EmptyCart) => ToolResult::failure(
                "empty_cart",
                "The cart is empty. Add items before placing an order.",
            ),
            Err(e) => {
                tracing::error!(error = %e, "checkout failed");
                ToolResult::failure("checkout_failed", "The order could not be placed.")
            }
        }
    }

    async fn escalate_issue(&self, args: &EscalateIssueArgs) -> ToolResult {
        let customer_id = self.shop.active_customer();
        match self.support.create_ticket(customer_id, &args.reason).await {
            Ok(ticket) => ToolResult::ok(
                json!({ "ticket_id": ticket.ticket_id }),
                format!(
                    "Ticket {} opened. A human agent will follow up.",
                    ticket.ticket_id
                ),
            ),
            Err(e) => ToolResult::failure("escalation_rejected", e.to_string()),
        }
    }

    fn order_summary(&self, order: &Order) -> Value {
        let catalog = self.shop.catalog();
        json!({
            "id": order.id,
            "created_at": order.created_at,
            "status": order.status,
            "total": order.total.to_string(),
            "items": order
                .items
                .iter()
                .map(|line| json!({
                    "product_id": line.product_id,
                    "product_name": catalog.product(line.product_id).map(|p| p.name),
                    "quantity": line.quantity,
                }))
                .collect::<Vec<_>>(),
        })
    }
}

impl std::fmt::Debug for ToolDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDispatcher").finish_non_exhaustive()
    }
}

fn product_summary(product: &Product) -> Value {
    json!({
        "id": product.id,
        "name": product.name,
        "category": product.category,
        "price": product.price.to_string(),
        "in_stock": product.in_stock,
        "rating": product.rating,
        "review_count": product.review_count,
    })
}
