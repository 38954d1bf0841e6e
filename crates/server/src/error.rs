//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Server-side failures are
//! captured to Sentry before the response is built; clients only ever see a
//! short, non-technical message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use shopdesk_agent::support::SupportError;
use shopdesk_agent::{ChatError, CheckoutError, ShopError};
use thiserror::Error;

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Checkout failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Cart or session operation referenced something that does not exist.
    #[error("Shop error: {0}")]
    Shop(#[from] ShopError),

    /// Text chat turn failed.
    #[error("Chat error: {0}")]
    Chat(#[from] ChatError),

    /// Support desk rejected the request.
    #[error("Support error: {0}")]
    Support(#[from] SupportError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Checkout(CheckoutError::EmptyCart) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Checkout(CheckoutError::Catalog(_)) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Shop(_) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Chat(err) => match err {
                ChatError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
                ChatError::EmptyMessage => StatusCode::BAD_REQUEST,
                ChatError::Model(shopdesk_agent::claude::ClaudeError::RateLimited(_)) => {
                    StatusCode::TOO_MANY_REQUESTS
                }
                ChatError::Model(_) => StatusCode::BAD_GATEWAY,
            },
            Self::Support(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Internal(_)
                | Self::Checkout(CheckoutError::Catalog(_))
                | Self::Chat(ChatError::Model(_))
        )
    }

    /// Message safe to show to the customer.
    fn public_message(&self) -> String {
        match self {
            Self::Checkout(CheckoutError::EmptyCart) => {
                "Your cart is empty. Add something before checking out.".to_string()
            }
            Self::Checkout(CheckoutError::Catalog(_)) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
            Self::Shop(ShopError::UnknownProduct(_)) => "Product not found".to_string(),
            Self::Shop(ShopError::UnknownCustomer(_)) => "Customer not found".to_string(),
            Self::Chat(err) => err.user_message().to_string(),
            Self::Support(err) => err.to_string(),
            Self::NotFound(what) => format!("Not found: {what}"),
            Self::BadRequest(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let body = Json(json!({ "error": self.public_message() }));
        (status, body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use shopdesk_agent::claude::ClaudeError;
    use shopdesk_core::ProductId;

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::Checkout(CheckoutError::EmptyCart)),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(AppError::Shop(ShopError::UnknownProduct(ProductId::new(99)))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Chat(ChatError::NotConfigured)),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            get_status(AppError::Chat(ChatError::Model(ClaudeError::RateLimited(30)))),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::Support(SupportError::RatingOutOfRange(9))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_model_errors_hide_transport_detail() {
        let err = AppError::Chat(ChatError::Model(ClaudeError::Api {
            error_type: "overloaded_error".to_string(),
            message: "upstream 529 from edge-7".to_string(),
        }));
        let message = err.public_message();
        assert!(!message.contains("edge-7"));
        assert!(!message.contains("529"));
    }
}
