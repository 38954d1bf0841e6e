//! Text chat and session route handlers.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use shopdesk_agent::TurnReply;
use shopdesk_core::{Customer, CustomerId, Language};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Chat request body.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Session switch request body. Omitted fields keep their current value.
#[derive(Debug, Default, Deserialize)]
pub struct SessionRequest {
    pub customer_id: Option<CustomerId>,
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub customer: Option<Customer>,
    pub language: Language,
    /// Whether the change ended the running conversation.
    pub session_reset: bool,
}

/// Run one text chat turn.
#[instrument(skip(state, req), fields(message_len = req.message.len()))]
pub async fn send(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<TurnReply>> {
    let mut chat = state.chat().lock().await;
    let reply = chat.send(&req.message).await?;
    Ok(Json(reply))
}

/// Switch the active customer and/or conversation language.
///
/// Any change starts a fresh conversation; a turn still in flight is
/// discarded when it returns.
#[instrument(skip(state))]
pub async fn switch_session(
    State(state): State<AppState>,
    Json(req): Json<SessionRequest>,
) -> Result<Json<SessionResponse>> {
    let context = state.context();

    // Parse everything before changing anything.
    let language = req
        .language
        .as_deref()
        .map(str::parse::<Language>)
        .transpose()
        .map_err(AppError::BadRequest)?;

    let epoch = context.epoch();
    if let Some(customer_id) = req.customer_id {
        context.switch_customer(customer_id)?;
    }
    if let Some(language) = language {
        context.set_language(language);
    }

    Ok(Json(SessionResponse {
        customer: context.active_customer(),
        language: context.language(),
        session_reset: context.epoch() != epoch,
    }))
}
