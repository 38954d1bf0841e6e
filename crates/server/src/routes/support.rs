//! Escalation and survey route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use shopdesk_agent::support::{EscalationTicket, SurveyAck};
use tracing::instrument;

use crate::error::Result;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EscalationRequest {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct SurveyRequest {
    pub rating: u8,
    #[serde(default)]
    pub feedback: String,
}

/// Open a ticket for the active customer.
#[instrument(skip(state, req))]
pub async fn escalate(
    State(state): State<AppState>,
    Json(req): Json<EscalationRequest>,
) -> Result<(StatusCode, Json<EscalationTicket>)> {
    let context = state.context();
    let ticket = context
        .support()
        .create_ticket(context.shop().active_customer(), &req.reason)
        .await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

/// Submit a satisfaction survey for the active customer.
#[instrument(skip(state, req), fields(rating = req.rating))]
pub async fn survey(
    State(state): State<AppState>,
    Json(req): Json<SurveyRequest>,
) -> Result<(StatusCode, Json<SurveyAck>)> {
    let context = state.context();
    let ack = context
        .support()
        .submit_survey(context.shop().active_customer(), req.rating, &req.feedback)
        .await?;
    Ok((StatusCode::CREATED, Json(ack)))
}
