//! Ticketing and survey collaborators.
//!
//! Both systems are external to the store. [`SimulatedSupportDesk`] stands
//! in for them with a fixed latency and synthetic ids.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use shopdesk_core::{CustomerId, SurveyId, TicketId, TicketStatus};
use thiserror::Error;

/// Accepted survey ratings.
pub const RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SupportError {
    #[error("an escalation needs a reason")]
    BlankReason,
    #[error("rating {0} is outside 1..=5")]
    RatingOutOfRange(u8),
}

/// Ticket created in the external ticketing system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EscalationTicket {
    pub ticket_id: TicketId,
    pub user_id: CustomerId,
    pub reason: String,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
}

/// Receipt for a submitted survey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurveyAck {
    pub survey_id: SurveyId,
    pub received_at: DateTime<Utc>,
}

/// External support systems reached by the assistant.
#[async_trait]
pub trait SupportDesk: Send + Sync {
    /// Open a ticket for a human agent.
    async fn create_ticket(
        &self,
        user_id: CustomerId,
        reason: &str,
    ) -> Result<EscalationTicket, SupportError>;

    /// Submit a post-conversation satisfaction survey.
    async fn submit_survey(
        &self,
        user_id: CustomerId,
        rating: u8,
        feedback: &str,
    ) -> Result<SurveyAck, SupportError>;
}

/// Support desk that answers after a fixed delay with generated ids.
#[derive(Debug, Clone)]
pub struct SimulatedSupportDesk {
    latency: Duration,
}

impl SimulatedSupportDesk {
    #[must_use]
    pub const fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

impl Default for SimulatedSupportDesk {
    fn default() -> Self {
        Self::new(Duration::from_millis(800))
    }
}

#[async_trait]
impl SupportDesk for SimulatedSupportDesk {
    #[tracing::instrument(skip(self, reason), fields(user_id = %user_id))]
    async fn create_ticket(
        &self,
        user_id: CustomerId,
        reason: &str,
    ) -> Result<EscalationTicket, SupportError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(SupportError::BlankReason);
        }
        tokio::time::sleep(self.latency).await;

        let ticket = EscalationTicket {
            ticket_id: TicketId::generate(),
            user_id,
            reason: reason.to_string(),
            status: TicketStatus::Open,
            created_at: Utc::now(),
        };
        tracing::info!(ticket_id = %ticket.ticket_id, "escalation ticket created");
        Ok(ticket)
    }

    #[tracing::instrument(skip(self, feedback), fields(user_id = %user_id))]
    async fn submit_survey(
        &self,
        user_id: CustomerId,
        rating: u8,
        feedback: &str,
    ) -> Result<SurveyAck, SupportError> {
        if !RATING_RANGE.contains(&rating) {
            return Err(SupportError::RatingOutOfRange(rating));
        }
        tokio::time::sleep(self.latency).await;

        let ack = SurveyAck {
            survey_id: SurveyId::generate(),
            received_at: Utc::now(),
        };
        tracing::info!(survey_id = %ack.survey_id, rating, feedback_len = feedback.len(), "survey received");
        Ok(ack)
    }
}
