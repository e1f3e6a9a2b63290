use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    errors::DomainError,
    models::{Nudge, NudgeStatus},
    repositories::NudgeRepository,
};

pub struct RescheduleNudgeUseCase {
    nudges: Arc<dyn NudgeRepository>,
}

pub struct RescheduleNudgeRequest {
    pub account_id: Uuid,
    pub nudge_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
}

pub struct RescheduleNudgeResponse {
    pub nudge_id: Uuid,
    /// True when the original nudge was terminal and a fresh pending
    /// nudge was created in its place.
    pub recreated: bool,
}

impl RescheduleNudgeUseCase {
    pub fn new(nudges: Arc<dyn NudgeRepository>) -> Self {
        Self { nudges }
    }

    pub async fn execute(
        &self,
        request: RescheduleNudgeRequest,
    ) -> anyhow::Result<RescheduleNudgeResponse> {
        let nudge = self
            .nudges
            .get(request.nudge_id)
            .await?
            .filter(|nudge| nudge.account_id == request.account_id)
            .ok_or_else(|| DomainError::NotFound(format!("nudge {}", request.nudge_id)))?;

        if !nudge.status.is_terminal() {
            if !self
                .nudges
                .reschedule(nudge.id, request.scheduled_at)
                .await?
            {
                return Err(DomainError::StateConflict(format!(
                    "nudge {} changed state during reschedule",
                    nudge.id
                ))
                .into());
            }
            return Ok(RescheduleNudgeResponse {
                nudge_id: nudge.id,
                recreated: false,
            });
        }

        // Terminal nudges never re-enter the pipeline. A fresh pending
        // nudge carries the same draft forward instead.
        self.nudges
            .cancel_by_status(nudge.conversation_id, &NudgeStatus::ACTIVE)
            .await?;

        let mut fresh = Nudge::new(
            nudge.account_id,
            nudge.conversation_id,
            nudge.contact_id,
            nudge.channel,
            nudge.draft_content.clone(),
            request.scheduled_at,
        );
        fresh.recurrence_hours = nudge.recurrence_hours;
        fresh.max_escalations = nudge.max_escalations;
        self.nudges.insert(&fresh).await?;

        Ok(RescheduleNudgeResponse {
            nudge_id: fresh.id,
            recreated: true,
        })
    }
}
