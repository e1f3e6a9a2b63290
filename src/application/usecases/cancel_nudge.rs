use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{
    errors::DomainError,
    models::NudgeStatus,
    repositories::NudgeRepository,
};

pub struct CancelNudgeUseCase {
    nudges: Arc<dyn NudgeRepository>,
}

pub struct CancelNudgeRequest {
    pub account_id: Uuid,
    pub nudge_id: Uuid,
}

impl CancelNudgeUseCase {
    pub fn new(nudges: Arc<dyn NudgeRepository>) -> Self {
        Self { nudges }
    }

    pub async fn execute(&self, request: CancelNudgeRequest) -> anyhow::Result<()> {
        let nudge = self
            .nudges
            .get(request.nudge_id)
            .await?
            .filter(|nudge| nudge.account_id == request.account_id)
            .ok_or_else(|| DomainError::NotFound(format!("nudge {}", request.nudge_id)))?;

        if !nudge.status.can_transition_to(NudgeStatus::Cancelled) {
            return Err(DomainError::StateConflict(format!(
                "cannot cancel a {} nudge",
                nudge.status.as_str()
            ))
            .into());
        }

        if !self.nudges.cancel(nudge.id).await? {
            return Err(DomainError::StateConflict(format!(
                "nudge {} changed state during cancellation",
                nudge.id
            ))
            .into());
        }

        Ok(())
    }
}
