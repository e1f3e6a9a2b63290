use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{
    errors::DomainError,
    models::NudgeStatus,
    repositories::NudgeRepository,
};

pub struct EditNudgeUseCase {
    nudges: Arc<dyn NudgeRepository>,
}

pub struct EditNudgeRequest {
    pub account_id: Uuid,
    pub nudge_id: Uuid,
    pub content: String,
}

impl EditNudgeUseCase {
    pub fn new(nudges: Arc<dyn NudgeRepository>) -> Self {
        Self { nudges }
    }

    pub async fn execute(&self, request: EditNudgeRequest) -> anyhow::Result<()> {
        if request.content.trim().is_empty() {
            return Err(DomainError::Validation("nudge content cannot be empty".to_string()).into());
        }

        let nudge = self
            .nudges
            .get(request.nudge_id)
            .await?
            .filter(|nudge| nudge.account_id == request.account_id)
            .ok_or_else(|| DomainError::NotFound(format!("nudge {}", request.nudge_id)))?;

        // Only unapproved drafts are editable; approved copy is frozen.
        if !matches!(nudge.status, NudgeStatus::Pending | NudgeStatus::Ready) {
            return Err(DomainError::StateConflict(format!(
                "cannot edit a {} nudge",
                nudge.status.as_str()
            ))
            .into());
        }

        if !self.nudges.update_draft(nudge.id, &request.content).await? {
            return Err(DomainError::StateConflict(format!(
                "nudge {} changed state during edit",
                nudge.id
            ))
            .into());
        }

        Ok(())
    }
}
