use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::{
    errors::DomainError,
    models::NudgeStatus,
    repositories::{ConversationRepository, NudgeRepository},
};

pub struct ApproveNudgeUseCase {
    nudges: Arc<dyn NudgeRepository>,
    conversations: Arc<dyn ConversationRepository>,
}

pub struct ApproveNudgeRequest {
    pub account_id: Uuid,
    pub nudge_id: Uuid,
}

#[derive(Debug)]
pub struct ApproveNudgeResponse {
    pub approved_content: String,
}

impl ApproveNudgeUseCase {
    pub fn new(
        nudges: Arc<dyn NudgeRepository>,
        conversations: Arc<dyn ConversationRepository>,
    ) -> Self {
        Self {
            nudges,
            conversations,
        }
    }

    pub async fn execute(&self, request: ApproveNudgeRequest) -> anyhow::Result<ApproveNudgeResponse> {
        let nudge = self
            .nudges
            .get(request.nudge_id)
            .await?
            .filter(|nudge| nudge.account_id == request.account_id)
            .ok_or_else(|| DomainError::NotFound(format!("nudge {}", request.nudge_id)))?;

        if !nudge.status.can_transition_to(NudgeStatus::Approved) {
            return Err(DomainError::StateConflict(format!(
                "cannot approve a {} nudge",
                nudge.status.as_str()
            ))
            .into());
        }

        // Approval freezes the draft as the deliverable copy.
        let content = nudge.draft_content.clone();
        if !self.nudges.approve(nudge.id, &content).await? {
            return Err(DomainError::StateConflict(format!(
                "nudge {} changed state during approval",
                nudge.id
            ))
            .into());
        }

        // One manual approval opts the whole thread into auto-approval.
        if let Some(mut conversation) = self.conversations.get(nudge.conversation_id).await? {
            if !conversation.auto_approved {
                conversation.auto_approved = true;
                conversation.updated_at = Utc::now();
                self.conversations.update(&conversation).await?;
            }
        }

        Ok(ApproveNudgeResponse {
            approved_content: content,
        })
    }
}
