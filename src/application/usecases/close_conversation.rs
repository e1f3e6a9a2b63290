use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::{
    errors::DomainError,
    models::{ConversationStatus, NudgeStatus},
    repositories::{ConversationRepository, NudgeRepository},
};

pub struct CloseConversationUseCase {
    conversations: Arc<dyn ConversationRepository>,
    nudges: Arc<dyn NudgeRepository>,
}

pub struct CloseConversationRequest {
    pub account_id: Uuid,
    pub conversation_id: Uuid,
}

pub struct CloseConversationResponse {
    pub cancelled_nudges: u64,
}

impl CloseConversationUseCase {
    pub fn new(
        conversations: Arc<dyn ConversationRepository>,
        nudges: Arc<dyn NudgeRepository>,
    ) -> Self {
        Self {
            conversations,
            nudges,
        }
    }

    pub async fn execute(
        &self,
        request: CloseConversationRequest,
    ) -> anyhow::Result<CloseConversationResponse> {
        let mut conversation = self
            .conversations
            .get(request.conversation_id)
            .await?
            .filter(|conversation| conversation.account_id == request.account_id)
            .ok_or_else(|| {
                DomainError::NotFound(format!("conversation {}", request.conversation_id))
            })?;

        if !conversation.status.is_closed() {
            conversation.status = ConversationStatus::Closed;
            conversation.next_action_at = None;
            conversation.updated_at = Utc::now();
            self.conversations.update(&conversation).await?;
        }

        // Closing always sweeps dispatchable nudges, even on a repeat call.
        let cancelled_nudges = self
            .nudges
            .cancel_by_status(conversation.id, &NudgeStatus::DISPATCHABLE)
            .await?;

        Ok(CloseConversationResponse { cancelled_nudges })
    }
}
