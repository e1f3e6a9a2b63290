use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::{
    errors::DomainError,
    models::{Channel, Conversation, Nudge, NudgeStatus},
    repositories::{ContactRepository, ConversationRepository, NudgeRepository},
};

pub struct ScheduleNudgeUseCase {
    contacts: Arc<dyn ContactRepository>,
    conversations: Arc<dyn ConversationRepository>,
    nudges: Arc<dyn NudgeRepository>,
}

pub struct ScheduleNudgeRequest {
    pub account_id: Uuid,
    pub contact_id: Uuid,
    pub channel: Channel,
    pub subject: Option<String>,
    pub content: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub recurrence_hours: Option<i64>,
    pub max_escalations: Option<i32>,
}

#[derive(Debug)]
pub struct ScheduleNudgeResponse {
    pub nudge_id: Uuid,
    pub conversation_id: Uuid,
    pub superseded: u64,
}

impl ScheduleNudgeUseCase {
    pub fn new(
        contacts: Arc<dyn ContactRepository>,
        conversations: Arc<dyn ConversationRepository>,
        nudges: Arc<dyn NudgeRepository>,
    ) -> Self {
        Self {
            contacts,
            conversations,
            nudges,
        }
    }

    pub async fn execute(
        &self,
        request: ScheduleNudgeRequest,
    ) -> anyhow::Result<ScheduleNudgeResponse> {
        let contact = self
            .contacts
            .get(request.contact_id)
            .await?
            .filter(|contact| contact.account_id == request.account_id)
            .ok_or_else(|| DomainError::NotFound(format!("contact {}", request.contact_id)))?;

        let conversation = match self
            .conversations
            .find_open_for_contact(request.account_id, contact.id)
            .await?
        {
            Some(existing) => existing,
            None => {
                let subject = request
                    .subject
                    .clone()
                    .unwrap_or_else(|| "Follow-up".to_string());
                let mut conversation = Conversation::new(
                    request.account_id,
                    contact.id,
                    request.channel,
                    Some(subject),
                );
                conversation.last_message_at = Some(Utc::now());
                self.conversations.insert(&conversation).await?;
                conversation
            }
        };

        // The newest nudge owns the thread; whatever is still active gets
        // superseded before the insert.
        let superseded = self
            .nudges
            .cancel_by_status(conversation.id, &NudgeStatus::ACTIVE)
            .await?;

        let scheduled_at = request
            .scheduled_at
            .unwrap_or_else(|| Utc::now() + Duration::hours(24));
        let draft = match request.content.as_deref() {
            Some(content) if !content.is_empty() => content.to_string(),
            _ => Nudge::default_draft(conversation.subject.as_deref()),
        };

        let mut nudge = Nudge::new(
            request.account_id,
            conversation.id,
            contact.id,
            request.channel,
            draft,
            scheduled_at,
        );
        nudge.recurrence_hours = request.recurrence_hours;
        if let Some(max_escalations) = request.max_escalations {
            nudge.max_escalations = max_escalations;
        }
        self.nudges.insert(&nudge).await?;

        Ok(ScheduleNudgeResponse {
            nudge_id: nudge.id,
            conversation_id: conversation.id,
            superseded,
        })
    }
}
