use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::models::{
    ChannelIntegration, Contact, Conversation, ConversationStatus, Message, Nudge, NudgeStatus,
};

#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Contact>>;
    async fn find_by_phone(
        &self,
        account_id: Uuid,
        candidates: &[String],
    ) -> anyhow::Result<Option<Contact>>;
    async fn insert(&self, contact: &Contact) -> anyhow::Result<()>;
}

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Conversation>>;
    async fn find_open_for_contact(
        &self,
        account_id: Uuid,
        contact_id: Uuid,
    ) -> anyhow::Result<Option<Conversation>>;
    async fn insert(&self, conversation: &Conversation) -> anyhow::Result<()>;
    async fn update(&self, conversation: &Conversation) -> anyhow::Result<()>;
    /// Conditional move; reports whether a row actually changed.
    async fn advance_status(
        &self,
        id: Uuid,
        from: &[ConversationStatus],
        to: ConversationStatus,
    ) -> anyhow::Result<bool>;
}

#[async_trait]
pub trait NudgeRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Nudge>>;
    async fn insert(&self, nudge: &Nudge) -> anyhow::Result<()>;
    async fn due(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<Nudge>>;
    /// Claims a due nudge for delivery by moving it to sent in one
    /// conditional update. A false return means another worker won.
    async fn claim_for_send(&self, id: Uuid, at: DateTime<Utc>) -> anyhow::Result<bool>;
    async fn mark_ready(&self, id: Uuid) -> anyhow::Result<bool>;
    async fn mark_failed(&self, id: Uuid) -> anyhow::Result<bool>;
    async fn approve(&self, id: Uuid, approved_content: &str) -> anyhow::Result<bool>;
    async fn update_draft(&self, id: Uuid, draft_content: &str) -> anyhow::Result<bool>;
    async fn reschedule(&self, id: Uuid, scheduled_at: DateTime<Utc>) -> anyhow::Result<bool>;
    async fn cancel(&self, id: Uuid) -> anyhow::Result<bool>;
    async fn cancel_by_status(
        &self,
        conversation_id: Uuid,
        statuses: &[NudgeStatus],
    ) -> anyhow::Result<u64>;
    async fn fail_sent_for_conversation(&self, conversation_id: Uuid) -> anyhow::Result<u64>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Message>>;
    async fn insert(&self, message: &Message) -> anyhow::Result<()>;
    async fn update(&self, message: &Message) -> anyhow::Result<()>;
    async fn find_by_provider_id(
        &self,
        provider_message_id: &str,
    ) -> anyhow::Result<Option<Message>>;
    async fn last_incoming(&self, conversation_id: Uuid) -> anyhow::Result<Option<Message>>;
}

#[async_trait]
pub trait IntegrationRepository: Send + Sync {
    async fn find_by_account(&self, account_id: Uuid)
    -> anyhow::Result<Option<ChannelIntegration>>;
    async fn find_by_phone_number_id(
        &self,
        phone_number_id: &str,
    ) -> anyhow::Result<Option<ChannelIntegration>>;
}

#[async_trait]
pub trait PreferencesRepository: Send + Sync {
    async fn auto_send_enabled(&self, account_id: Uuid) -> anyhow::Result<bool>;
}
