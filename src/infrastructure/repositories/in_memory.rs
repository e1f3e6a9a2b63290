use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    models::{
        ChannelIntegration, Contact, Conversation, ConversationStatus, Direction, Message, Nudge,
        NudgeStatus,
    },
    repositories::{
        ContactRepository, ConversationRepository, IntegrationRepository, MessageRepository,
        NudgeRepository, PreferencesRepository,
    },
};

#[derive(Default)]
pub struct InMemoryContactRepository {
    contacts: Arc<RwLock<HashMap<Uuid, Contact>>>,
}

impl InMemoryContactRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContactRepository for InMemoryContactRepository {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Contact>> {
        let contacts = self.contacts.read().await;
        Ok(contacts.get(&id).cloned())
    }

    async fn find_by_phone(
        &self,
        account_id: Uuid,
        candidates: &[String],
    ) -> anyhow::Result<Option<Contact>> {
        let contacts = self.contacts.read().await;
        Ok(contacts
            .values()
            .filter(|contact| {
                contact.account_id == account_id
                    && candidates.contains(&contact.phone_number)
            })
            .min_by_key(|contact| contact.created_at)
            .cloned())
    }

    async fn insert(&self, contact: &Contact) -> anyhow::Result<()> {
        let mut contacts = self.contacts.write().await;
        contacts.insert(contact.id, contact.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryConversationRepository {
    conversations: Arc<RwLock<HashMap<Uuid, Conversation>>>,
}

impl InMemoryConversationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Conversation>> {
        let conversations = self.conversations.read().await;
        Ok(conversations.get(&id).cloned())
    }

    async fn find_open_for_contact(
        &self,
        account_id: Uuid,
        contact_id: Uuid,
    ) -> anyhow::Result<Option<Conversation>> {
        let conversations = self.conversations.read().await;
        Ok(conversations
            .values()
            .filter(|conversation| {
                conversation.account_id == account_id
                    && conversation.contact_id == contact_id
                    && !conversation.status.is_closed()
            })
            .max_by_key(|conversation| conversation.created_at)
            .cloned())
    }

    async fn insert(&self, conversation: &Conversation) -> anyhow::Result<()> {
        let mut conversations = self.conversations.write().await;
        conversations.insert(conversation.id, conversation.clone());
        Ok(())
    }

    async fn update(&self, conversation: &Conversation) -> anyhow::Result<()> {
        let mut conversations = self.conversations.write().await;
        conversations.insert(conversation.id, conversation.clone());
        Ok(())
    }

    async fn advance_status(
        &self,
        id: Uuid,
        from: &[ConversationStatus],
        to: ConversationStatus,
    ) -> anyhow::Result<bool> {
        let mut conversations = self.conversations.write().await;
        if let Some(conversation) = conversations.get_mut(&id) {
            if from.contains(&conversation.status) {
                conversation.status = to;
                conversation.updated_at = Utc::now();
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[derive(Default)]
pub struct InMemoryNudgeRepository {
    nudges: Arc<RwLock<HashMap<Uuid, Nudge>>>,
}

impl InMemoryNudgeRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NudgeRepository for InMemoryNudgeRepository {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Nudge>> {
        let nudges = self.nudges.read().await;
        Ok(nudges.get(&id).cloned())
    }

    async fn insert(&self, nudge: &Nudge) -> anyhow::Result<()> {
        let mut nudges = self.nudges.write().await;
        nudges.insert(nudge.id, nudge.clone());
        Ok(())
    }

    async fn due(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<Nudge>> {
        let nudges = self.nudges.read().await;
        let mut due: Vec<Nudge> = nudges
            .values()
            .filter(|nudge| {
                NudgeStatus::DISPATCHABLE.contains(&nudge.status) && nudge.scheduled_at <= now
            })
            .cloned()
            .collect();
        due.sort_by_key(|nudge| nudge.scheduled_at);
        Ok(due)
    }

    async fn claim_for_send(&self, id: Uuid, at: DateTime<Utc>) -> anyhow::Result<bool> {
        let mut nudges = self.nudges.write().await;
        if let Some(nudge) = nudges.get_mut(&id) {
            if NudgeStatus::DISPATCHABLE.contains(&nudge.status) {
                nudge.status = NudgeStatus::Sent;
                nudge.sent_at = Some(at);
                nudge.updated_at = at;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn mark_ready(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut nudges = self.nudges.write().await;
        if let Some(nudge) = nudges.get_mut(&id) {
            if nudge.status == NudgeStatus::Pending {
                nudge.status = NudgeStatus::Ready;
                nudge.updated_at = Utc::now();
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn mark_failed(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut nudges = self.nudges.write().await;
        if let Some(nudge) = nudges.get_mut(&id) {
            if matches!(
                nudge.status,
                NudgeStatus::Pending | NudgeStatus::Approved | NudgeStatus::Sent
            ) {
                nudge.status = NudgeStatus::Failed;
                nudge.updated_at = Utc::now();
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn approve(&self, id: Uuid, approved_content: &str) -> anyhow::Result<bool> {
        let mut nudges = self.nudges.write().await;
        if let Some(nudge) = nudges.get_mut(&id) {
            if matches!(nudge.status, NudgeStatus::Pending | NudgeStatus::Ready) {
                nudge.status = NudgeStatus::Approved;
                nudge.approved_content = Some(approved_content.to_string());
                nudge.updated_at = Utc::now();
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn update_draft(&self, id: Uuid, draft_content: &str) -> anyhow::Result<bool> {
        let mut nudges = self.nudges.write().await;
        if let Some(nudge) = nudges.get_mut(&id) {
            if matches!(nudge.status, NudgeStatus::Pending | NudgeStatus::Ready) {
                nudge.draft_content = draft_content.to_string();
                nudge.updated_at = Utc::now();
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn reschedule(&self, id: Uuid, scheduled_at: DateTime<Utc>) -> anyhow::Result<bool> {
        let mut nudges = self.nudges.write().await;
        if let Some(nudge) = nudges.get_mut(&id) {
            if !nudge.status.is_terminal() {
                nudge.scheduled_at = scheduled_at;
                nudge.updated_at = Utc::now();
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn cancel(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut nudges = self.nudges.write().await;
        if let Some(nudge) = nudges.get_mut(&id) {
            if !nudge.status.is_terminal() {
                nudge.status = NudgeStatus::Cancelled;
                nudge.updated_at = Utc::now();
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn cancel_by_status(
        &self,
        conversation_id: Uuid,
        statuses: &[NudgeStatus],
    ) -> anyhow::Result<u64> {
        let mut nudges = self.nudges.write().await;
        let mut cancelled = 0;
        for nudge in nudges.values_mut() {
            if nudge.conversation_id == conversation_id && statuses.contains(&nudge.status) {
                nudge.status = NudgeStatus::Cancelled;
                nudge.updated_at = Utc::now();
                cancelled += 1;
            }
        }
        Ok(cancelled)
    }

    async fn fail_sent_for_conversation(&self, conversation_id: Uuid) -> anyhow::Result<u64> {
        let mut nudges = self.nudges.write().await;
        let mut failed = 0;
        for nudge in nudges.values_mut() {
            if nudge.conversation_id == conversation_id && nudge.status == NudgeStatus::Sent {
                nudge.status = NudgeStatus::Failed;
                nudge.updated_at = Utc::now();
                failed += 1;
            }
        }
        Ok(failed)
    }
}

#[derive(Default)]
pub struct InMemoryMessageRepository {
    messages: Arc<RwLock<HashMap<Uuid, Message>>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<Message> {
        let messages = self.messages.read().await;
        let mut all: Vec<Message> = messages.values().cloned().collect();
        all.sort_by_key(|message| message.created_at);
        all
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Message>> {
        let messages = self.messages.read().await;
        Ok(messages.get(&id).cloned())
    }

    async fn insert(&self, message: &Message) -> anyhow::Result<()> {
        let mut messages = self.messages.write().await;
        messages.insert(message.id, message.clone());
        Ok(())
    }

    async fn update(&self, message: &Message) -> anyhow::Result<()> {
        let mut messages = self.messages.write().await;
        messages.insert(message.id, message.clone());
        Ok(())
    }

    async fn find_by_provider_id(&self, provider_id: &str) -> anyhow::Result<Option<Message>> {
        let messages = self.messages.read().await;
        Ok(messages
            .values()
            .filter(|message| message.provider_message_id.as_deref() == Some(provider_id))
            .max_by_key(|message| message.created_at)
            .cloned())
    }

    async fn last_incoming(&self, conversation_id: Uuid) -> anyhow::Result<Option<Message>> {
        let messages = self.messages.read().await;
        Ok(messages
            .values()
            .filter(|message| {
                message.conversation_id == conversation_id
                    && message.direction == Direction::Incoming
            })
            .max_by_key(|message| message.created_at)
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemoryIntegrationRepository {
    integrations: Arc<RwLock<HashMap<Uuid, ChannelIntegration>>>,
}

impl InMemoryIntegrationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, integration: ChannelIntegration) {
        let mut integrations = self.integrations.write().await;
        integrations.insert(integration.id, integration);
    }
}

#[async_trait]
impl IntegrationRepository for InMemoryIntegrationRepository {
    async fn find_by_account(&self, account_id: Uuid) -> anyhow::Result<Option<ChannelIntegration>> {
        let integrations = self.integrations.read().await;
        Ok(integrations
            .values()
            .find(|integration| integration.account_id == account_id)
            .cloned())
    }

    async fn find_by_phone_number_id(
        &self,
        phone_number_id: &str,
    ) -> anyhow::Result<Option<ChannelIntegration>> {
        let integrations = self.integrations.read().await;
        Ok(integrations
            .values()
            .find(|integration| integration.phone_number_id == phone_number_id)
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemoryPreferencesRepository {
    auto_send: Arc<RwLock<HashMap<Uuid, bool>>>,
}

impl InMemoryPreferencesRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_auto_send(&self, account_id: Uuid, enabled: bool) {
        let mut auto_send = self.auto_send.write().await;
        auto_send.insert(account_id, enabled);
    }
}

#[async_trait]
impl PreferencesRepository for InMemoryPreferencesRepository {
    async fn auto_send_enabled(&self, account_id: Uuid) -> anyhow::Result<bool> {
        let auto_send = self.auto_send.read().await;
        Ok(auto_send.get(&account_id).copied().unwrap_or(false))
    }
}
