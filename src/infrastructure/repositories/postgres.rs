use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Pool, Postgres};
use uuid::Uuid;

use crate::domain::{
    models::{
        Channel, ChannelIntegration, Contact, Conversation, ConversationStatus, Direction, Message,
        MessageStatus, Nudge, NudgeStatus, TemplateConfig,
    },
    repositories::{
        ContactRepository, ConversationRepository, IntegrationRepository, MessageRepository,
        NudgeRepository, PreferencesRepository,
    },
};

pub type PgPool = Pool<Postgres>;

#[derive(Clone)]
pub struct PostgresContactRepository {
    pool: PgPool,
}

impl PostgresContactRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl ContactRepository for PostgresContactRepository {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Contact>> {
        let record = sqlx::query_as::<_, ContactRecord>(
            r#"SELECT id, account_id, phone_number, name, created_at FROM contacts WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record.map(Contact::from))
    }

    async fn find_by_phone(
        &self,
        account_id: Uuid,
        candidates: &[String],
    ) -> anyhow::Result<Option<Contact>> {
        let record = sqlx::query_as::<_, ContactRecord>(
            r#"
            SELECT id, account_id, phone_number, name, created_at
            FROM contacts
            WHERE account_id = $1
              AND phone_number = ANY($2)
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(account_id)
        .bind(candidates.to_vec())
        .fetch_optional(&self.pool)
        .await?;
        Ok(record.map(Contact::from))
    }

    async fn insert(&self, contact: &Contact) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO contacts (id, account_id, phone_number, name, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(contact.id)
        .bind(contact.account_id)
        .bind(&contact.phone_number)
        .bind(&contact.name)
        .bind(contact.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct PostgresConversationRepository {
    pool: PgPool,
}

impl PostgresConversationRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl ConversationRepository for PostgresConversationRepository {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Conversation>> {
        let record = sqlx::query_as::<_, ConversationRecord>(
            r#"
            SELECT id, account_id, contact_id, subject, status, channel, auto_approved,
                   last_message_at, last_reply_at, next_action_at, created_at, updated_at
            FROM conversations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        record.map(|record| record.try_into()).transpose()
    }

    async fn find_open_for_contact(
        &self,
        account_id: Uuid,
        contact_id: Uuid,
    ) -> anyhow::Result<Option<Conversation>> {
        let record = sqlx::query_as::<_, ConversationRecord>(
            r#"
            SELECT id, account_id, contact_id, subject, status, channel, auto_approved,
                   last_message_at, last_reply_at, next_action_at, created_at, updated_at
            FROM conversations
            WHERE account_id = $1
              AND contact_id = $2
              AND status <> ALL($3)
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(account_id)
        .bind(contact_id)
        .bind(status_aliases(ConversationStatus::Closed))
        .fetch_optional(&self.pool)
        .await?;
        record.map(|record| record.try_into()).transpose()
    }

    async fn insert(&self, conversation: &Conversation) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO conversations (
                id, account_id, contact_id, subject, status, channel, auto_approved,
                last_message_at, last_reply_at, next_action_at, created_at, updated_at
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12)
            "#,
        )
        .bind(conversation.id)
        .bind(conversation.account_id)
        .bind(conversation.contact_id)
        .bind(&conversation.subject)
        .bind(conversation.status.as_str())
        .bind(conversation.channel.as_str())
        .bind(conversation.auto_approved)
        .bind(conversation.last_message_at)
        .bind(conversation.last_reply_at)
        .bind(conversation.next_action_at)
        .bind(conversation.created_at)
        .bind(conversation.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, conversation: &Conversation) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE conversations
            SET subject = $2,
                status = $3,
                auto_approved = $4,
                last_message_at = $5,
                last_reply_at = $6,
                next_action_at = $7,
                updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(conversation.id)
        .bind(&conversation.subject)
        .bind(conversation.status.as_str())
        .bind(conversation.auto_approved)
        .bind(conversation.last_message_at)
        .bind(conversation.last_reply_at)
        .bind(conversation.next_action_at)
        .bind(conversation.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn advance_status(
        &self,
        id: Uuid,
        from: &[ConversationStatus],
        to: ConversationStatus,
    ) -> anyhow::Result<bool> {
        let from_values: Vec<String> = from
            .iter()
            .flat_map(|status| status_aliases(*status))
            .collect();
        let result = sqlx::query(
            r#"
            UPDATE conversations
            SET status = $2, updated_at = $3
            WHERE id = $1
              AND status = ANY($4)
            "#,
        )
        .bind(id)
        .bind(to.as_str())
        .bind(Utc::now())
        .bind(from_values)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Clone)]
pub struct PostgresNudgeRepository {
    pool: PgPool,
}

impl PostgresNudgeRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl NudgeRepository for PostgresNudgeRepository {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Nudge>> {
        let record = sqlx::query_as::<_, NudgeRecord>(
            r#"
            SELECT id, account_id, conversation_id, contact_id, status, channel,
                   draft_content, approved_content, scheduled_at, recurrence_hours,
                   max_escalations, sent_at, created_at, updated_at
            FROM nudges
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        record.map(|record| record.try_into()).transpose()
    }

    async fn insert(&self, nudge: &Nudge) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO nudges (
                id, account_id, conversation_id, contact_id, status, channel,
                draft_content, approved_content, scheduled_at, recurrence_hours,
                max_escalations, sent_at, created_at, updated_at
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14)
            "#,
        )
        .bind(nudge.id)
        .bind(nudge.account_id)
        .bind(nudge.conversation_id)
        .bind(nudge.contact_id)
        .bind(nudge.status.as_str())
        .bind(nudge.channel.as_str())
        .bind(&nudge.draft_content)
        .bind(&nudge.approved_content)
        .bind(nudge.scheduled_at)
        .bind(nudge.recurrence_hours)
        .bind(nudge.max_escalations)
        .bind(nudge.sent_at)
        .bind(nudge.created_at)
        .bind(nudge.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn due(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<Nudge>> {
        let rows = sqlx::query_as::<_, NudgeRecord>(
            r#"
            SELECT id, account_id, conversation_id, contact_id, status, channel,
                   draft_content, approved_content, scheduled_at, recurrence_hours,
                   max_escalations, sent_at, created_at, updated_at
            FROM nudges
            WHERE status = ANY($1)
              AND scheduled_at <= $2
            ORDER BY scheduled_at ASC
            "#,
        )
        .bind(nudge_statuses(&NudgeStatus::DISPATCHABLE))
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(|record| record.try_into()).collect()
    }

    async fn claim_for_send(&self, id: Uuid, at: DateTime<Utc>) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE nudges
            SET status = 'sent', sent_at = $2, updated_at = $2
            WHERE id = $1
              AND status = ANY($3)
            "#,
        )
        .bind(id)
        .bind(at)
        .bind(nudge_statuses(&NudgeStatus::DISPATCHABLE))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_ready(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE nudges
            SET status = 'ready', updated_at = $2
            WHERE id = $1
              AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_failed(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE nudges
            SET status = 'failed', updated_at = $2
            WHERE id = $1
              AND status IN ('pending', 'approved', 'sent')
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn approve(&self, id: Uuid, approved_content: &str) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE nudges
            SET status = 'approved', approved_content = $2, updated_at = $3
            WHERE id = $1
              AND status IN ('pending', 'ready')
            "#,
        )
        .bind(id)
        .bind(approved_content)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_draft(&self, id: Uuid, draft_content: &str) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE nudges
            SET draft_content = $2, updated_at = $3
            WHERE id = $1
              AND status IN ('pending', 'ready')
            "#,
        )
        .bind(id)
        .bind(draft_content)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn reschedule(&self, id: Uuid, scheduled_at: DateTime<Utc>) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE nudges
            SET scheduled_at = $2, updated_at = $3
            WHERE id = $1
              AND status IN ('pending', 'approved', 'ready')
            "#,
        )
        .bind(id)
        .bind(scheduled_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn cancel(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE nudges
            SET status = 'cancelled', updated_at = $2
            WHERE id = $1
              AND status IN ('pending', 'approved', 'ready')
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn cancel_by_status(
        &self,
        conversation_id: Uuid,
        statuses: &[NudgeStatus],
    ) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE nudges
            SET status = 'cancelled', updated_at = $2
            WHERE conversation_id = $1
              AND status = ANY($3)
            "#,
        )
        .bind(conversation_id)
        .bind(Utc::now())
        .bind(nudge_statuses(statuses))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn fail_sent_for_conversation(&self, conversation_id: Uuid) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE nudges
            SET status = 'failed', updated_at = $2
            WHERE conversation_id = $1
              AND status = 'sent'
            "#,
        )
        .bind(conversation_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[derive(Clone)]
pub struct PostgresMessageRepository {
    pool: PgPool,
}

impl PostgresMessageRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl MessageRepository for PostgresMessageRepository {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Message>> {
        let record = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, account_id, conversation_id, contact_id, direction, channel, content,
                   provider_message_id, status, retry_count, max_retries, error_code,
                   error_message, sent_at, delivered_at, read_at, failed_at, created_at
            FROM messages
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        record.map(|record| record.try_into()).transpose()
    }

    async fn insert(&self, message: &Message) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO messages (
                id, account_id, conversation_id, contact_id, direction, channel, content,
                provider_message_id, status, retry_count, max_retries, error_code,
                error_message, sent_at, delivered_at, read_at, failed_at, created_at
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18)
            "#,
        )
        .bind(message.id)
        .bind(message.account_id)
        .bind(message.conversation_id)
        .bind(message.contact_id)
        .bind(message.direction.as_str())
        .bind(message.channel.as_str())
        .bind(&message.content)
        .bind(&message.provider_message_id)
        .bind(message.status.as_str())
        .bind(message.retry_count)
        .bind(message.max_retries)
        .bind(&message.error_code)
        .bind(&message.error_message)
        .bind(message.sent_at)
        .bind(message.delivered_at)
        .bind(message.read_at)
        .bind(message.failed_at)
        .bind(message.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, message: &Message) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE messages
            SET status = $2,
                provider_message_id = $3,
                retry_count = $4,
                error_code = $5,
                error_message = $6,
                sent_at = $7,
                delivered_at = $8,
                read_at = $9,
                failed_at = $10
            WHERE id = $1
            "#,
        )
        .bind(message.id)
        .bind(message.status.as_str())
        .bind(&message.provider_message_id)
        .bind(message.retry_count)
        .bind(&message.error_code)
        .bind(&message.error_message)
        .bind(message.sent_at)
        .bind(message.delivered_at)
        .bind(message.read_at)
        .bind(message.failed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_provider_id(&self, provider_id: &str) -> anyhow::Result<Option<Message>> {
        let record = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, account_id, conversation_id, contact_id, direction, channel, content,
                   provider_message_id, status, retry_count, max_retries, error_code,
                   error_message, sent_at, delivered_at, read_at, failed_at, created_at
            FROM messages
            WHERE provider_message_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(provider_id)
        .fetch_optional(&self.pool)
        .await?;
        record.map(|record| record.try_into()).transpose()
    }

    async fn last_incoming(&self, conversation_id: Uuid) -> anyhow::Result<Option<Message>> {
        let record = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, account_id, conversation_id, contact_id, direction, channel, content,
                   provider_message_id, status, retry_count, max_retries, error_code,
                   error_message, sent_at, delivered_at, read_at, failed_at, created_at
            FROM messages
            WHERE conversation_id = $1
              AND direction = 'incoming'
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await?;
        record.map(|record| record.try_into()).transpose()
    }
}

#[derive(Clone)]
pub struct PostgresIntegrationRepository {
    pool: PgPool,
}

impl PostgresIntegrationRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl IntegrationRepository for PostgresIntegrationRepository {
    async fn find_by_account(&self, account_id: Uuid) -> anyhow::Result<Option<ChannelIntegration>> {
        let record = sqlx::query_as::<_, IntegrationRecord>(
            r#"
            SELECT id, account_id, access_token, phone_number_id, template_name,
                   template_parameter_name, template_language, fallback_template_name
            FROM integrations
            WHERE account_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record.map(ChannelIntegration::from))
    }

    async fn find_by_phone_number_id(
        &self,
        phone_number_id: &str,
    ) -> anyhow::Result<Option<ChannelIntegration>> {
        let record = sqlx::query_as::<_, IntegrationRecord>(
            r#"
            SELECT id, account_id, access_token, phone_number_id, template_name,
                   template_parameter_name, template_language, fallback_template_name
            FROM integrations
            WHERE phone_number_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(phone_number_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record.map(ChannelIntegration::from))
    }
}

#[derive(Clone)]
pub struct PostgresPreferencesRepository {
    pool: PgPool,
}

impl PostgresPreferencesRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl PreferencesRepository for PostgresPreferencesRepository {
    async fn auto_send_enabled(&self, account_id: Uuid) -> anyhow::Result<bool> {
        let enabled: Option<bool> = sqlx::query_scalar(
            r#"SELECT auto_send_enabled FROM account_preferences WHERE account_id = $1"#,
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(enabled.unwrap_or(false))
    }
}

#[derive(FromRow)]
struct ContactRecord {
    id: Uuid,
    account_id: Uuid,
    phone_number: String,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<ContactRecord> for Contact {
    fn from(value: ContactRecord) -> Self {
        Self {
            id: value.id,
            account_id: value.account_id,
            phone_number: value.phone_number,
            name: value.name,
            created_at: value.created_at,
        }
    }
}

#[derive(FromRow)]
struct ConversationRecord {
    id: Uuid,
    account_id: Uuid,
    contact_id: Uuid,
    subject: Option<String>,
    status: String,
    channel: String,
    auto_approved: bool,
    last_message_at: Option<DateTime<Utc>>,
    last_reply_at: Option<DateTime<Utc>>,
    next_action_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ConversationRecord> for Conversation {
    type Error = anyhow::Error;

    fn try_from(value: ConversationRecord) -> Result<Self, Self::Error> {
        let status = ConversationStatus::from_str(&value.status)
            .ok_or_else(|| anyhow::anyhow!("unknown conversation status {}", value.status))?;
        let channel = Channel::from_str(&value.channel)
            .ok_or_else(|| anyhow::anyhow!("unknown channel {}", value.channel))?;
        Ok(Self {
            id: value.id,
            account_id: value.account_id,
            contact_id: value.contact_id,
            subject: value.subject,
            status,
            channel,
            auto_approved: value.auto_approved,
            last_message_at: value.last_message_at,
            last_reply_at: value.last_reply_at,
            next_action_at: value.next_action_at,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[derive(FromRow)]
struct NudgeRecord {
    id: Uuid,
    account_id: Uuid,
    conversation_id: Uuid,
    contact_id: Uuid,
    status: String,
    channel: String,
    draft_content: String,
    approved_content: Option<String>,
    scheduled_at: DateTime<Utc>,
    recurrence_hours: Option<i64>,
    max_escalations: i32,
    sent_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<NudgeRecord> for Nudge {
    type Error = anyhow::Error;

    fn try_from(value: NudgeRecord) -> Result<Self, Self::Error> {
        let status = NudgeStatus::from_str(&value.status)
            .ok_or_else(|| anyhow::anyhow!("unknown nudge status {}", value.status))?;
        let channel = Channel::from_str(&value.channel)
            .ok_or_else(|| anyhow::anyhow!("unknown channel {}", value.channel))?;
        Ok(Self {
            id: value.id,
            account_id: value.account_id,
            conversation_id: value.conversation_id,
            contact_id: value.contact_id,
            status,
            channel,
            draft_content: value.draft_content,
            approved_content: value.approved_content,
            scheduled_at: value.scheduled_at,
            recurrence_hours: value.recurrence_hours,
            max_escalations: value.max_escalations,
            sent_at: value.sent_at,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[derive(FromRow)]
struct MessageRecord {
    id: Uuid,
    account_id: Uuid,
    conversation_id: Uuid,
    contact_id: Uuid,
    direction: String,
    channel: String,
    content: String,
    provider_message_id: Option<String>,
    status: String,
    retry_count: i32,
    max_retries: i32,
    error_code: Option<String>,
    error_message: Option<String>,
    sent_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    read_at: Option<DateTime<Utc>>,
    failed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageRecord> for Message {
    type Error = anyhow::Error;

    fn try_from(value: MessageRecord) -> Result<Self, Self::Error> {
        let direction = Direction::from_str(&value.direction)
            .ok_or_else(|| anyhow::anyhow!("unknown direction {}", value.direction))?;
        let channel = Channel::from_str(&value.channel)
            .ok_or_else(|| anyhow::anyhow!("unknown channel {}", value.channel))?;
        let status = MessageStatus::from_str(&value.status)
            .ok_or_else(|| anyhow::anyhow!("unknown message status {}", value.status))?;
        Ok(Self {
            id: value.id,
            account_id: value.account_id,
            conversation_id: value.conversation_id,
            contact_id: value.contact_id,
            direction,
            channel,
            content: value.content,
            provider_message_id: value.provider_message_id,
            status,
            retry_count: value.retry_count,
            max_retries: value.max_retries,
            error_code: value.error_code,
            error_message: value.error_message,
            sent_at: value.sent_at,
            delivered_at: value.delivered_at,
            read_at: value.read_at,
            failed_at: value.failed_at,
            created_at: value.created_at,
        })
    }
}

#[derive(FromRow)]
struct IntegrationRecord {
    id: Uuid,
    account_id: Uuid,
    access_token: String,
    phone_number_id: String,
    template_name: String,
    template_parameter_name: String,
    template_language: String,
    fallback_template_name: String,
}

impl From<IntegrationRecord> for ChannelIntegration {
    fn from(value: IntegrationRecord) -> Self {
        Self {
            id: value.id,
            account_id: value.account_id,
            access_token: value.access_token,
            phone_number_id: value.phone_number_id,
            template: TemplateConfig {
                name: value.template_name,
                parameter_name: value.template_parameter_name,
                language: value.template_language,
                fallback_name: value.fallback_template_name,
            },
        }
    }
}

/// Rows written by earlier releases still carry legacy status strings, so
/// every status filter matches the whole alias set.
fn status_aliases(status: ConversationStatus) -> Vec<String> {
    let aliases: &[&str] = match status {
        ConversationStatus::Pending => &["pending", "active", "approved", "snoozed"],
        ConversationStatus::Awaiting => &["awaiting"],
        ConversationStatus::NeedsResponse => &["needs_response"],
        ConversationStatus::Promised => &["promised"],
        ConversationStatus::Escalated => &["escalated"],
        ConversationStatus::Closed => &["closed", "resolved"],
    };
    aliases.iter().map(|value| value.to_string()).collect()
}

fn nudge_statuses(statuses: &[NudgeStatus]) -> Vec<String> {
    statuses
        .iter()
        .map(|status| status.as_str().to_string())
        .collect()
}
