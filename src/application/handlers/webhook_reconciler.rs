use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    application::services::{
        decision::DecisionEngine,
        delivery::{DeliveryClient, OutboundPayload},
    },
    domain::{
        models::{
            sanitize_phone_number, Channel, ChannelIntegration, Contact, Conversation,
            ConversationStatus, Decision, DecisionAction, DecisionContext, Message, MessageStatus,
            Nudge, NudgeStatus, FALLBACK_WAIT_HOURS,
        },
        repositories::{
            ContactRepository, ConversationRepository, IntegrationRepository, MessageRepository,
            NudgeRepository,
        },
    },
};

/// Folds provider webhook events back into local state: delivery receipts
/// update message rows, inbound texts open or advance conversations and run
/// the decision engine.
pub struct WebhookReconciler {
    contacts: Arc<dyn ContactRepository>,
    conversations: Arc<dyn ConversationRepository>,
    nudges: Arc<dyn NudgeRepository>,
    messages: Arc<dyn MessageRepository>,
    integrations: Arc<dyn IntegrationRepository>,
    decisions: Arc<dyn DecisionEngine>,
    delivery: Arc<dyn DeliveryClient>,
}

impl WebhookReconciler {
    pub fn new(
        contacts: Arc<dyn ContactRepository>,
        conversations: Arc<dyn ConversationRepository>,
        nudges: Arc<dyn NudgeRepository>,
        messages: Arc<dyn MessageRepository>,
        integrations: Arc<dyn IntegrationRepository>,
        decisions: Arc<dyn DecisionEngine>,
        delivery: Arc<dyn DeliveryClient>,
    ) -> Self {
        Self {
            contacts,
            conversations,
            nudges,
            messages,
            integrations,
            decisions,
            delivery,
        }
    }

    /// Processes one webhook payload. Malformed or unknown content is
    /// logged and dropped; the provider never sees an error for it.
    pub async fn process_event(&self, payload: Value) {
        let event: ProviderEvent = match serde_json::from_value(payload) {
            Ok(event) => event,
            Err(err) => {
                warn!(error = %err, "unparseable webhook payload");
                return;
            }
        };

        for entry in event.entry {
            for change in entry.changes {
                let value = change.value;
                let phone_number_id = value
                    .metadata
                    .and_then(|metadata| metadata.phone_number_id);

                for receipt in value.statuses {
                    self.apply_receipt(receipt).await;
                }
                for inbound in value.messages {
                    self.apply_inbound(inbound, phone_number_id.as_deref())
                        .await;
                }
            }
        }
    }

    async fn apply_receipt(&self, receipt: StatusReceipt) {
        let Some(status) = MessageStatus::from_str(&receipt.status) else {
            warn!(status = %receipt.status, "unknown receipt status");
            return;
        };

        let mut message = match self.messages.find_by_provider_id(&receipt.id).await {
            Ok(Some(message)) => message,
            Ok(None) => {
                debug!(provider_message_id = %receipt.id, "receipt for unknown message");
                return;
            }
            Err(err) => {
                warn!(provider_message_id = %receipt.id, error = %err, "receipt lookup failed");
                return;
            }
        };

        let error = receipt.errors.into_iter().next().map(|detail| {
            (
                detail
                    .code
                    .map(|code| code.to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
                detail
                    .title
                    .or(detail.message)
                    .unwrap_or_else(|| "Unknown error".to_string()),
            )
        });

        message.apply_receipt(status, Utc::now(), error);
        if let Err(err) = self.messages.update(&message).await {
            warn!(message_id = %message.id, error = %err, "receipt update failed");
            return;
        }
        info!(
            provider_message_id = %receipt.id,
            status = status.as_str(),
            "receipt applied"
        );

        match status {
            MessageStatus::Failed => {
                // A hard bounce invalidates any nudge we believed delivered.
                match self
                    .nudges
                    .fail_sent_for_conversation(message.conversation_id)
                    .await
                {
                    Ok(count) if count > 0 => {
                        info!(
                            conversation_id = %message.conversation_id,
                            count,
                            "sent nudges marked failed"
                        );
                    }
                    Ok(_) => {}
                    Err(err) => {
                        warn!(
                            conversation_id = %message.conversation_id,
                            error = %err,
                            "nudge failure cascade failed"
                        );
                    }
                }
            }
            MessageStatus::Delivered => {
                if let Err(err) = self
                    .conversations
                    .advance_status(
                        message.conversation_id,
                        &[ConversationStatus::Pending],
                        ConversationStatus::Awaiting,
                    )
                    .await
                {
                    warn!(
                        conversation_id = %message.conversation_id,
                        error = %err,
                        "conversation advance failed"
                    );
                }
            }
            _ => {}
        }
    }

    async fn apply_inbound(&self, inbound: InboundMessage, phone_number_id: Option<&str>) {
        let Some(text) = inbound.text_content() else {
            debug!(kind = %inbound.kind, "inbound without text content skipped");
            return;
        };

        let Some(phone_number_id) = phone_number_id else {
            warn!("inbound change without phone_number_id metadata");
            return;
        };

        let integration = match self
            .integrations
            .find_by_phone_number_id(phone_number_id)
            .await
        {
            Ok(Some(integration)) => integration,
            Ok(None) => {
                warn!(phone_number_id = %phone_number_id, "no account bound to phone_number_id");
                return;
            }
            Err(err) => {
                warn!(phone_number_id = %phone_number_id, error = %err, "integration lookup failed");
                return;
            }
        };

        let Some(contact) = self
            .resolve_contact(integration.account_id, &inbound.from)
            .await
        else {
            return;
        };
        let Some(mut conversation) = self
            .resolve_conversation(integration.account_id, contact.id)
            .await
        else {
            return;
        };

        let message = Message::incoming(
            integration.account_id,
            conversation.id,
            contact.id,
            text.clone(),
            inbound.id.clone(),
        );
        if let Err(err) = self.messages.insert(&message).await {
            warn!(error = %err, "incoming message insert failed");
            return;
        }

        let now = Utc::now();
        conversation.record_inbound(now);
        if let Err(err) = self.conversations.update(&conversation).await {
            warn!(conversation_id = %conversation.id, error = %err, "conversation update failed");
            return;
        }

        info!(
            conversation_id = %conversation.id,
            from = %contact.phone_number,
            "inbound message stored"
        );

        self.apply_decision(&conversation, &contact, &integration, text)
            .await;
    }

    async fn apply_decision(
        &self,
        conversation: &Conversation,
        contact: &Contact,
        integration: &ChannelIntegration,
        text: String,
    ) {
        let context = DecisionContext {
            account_id: conversation.account_id,
            conversation_id: conversation.id,
            contact_id: contact.id,
            current_status: conversation.status,
            message_text: text,
        };

        let decision = match self.decisions.decide(&context).await {
            Ok(decision) => decision,
            Err(err) => {
                warn!(
                    conversation_id = %conversation.id,
                    error = %err,
                    "decision engine failed, using fallback"
                );
                Decision::fallback()
            }
        };

        info!(
            conversation_id = %conversation.id,
            action = decision.action.as_str(),
            status = decision.status.as_str(),
            confidence = decision.confidence,
            "decision applied"
        );

        let now = Utc::now();
        let mut updated = conversation.clone();
        updated.status = decision.status;
        updated.next_action_at = decision.wait_hours.map(|hours| wait_until(now, hours));
        updated.updated_at = now;
        if let Err(err) = self.conversations.update(&updated).await {
            warn!(conversation_id = %conversation.id, error = %err, "decision status update failed");
        }

        match decision.action {
            DecisionAction::Close => {
                match self
                    .nudges
                    .cancel_by_status(conversation.id, &NudgeStatus::DISPATCHABLE)
                    .await
                {
                    Ok(count) if count > 0 => {
                        info!(conversation_id = %conversation.id, count, "nudges cancelled on close");
                    }
                    Ok(_) => {}
                    Err(err) => {
                        warn!(
                            conversation_id = %conversation.id,
                            error = %err,
                            "nudge cancel cascade failed"
                        );
                    }
                }
            }
            DecisionAction::Reschedule => {
                self.schedule_followup(&updated, contact, &decision, now)
                    .await;
            }
            _ => {}
        }

        self.send_reply(contact, integration, &decision).await;
    }

    async fn schedule_followup(
        &self,
        conversation: &Conversation,
        contact: &Contact,
        decision: &Decision,
        now: DateTime<Utc>,
    ) {
        match self
            .nudges
            .cancel_by_status(conversation.id, &NudgeStatus::ACTIVE)
            .await
        {
            Ok(count) if count > 0 => {
                debug!(conversation_id = %conversation.id, count, "active nudges superseded");
            }
            Ok(_) => {}
            Err(err) => {
                warn!(conversation_id = %conversation.id, error = %err, "nudge supersede failed");
                return;
            }
        }

        let hours = decision.wait_hours.unwrap_or(FALLBACK_WAIT_HOURS);
        let draft = decision
            .draft_text
            .clone()
            .filter(|draft| !draft.trim().is_empty())
            .unwrap_or_else(|| Nudge::default_draft(conversation.subject.as_deref()));

        let nudge = Nudge::new(
            conversation.account_id,
            conversation.id,
            contact.id,
            conversation.channel,
            draft,
            wait_until(now, hours),
        );
        match self.nudges.insert(&nudge).await {
            Ok(()) => {
                info!(
                    conversation_id = %conversation.id,
                    nudge_id = %nudge.id,
                    wait_hours = hours,
                    "follow-up nudge scheduled"
                );
            }
            Err(err) => {
                warn!(conversation_id = %conversation.id, error = %err, "follow-up insert failed");
            }
        }
    }

    async fn send_reply(
        &self,
        contact: &Contact,
        integration: &ChannelIntegration,
        decision: &Decision,
    ) {
        let payload = OutboundPayload::Text {
            body: decision.reply_text(),
        };
        match self
            .delivery
            .send(&integration.credentials(), &contact.phone_number, &payload)
            .await
        {
            Ok(result) => {
                info!(
                    provider_message_id = %result.message_id,
                    to = %contact.phone_number,
                    "reply sent"
                );
            }
            Err(err) => {
                warn!(to = %contact.phone_number, error = %err, "reply send failed");
            }
        }
    }

    async fn resolve_contact(&self, account_id: Uuid, raw_from: &str) -> Option<Contact> {
        let safe = sanitize_phone_number(raw_from);
        if safe.is_empty() {
            warn!(from = %raw_from, "inbound sender address unusable");
            return None;
        }
        let normalized = if safe.starts_with('+') {
            safe.clone()
        } else {
            format!("+{safe}")
        };

        match self
            .contacts
            .find_by_phone(account_id, &[normalized.clone(), safe.clone()])
            .await
        {
            Ok(Some(contact)) => Some(contact),
            Ok(None) => {
                let contact = Contact::new(account_id, normalized, safe);
                match self.contacts.insert(&contact).await {
                    Ok(()) => {
                        info!(contact_id = %contact.id, "contact created from inbound");
                        Some(contact)
                    }
                    Err(err) => {
                        warn!(error = %err, "contact insert failed");
                        None
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "contact lookup failed");
                None
            }
        }
    }

    async fn resolve_conversation(
        &self,
        account_id: Uuid,
        contact_id: Uuid,
    ) -> Option<Conversation> {
        match self
            .conversations
            .find_open_for_contact(account_id, contact_id)
            .await
        {
            Ok(Some(conversation)) => Some(conversation),
            Ok(None) => {
                let conversation = Conversation::new(
                    account_id,
                    contact_id,
                    Channel::Whatsapp,
                    Some("WhatsApp Conversation".to_string()),
                );
                match self.conversations.insert(&conversation).await {
                    Ok(()) => Some(conversation),
                    Err(err) => {
                        warn!(error = %err, "conversation insert failed");
                        None
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "conversation lookup failed");
                None
            }
        }
    }
}

/// `now + hours` without the panic paths. The decision service is not
/// trusted to keep wait values in range, so out-of-range arithmetic
/// degrades to the fallback delay.
fn wait_until(now: DateTime<Utc>, hours: i64) -> DateTime<Utc> {
    Duration::try_hours(hours)
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or_else(|| now + Duration::hours(FALLBACK_WAIT_HOURS))
}

#[derive(Debug, Deserialize)]
struct ProviderEvent {
    #[serde(default)]
    entry: Vec<ProviderEntry>,
}

#[derive(Debug, Deserialize)]
struct ProviderEntry {
    #[serde(default)]
    changes: Vec<ProviderChange>,
}

#[derive(Debug, Deserialize)]
struct ProviderChange {
    #[serde(default)]
    value: ChangeValue,
}

#[derive(Debug, Default, Deserialize)]
struct ChangeValue {
    metadata: Option<ChangeMetadata>,
    #[serde(default)]
    statuses: Vec<StatusReceipt>,
    #[serde(default)]
    messages: Vec<InboundMessage>,
}

#[derive(Debug, Deserialize)]
struct ChangeMetadata {
    phone_number_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusReceipt {
    id: String,
    status: String,
    #[serde(default)]
    errors: Vec<ReceiptError>,
}

#[derive(Debug, Deserialize)]
struct ReceiptError {
    code: Option<i64>,
    title: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InboundMessage {
    #[serde(default)]
    from: String,
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default)]
    kind: String,
    text: Option<TextContent>,
    button: Option<ButtonContent>,
    interactive: Option<InteractiveContent>,
}

impl InboundMessage {
    fn text_content(&self) -> Option<String> {
        let text = match self.kind.as_str() {
            "text" => self.text.as_ref().map(|content| content.body.clone()),
            "button" => self.button.as_ref().map(|content| content.text.clone()),
            "interactive" => self.interactive.as_ref().and_then(|content| {
                content
                    .button_reply
                    .as_ref()
                    .map(|reply| reply.title.clone())
                    .or_else(|| content.list_reply.as_ref().map(|reply| reply.title.clone()))
            }),
            _ => None,
        };
        text.filter(|text| !text.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct TextContent {
    #[serde(default)]
    body: String,
}

#[derive(Debug, Deserialize)]
struct ButtonContent {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct InteractiveContent {
    button_reply: Option<ReplyContent>,
    list_reply: Option<ReplyContent>,
}

#[derive(Debug, Deserialize)]
struct ReplyContent {
    #[serde(default)]
    title: String,
}
