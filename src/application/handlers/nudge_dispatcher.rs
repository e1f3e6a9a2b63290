use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    application::services::outbound::NudgeSender,
    domain::{
        errors::DeliveryError,
        models::{Message, Nudge, NudgeStatus},
        repositories::{
            ContactRepository, ConversationRepository, IntegrationRepository, MessageRepository,
            NudgeRepository, PreferencesRepository,
        },
    },
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub processed: u32,
    pub errors: u32,
}

/// Drives due nudges through delivery. Approved nudges go out directly;
/// pending ones go out only for accounts with auto-send enabled and are
/// otherwise parked as ready for manual approval.
pub struct NudgeDispatcher {
    nudges: Arc<dyn NudgeRepository>,
    conversations: Arc<dyn ConversationRepository>,
    contacts: Arc<dyn ContactRepository>,
    messages: Arc<dyn MessageRepository>,
    integrations: Arc<dyn IntegrationRepository>,
    preferences: Arc<dyn PreferencesRepository>,
    sender: Arc<NudgeSender>,
}

impl NudgeDispatcher {
    pub fn new(
        nudges: Arc<dyn NudgeRepository>,
        conversations: Arc<dyn ConversationRepository>,
        contacts: Arc<dyn ContactRepository>,
        messages: Arc<dyn MessageRepository>,
        integrations: Arc<dyn IntegrationRepository>,
        preferences: Arc<dyn PreferencesRepository>,
        sender: Arc<NudgeSender>,
    ) -> Self {
        Self {
            nudges,
            conversations,
            contacts,
            messages,
            integrations,
            preferences,
            sender,
        }
    }

    /// One pass over everything due right now. A failing nudge never
    /// stops the rest of the batch.
    pub async fn run_tick(&self) -> TickSummary {
        let due = match self.nudges.due(Utc::now()).await {
            Ok(due) => due,
            Err(err) => {
                error!(error = %err, "due nudge query failed");
                return TickSummary {
                    processed: 0,
                    errors: 1,
                };
            }
        };

        if !due.is_empty() {
            info!(count = due.len(), "processing due nudges");
        }

        let mut summary = TickSummary::default();
        for nudge in due {
            let nudge_id = nudge.id;
            match self.process_nudge(nudge).await {
                Ok(()) => summary.processed += 1,
                Err(err) => {
                    error!(nudge_id = %nudge_id, error = %err, "nudge processing failed");
                    summary.errors += 1;
                }
            }
        }
        summary
    }

    async fn process_nudge(&self, nudge: Nudge) -> anyhow::Result<()> {
        match nudge.status {
            NudgeStatus::Approved => self.dispatch(nudge).await,
            NudgeStatus::Pending => {
                if self.preferences.auto_send_enabled(nudge.account_id).await? {
                    self.dispatch(nudge).await
                } else {
                    // Parked until someone approves it in the dashboard.
                    if !self.nudges.mark_ready(nudge.id).await? {
                        debug!(nudge_id = %nudge.id, "nudge left pending by a concurrent update");
                    }
                    Ok(())
                }
            }
            other => {
                warn!(nudge_id = %nudge.id, status = other.as_str(), "unexpected status in due batch");
                Ok(())
            }
        }
    }

    async fn dispatch(&self, nudge: Nudge) -> anyhow::Result<()> {
        let contact = self
            .contacts
            .get(nudge.contact_id)
            .await?
            .filter(|contact| !contact.phone_number.is_empty());
        let Some(contact) = contact else {
            warn!(nudge_id = %nudge.id, "no deliverable address, failing nudge");
            self.nudges.mark_failed(nudge.id).await?;
            let mut message = Message::outgoing(
                nudge.account_id,
                nudge.conversation_id,
                nudge.contact_id,
                nudge.effective_content().to_string(),
            );
            message.channel = nudge.channel;
            message.record_send_failure(
                Some("no_address".to_string()),
                "contact has no deliverable phone number".to_string(),
                Utc::now(),
            );
            self.messages.insert(&message).await?;
            return Ok(());
        };

        let Some(integration) = self.integrations.find_by_account(nudge.account_id).await? else {
            warn!(nudge_id = %nudge.id, "no whatsapp integration configured, skipping");
            return Ok(());
        };

        let now = Utc::now();
        // Whoever wins the claim owns the send; losers walk away.
        if !self.nudges.claim_for_send(nudge.id, now).await? {
            debug!(nudge_id = %nudge.id, "claim lost, nudge already taken");
            return Ok(());
        }

        let content = nudge.effective_content().to_string();
        let outcome = self
            .sender
            .send(
                &integration,
                &contact.phone_number,
                &content,
                nudge.conversation_id,
            )
            .await;

        let mut message = Message::outgoing(
            nudge.account_id,
            nudge.conversation_id,
            nudge.contact_id,
            content,
        );
        message.channel = nudge.channel;

        match outcome {
            Ok(result) => {
                info!(
                    nudge_id = %nudge.id,
                    provider_message_id = %result.message_id,
                    "nudge sent"
                );
                message.record_send_success(result.message_id, now);
                self.messages.insert(&message).await?;
                self.record_conversation_outbound(nudge.conversation_id, now)
                    .await;
                Ok(())
            }
            Err(err) => {
                if !self.nudges.mark_failed(nudge.id).await? {
                    warn!(nudge_id = %nudge.id, "failed nudge already moved on");
                }
                let code = match &err {
                    DeliveryError::Api { status, .. } => Some(status.to_string()),
                    _ => None,
                };
                message.record_send_failure(code, err.to_string(), now);
                self.messages.insert(&message).await?;
                Err(err.into())
            }
        }
    }

    async fn record_conversation_outbound(&self, conversation_id: Uuid, at: DateTime<Utc>) {
        match self.conversations.get(conversation_id).await {
            Ok(Some(mut conversation)) => {
                conversation.record_outbound(at);
                if let Err(err) = self.conversations.update(&conversation).await {
                    warn!(
                        conversation_id = %conversation_id,
                        error = %err,
                        "conversation update failed after send"
                    );
                }
            }
            Ok(None) => {
                warn!(conversation_id = %conversation_id, "conversation missing after send");
            }
            Err(err) => {
                warn!(
                    conversation_id = %conversation_id,
                    error = %err,
                    "conversation lookup failed after send"
                );
            }
        }
    }
}
