use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    application::services::outbound::NudgeSender,
    domain::{
        errors::{DeliveryError, DomainError},
        models::MessageStatus,
        repositories::{ContactRepository, IntegrationRepository, MessageRepository},
    },
};

pub struct RetryMessageUseCase {
    messages: Arc<dyn MessageRepository>,
    contacts: Arc<dyn ContactRepository>,
    integrations: Arc<dyn IntegrationRepository>,
    sender: Arc<NudgeSender>,
}

pub struct RetryMessageRequest {
    pub account_id: Uuid,
    pub message_id: Uuid,
}

#[derive(Debug)]
pub struct RetryMessageResponse {
    pub provider_message_id: String,
    pub retry_count: i32,
    pub can_retry: bool,
}

impl RetryMessageUseCase {
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        contacts: Arc<dyn ContactRepository>,
        integrations: Arc<dyn IntegrationRepository>,
        sender: Arc<NudgeSender>,
    ) -> Self {
        Self {
            messages,
            contacts,
            integrations,
            sender,
        }
    }

    pub async fn execute(&self, request: RetryMessageRequest) -> anyhow::Result<RetryMessageResponse> {
        let mut message = self
            .messages
            .get(request.message_id)
            .await?
            .filter(|message| message.account_id == request.account_id)
            .ok_or_else(|| DomainError::NotFound(format!("message {}", request.message_id)))?;

        if message.status != MessageStatus::Failed {
            return Err(DomainError::StateConflict(format!(
                "only failed messages can be retried, message is {}",
                message.status.as_str()
            ))
            .into());
        }

        // The cap is checked before any network traffic.
        if !message.can_retry() {
            return Err(DomainError::RetryExhausted {
                retry_count: message.retry_count,
                max_retries: message.max_retries,
            }
            .into());
        }

        let contact = self
            .contacts
            .get(message.contact_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("contact {}", message.contact_id)))?;

        let integration = self
            .integrations
            .find_by_account(request.account_id)
            .await?
            .ok_or_else(|| {
                DomainError::Validation("whatsapp integration not configured".to_string())
            })?;

        message.retry_count += 1;
        let now = Utc::now();
        let outcome = self
            .sender
            .send(
                &integration,
                &contact.phone_number,
                &message.content,
                message.conversation_id,
            )
            .await;

        match outcome {
            Ok(result) => {
                message.record_send_success(result.message_id.clone(), now);
                self.messages.update(&message).await?;
                Ok(RetryMessageResponse {
                    provider_message_id: result.message_id,
                    retry_count: message.retry_count,
                    can_retry: message.can_retry(),
                })
            }
            Err(err) => {
                let code = match &err {
                    DeliveryError::Api { status, .. } => Some(status.to_string()),
                    _ => None,
                };
                message.record_send_failure(code, err.to_string(), now);
                self.messages.update(&message).await?;
                Err(DomainError::Delivery(err).into())
            }
        }
    }
}
