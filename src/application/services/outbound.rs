use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::{
    application::services::delivery::{
        DeliveryClient, OutboundPayload, SendResult, TemplateParameter,
    },
    domain::{errors::DeliveryError, models::ChannelIntegration, repositories::MessageRepository},
};

const REPLY_WINDOW_HOURS: i64 = 24;
const DEFAULT_TEMPLATE_BODY: &str =
    "Hi! This is a follow-up message. Let me know if you have any questions.";

/// Picks the wire shape for an outbound follow-up: free text while the
/// contact's last inbound message is under 24 hours old, the account's
/// approved template otherwise.
pub struct NudgeSender {
    delivery: Arc<dyn DeliveryClient>,
    messages: Arc<dyn MessageRepository>,
}

impl NudgeSender {
    pub fn new(delivery: Arc<dyn DeliveryClient>, messages: Arc<dyn MessageRepository>) -> Self {
        Self { delivery, messages }
    }

    pub async fn send(
        &self,
        integration: &ChannelIntegration,
        phone: &str,
        content: &str,
        conversation_id: Uuid,
    ) -> Result<SendResult, DeliveryError> {
        let credentials = integration.credentials();

        if self.within_reply_window(conversation_id).await {
            let payload = OutboundPayload::Text {
                body: content.to_string(),
            };
            return self.delivery.send(&credentials, phone, &payload).await;
        }

        let template = &integration.template;
        let body = if content.trim().is_empty() {
            DEFAULT_TEMPLATE_BODY
        } else {
            content
        };
        let payload = OutboundPayload::Template {
            name: template.name.clone(),
            language: template.language.clone(),
            parameters: vec![TemplateParameter {
                parameter_name: template.parameter_name.clone(),
                text: body.to_string(),
            }],
        };

        match self.delivery.send(&credentials, phone, &payload).await {
            Ok(result) => Ok(result),
            Err(err) if err.is_template_unavailable() => {
                warn!(
                    template = %template.name,
                    fallback = %template.fallback_name,
                    error = %err,
                    "template rejected, retrying with fallback"
                );
                let fallback = OutboundPayload::Template {
                    name: template.fallback_name.clone(),
                    language: template.language.clone(),
                    parameters: Vec::new(),
                };
                self.delivery.send(&credentials, phone, &fallback).await
            }
            Err(err) => Err(err),
        }
    }

    async fn within_reply_window(&self, conversation_id: Uuid) -> bool {
        match self.messages.last_incoming(conversation_id).await {
            Ok(Some(message)) => {
                Utc::now() - message.created_at < Duration::hours(REPLY_WINDOW_HOURS)
            }
            Ok(None) => false,
            Err(err) => {
                warn!(%conversation_id, error = %err, "reply window check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::{
        domain::models::{ChannelIntegration, Message, TemplateConfig, WhatsAppCredentials},
        infrastructure::repositories::in_memory::InMemoryMessageRepository,
    };

    struct StubDelivery {
        calls: Mutex<Vec<OutboundPayload>>,
        outcomes: Mutex<VecDeque<Result<SendResult, DeliveryError>>>,
    }

    impl StubDelivery {
        fn new(outcomes: Vec<Result<SendResult, DeliveryError>>) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                outcomes: Mutex::new(outcomes.into()),
            })
        }

        fn calls(&self) -> Vec<OutboundPayload> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DeliveryClient for StubDelivery {
        async fn send(
            &self,
            _credentials: &WhatsAppCredentials,
            _to: &str,
            payload: &OutboundPayload,
        ) -> Result<SendResult, DeliveryError> {
            self.calls.lock().unwrap().push(payload.clone());
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(queued("wamid.TEST")))
        }
    }

    fn queued(id: &str) -> SendResult {
        SendResult {
            message_id: id.to_string(),
            recipient_id: Some("15551234567".to_string()),
            status: "queued".to_string(),
        }
    }

    fn integration() -> ChannelIntegration {
        ChannelIntegration {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            access_token: "token".to_string(),
            phone_number_id: "106540352242922".to_string(),
            template: TemplateConfig::default(),
        }
    }

    fn template_rejection() -> DeliveryError {
        DeliveryError::Api {
            status: 404,
            code: None,
            body: "template not found".to_string(),
        }
    }

    async fn seed_inbound(messages: &InMemoryMessageRepository, conversation_id: Uuid, age_hours: i64) {
        let mut message = Message::incoming(
            Uuid::new_v4(),
            conversation_id,
            Uuid::new_v4(),
            "hi there".to_string(),
            "wamid.INBOUND".to_string(),
        );
        message.created_at = Utc::now() - Duration::hours(age_hours);
        messages.insert(&message).await.unwrap();
    }

    #[tokio::test]
    async fn recent_inbound_selects_free_text() {
        let delivery = StubDelivery::new(vec![]);
        let messages = Arc::new(InMemoryMessageRepository::new());
        let conversation_id = Uuid::new_v4();
        seed_inbound(&messages, conversation_id, 1).await;

        let sender = NudgeSender::new(delivery.clone(), messages);
        sender
            .send(&integration(), "+15551234567", "quick check-in", conversation_id)
            .await
            .unwrap();

        assert_eq!(
            delivery.calls(),
            vec![OutboundPayload::Text {
                body: "quick check-in".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn stale_inbound_selects_template() {
        let delivery = StubDelivery::new(vec![]);
        let messages = Arc::new(InMemoryMessageRepository::new());
        let conversation_id = Uuid::new_v4();
        seed_inbound(&messages, conversation_id, 25).await;

        let sender = NudgeSender::new(delivery.clone(), messages);
        sender
            .send(&integration(), "+15551234567", "quick check-in", conversation_id)
            .await
            .unwrap();

        let calls = delivery.calls();
        match &calls[..] {
            [OutboundPayload::Template { name, parameters, .. }] => {
                assert_eq!(name, "ai_followup");
                assert_eq!(parameters.len(), 1);
                assert_eq!(parameters[0].parameter_name, "followup_message");
                assert_eq!(parameters[0].text, "quick check-in");
            }
            other => panic!("expected one template call, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn inbound_aged_exactly_24_hours_selects_template() {
        let delivery = StubDelivery::new(vec![]);
        let messages = Arc::new(InMemoryMessageRepository::new());
        let conversation_id = Uuid::new_v4();
        // The window is strictly less than 24 hours; the edge is outside.
        seed_inbound(&messages, conversation_id, 24).await;

        let sender = NudgeSender::new(delivery.clone(), messages);
        sender
            .send(&integration(), "+15551234567", "quick check-in", conversation_id)
            .await
            .unwrap();

        assert!(matches!(
            delivery.calls()[..],
            [OutboundPayload::Template { .. }]
        ));
    }

    #[tokio::test]
    async fn silent_conversation_selects_template() {
        let delivery = StubDelivery::new(vec![]);
        let messages = Arc::new(InMemoryMessageRepository::new());

        let sender = NudgeSender::new(delivery.clone(), messages);
        sender
            .send(&integration(), "+15551234567", "hello again", Uuid::new_v4())
            .await
            .unwrap();

        assert!(matches!(
            delivery.calls()[..],
            [OutboundPayload::Template { .. }]
        ));
    }

    #[tokio::test]
    async fn blank_content_uses_stock_template_body() {
        let delivery = StubDelivery::new(vec![]);
        let messages = Arc::new(InMemoryMessageRepository::new());

        let sender = NudgeSender::new(delivery.clone(), messages);
        sender
            .send(&integration(), "+15551234567", "   ", Uuid::new_v4())
            .await
            .unwrap();

        match &delivery.calls()[..] {
            [OutboundPayload::Template { parameters, .. }] => {
                assert_eq!(parameters[0].text, DEFAULT_TEMPLATE_BODY);
            }
            other => panic!("expected one template call, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_template_falls_back_once_without_parameters() {
        let delivery = StubDelivery::new(vec![Err(template_rejection()), Ok(queued("wamid.FB"))]);
        let messages = Arc::new(InMemoryMessageRepository::new());

        let sender = NudgeSender::new(delivery.clone(), messages);
        let result = sender
            .send(&integration(), "+15551234567", "check-in", Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(result.message_id, "wamid.FB");
        let calls = delivery.calls();
        assert_eq!(calls.len(), 2);
        match &calls[1] {
            OutboundPayload::Template { name, parameters, .. } => {
                assert_eq!(name, "hello_world");
                assert!(parameters.is_empty());
            }
            other => panic!("expected fallback template, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn provider_code_132001_triggers_fallback() {
        let rejection = DeliveryError::Api {
            status: 400,
            code: Some(132001),
            body: "template unavailable".to_string(),
        };
        let delivery = StubDelivery::new(vec![Err(rejection), Ok(queued("wamid.FB"))]);
        let messages = Arc::new(InMemoryMessageRepository::new());

        let sender = NudgeSender::new(delivery.clone(), messages);
        sender
            .send(&integration(), "+15551234567", "check-in", Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(delivery.calls().len(), 2);
    }

    #[tokio::test]
    async fn unrelated_api_error_propagates_without_fallback() {
        let failure = DeliveryError::Api {
            status: 500,
            code: Some(131000),
            body: "something went wrong".to_string(),
        };
        let delivery = StubDelivery::new(vec![Err(failure)]);
        let messages = Arc::new(InMemoryMessageRepository::new());

        let sender = NudgeSender::new(delivery.clone(), messages);
        let err = sender
            .send(&integration(), "+15551234567", "check-in", Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(err, DeliveryError::Api { status: 500, .. }));
        assert_eq!(delivery.calls().len(), 1);
    }

    #[tokio::test]
    async fn failing_fallback_propagates() {
        let delivery = StubDelivery::new(vec![
            Err(template_rejection()),
            Err(template_rejection()),
        ]);
        let messages = Arc::new(InMemoryMessageRepository::new());

        let sender = NudgeSender::new(delivery.clone(), messages);
        let err = sender
            .send(&integration(), "+15551234567", "check-in", Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(err.is_template_unavailable());
        assert_eq!(delivery.calls().len(), 2);
    }
}
