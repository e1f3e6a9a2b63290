use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use uuid::Uuid;

use followup::application::handlers::webhook_reconciler::WebhookReconciler;
use followup::application::services::decision::DecisionEngine;
use followup::application::services::delivery::{DeliveryClient, OutboundPayload, SendResult};
use followup::domain::errors::DeliveryError;
use followup::domain::models::{
    Channel, ChannelIntegration, Contact, Conversation, ConversationStatus, Decision,
    DecisionAction, DecisionContext, Message, MessageStatus, Nudge, NudgeStatus, TemplateConfig,
    WhatsAppCredentials,
};
use followup::domain::repositories::{
    ContactRepository, ConversationRepository, MessageRepository, NudgeRepository,
};
use followup::infrastructure::repositories::in_memory::{
    InMemoryContactRepository, InMemoryConversationRepository, InMemoryIntegrationRepository,
    InMemoryMessageRepository, InMemoryNudgeRepository,
};

const PHONE_NUMBER_ID: &str = "106540352242922";

struct StubDelivery {
    calls: Mutex<Vec<OutboundPayload>>,
}

impl StubDelivery {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
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
        Ok(SendResult {
            message_id: "wamid.REPLY".to_string(),
            recipient_id: Some("15551234567".to_string()),
            status: "sent".to_string(),
        })
    }
}

struct StubDecision {
    outcomes: Mutex<VecDeque<anyhow::Result<Decision>>>,
    contexts: Mutex<Vec<DecisionContext>>,
}

impl StubDecision {
    fn new(outcomes: Vec<anyhow::Result<Decision>>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
            contexts: Mutex::new(Vec::new()),
        })
    }

    fn contexts(&self) -> Vec<DecisionContext> {
        self.contexts.lock().unwrap().clone()
    }
}

#[async_trait]
impl DecisionEngine for StubDecision {
    async fn decide(&self, context: &DecisionContext) -> anyhow::Result<Decision> {
        self.contexts.lock().unwrap().push(context.clone());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Decision::fallback()))
    }
}

struct Fixture {
    contacts: Arc<InMemoryContactRepository>,
    conversations: Arc<InMemoryConversationRepository>,
    nudges: Arc<InMemoryNudgeRepository>,
    messages: Arc<InMemoryMessageRepository>,
    integrations: Arc<InMemoryIntegrationRepository>,
    delivery: Arc<StubDelivery>,
    decisions: Arc<StubDecision>,
    reconciler: WebhookReconciler,
    account_id: Uuid,
}

impl Fixture {
    fn new(decisions: Vec<anyhow::Result<Decision>>) -> Self {
        let contacts = Arc::new(InMemoryContactRepository::new());
        let conversations = Arc::new(InMemoryConversationRepository::new());
        let nudges = Arc::new(InMemoryNudgeRepository::new());
        let messages = Arc::new(InMemoryMessageRepository::new());
        let integrations = Arc::new(InMemoryIntegrationRepository::new());
        let delivery = StubDelivery::new();
        let decisions = StubDecision::new(decisions);
        let reconciler = WebhookReconciler::new(
            contacts.clone(),
            conversations.clone(),
            nudges.clone(),
            messages.clone(),
            integrations.clone(),
            decisions.clone(),
            delivery.clone(),
        );
        Self {
            contacts,
            conversations,
            nudges,
            messages,
            integrations,
            delivery,
            decisions,
            reconciler,
            account_id: Uuid::new_v4(),
        }
    }

    async fn seed_integration(&self) {
        self.integrations
            .put(ChannelIntegration {
                id: Uuid::new_v4(),
                account_id: self.account_id,
                access_token: "token".to_string(),
                phone_number_id: PHONE_NUMBER_ID.to_string(),
                template: TemplateConfig::default(),
            })
            .await;
    }

    async fn seed_contact(&self) -> Contact {
        let contact = Contact::new(
            self.account_id,
            "+15551234567".to_string(),
            "Dana".to_string(),
        );
        self.contacts.insert(&contact).await.unwrap();
        contact
    }

    async fn seed_conversation(&self, contact_id: Uuid) -> Conversation {
        let conversation = Conversation::new(
            self.account_id,
            contact_id,
            Channel::Whatsapp,
            Some("Roof quote".to_string()),
        );
        self.conversations.insert(&conversation).await.unwrap();
        conversation
    }

    async fn seed_sent_message(&self, conversation: &Conversation, wamid: &str) -> Message {
        let mut message = Message::outgoing(
            self.account_id,
            conversation.id,
            conversation.contact_id,
            "follow-up".to_string(),
        );
        message.record_send_success(wamid.to_string(), Utc::now());
        self.messages.insert(&message).await.unwrap();
        message
    }

    async fn seed_nudge(&self, conversation: &Conversation, status: NudgeStatus) -> Nudge {
        let mut nudge = Nudge::new(
            self.account_id,
            conversation.id,
            conversation.contact_id,
            Channel::Whatsapp,
            "Checking in about your quote".to_string(),
            Utc::now() + Duration::hours(1),
        );
        nudge.status = status;
        self.nudges.insert(&nudge).await.unwrap();
        nudge
    }
}

fn receipt_event(wamid: &str, status: &str) -> Value {
    receipt_event_with_errors(wamid, status, json!([]))
}

fn receipt_event_with_errors(wamid: &str, status: &str, errors: Value) -> Value {
    json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "entry-1",
            "changes": [{
                "field": "messages",
                "value": {
                    "metadata": {
                        "display_phone_number": "15550001111",
                        "phone_number_id": PHONE_NUMBER_ID
                    },
                    "statuses": [{
                        "id": wamid,
                        "status": status,
                        "timestamp": "1700000000",
                        "recipient_id": "15551234567",
                        "errors": errors
                    }]
                }
            }]
        }]
    })
}

fn inbound_text_event(phone_number_id: &str, from: &str, wamid: &str, body: &str) -> Value {
    json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "entry-1",
            "changes": [{
                "field": "messages",
                "value": {
                    "metadata": {
                        "display_phone_number": "15550001111",
                        "phone_number_id": phone_number_id
                    },
                    "contacts": [{"profile": {"name": "Dana"}, "wa_id": from}],
                    "messages": [{
                        "from": from,
                        "id": wamid,
                        "timestamp": "1700000000",
                        "type": "text",
                        "text": {"body": body}
                    }]
                }
            }]
        }]
    })
}

fn decision(
    action: DecisionAction,
    wait_hours: Option<i64>,
    status: ConversationStatus,
    draft: Option<&str>,
) -> Decision {
    Decision {
        action,
        wait_hours,
        status,
        draft_text: draft.map(str::to_string),
        confidence: 0.9,
    }
}

#[tokio::test]
async fn delivered_receipt_advances_a_pending_conversation() {
    let fixture = Fixture::new(vec![]);
    let contact = fixture.seed_contact().await;
    let conversation = fixture.seed_conversation(contact.id).await;
    let message = fixture.seed_sent_message(&conversation, "wamid.OUT1").await;

    fixture
        .reconciler
        .process_event(receipt_event("wamid.OUT1", "delivered"))
        .await;

    let message = fixture.messages.get(message.id).await.unwrap().unwrap();
    assert_eq!(message.status, MessageStatus::Delivered);
    assert!(message.delivered_at.is_some());

    let conversation = fixture
        .conversations
        .get(conversation.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(conversation.status, ConversationStatus::Awaiting);
}

#[tokio::test]
async fn read_receipt_only_stamps_the_message() {
    let fixture = Fixture::new(vec![]);
    let contact = fixture.seed_contact().await;
    let mut conversation = fixture.seed_conversation(contact.id).await;
    conversation.status = ConversationStatus::Awaiting;
    fixture.conversations.update(&conversation).await.unwrap();
    let message = fixture.seed_sent_message(&conversation, "wamid.OUT2").await;

    fixture
        .reconciler
        .process_event(receipt_event("wamid.OUT2", "read"))
        .await;

    let message = fixture.messages.get(message.id).await.unwrap().unwrap();
    assert_eq!(message.status, MessageStatus::Read);
    assert!(message.read_at.is_some());

    let conversation = fixture
        .conversations
        .get(conversation.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(conversation.status, ConversationStatus::Awaiting);
}

#[tokio::test]
async fn failed_receipt_cascades_to_sent_nudges() {
    let fixture = Fixture::new(vec![]);
    let contact = fixture.seed_contact().await;
    let conversation = fixture.seed_conversation(contact.id).await;
    let message = fixture.seed_sent_message(&conversation, "wamid.OUT3").await;
    let sent_nudge = fixture.seed_nudge(&conversation, NudgeStatus::Sent).await;
    let pending_nudge = fixture
        .seed_nudge(&conversation, NudgeStatus::Pending)
        .await;

    fixture
        .reconciler
        .process_event(receipt_event_with_errors(
            "wamid.OUT3",
            "failed",
            json!([{"code": 131026, "title": "Message undeliverable"}]),
        ))
        .await;

    let message = fixture.messages.get(message.id).await.unwrap().unwrap();
    assert_eq!(message.status, MessageStatus::Failed);
    assert_eq!(message.error_code.as_deref(), Some("131026"));
    assert_eq!(message.error_message.as_deref(), Some("Message undeliverable"));

    let sent_nudge = fixture.nudges.get(sent_nudge.id).await.unwrap().unwrap();
    assert_eq!(sent_nudge.status, NudgeStatus::Failed);
    let pending_nudge = fixture
        .nudges
        .get(pending_nudge.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pending_nudge.status, NudgeStatus::Pending);
}

#[tokio::test]
async fn receipt_for_an_unknown_message_is_ignored() {
    let fixture = Fixture::new(vec![]);

    fixture
        .reconciler
        .process_event(receipt_event("wamid.GHOST", "delivered"))
        .await;

    assert!(fixture.messages.all().await.is_empty());
}

#[tokio::test]
async fn receipt_with_an_unknown_status_is_ignored() {
    let fixture = Fixture::new(vec![]);
    let contact = fixture.seed_contact().await;
    let conversation = fixture.seed_conversation(contact.id).await;
    let message = fixture.seed_sent_message(&conversation, "wamid.OUT4").await;

    fixture
        .reconciler
        .process_event(receipt_event("wamid.OUT4", "buffered"))
        .await;

    let message = fixture.messages.get(message.id).await.unwrap().unwrap();
    assert_eq!(message.status, MessageStatus::Sent);
    assert_eq!(message.delivered_at, None);
}

#[tokio::test]
async fn inbound_reply_stores_the_message_and_applies_the_decision() {
    let fixture = Fixture::new(vec![Ok(decision(
        DecisionAction::Wait,
        Some(4),
        ConversationStatus::Promised,
        Some("Got it!"),
    ))]);
    fixture.seed_integration().await;
    let contact = fixture.seed_contact().await;
    let conversation = fixture.seed_conversation(contact.id).await;

    fixture
        .reconciler
        .process_event(inbound_text_event(
            PHONE_NUMBER_ID,
            "15551234567",
            "wamid.IN1",
            "sounds good",
        ))
        .await;

    let message = fixture
        .messages
        .find_by_provider_id("wamid.IN1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(message.content, "sounds good");
    assert_eq!(message.conversation_id, conversation.id);

    let contexts = fixture.decisions.contexts();
    assert_eq!(contexts.len(), 1);
    assert_eq!(contexts[0].current_status, ConversationStatus::NeedsResponse);
    assert_eq!(contexts[0].message_text, "sounds good");

    let conversation = fixture
        .conversations
        .get(conversation.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(conversation.status, ConversationStatus::Promised);
    assert!(conversation.last_reply_at.is_some());
    let next_action = conversation.next_action_at.unwrap();
    assert!(next_action > Utc::now() + Duration::hours(3));
    assert!(next_action <= Utc::now() + Duration::hours(4));

    assert_eq!(
        fixture.delivery.calls(),
        vec![OutboundPayload::Text {
            body: "Got it!".to_string()
        }]
    );
}

#[tokio::test]
async fn inbound_from_an_unknown_number_creates_contact_and_thread() {
    let fixture = Fixture::new(vec![Err(anyhow::anyhow!("decision service down"))]);
    fixture.seed_integration().await;

    fixture
        .reconciler
        .process_event(inbound_text_event(
            PHONE_NUMBER_ID,
            "15557654321",
            "wamid.IN2",
            "hello",
        ))
        .await;

    let contact = fixture
        .contacts
        .find_by_phone(fixture.account_id, &["+15557654321".to_string()])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(contact.name, "15557654321");

    let conversation = fixture
        .conversations
        .find_open_for_contact(fixture.account_id, contact.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(conversation.subject.as_deref(), Some("WhatsApp Conversation"));
    assert_eq!(conversation.status, ConversationStatus::Pending);
    let next_action = conversation.next_action_at.unwrap();
    assert!(next_action > Utc::now() + Duration::hours(23));
    assert!(next_action <= Utc::now() + Duration::hours(24));

    let messages = fixture.messages.all().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "hello");

    let calls = fixture.delivery.calls();
    match &calls[..] {
        [OutboundPayload::Text { body }] => {
            assert!(body.starts_with("Thank you for your message"));
        }
        other => panic!("expected one text reply, got {other:?}"),
    }
}

#[tokio::test]
async fn absurd_wait_hours_still_reconcile_with_the_fallback_delay() {
    let fixture = Fixture::new(vec![Ok(decision(
        DecisionAction::Wait,
        Some(i64::MAX),
        ConversationStatus::Promised,
        None,
    ))]);
    fixture.seed_integration().await;
    let contact = fixture.seed_contact().await;
    let conversation = fixture.seed_conversation(contact.id).await;

    fixture
        .reconciler
        .process_event(inbound_text_event(
            PHONE_NUMBER_ID,
            "15551234567",
            "wamid.IN7",
            "give me forever",
        ))
        .await;

    let conversation = fixture
        .conversations
        .get(conversation.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(conversation.status, ConversationStatus::Promised);
    let next_action_at = conversation.next_action_at.unwrap();
    assert!(next_action_at > Utc::now() + Duration::hours(23));
    assert!(next_action_at < Utc::now() + Duration::hours(25));
}

#[tokio::test]
async fn close_decision_cancels_dispatchable_nudges() {
    let fixture = Fixture::new(vec![Ok(decision(
        DecisionAction::Close,
        None,
        ConversationStatus::Closed,
        None,
    ))]);
    fixture.seed_integration().await;
    let contact = fixture.seed_contact().await;
    let mut conversation = fixture.seed_conversation(contact.id).await;
    conversation.next_action_at = Some(Utc::now() + Duration::hours(6));
    fixture.conversations.update(&conversation).await.unwrap();

    let pending = fixture
        .seed_nudge(&conversation, NudgeStatus::Pending)
        .await;
    let approved = fixture
        .seed_nudge(&conversation, NudgeStatus::Approved)
        .await;
    let ready = fixture.seed_nudge(&conversation, NudgeStatus::Ready).await;

    fixture
        .reconciler
        .process_event(inbound_text_event(
            PHONE_NUMBER_ID,
            "15551234567",
            "wamid.IN3",
            "all done, thanks",
        ))
        .await;

    let conversation = fixture
        .conversations
        .get(conversation.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(conversation.status, ConversationStatus::Closed);
    assert_eq!(conversation.next_action_at, None);

    let pending = fixture.nudges.get(pending.id).await.unwrap().unwrap();
    assert_eq!(pending.status, NudgeStatus::Cancelled);
    let approved = fixture.nudges.get(approved.id).await.unwrap().unwrap();
    assert_eq!(approved.status, NudgeStatus::Cancelled);
    let ready = fixture.nudges.get(ready.id).await.unwrap().unwrap();
    assert_eq!(ready.status, NudgeStatus::Ready);

    let calls = fixture.delivery.calls();
    match &calls[..] {
        [OutboundPayload::Text { body }] => {
            assert!(body.starts_with("Thank you! Your request has been completed"));
        }
        other => panic!("expected one text reply, got {other:?}"),
    }
}

#[tokio::test]
async fn reschedule_decision_supersedes_and_books_a_followup() {
    let fixture = Fixture::new(vec![Ok(decision(
        DecisionAction::Reschedule,
        Some(48),
        ConversationStatus::Promised,
        Some("I'll circle back Friday"),
    ))]);
    fixture.seed_integration().await;
    let contact = fixture.seed_contact().await;
    let conversation = fixture.seed_conversation(contact.id).await;
    let ready = fixture.seed_nudge(&conversation, NudgeStatus::Ready).await;

    fixture
        .reconciler
        .process_event(inbound_text_event(
            PHONE_NUMBER_ID,
            "15551234567",
            "wamid.IN4",
            "ask me again on friday",
        ))
        .await;

    let ready = fixture.nudges.get(ready.id).await.unwrap().unwrap();
    assert_eq!(ready.status, NudgeStatus::Cancelled);

    let due = fixture
        .nudges
        .due(Utc::now() + Duration::hours(49))
        .await
        .unwrap();
    assert_eq!(due.len(), 1);
    let followup = &due[0];
    assert_eq!(followup.status, NudgeStatus::Pending);
    assert_eq!(followup.draft_content, "I'll circle back Friday");
    assert!(followup.scheduled_at > Utc::now() + Duration::hours(47));

    let conversation = fixture
        .conversations
        .get(conversation.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(conversation.status, ConversationStatus::Promised);

    assert_eq!(
        fixture.delivery.calls(),
        vec![OutboundPayload::Text {
            body: "I'll circle back Friday".to_string()
        }]
    );
}

#[tokio::test]
async fn reschedule_without_a_draft_uses_the_default_followup() {
    let fixture = Fixture::new(vec![Ok(decision(
        DecisionAction::Reschedule,
        Some(24),
        ConversationStatus::Promised,
        None,
    ))]);
    fixture.seed_integration().await;
    let contact = fixture.seed_contact().await;
    fixture.seed_conversation(contact.id).await;

    fixture
        .reconciler
        .process_event(inbound_text_event(
            PHONE_NUMBER_ID,
            "15551234567",
            "wamid.IN5",
            "maybe tomorrow",
        ))
        .await;

    let due = fixture
        .nudges
        .due(Utc::now() + Duration::hours(25))
        .await
        .unwrap();
    assert_eq!(due.len(), 1);
    assert!(due[0].draft_content.contains("Roof quote"));

    let calls = fixture.delivery.calls();
    match &calls[..] {
        [OutboundPayload::Text { body }] => {
            assert!(body.contains("24 hours"));
        }
        other => panic!("expected one text reply, got {other:?}"),
    }
}

#[tokio::test]
async fn inbound_without_text_is_skipped() {
    let fixture = Fixture::new(vec![]);
    fixture.seed_integration().await;

    fixture
        .reconciler
        .process_event(json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "entry-1",
                "changes": [{
                    "field": "messages",
                    "value": {
                        "metadata": {"phone_number_id": PHONE_NUMBER_ID},
                        "messages": [{
                            "from": "15551234567",
                            "id": "wamid.IMG",
                            "type": "image"
                        }]
                    }
                }]
            }]
        }))
        .await;

    assert!(fixture.messages.all().await.is_empty());
    assert!(fixture.decisions.contexts().is_empty());
    assert!(fixture.delivery.calls().is_empty());
}

#[tokio::test]
async fn inbound_for_an_unknown_phone_number_id_is_dropped() {
    let fixture = Fixture::new(vec![]);
    fixture.seed_integration().await;

    fixture
        .reconciler
        .process_event(inbound_text_event(
            "999000111222",
            "15551234567",
            "wamid.IN6",
            "hello?",
        ))
        .await;

    assert!(fixture.messages.all().await.is_empty());
    assert!(fixture.decisions.contexts().is_empty());
    assert!(fixture.delivery.calls().is_empty());
}

#[tokio::test]
async fn malformed_payloads_are_swallowed() {
    let fixture = Fixture::new(vec![]);

    fixture.reconciler.process_event(json!("not an event")).await;
    fixture.reconciler.process_event(json!({"entry": 42})).await;

    assert!(fixture.messages.all().await.is_empty());
}
