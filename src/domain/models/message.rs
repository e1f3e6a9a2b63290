use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::channel::Channel;

pub const DEFAULT_MESSAGE_MAX_RETRIES: i32 = 3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Incoming,
    Outgoing,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Incoming => "incoming",
            Direction::Outgoing => "outgoing",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "incoming" => Some(Direction::Incoming),
            "outgoing" => Some(Direction::Outgoing),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Pending,
    Sent,
    Delivered,
    Read,
    Failed,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Pending => "pending",
            MessageStatus::Sent => "sent",
            MessageStatus::Delivered => "delivered",
            MessageStatus::Read => "read",
            MessageStatus::Failed => "failed",
        }
    }

    /// Accepts canonical values plus the legacy `received` rows.
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(MessageStatus::Pending),
            "sent" => Some(MessageStatus::Sent),
            "delivered" | "received" => Some(MessageStatus::Delivered),
            "read" => Some(MessageStatus::Read),
            "failed" => Some(MessageStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub account_id: Uuid,
    pub conversation_id: Uuid,
    pub contact_id: Uuid,
    pub direction: Direction,
    pub channel: Channel,
    pub content: String,
    pub provider_message_id: Option<String>,
    pub status: MessageStatus,
    pub retry_count: i32,
    pub max_retries: i32,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn incoming(
        account_id: Uuid,
        conversation_id: Uuid,
        contact_id: Uuid,
        content: String,
        provider_message_id: String,
    ) -> Self {
        let mut message = Self::base(account_id, conversation_id, contact_id, content);
        message.direction = Direction::Incoming;
        message.provider_message_id = Some(provider_message_id);
        message.status = MessageStatus::Delivered;
        message
    }

    pub fn outgoing(
        account_id: Uuid,
        conversation_id: Uuid,
        contact_id: Uuid,
        content: String,
    ) -> Self {
        Self::base(account_id, conversation_id, contact_id, content)
    }

    fn base(account_id: Uuid, conversation_id: Uuid, contact_id: Uuid, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            conversation_id,
            contact_id,
            direction: Direction::Outgoing,
            channel: Channel::Whatsapp,
            content,
            provider_message_id: None,
            status: MessageStatus::Pending,
            retry_count: 0,
            max_retries: DEFAULT_MESSAGE_MAX_RETRIES,
            error_code: None,
            error_message: None,
            sent_at: None,
            delivered_at: None,
            read_at: None,
            failed_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }

    /// Applies a provider status receipt: the matching timestamp is stamped
    /// and failure details are kept alongside the status.
    pub fn apply_receipt(
        &mut self,
        status: MessageStatus,
        at: DateTime<Utc>,
        error: Option<(String, String)>,
    ) {
        self.status = status;
        match status {
            MessageStatus::Sent => self.sent_at = Some(at),
            MessageStatus::Delivered => self.delivered_at = Some(at),
            MessageStatus::Read => self.read_at = Some(at),
            MessageStatus::Failed => {
                self.failed_at = Some(at);
                if let Some((code, message)) = error {
                    self.error_code = Some(code);
                    self.error_message = Some(message);
                }
            }
            MessageStatus::Pending => {}
        }
    }

    /// Records a successful (re)send: the same row moves back to sent and
    /// every failure artifact is cleared.
    pub fn record_send_success(&mut self, provider_message_id: String, at: DateTime<Utc>) {
        self.status = MessageStatus::Sent;
        self.provider_message_id = Some(provider_message_id);
        self.sent_at = Some(at);
        self.error_code = None;
        self.error_message = None;
        self.failed_at = None;
    }

    pub fn record_send_failure(&mut self, code: Option<String>, message: String, at: DateTime<Utc>) {
        self.status = MessageStatus::Failed;
        self.error_code = Some(code.unwrap_or_else(|| "unknown".to_string()));
        self.error_message = Some(message);
        self.failed_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_received_maps_to_delivered() {
        assert_eq!(
            MessageStatus::from_str("received"),
            Some(MessageStatus::Delivered)
        );
    }

    #[test]
    fn receipt_stamps_matching_timestamp() {
        let mut message = outgoing_message();
        let at = Utc::now();

        message.apply_receipt(MessageStatus::Read, at, None);
        assert_eq!(message.status, MessageStatus::Read);
        assert_eq!(message.read_at, Some(at));
        assert_eq!(message.delivered_at, None);
    }

    #[test]
    fn failed_receipt_keeps_error_details() {
        let mut message = outgoing_message();
        let at = Utc::now();

        message.apply_receipt(
            MessageStatus::Failed,
            at,
            Some(("131026".to_string(), "Message undeliverable".to_string())),
        );
        assert_eq!(message.status, MessageStatus::Failed);
        assert_eq!(message.failed_at, Some(at));
        assert_eq!(message.error_code.as_deref(), Some("131026"));
        assert_eq!(message.error_message.as_deref(), Some("Message undeliverable"));
    }

    #[test]
    fn send_success_clears_failure_artifacts() {
        let mut message = outgoing_message();
        message.record_send_failure(Some("500".to_string()), "boom".to_string(), Utc::now());
        assert!(message.failed_at.is_some());

        message.record_send_success("wamid.NEW".to_string(), Utc::now());
        assert_eq!(message.status, MessageStatus::Sent);
        assert_eq!(message.provider_message_id.as_deref(), Some("wamid.NEW"));
        assert_eq!(message.error_code, None);
        assert_eq!(message.error_message, None);
        assert_eq!(message.failed_at, None);
    }

    #[test]
    fn retry_budget_is_strict() {
        let mut message = outgoing_message();
        message.retry_count = 2;
        assert!(message.can_retry());
        message.retry_count = 3;
        assert!(!message.can_retry());
    }

    fn outgoing_message() -> Message {
        Message::outgoing(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            "hello".to_string(),
        )
    }
}
