use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::channel::Channel;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    Pending,
    Awaiting,
    NeedsResponse,
    Promised,
    Escalated,
    Closed,
}

impl ConversationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStatus::Pending => "pending",
            ConversationStatus::Awaiting => "awaiting",
            ConversationStatus::NeedsResponse => "needs_response",
            ConversationStatus::Promised => "promised",
            ConversationStatus::Escalated => "escalated",
            ConversationStatus::Closed => "closed",
        }
    }

    /// Accepts canonical values plus the loose statuses older rows carry.
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "pending" | "active" | "approved" | "snoozed" => Some(ConversationStatus::Pending),
            "awaiting" => Some(ConversationStatus::Awaiting),
            "needs_response" => Some(ConversationStatus::NeedsResponse),
            "promised" => Some(ConversationStatus::Promised),
            "escalated" => Some(ConversationStatus::Escalated),
            "closed" | "resolved" => Some(ConversationStatus::Closed),
            _ => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, ConversationStatus::Closed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub account_id: Uuid,
    pub contact_id: Uuid,
    pub subject: Option<String>,
    pub status: ConversationStatus,
    pub channel: Channel,
    pub auto_approved: bool,
    pub last_message_at: Option<DateTime<Utc>>,
    pub last_reply_at: Option<DateTime<Utc>>,
    pub next_action_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(account_id: Uuid, contact_id: Uuid, channel: Channel, subject: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            account_id,
            contact_id,
            subject,
            status: ConversationStatus::Pending,
            channel,
            auto_approved: false,
            last_message_at: None,
            last_reply_at: None,
            next_action_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Stamps an inbound reply: both message clocks move and the thread now
    /// needs a response.
    pub fn record_inbound(&mut self, at: DateTime<Utc>) {
        self.last_message_at = Some(at);
        self.last_reply_at = Some(at);
        self.status = ConversationStatus::NeedsResponse;
        self.updated_at = at;
    }

    /// Stamps an outbound send: the thread is now waiting on the contact.
    pub fn record_outbound(&mut self, at: DateTime<Utc>) {
        self.last_message_at = Some(at);
        self.status = ConversationStatus::Awaiting;
        self.updated_at = at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_statuses_canonicalize() {
        assert_eq!(
            ConversationStatus::from_str("active"),
            Some(ConversationStatus::Pending)
        );
        assert_eq!(
            ConversationStatus::from_str("approved"),
            Some(ConversationStatus::Pending)
        );
        assert_eq!(
            ConversationStatus::from_str("snoozed"),
            Some(ConversationStatus::Pending)
        );
        assert_eq!(
            ConversationStatus::from_str("resolved"),
            Some(ConversationStatus::Closed)
        );
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert_eq!(ConversationStatus::from_str("archived"), None);
    }

    #[test]
    fn canonical_statuses_round_trip() {
        for status in [
            ConversationStatus::Pending,
            ConversationStatus::Awaiting,
            ConversationStatus::NeedsResponse,
            ConversationStatus::Promised,
            ConversationStatus::Escalated,
            ConversationStatus::Closed,
        ] {
            assert_eq!(ConversationStatus::from_str(status.as_str()), Some(status));
        }
    }
}
