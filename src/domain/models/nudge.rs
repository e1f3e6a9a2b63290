use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::channel::Channel;

pub const DEFAULT_NUDGE_MAX_ESCALATIONS: i32 = 2;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NudgeStatus {
    Pending,
    Approved,
    Ready,
    Sent,
    Failed,
    Cancelled,
}

impl NudgeStatus {
    /// Statuses a newer nudge for the same conversation supersedes.
    pub const ACTIVE: [NudgeStatus; 3] =
        [NudgeStatus::Pending, NudgeStatus::Approved, NudgeStatus::Ready];

    /// Statuses the due query picks up; also the set cancelled when a
    /// conversation closes.
    pub const DISPATCHABLE: [NudgeStatus; 2] = [NudgeStatus::Pending, NudgeStatus::Approved];

    pub fn as_str(&self) -> &'static str {
        match self {
            NudgeStatus::Pending => "pending",
            NudgeStatus::Approved => "approved",
            NudgeStatus::Ready => "ready",
            NudgeStatus::Sent => "sent",
            NudgeStatus::Failed => "failed",
            NudgeStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(NudgeStatus::Pending),
            "approved" => Some(NudgeStatus::Approved),
            "ready" => Some(NudgeStatus::Ready),
            "sent" => Some(NudgeStatus::Sent),
            "failed" => Some(NudgeStatus::Failed),
            "cancelled" => Some(NudgeStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            NudgeStatus::Sent | NudgeStatus::Failed | NudgeStatus::Cancelled
        )
    }

    pub fn can_transition_to(&self, to: NudgeStatus) -> bool {
        use NudgeStatus::*;
        match (self, to) {
            (Pending, Approved | Ready | Sent | Failed | Cancelled) => true,
            (Approved, Sent | Failed | Cancelled) => true,
            (Ready, Approved | Cancelled) => true,
            (Sent, Failed) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nudge {
    pub id: Uuid,
    pub account_id: Uuid,
    pub conversation_id: Uuid,
    pub contact_id: Uuid,
    pub status: NudgeStatus,
    pub channel: Channel,
    pub draft_content: String,
    pub approved_content: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub recurrence_hours: Option<i64>,
    pub max_escalations: i32,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Nudge {
    pub fn new(
        account_id: Uuid,
        conversation_id: Uuid,
        contact_id: Uuid,
        channel: Channel,
        draft_content: String,
        scheduled_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            account_id,
            conversation_id,
            contact_id,
            status: NudgeStatus::Pending,
            channel,
            draft_content,
            approved_content: None,
            scheduled_at,
            recurrence_hours: None,
            max_escalations: DEFAULT_NUDGE_MAX_ESCALATIONS,
            sent_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Approved copy wins over the draft; an unapproved, empty draft still
    /// produces something deliverable.
    pub fn effective_content(&self) -> &str {
        match self.approved_content.as_deref() {
            Some(content) if !content.is_empty() => content,
            _ if !self.draft_content.is_empty() => &self.draft_content,
            _ => "Hello!",
        }
    }

    /// Draft used when the caller supplies no content of their own.
    pub fn default_draft(subject: Option<&str>) -> String {
        let subject = subject.unwrap_or("Follow-up");
        format!(
            "Hi! Just following up on our conversation about \"{subject}\". \
             Let me know if you need anything!"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses_do_not_re_enter() {
        for terminal in [NudgeStatus::Sent, NudgeStatus::Failed, NudgeStatus::Cancelled] {
            assert!(!terminal.can_transition_to(NudgeStatus::Pending));
            assert!(!terminal.can_transition_to(NudgeStatus::Approved));
            assert!(!terminal.can_transition_to(NudgeStatus::Ready));
        }
        assert!(!NudgeStatus::Failed.can_transition_to(NudgeStatus::Sent));
        assert!(!NudgeStatus::Cancelled.can_transition_to(NudgeStatus::Sent));
    }

    #[test]
    fn sent_can_only_degrade_to_failed() {
        assert!(NudgeStatus::Sent.can_transition_to(NudgeStatus::Failed));
        assert!(!NudgeStatus::Sent.can_transition_to(NudgeStatus::Cancelled));
    }

    #[test]
    fn ready_waits_for_approval() {
        assert!(NudgeStatus::Ready.can_transition_to(NudgeStatus::Approved));
        assert!(NudgeStatus::Ready.can_transition_to(NudgeStatus::Cancelled));
        assert!(!NudgeStatus::Ready.can_transition_to(NudgeStatus::Sent));
    }

    #[test]
    fn content_precedence_prefers_approved_copy() {
        let mut nudge = sample_nudge("draft text".to_string());
        assert_eq!(nudge.effective_content(), "draft text");

        nudge.approved_content = Some("approved text".to_string());
        assert_eq!(nudge.effective_content(), "approved text");

        nudge.approved_content = Some(String::new());
        assert_eq!(nudge.effective_content(), "draft text");
    }

    #[test]
    fn blank_content_falls_back_to_greeting() {
        let nudge = sample_nudge(String::new());
        assert_eq!(nudge.effective_content(), "Hello!");
    }

    fn sample_nudge(draft: String) -> Nudge {
        Nudge::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            Channel::Whatsapp,
            draft,
            Utc::now(),
        )
    }
}
