use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::conversation::ConversationStatus;

pub const FALLBACK_WAIT_HOURS: i64 = 24;
pub const FALLBACK_CONFIDENCE: f32 = 0.3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    Wait,
    Reschedule,
    Close,
    Escalate,
}

impl DecisionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionAction::Wait => "wait",
            DecisionAction::Reschedule => "reschedule",
            DecisionAction::Close => "close",
            DecisionAction::Escalate => "escalate",
        }
    }
}

/// Everything the decision component gets to see about an inbound reply.
#[derive(Debug, Clone)]
pub struct DecisionContext {
    pub account_id: Uuid,
    pub conversation_id: Uuid,
    pub contact_id: Uuid,
    pub current_status: ConversationStatus,
    pub message_text: String,
}

#[derive(Debug, Clone)]
pub struct Decision {
    pub action: DecisionAction,
    pub wait_hours: Option<i64>,
    pub status: ConversationStatus,
    pub draft_text: Option<String>,
    pub confidence: f32,
}

impl Decision {
    /// The degraded answer used whenever the decision component is
    /// unavailable or returns garbage: wait a day, keep the thread pending.
    pub fn fallback() -> Self {
        Self {
            action: DecisionAction::Wait,
            wait_hours: Some(FALLBACK_WAIT_HOURS),
            status: ConversationStatus::Pending,
            draft_text: None,
            confidence: FALLBACK_CONFIDENCE,
        }
    }

    /// Reply copy for the contact. A drafted reply wins; otherwise each
    /// action has a stock line.
    pub fn reply_text(&self) -> String {
        if let Some(draft) = self.draft_text.as_deref() {
            if !draft.trim().is_empty() {
                return draft.to_string();
            }
        }
        match self.action {
            DecisionAction::Close => {
                "Thank you! Your request has been completed. Is there anything else I can help you with?"
                    .to_string()
            }
            DecisionAction::Escalate => {
                "I'm connecting you with a human agent who can better assist you. Please hold."
                    .to_string()
            }
            DecisionAction::Reschedule => {
                let hours = self.wait_hours.unwrap_or(FALLBACK_WAIT_HOURS);
                format!("I'll follow up with you in {hours} hours. Thank you for your patience!")
            }
            DecisionAction::Wait => {
                "Thank you for your message. We're processing your request and will get back to you soon."
                    .to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_waits_a_day_with_low_confidence() {
        let decision = Decision::fallback();
        assert_eq!(decision.action, DecisionAction::Wait);
        assert_eq!(decision.wait_hours, Some(24));
        assert_eq!(decision.status, ConversationStatus::Pending);
        assert!(decision.confidence < 0.5);
    }

    #[test]
    fn drafted_reply_wins_over_stock_line() {
        let mut decision = Decision::fallback();
        decision.draft_text = Some("See you Tuesday!".to_string());
        assert_eq!(decision.reply_text(), "See you Tuesday!");

        decision.draft_text = Some("   ".to_string());
        assert!(decision.reply_text().starts_with("Thank you for your message"));
    }

    #[test]
    fn reschedule_reply_names_the_delay() {
        let decision = Decision {
            action: DecisionAction::Reschedule,
            wait_hours: Some(48),
            status: ConversationStatus::Promised,
            draft_text: None,
            confidence: 0.9,
        };
        assert!(decision.reply_text().contains("48 hours"));
    }
}
