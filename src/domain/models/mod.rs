pub mod channel;
pub mod contact;
pub mod conversation;
pub mod decision;
pub mod integration;
pub mod message;
pub mod nudge;

pub use channel::Channel;
pub use contact::{Contact, sanitize_phone_number};
pub use conversation::{Conversation, ConversationStatus};
pub use decision::{Decision, DecisionAction, DecisionContext, FALLBACK_WAIT_HOURS};
pub use integration::{ChannelIntegration, TemplateConfig, WhatsAppCredentials};
pub use message::{Direction, Message, MessageStatus};
pub use nudge::{Nudge, NudgeStatus};
