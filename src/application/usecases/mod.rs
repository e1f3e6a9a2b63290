pub mod approve_nudge;
pub mod cancel_nudge;
pub mod close_conversation;
pub mod edit_nudge;
pub mod reschedule_nudge;
pub mod retry_message;
pub mod schedule_nudge;
