pub mod nudge_dispatcher;
pub mod scheduler;
pub mod webhook_reconciler;
