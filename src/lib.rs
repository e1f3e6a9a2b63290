//! Follow-up engine for WhatsApp conversations: schedules nudges, sends
//! them through the Cloud API, and reconciles provider webhooks back into
//! conversation state.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
