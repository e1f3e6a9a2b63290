use std::sync::Arc;

use poem_openapi::Tags;

use crate::application::handlers::{
    nudge_dispatcher::NudgeDispatcher, webhook_reconciler::WebhookReconciler,
};

#[derive(Clone)]
pub struct ApiState {
    pub dispatcher: Arc<NudgeDispatcher>,
    pub reconciler: Arc<WebhookReconciler>,
    pub webhook_verify_token: String,
    pub cron_secret: String,
}

/// Enum of API sections (tags)
#[derive(Tags)]
pub enum EndpointsTags {
    Health,
    Webhooks,
    Cron,
}
