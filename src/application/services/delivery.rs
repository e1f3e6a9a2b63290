use async_trait::async_trait;

use crate::domain::{errors::DeliveryError, models::WhatsAppCredentials};

/// What goes over the wire for one outbound send. Free text is only
/// deliverable inside the provider's reply window; templates work anywhere.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundPayload {
    Template {
        name: String,
        language: String,
        parameters: Vec<TemplateParameter>,
    },
    Text {
        body: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateParameter {
    pub parameter_name: String,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct SendResult {
    pub message_id: String,
    pub recipient_id: Option<String>,
    pub status: String,
}

#[async_trait]
pub trait DeliveryClient: Send + Sync {
    async fn send(
        &self,
        credentials: &WhatsAppCredentials,
        to: &str,
        payload: &OutboundPayload,
    ) -> Result<SendResult, DeliveryError>;
}
