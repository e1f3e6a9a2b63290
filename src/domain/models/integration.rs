use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_TEMPLATE_NAME: &str = "ai_followup";
pub const DEFAULT_TEMPLATE_PARAM_NAME: &str = "followup_message";
pub const DEFAULT_TEMPLATE_LANGUAGE: &str = "en";
pub const FALLBACK_TEMPLATE_NAME: &str = "hello_world";

/// Per-account template settings. Unset fields fall back to the defaults the
/// provider-side onboarding ships with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    pub name: String,
    pub parameter_name: String,
    pub language: String,
    pub fallback_name: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_TEMPLATE_NAME.to_string(),
            parameter_name: DEFAULT_TEMPLATE_PARAM_NAME.to_string(),
            language: DEFAULT_TEMPLATE_LANGUAGE.to_string(),
            fallback_name: FALLBACK_TEMPLATE_NAME.to_string(),
        }
    }
}

/// An account's WhatsApp Business binding: the credentials used for sends and
/// the phone number id provider callbacks are matched against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelIntegration {
    pub id: Uuid,
    pub account_id: Uuid,
    pub access_token: String,
    pub phone_number_id: String,
    pub template: TemplateConfig,
}

#[derive(Debug, Clone)]
pub struct WhatsAppCredentials {
    pub access_token: String,
    pub phone_number_id: String,
}

impl ChannelIntegration {
    pub fn credentials(&self) -> WhatsAppCredentials {
        WhatsAppCredentials {
            access_token: self.access_token.clone(),
            phone_number_id: self.phone_number_id.clone(),
        }
    }
}
