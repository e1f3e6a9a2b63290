use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    application::services::delivery::{DeliveryClient, OutboundPayload, SendResult},
    domain::{errors::DeliveryError, models::WhatsAppCredentials},
};

/// Graph API client for the WhatsApp Cloud messages endpoint.
pub struct WhatsAppClient {
    http: Client,
    base_url: String,
    api_version: String,
}

impl WhatsAppClient {
    pub fn new(base_url: String, api_version: String, timeout_secs: u64) -> Arc<dyn DeliveryClient> {
        Arc::new(Self {
            http: Client::builder()
                .user_agent("followup/whatsapp")
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .expect("failed to build whatsapp client"),
            base_url,
            api_version,
        }) as Arc<dyn DeliveryClient>
    }

    fn build_url(&self, phone_number_id: &str) -> String {
        format!(
            "{}/{}/{}/messages",
            self.base_url, self.api_version, phone_number_id
        )
    }
}

#[async_trait]
impl DeliveryClient for WhatsAppClient {
    async fn send(
        &self,
        credentials: &WhatsAppCredentials,
        to: &str,
        payload: &OutboundPayload,
    ) -> Result<SendResult, DeliveryError> {
        if credentials.access_token.trim().is_empty() {
            return Err(DeliveryError::MissingCredential("access_token".to_string()));
        }
        if credentials.phone_number_id.trim().is_empty() {
            return Err(DeliveryError::MissingCredential(
                "phone_number_id".to_string(),
            ));
        }

        let url = self.build_url(&credentials.phone_number_id);
        let request = OutboundRequest::build(to, payload);
        debug!(to = %to, kind = request.kind, "posting message to graph api");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&credentials.access_token)
            .json(&request)
            .send()
            .await
            .map_err(|err| DeliveryError::Network(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| DeliveryError::Network(err.to_string()))?;

        if !status.is_success() {
            let code = serde_json::from_str::<GraphErrorEnvelope>(&body)
                .ok()
                .and_then(|envelope| envelope.error)
                .and_then(|error| error.code);
            return Err(DeliveryError::Api {
                status: status.as_u16(),
                code,
                body,
            });
        }

        let parsed: GraphSendResponse = serde_json::from_str(&body)
            .map_err(|err| DeliveryError::Network(format!("unexpected response body: {err}")))?;

        let message_id = parsed
            .messages
            .into_iter()
            .next()
            .map(|message| message.id)
            .unwrap_or_else(|| "unknown".to_string());
        let recipient_id = parsed
            .contacts
            .into_iter()
            .next()
            .and_then(|contact| contact.wa_id);

        Ok(SendResult {
            message_id,
            recipient_id,
            status: "queued".to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
struct OutboundRequest<'a> {
    messaging_product: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    recipient_type: Option<&'static str>,
    to: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<TextBody<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    template: Option<TemplateBody<'a>>,
}

impl<'a> OutboundRequest<'a> {
    fn build(to: &'a str, payload: &'a OutboundPayload) -> Self {
        match payload {
            OutboundPayload::Text { body } => Self {
                messaging_product: "whatsapp",
                recipient_type: Some("individual"),
                to,
                kind: "text",
                text: Some(TextBody {
                    preview_url: false,
                    body,
                }),
                template: None,
            },
            OutboundPayload::Template {
                name,
                language,
                parameters,
            } => {
                let components = if parameters.is_empty() {
                    vec![]
                } else {
                    vec![TemplateComponent {
                        kind: "body",
                        parameters: parameters
                            .iter()
                            .map(|parameter| TemplateParameterBody {
                                kind: "text",
                                parameter_name: &parameter.parameter_name,
                                text: &parameter.text,
                            })
                            .collect(),
                    }]
                };
                Self {
                    messaging_product: "whatsapp",
                    recipient_type: None,
                    to,
                    kind: "template",
                    text: None,
                    template: Some(TemplateBody {
                        name,
                        language: TemplateLanguage { code: language },
                        components,
                    }),
                }
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct TextBody<'a> {
    preview_url: bool,
    body: &'a str,
}

#[derive(Debug, Serialize)]
struct TemplateBody<'a> {
    name: &'a str,
    language: TemplateLanguage<'a>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    components: Vec<TemplateComponent<'a>>,
}

#[derive(Debug, Serialize)]
struct TemplateLanguage<'a> {
    code: &'a str,
}

#[derive(Debug, Serialize)]
struct TemplateComponent<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    parameters: Vec<TemplateParameterBody<'a>>,
}

#[derive(Debug, Serialize)]
struct TemplateParameterBody<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    parameter_name: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GraphSendResponse {
    #[serde(default)]
    messages: Vec<GraphMessageId>,
    #[serde(default)]
    contacts: Vec<GraphContact>,
}

#[derive(Debug, Deserialize)]
struct GraphMessageId {
    id: String,
}

#[derive(Debug, Deserialize)]
struct GraphContact {
    wa_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphErrorEnvelope {
    error: Option<GraphError>,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    code: Option<i64>,
}
