use std::sync::Arc;

use poem::Result as PoemResult;
use poem_openapi::{
    OpenApi,
    param::Query,
    payload::{Binary, Json, PlainText},
};
use serde_json::Value;
use tracing::warn;

use crate::presentation::http::{
    endpoints::root::{ApiState, EndpointsTags},
    responses::WebhookAckDto,
};

#[derive(Clone)]
pub struct WebhookEndpoints {
    state: Arc<ApiState>,
}

impl WebhookEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }
}

#[OpenApi]
impl WebhookEndpoints {
    /// Provider subscription handshake. Echoes the challenge when the
    /// verify token matches.
    #[oai(
        path = "/webhooks/whatsapp",
        method = "get",
        tag = EndpointsTags::Webhooks,
    )]
    pub async fn verify(
        &self,
        #[oai(name = "hub.mode")] mode: Query<Option<String>>,
        #[oai(name = "hub.verify_token")] verify_token: Query<Option<String>>,
        #[oai(name = "hub.challenge")] challenge: Query<Option<String>>,
    ) -> PoemResult<PlainText<String>> {
        let accepted = handshake_accepted(
            mode.0.as_deref(),
            verify_token.0.as_deref(),
            &self.state.webhook_verify_token,
        );
        if !accepted {
            return Err(poem::Error::from_string(
                "verification failed",
                poem::http::StatusCode::FORBIDDEN,
            ));
        }
        Ok(PlainText(challenge.0.unwrap_or_default()))
    }

    /// Provider event intake. Acknowledged no matter what, so the
    /// provider never retry-storms us over our own processing problems.
    #[oai(
        path = "/webhooks/whatsapp",
        method = "post",
        tag = EndpointsTags::Webhooks,
    )]
    pub async fn receive(&self, payload: Binary<Vec<u8>>) -> Json<WebhookAckDto> {
        match serde_json::from_slice::<Value>(&payload.0) {
            Ok(event) => self.state.reconciler.process_event(event).await,
            Err(err) => warn!(error = %err, "webhook body is not json"),
        }
        Json(WebhookAckDto {
            status: "ok".to_string(),
        })
    }
}

/// The provider must claim a subscribe and present our verify token.
fn handshake_accepted(mode: Option<&str>, token: Option<&str>, expected: &str) -> bool {
    mode == Some("subscribe") && token == Some(expected)
}

#[cfg(test)]
mod tests {
    use super::handshake_accepted;

    #[test]
    fn subscribe_with_matching_token_passes() {
        assert!(handshake_accepted(Some("subscribe"), Some("sekret"), "sekret"));
    }

    #[test]
    fn wrong_token_is_rejected() {
        assert!(!handshake_accepted(Some("subscribe"), Some("guess"), "sekret"));
        assert!(!handshake_accepted(Some("subscribe"), None, "sekret"));
    }

    #[test]
    fn missing_or_wrong_mode_is_rejected() {
        assert!(!handshake_accepted(None, Some("sekret"), "sekret"));
        assert!(!handshake_accepted(Some("unsubscribe"), Some("sekret"), "sekret"));
    }
}
