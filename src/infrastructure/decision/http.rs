use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    application::services::decision::DecisionEngine,
    domain::models::{ConversationStatus, Decision, DecisionAction, DecisionContext},
};

/// HTTP client for the decision service. Any failure here surfaces as an
/// error; callers decide what a safe fallback looks like.
pub struct HttpDecisionClient {
    http: Client,
    base_url: String,
}

impl HttpDecisionClient {
    pub fn new(base_url: String, timeout_secs: u64) -> Arc<dyn DecisionEngine> {
        Arc::new(Self {
            http: Client::builder()
                .user_agent("followup/decision")
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .expect("failed to build decision client"),
            base_url,
        }) as Arc<dyn DecisionEngine>
    }
}

#[async_trait]
impl DecisionEngine for HttpDecisionClient {
    async fn decide(&self, context: &DecisionContext) -> anyhow::Result<Decision> {
        let url = format!("{}/v1/decide", self.base_url);
        let request = DecideRequest {
            org_id: context.account_id,
            conversation_id: context.conversation_id,
            contact_id: context.contact_id,
            incoming_text: &context.message_text,
            last_status: decision_status_str(context.current_status),
        };

        let response = self.http.post(&url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("decision api returned {status}: {body}");
        }

        let payload: DecideResponse = response.json().await?;
        let action = match payload.action.as_str() {
            "wait" => DecisionAction::Wait,
            "reschedule" => DecisionAction::Reschedule,
            "close" => DecisionAction::Close,
            "escalate" => DecisionAction::Escalate,
            other => anyhow::bail!("unknown decision action: {other}"),
        };
        let status = ConversationStatus::from_str(&payload.new_status)
            .ok_or_else(|| anyhow::anyhow!("unknown decision status: {}", payload.new_status))?;

        Ok(Decision {
            action,
            wait_hours: payload.after_hours,
            status,
            draft_text: payload.draft_message,
            confidence: payload.confidence,
        })
    }
}

/// The decision service only understands the four canonical statuses;
/// everything in-flight on our side reads as pending to it.
fn decision_status_str(status: ConversationStatus) -> &'static str {
    match status {
        ConversationStatus::Promised => "promised",
        ConversationStatus::Escalated => "escalated",
        ConversationStatus::Closed => "closed",
        _ => "pending",
    }
}

#[derive(Debug, Serialize)]
struct DecideRequest<'a> {
    org_id: Uuid,
    conversation_id: Uuid,
    contact_id: Uuid,
    incoming_text: &'a str,
    last_status: &'static str,
}

#[derive(Debug, Deserialize)]
struct DecideResponse {
    action: String,
    after_hours: Option<i64>,
    new_status: String,
    confidence: f32,
    draft_message: Option<String>,
}
