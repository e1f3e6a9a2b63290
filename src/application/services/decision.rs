use async_trait::async_trait;

use crate::domain::models::{Decision, DecisionContext};

/// Seam for the NL decision component. Callers must treat any error as a
/// cue to apply [`Decision::fallback`], never as a hard failure.
#[async_trait]
pub trait DecisionEngine: Send + Sync {
    async fn decide(&self, context: &DecisionContext) -> anyhow::Result<Decision>;
}

/// Engine used when no decision service is configured. Every inbound
/// message gets the stock wait-and-follow-up decision.
pub struct FallbackDecisionEngine;

#[async_trait]
impl DecisionEngine for FallbackDecisionEngine {
    async fn decide(&self, _context: &DecisionContext) -> anyhow::Result<Decision> {
        Ok(Decision::fallback())
    }
}
