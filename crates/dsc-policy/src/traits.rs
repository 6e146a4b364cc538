use async_trait::async_trait;

use crate::context::{PolicyContext, PolicyDecision};
use crate::error::PolicyResult;

/// External evaluator of usage-control rules.
#[async_trait]
pub trait PolicyDecisionPoint: Send + Sync {
    async fn evaluate(&self, context: &PolicyContext) -> PolicyResult<PolicyDecision>;
}
