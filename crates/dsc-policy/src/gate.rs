use std::sync::Arc;

use async_trait::async_trait;
use dsc_types::RejectionReason;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::context::{PolicyContext, PolicyDecision};
use crate::error::PolicyResult;
use crate::traits::PolicyDecisionPoint;

/// Invokes the decision point and maps its verdict to the rejection vocabulary.
#[derive(Clone)]
pub struct PolicyGate {
    pdp: Arc<dyn PolicyDecisionPoint>,
}

impl PolicyGate {
    pub fn new(pdp: Arc<dyn PolicyDecisionPoint>) -> Self {
        Self { pdp }
    }

    /// Evaluate one request. Never fails: an unreachable or erroring
    /// decision point yields `Deny`.
    pub async fn evaluate(&self, context: &PolicyContext) -> PolicyDecision {
        debug!(
            artifact = %context.artifact,
            connector = %context.requesting_connector,
            rules = context.rules.len(),
            "Evaluating usage policy"
        );

        match self.pdp.evaluate(context).await {
            Ok(PolicyDecision::Permit) => {
                debug!(artifact = %context.artifact, "Access permitted");
                PolicyDecision::Permit
            }
            Ok(PolicyDecision::Deny(reason)) => {
                info!(
                    artifact = %context.artifact,
                    connector = %context.requesting_connector,
                    reason = %reason,
                    "Access denied by policy"
                );
                PolicyDecision::Deny(reason)
            }
            Err(e) => {
                warn!(
                    artifact = %context.artifact,
                    error = %e,
                    "Policy decision point failed, denying access"
                );
                PolicyDecision::Deny(format!("policy evaluation failed: {e}"))
            }
        }
    }

    /// Rejection reason for a verdict, if it rejects.
    pub fn rejection(decision: &PolicyDecision) -> Option<RejectionReason> {
        match decision {
            PolicyDecision::Permit => None,
            PolicyDecision::Deny(_) => Some(RejectionReason::NotAuthorized),
        }
    }
}

/// Decision point answering every request the same way.
///
/// Used when no external decision point is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaticDecisionPoint {
    Permit,
    Deny,
}

impl Default for StaticDecisionPoint {
    fn default() -> Self {
        StaticDecisionPoint::Permit
    }
}

#[async_trait]
impl PolicyDecisionPoint for StaticDecisionPoint {
    async fn evaluate(&self, _context: &PolicyContext) -> PolicyResult<PolicyDecision> {
        Ok(match self {
            StaticDecisionPoint::Permit => PolicyDecision::Permit,
            StaticDecisionPoint::Deny => {
                PolicyDecision::Deny("static policy denies all access".to_string())
            }
        })
    }
}
