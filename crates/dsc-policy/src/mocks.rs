use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::context::{PolicyContext, PolicyDecision};
use crate::error::{PolicyError, PolicyResult};
use crate::traits::PolicyDecisionPoint;

/// Mock decision point for testing.
///
/// Answers every request with a fixed decision and records what it was asked.
pub struct MockDecisionPoint {
    decision: PolicyDecision,
    calls: AtomicUsize,
    last: Mutex<Option<PolicyContext>>,
}

impl MockDecisionPoint {
    /// Create a decision point that permits everything.
    pub fn permit_all() -> Self {
        Self::with_decision(PolicyDecision::Permit)
    }

    /// Create a decision point that denies everything.
    pub fn deny_all() -> Self {
        Self::with_decision(PolicyDecision::Deny("Mock policy: denied".into()))
    }

    /// Create a decision point with a specific decision.
    pub fn with_decision(decision: PolicyDecision) -> Self {
        Self {
            decision,
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    /// Number of evaluations so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_context(&self) -> Option<PolicyContext> {
        self.last.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl PolicyDecisionPoint for MockDecisionPoint {
    async fn evaluate(&self, context: &PolicyContext) -> PolicyResult<PolicyDecision> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.last.lock() {
            *guard = Some(context.clone());
        }
        Ok(self.decision.clone())
    }
}

/// Decision point that always errors.
pub struct FailingDecisionPoint {
    message: String,
}

impl FailingDecisionPoint {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl PolicyDecisionPoint for FailingDecisionPoint {
    async fn evaluate(&self, _context: &PolicyContext) -> PolicyResult<PolicyDecision> {
        Err(PolicyError::Unavailable(self.message.clone()))
    }
}
