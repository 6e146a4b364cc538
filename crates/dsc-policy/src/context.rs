use dsc_types::{Uri, UsageRule};
use serde::{Deserialize, Serialize};

/// Everything a decision point may look at for one artifact request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyContext {
    /// Rules of the governing agreement, or of the resource's offer when no
    /// agreement is involved.
    pub rules: Vec<UsageRule>,
    pub requesting_connector: Uri,
    pub artifact: Uri,
    /// Transfer contract presented with the request.
    pub agreement: Option<Uri>,
    /// Successful reads of the artifact so far.
    pub access_count: u64,
}

impl PolicyContext {
    pub fn new(rules: Vec<UsageRule>, requesting_connector: Uri, artifact: Uri) -> Self {
        Self {
            rules,
            requesting_connector,
            artifact,
            agreement: None,
            access_count: 0,
        }
    }

    pub fn with_agreement(mut self, agreement: Uri) -> Self {
        self.agreement = Some(agreement);
        self
    }

    pub fn with_access_count(mut self, count: u64) -> Self {
        self.access_count = count;
        self
    }
}

/// Verdict for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyDecision {
    Permit,
    Deny(String),
}

impl PolicyDecision {
    pub fn is_permit(&self) -> bool {
        matches!(self, PolicyDecision::Permit)
    }
}
