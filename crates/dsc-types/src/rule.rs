//! Usage rules and their structural comparison.
//!
//! Rules are opaque to the connector core: their evaluation belongs to the
//! external policy decision point. The core only needs to group rules by
//! target and decide whether two rule sets say the same thing.

use crate::Uri;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RuleKind {
    #[serde(rename = "ids:Permission")]
    Permission,
    #[serde(rename = "ids:Prohibition")]
    Prohibition,
    #[serde(rename = "ids:Duty")]
    Obligation,
}

/// A single constraint on a rule, e.g. `POLICY_EVALUATION_TIME BEFORE 2030-01-01`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub left_operand: String,
    pub operator: String,
    pub right_operand: serde_json::Value,
}

/// A permission, prohibition or obligation clause targeting an artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRule {
    /// Identifier assigned by whichever connector minted the rule. Ignored
    /// by structural comparison.
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uri>,

    #[serde(rename = "@type")]
    pub kind: RuleKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Uri>,

    #[serde(default = "default_action")]
    pub action: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,

    /// Duties attached to a permission (e.g. log or notify after use).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_duties: Vec<UsageRule>,
}

fn default_action() -> String {
    "USE".to_string()
}

impl UsageRule {
    pub fn permission(target: Uri) -> Self {
        Self::new(RuleKind::Permission, target)
    }

    pub fn prohibition(target: Uri) -> Self {
        Self::new(RuleKind::Prohibition, target)
    }

    pub fn new(kind: RuleKind, target: Uri) -> Self {
        Self {
            id: None,
            kind,
            target: Some(target),
            action: default_action(),
            constraints: Vec::new(),
            post_duties: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: Uri) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_constraint(
        mut self,
        left_operand: impl Into<String>,
        operator: impl Into<String>,
        right_operand: serde_json::Value,
    ) -> Self {
        self.constraints.push(Constraint {
            left_operand: left_operand.into(),
            operator: operator.into(),
            right_operand,
        });
        self
    }

    /// Canonical, identifier-free rendering of the rule. Object keys come out
    /// sorted and constraint order is normalised, so two rules with the same
    /// meaning render identically.
    pub fn canonical_form(&self) -> String {
        canonical_value(self).to_string()
    }
}

fn canonical_value(rule: &UsageRule) -> serde_json::Value {
    let mut constraints: Vec<String> = rule
        .constraints
        .iter()
        .map(|c| {
            serde_json::json!({
                "left": c.left_operand,
                "op": c.operator,
                "right": c.right_operand,
            })
            .to_string()
        })
        .collect();
    constraints.sort();

    let mut duties: Vec<String> = rule.post_duties.iter().map(UsageRule::canonical_form).collect();
    duties.sort();

    serde_json::json!({
        "kind": rule.kind,
        "target": rule.target.as_ref().map(Uri::as_str),
        "action": rule.action,
        "constraints": constraints,
        "duties": duties,
    })
}

/// Compare two rule collections as sets, ignoring rule identifiers and the
/// order of rules and constraints.
pub fn rule_sets_equal(left: &[UsageRule], right: &[UsageRule]) -> bool {
    let left: BTreeSet<String> = left.iter().map(UsageRule::canonical_form).collect();
    let right: BTreeSet<String> = right.iter().map(UsageRule::canonical_form).collect();
    left == right
}
