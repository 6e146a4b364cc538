use super::{set_if_changed, Factory};
use crate::entity::{impl_entity, EntityKind, EntityMeta};
use crate::error::{TypesError, TypesResult};
use crate::rule::UsageRule;
use crate::Uri;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A provider's rule-set offer for accessing the artifacts of a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    #[serde(flatten)]
    pub meta: EntityMeta,
    pub title: String,
    /// When set, only this connector may accept the offer.
    pub consumer: Option<Uri>,
    pub provider: Option<Uri>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub remote_id: Option<Uri>,
    #[serde(default)]
    pub rules: Vec<Uuid>,
}

impl_entity!(Contract, EntityKind::Contract);

impl Contract {
    /// Whether `at` lies inside the validity window. Missing bounds are open.
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.start.map_or(true, |start| start <= at) && self.end.map_or(true, |end| at <= end)
    }

    /// Whether the consumer restriction, if any, admits `issuer`.
    pub fn admits(&self, issuer: &Uri) -> bool {
        self.consumer.as_ref().map_or(true, |consumer| consumer == issuer)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractDesc {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub consumer: Option<Uri>,
    #[serde(default)]
    pub provider: Option<Uri>,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub remote_id: Option<Uri>,
}

pub struct ContractFactory;

impl Factory for ContractFactory {
    type Entity = Contract;
    type Desc = ContractDesc;

    fn create(desc: ContractDesc) -> TypesResult<Contract> {
        let mut contract = Contract {
            meta: EntityMeta::new(),
            title: String::new(),
            consumer: None,
            provider: None,
            start: None,
            end: None,
            remote_id: None,
            rules: Vec::new(),
        };
        Self::update(&mut contract, desc)?;
        Ok(contract)
    }

    fn update(contract: &mut Contract, desc: ContractDesc) -> TypesResult<bool> {
        if let (Some(start), Some(end)) = (desc.start, desc.end) {
            if end < start {
                return Err(TypesError::InvalidResource(
                    "contract end lies before its start".to_string(),
                ));
            }
        }

        let mut changed = false;
        set_if_changed(&mut contract.title, desc.title.unwrap_or_default(), &mut changed);
        set_if_changed(&mut contract.consumer, desc.consumer, &mut changed);
        set_if_changed(&mut contract.provider, desc.provider, &mut changed);
        set_if_changed(&mut contract.start, desc.start, &mut changed);
        set_if_changed(&mut contract.end, desc.end, &mut changed);
        set_if_changed(&mut contract.remote_id, desc.remote_id, &mut changed);
        Ok(changed)
    }
}

/// One clause of a contract, stored in its serialized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractRule {
    #[serde(flatten)]
    pub meta: EntityMeta,
    pub title: String,
    /// Serialized [`UsageRule`].
    pub value: String,
    pub remote_id: Option<Uri>,
}

impl_entity!(ContractRule, EntityKind::ContractRule);

impl ContractRule {
    pub fn rule(&self) -> TypesResult<UsageRule> {
        serde_json::from_str(&self.value)
            .map_err(|e| TypesError::IllegalArgument(format!("undecodable rule value: {e}")))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractRuleDesc {
    #[serde(default)]
    pub title: Option<String>,
    pub value: String,
    #[serde(default)]
    pub remote_id: Option<Uri>,
}

impl ContractRuleDesc {
    pub fn from_rule(title: impl Into<String>, rule: &UsageRule) -> TypesResult<Self> {
        let value = serde_json::to_string(rule)
            .map_err(|e| TypesError::IllegalArgument(format!("unserializable rule: {e}")))?;
        Ok(Self {
            title: Some(title.into()),
            value,
            remote_id: None,
        })
    }
}

pub struct ContractRuleFactory;

impl Factory for ContractRuleFactory {
    type Entity = ContractRule;
    type Desc = ContractRuleDesc;

    fn create(desc: ContractRuleDesc) -> TypesResult<ContractRule> {
        let mut rule = ContractRule {
            meta: EntityMeta::new(),
            title: String::new(),
            value: String::new(),
            remote_id: None,
        };
        Self::update(&mut rule, desc)?;
        Ok(rule)
    }

    fn update(rule: &mut ContractRule, desc: ContractRuleDesc) -> TypesResult<bool> {
        let mut changed = false;
        set_if_changed(&mut rule.title, desc.title.unwrap_or_default(), &mut changed);
        set_if_changed(&mut rule.value, desc.value, &mut changed);
        set_if_changed(&mut rule.remote_id, desc.remote_id, &mut changed);
        Ok(changed)
    }
}
