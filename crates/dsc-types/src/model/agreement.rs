use super::{set_if_changed, Factory};
use crate::entity::{impl_entity, EntityKind, EntityMeta};
use crate::error::TypesResult;
use crate::Uri;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A negotiated contract between a specific consumer and provider.
///
/// Created only by contract negotiation; afterwards only `confirmed` and
/// `archived` change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agreement {
    #[serde(flatten)]
    pub meta: EntityMeta,
    pub remote_id: Option<Uri>,
    pub confirmed: bool,
    pub archived: bool,
    /// Serialized contract agreement document.
    pub value: String,
    #[serde(default)]
    pub artifacts: Vec<Uuid>,
}

impl_entity!(Agreement, EntityKind::Agreement);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgreementDesc {
    #[serde(default)]
    pub remote_id: Option<Uri>,
    #[serde(default)]
    pub confirmed: bool,
    pub value: String,
}

pub struct AgreementFactory;

impl Factory for AgreementFactory {
    type Entity = Agreement;
    type Desc = AgreementDesc;

    fn create(desc: AgreementDesc) -> TypesResult<Agreement> {
        let mut agreement = Agreement {
            meta: EntityMeta::new(),
            remote_id: None,
            confirmed: false,
            archived: false,
            value: String::new(),
            artifacts: Vec::new(),
        };
        Self::update(&mut agreement, desc)?;
        Ok(agreement)
    }

    fn update(agreement: &mut Agreement, desc: AgreementDesc) -> TypesResult<bool> {
        let mut changed = false;
        set_if_changed(&mut agreement.remote_id, desc.remote_id, &mut changed);
        set_if_changed(&mut agreement.confirmed, desc.confirmed, &mut changed);
        set_if_changed(&mut agreement.value, desc.value, &mut changed);
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_agreement_is_unconfirmed_and_active() {
        let agreement = AgreementFactory::create(AgreementDesc {
            value: "{}".into(),
            ..AgreementDesc::default()
        })
        .unwrap();
        assert!(!agreement.confirmed);
        assert!(!agreement.archived);
        assert!(agreement.artifacts.is_empty());
    }
}
