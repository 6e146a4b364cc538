//! Persisted connector records and the factories that build them.
//!
//! Records are created from a description (`*Desc`) through a [`Factory`]
//! and later updated in place from a new description. Relations between
//! records are plain id lists on the owning side; they are only ever
//! mutated through the relation linker.

mod agreement;
mod artifact;
mod catalog;
mod contract;
mod representation;
mod resource;
mod subscription;

pub use agreement::{Agreement, AgreementDesc, AgreementFactory};
pub use artifact::{Artifact, ArtifactDesc, ArtifactFactory, BasicAuth, Data};
pub use catalog::{Catalog, CatalogDesc, CatalogFactory};
pub use contract::{
    Contract, ContractDesc, ContractFactory, ContractRule, ContractRuleDesc, ContractRuleFactory,
};
pub use representation::{Representation, RepresentationDesc, RepresentationFactory};
pub use resource::{Resource, ResourceDesc, ResourceFactory, ResourceKind};
pub use subscription::{Subscription, SubscriptionDesc, SubscriptionFactory};

use crate::error::TypesResult;

/// Creates records from descriptions and applies later descriptions to them.
pub trait Factory {
    type Entity;
    type Desc;

    fn create(desc: Self::Desc) -> TypesResult<Self::Entity>;

    /// Apply `desc` to `entity`. Returns whether anything changed.
    fn update(entity: &mut Self::Entity, desc: Self::Desc) -> TypesResult<bool>;
}

/// Assign `value` to `slot` if it differs, recording the change.
pub(crate) fn set_if_changed<T: PartialEq>(slot: &mut T, value: T, changed: &mut bool) {
    if *slot != value {
        *slot = value;
        *changed = true;
    }
}
