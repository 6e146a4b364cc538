use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kinds of records the connector persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Catalog,
    Resource,
    Representation,
    Artifact,
    Contract,
    ContractRule,
    Agreement,
    Subscription,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Catalog => "catalog",
            EntityKind::Resource => "resource",
            EntityKind::Representation => "representation",
            EntityKind::Artifact => "artifact",
            EntityKind::Contract => "contract",
            EntityKind::ContractRule => "rule",
            EntityKind::Agreement => "agreement",
            EntityKind::Subscription => "subscription",
        }
    }

    /// Path segment used in self-links. Resources use `offers`/`requests`
    /// depending on their kind, see [`Entity::link_segment`].
    pub fn segment(&self) -> &'static str {
        match self {
            EntityKind::Catalog => "catalogs",
            EntityKind::Resource => "offers",
            EntityKind::Representation => "representations",
            EntityKind::Artifact => "artifacts",
            EntityKind::Contract => "contracts",
            EntityKind::ContractRule => "rules",
            EntityKind::Agreement => "agreements",
            EntityKind::Subscription => "subscriptions",
        }
    }

    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "catalogs" => Some(EntityKind::Catalog),
            "offers" | "requests" => Some(EntityKind::Resource),
            "representations" => Some(EntityKind::Representation),
            "artifacts" => Some(EntityKind::Artifact),
            "contracts" => Some(EntityKind::Contract),
            "rules" => Some(EntityKind::ContractRule),
            "agreements" => Some(EntityKind::Agreement),
            "subscriptions" => Some(EntityKind::Subscription),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bookkeeping shared by every persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMeta {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    /// Soft-deletion marker. Deleted records stay resolvable by id so that
    /// historical agreements keep pointing at something.
    #[serde(default)]
    pub deleted: bool,
}

impl EntityMeta {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            modified_at: now,
            deleted: false,
        }
    }
}

impl Default for EntityMeta {
    fn default() -> Self {
        Self::new()
    }
}

/// A persisted connector record.
pub trait Entity: Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    fn meta(&self) -> &EntityMeta;

    fn meta_mut(&mut self) -> &mut EntityMeta;

    fn id(&self) -> Uuid {
        self.meta().id
    }

    fn is_deleted(&self) -> bool {
        self.meta().deleted
    }

    fn mark_deleted(&mut self) {
        let meta = self.meta_mut();
        meta.deleted = true;
        meta.modified_at = Utc::now();
    }

    fn touch(&mut self) {
        self.meta_mut().modified_at = Utc::now();
    }

    fn link_segment(&self) -> &'static str {
        Self::KIND.segment()
    }
}

macro_rules! impl_entity {
    ($ty:ty, $kind:expr) => {
        impl $crate::entity::Entity for $ty {
            const KIND: $crate::entity::EntityKind = $kind;

            fn meta(&self) -> &$crate::entity::EntityMeta {
                &self.meta
            }

            fn meta_mut(&mut self) -> &mut $crate::entity::EntityMeta {
                &mut self.meta
            }
        }
    };
}

pub(crate) use impl_entity;
