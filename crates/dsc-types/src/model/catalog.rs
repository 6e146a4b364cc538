use super::{set_if_changed, Factory};
use crate::entity::{impl_entity, EntityKind, EntityMeta};
use crate::error::TypesResult;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named grouping of offered and requested resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(flatten)]
    pub meta: EntityMeta,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub offered_resources: Vec<Uuid>,
    #[serde(default)]
    pub requested_resources: Vec<Uuid>,
}

impl_entity!(Catalog, EntityKind::Catalog);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogDesc {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

pub struct CatalogFactory;

impl Factory for CatalogFactory {
    type Entity = Catalog;
    type Desc = CatalogDesc;

    fn create(desc: CatalogDesc) -> TypesResult<Catalog> {
        let mut catalog = Catalog {
            meta: EntityMeta::new(),
            title: String::new(),
            description: String::new(),
            offered_resources: Vec::new(),
            requested_resources: Vec::new(),
        };
        Self::update(&mut catalog, desc)?;
        Ok(catalog)
    }

    fn update(catalog: &mut Catalog, desc: CatalogDesc) -> TypesResult<bool> {
        let mut changed = false;
        set_if_changed(&mut catalog.title, desc.title.unwrap_or_default(), &mut changed);
        set_if_changed(
            &mut catalog.description,
            desc.description.unwrap_or_default(),
            &mut changed,
        );
        Ok(changed)
    }
}
