use super::{set_if_changed, Factory};
use crate::entity::{impl_entity, EntityKind, EntityMeta};
use crate::error::TypesResult;
use crate::Uri;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One concrete encoding of a resource's data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Representation {
    #[serde(flatten)]
    pub meta: EntityMeta,
    pub title: String,
    pub media_type: String,
    pub language: String,
    pub standard: String,
    pub remote_id: Option<Uri>,
    #[serde(default)]
    pub artifacts: Vec<Uuid>,
}

impl_entity!(Representation, EntityKind::Representation);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepresentationDesc {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub standard: Option<String>,
    #[serde(default)]
    pub remote_id: Option<Uri>,
}

pub struct RepresentationFactory;

impl Factory for RepresentationFactory {
    type Entity = Representation;
    type Desc = RepresentationDesc;

    fn create(desc: RepresentationDesc) -> TypesResult<Representation> {
        let mut representation = Representation {
            meta: EntityMeta::new(),
            title: String::new(),
            media_type: String::new(),
            language: String::new(),
            standard: String::new(),
            remote_id: None,
            artifacts: Vec::new(),
        };
        Self::update(&mut representation, desc)?;
        Ok(representation)
    }

    fn update(representation: &mut Representation, desc: RepresentationDesc) -> TypesResult<bool> {
        let mut changed = false;
        set_if_changed(&mut representation.title, desc.title.unwrap_or_default(), &mut changed);
        set_if_changed(
            &mut representation.media_type,
            desc.media_type.unwrap_or_default(),
            &mut changed,
        );
        set_if_changed(
            &mut representation.language,
            desc.language.unwrap_or_default(),
            &mut changed,
        );
        set_if_changed(
            &mut representation.standard,
            desc.standard.unwrap_or_default(),
            &mut changed,
        );
        set_if_changed(&mut representation.remote_id, desc.remote_id, &mut changed);
        Ok(changed)
    }
}
