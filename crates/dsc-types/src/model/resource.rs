use super::{set_if_changed, Factory};
use crate::entity::{Entity, EntityKind, EntityMeta};
use crate::error::TypesResult;
use crate::Uri;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a resource is offered by this connector or mirrored from a
/// resource another connector offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceKind {
    Offered,
    Requested {
        /// The resource id on the originating connector.
        remote_id: Uri,
        /// Callback URIs notified when the mirrored resource changes.
        #[serde(default)]
        subscribers: Vec<Uri>,
    },
}

impl ResourceKind {
    pub fn is_offered(&self) -> bool {
        matches!(self, ResourceKind::Offered)
    }
}

/// A described unit of data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(flatten)]
    pub meta: EntityMeta,
    pub kind: ResourceKind,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub publisher: Option<Uri>,
    pub license: Option<Uri>,
    pub sovereign: Option<Uri>,
    pub language: String,
    pub endpoint_documentation: Option<Uri>,
    /// Bumped on every effective update.
    pub version: u64,
    #[serde(default)]
    pub representations: Vec<Uuid>,
    #[serde(default)]
    pub contracts: Vec<Uuid>,
}

impl Entity for Resource {
    const KIND: EntityKind = EntityKind::Resource;

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }

    fn link_segment(&self) -> &'static str {
        match self.kind {
            ResourceKind::Offered => "offers",
            ResourceKind::Requested { .. } => "requests",
        }
    }
}

impl Resource {
    pub fn remote_id(&self) -> Option<&Uri> {
        match &self.kind {
            ResourceKind::Offered => None,
            ResourceKind::Requested { remote_id, .. } => Some(remote_id),
        }
    }

    pub fn subscribers(&self) -> &[Uri] {
        match &self.kind {
            ResourceKind::Offered => &[],
            ResourceKind::Requested { subscribers, .. } => subscribers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDesc {
    pub kind: ResourceKind,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    #[serde(default)]
    pub publisher: Option<Uri>,
    #[serde(default)]
    pub license: Option<Uri>,
    #[serde(default)]
    pub sovereign: Option<Uri>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub endpoint_documentation: Option<Uri>,
}

impl ResourceDesc {
    pub fn offered(title: impl Into<String>) -> Self {
        Self {
            kind: ResourceKind::Offered,
            title: Some(title.into()),
            description: None,
            keywords: None,
            publisher: None,
            license: None,
            sovereign: None,
            language: None,
            endpoint_documentation: None,
        }
    }

    pub fn requested(title: impl Into<String>, remote_id: Uri) -> Self {
        Self {
            kind: ResourceKind::Requested {
                remote_id,
                subscribers: Vec::new(),
            },
            ..Self::offered(title)
        }
    }
}

pub struct ResourceFactory;

impl Factory for ResourceFactory {
    type Entity = Resource;
    type Desc = ResourceDesc;

    fn create(desc: ResourceDesc) -> TypesResult<Resource> {
        let mut resource = Resource {
            meta: EntityMeta::new(),
            kind: desc.kind.clone(),
            title: String::new(),
            description: String::new(),
            keywords: Vec::new(),
            publisher: None,
            license: None,
            sovereign: None,
            language: String::new(),
            endpoint_documentation: None,
            version: 0,
            representations: Vec::new(),
            contracts: Vec::new(),
        };
        Self::update(&mut resource, desc)?;
        // A freshly created resource starts at version zero regardless of
        // how many fields the description filled in.
        resource.version = 0;
        Ok(resource)
    }

    fn update(resource: &mut Resource, desc: ResourceDesc) -> TypesResult<bool> {
        let mut changed = false;
        set_if_changed(&mut resource.kind, desc.kind, &mut changed);
        set_if_changed(&mut resource.title, desc.title.unwrap_or_default(), &mut changed);
        set_if_changed(
            &mut resource.description,
            desc.description.unwrap_or_default(),
            &mut changed,
        );
        set_if_changed(&mut resource.keywords, desc.keywords.unwrap_or_default(), &mut changed);
        set_if_changed(&mut resource.publisher, desc.publisher, &mut changed);
        set_if_changed(&mut resource.license, desc.license, &mut changed);
        set_if_changed(&mut resource.sovereign, desc.sovereign, &mut changed);
        set_if_changed(&mut resource.language, desc.language.unwrap_or_default(), &mut changed);
        set_if_changed(
            &mut resource.endpoint_documentation,
            desc.endpoint_documentation,
            &mut changed,
        );
        if changed {
            resource.version += 1;
        }
        Ok(changed)
    }
}
