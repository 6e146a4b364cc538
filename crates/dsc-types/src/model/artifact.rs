use super::{set_if_changed, Factory};
use crate::entity::{impl_entity, EntityKind, EntityMeta};
use crate::error::{TypesError, TypesResult};
use crate::Uri;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Credentials for a backend protected by HTTP basic auth.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// What backs an artifact: bytes held by the connector, or a reference to
/// an HTTP(S) backend that is queried on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Data {
    Local {
        value: Bytes,
    },
    Remote {
        /// Backend URL, possibly containing `{name}` placeholders.
        access_url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        credentials: Option<BasicAuth>,
    },
}

/// The addressable data payload behind a representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(flatten)]
    pub meta: EntityMeta,
    pub title: String,
    pub data: Data,
    /// Refresh the data from its origin on every read.
    pub automated_download: bool,
    /// Successful reads so far. Never decreases.
    pub access_counter: u64,
    pub byte_size: u64,
    /// BLAKE3 hex digest of the local bytes.
    pub checksum: Option<String>,
    /// Artifact id on the connector this artifact mirrors.
    pub remote_id: Option<Uri>,
    /// Address of the connector this artifact mirrors.
    pub remote_address: Option<Uri>,
}

impl_entity!(Artifact, EntityKind::Artifact);

impl Artifact {
    /// True for artifacts mirroring another connector's artifact.
    pub fn has_remote_origin(&self) -> bool {
        self.remote_address.is_some()
    }

    /// True if non-empty bytes are already held locally.
    pub fn has_local_data(&self) -> bool {
        matches!(&self.data, Data::Local { value } if !value.is_empty())
    }

    /// Replace the backing data with locally held bytes.
    pub fn set_local_data(&mut self, value: Bytes) {
        self.byte_size = value.len() as u64;
        self.checksum = Some(checksum(&value));
        self.data = Data::Local { value };
    }

    pub fn increment_access_counter(&mut self) {
        self.access_counter = self.access_counter.saturating_add(1);
    }
}

fn checksum(value: &[u8]) -> String {
    blake3::hash(value).to_hex().to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactDesc {
    #[serde(default)]
    pub title: Option<String>,
    /// Local bytes. Ignored when `access_url` is set.
    #[serde(default)]
    pub value: Option<Bytes>,
    #[serde(default)]
    pub access_url: Option<String>,
    #[serde(default)]
    pub basic_auth: Option<BasicAuth>,
    #[serde(default)]
    pub automated_download: bool,
    #[serde(default)]
    pub remote_id: Option<Uri>,
    #[serde(default)]
    pub remote_address: Option<Uri>,
}

impl ArtifactDesc {
    pub fn local(title: impl Into<String>, value: impl Into<Bytes>) -> Self {
        Self {
            title: Some(title.into()),
            value: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn remote(title: impl Into<String>, access_url: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            access_url: Some(access_url.into()),
            ..Self::default()
        }
    }
}

/// Placeholders in a backend URL must be balanced.
fn validate_access_url(url: &str) -> TypesResult<()> {
    let opening = url.matches('{').count();
    let closing = url.matches('}').count();
    if opening != closing {
        return Err(TypesError::InvalidResource(format!(
            "access url has unbalanced placeholders ({opening} '{{' vs {closing} '}}')"
        )));
    }
    Ok(())
}

pub struct ArtifactFactory;

impl Factory for ArtifactFactory {
    type Entity = Artifact;
    type Desc = ArtifactDesc;

    fn create(desc: ArtifactDesc) -> TypesResult<Artifact> {
        let mut artifact = Artifact {
            meta: EntityMeta::new(),
            title: String::new(),
            data: Data::Local { value: Bytes::new() },
            automated_download: false,
            access_counter: 0,
            byte_size: 0,
            checksum: None,
            remote_id: None,
            remote_address: None,
        };
        Self::update(&mut artifact, desc)?;
        Ok(artifact)
    }

    fn update(artifact: &mut Artifact, desc: ArtifactDesc) -> TypesResult<bool> {
        if let Some(url) = &desc.access_url {
            validate_access_url(url)?;
        }

        let mut changed = false;
        set_if_changed(&mut artifact.title, desc.title.unwrap_or_default(), &mut changed);
        set_if_changed(
            &mut artifact.automated_download,
            desc.automated_download,
            &mut changed,
        );
        set_if_changed(&mut artifact.remote_id, desc.remote_id, &mut changed);
        set_if_changed(&mut artifact.remote_address, desc.remote_address, &mut changed);

        match desc.access_url {
            Some(access_url) => {
                let data = Data::Remote {
                    access_url,
                    credentials: desc.basic_auth,
                };
                if artifact.data != data {
                    artifact.data = data;
                    artifact.byte_size = 0;
                    artifact.checksum = None;
                    changed = true;
                }
            }
            None => {
                let value = match (desc.value, &artifact.data) {
                    (Some(value), _) => value,
                    (None, Data::Local { value }) => value.clone(),
                    (None, Data::Remote { .. }) => Bytes::new(),
                };
                let unchanged = matches!(&artifact.data, Data::Local { value: v } if *v == value)
                    && artifact.checksum.is_some();
                if !unchanged {
                    artifact.set_local_data(value);
                    changed = true;
                }
            }
        }

        Ok(changed)
    }
}
