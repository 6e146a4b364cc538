use crate::entity::{Entity, EntityKind};
use crate::error::{TypesError, TypesResult};
use crate::Uri;
use uuid::Uuid;

/// Translates between internal record ids and externally addressable
/// self-links of the form `{base}/api/{segment}/{id}`.
#[derive(Debug, Clone)]
pub struct SelfLinkResolver {
    base: Uri,
}

impl SelfLinkResolver {
    pub fn new(base: Uri) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &Uri {
        &self.base
    }

    pub fn resolve<E: Entity>(&self, entity: &E) -> TypesResult<Uri> {
        self.link(entity.link_segment(), entity.id())
    }

    pub fn link_for(&self, kind: EntityKind, id: Uuid) -> TypesResult<Uri> {
        self.link(kind.segment(), id)
    }

    fn link(&self, segment: &str, id: Uuid) -> TypesResult<Uri> {
        let base = self.base.as_str().trim_end_matches('/');
        Uri::parse(&format!("{base}/api/{segment}/{id}"))
            .map_err(|e| TypesError::InvalidSelfLink(format!("{base}: {e}")))
    }

    /// Extract the kind and id from a self-link. Only the last two path
    /// segments are inspected, so links minted by peers parse as well.
    pub fn parse(uri: &Uri) -> TypesResult<(EntityKind, Uuid)> {
        let mut segments = uri
            .path_segments()
            .ok_or_else(|| TypesError::InvalidSelfLink(uri.to_string()))?
            .filter(|s| !s.is_empty())
            .rev();
        let id = segments
            .next()
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| TypesError::InvalidSelfLink(uri.to_string()))?;
        let kind = segments
            .next()
            .and_then(EntityKind::from_segment)
            .ok_or_else(|| TypesError::InvalidSelfLink(uri.to_string()))?;
        Ok((kind, id))
    }

    /// Like [`SelfLinkResolver::parse`] but requires a specific kind.
    pub fn parse_as(uri: &Uri, expected: EntityKind) -> TypesResult<Uuid> {
        match Self::parse(uri)? {
            (kind, id) if kind == expected => Ok(id),
            (kind, _) => Err(TypesError::InvalidSelfLink(format!(
                "{uri} addresses a {kind}, not a {expected}"
            ))),
        }
    }
}
