use dsc_linker::LinkError;
use dsc_store::StorageError;
use thiserror::Error;

pub type ResolverResult<T> = Result<T, ResolverError>;

#[derive(Debug, Error)]
pub enum ResolverError {
    /// The artifact does not exist.
    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    /// The data source is missing, malformed, unreachable or answered with
    /// an error status.
    #[error("resource error: {0}")]
    Resource(String),

    /// The artifact description violates an invariant.
    #[error("invalid resource: {0}")]
    InvalidResource(String),

    /// Pulling the data from another connector failed.
    #[error("remote connector error: {0}")]
    Remote(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<LinkError> for ResolverError {
    fn from(e: LinkError) -> Self {
        match e {
            LinkError::ResourceNotFound { kind, id } => {
                ResolverError::ResourceNotFound(format!("{kind} {id}"))
            }
            LinkError::Storage(e) => ResolverError::Storage(e),
        }
    }
}
