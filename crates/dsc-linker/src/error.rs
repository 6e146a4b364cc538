use dsc_store::StorageError;
use dsc_types::EntityKind;
use thiserror::Error;
use uuid::Uuid;

pub type LinkResult<T> = Result<T, LinkError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error("{kind} {id} not found")]
    ResourceNotFound { kind: EntityKind, id: Uuid },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
