use thiserror::Error;

pub type TypesResult<T> = Result<T, TypesError>;

/// Errors raised while building or decoding connector types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypesError {
    /// Input could not be interpreted (undecodable payload, wrong document kind).
    #[error("illegal argument: {0}")]
    IllegalArgument(String),

    /// A description violates an entity invariant.
    #[error("invalid resource: {0}")]
    InvalidResource(String),

    #[error("invalid self-link: {0}")]
    InvalidSelfLink(String),
}
