use thiserror::Error;

pub type PolicyResult<T> = Result<T, PolicyError>;

/// Failures talking to a policy decision point.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("policy decision point unavailable: {0}")]
    Unavailable(String),

    #[error("policy could not be evaluated: {0}")]
    Evaluation(String),
}
