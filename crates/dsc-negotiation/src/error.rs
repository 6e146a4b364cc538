use dsc_linker::LinkError;
use dsc_resolver::ResolverError;
use dsc_store::StorageError;
use dsc_types::RejectionReason;
use thiserror::Error;

pub type NegotiationResult<T> = Result<T, NegotiationError>;

/// Failure while handling one inbound message.
///
/// Every variant maps to exactly one [`RejectionReason`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NegotiationError {
    #[error("unsupported model version: {0}")]
    VersionNotSupported(String),

    /// Missing or undecodable parts of the request.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The request contradicts stored state, e.g. mismatching rules or an
    /// unusable agreement.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl NegotiationError {
    pub fn rejection_reason(&self) -> RejectionReason {
        match self {
            NegotiationError::VersionNotSupported(_) => RejectionReason::VersionNotSupported,
            NegotiationError::MalformedRequest(_) => RejectionReason::BadParameters,
            NegotiationError::NotFound(_) => RejectionReason::NotFound,
            NegotiationError::Unauthorized(_) => RejectionReason::NotAuthorized,
            NegotiationError::Conflict(_) => RejectionReason::BadParameters,
            NegotiationError::Internal(_) => RejectionReason::InternalRecipientError,
        }
    }

    /// Message safe to hand to the peer. Internal details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            NegotiationError::Internal(_) => "internal recipient error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<StorageError> for NegotiationError {
    fn from(e: StorageError) -> Self {
        NegotiationError::Internal(e.to_string())
    }
}

impl From<LinkError> for NegotiationError {
    fn from(e: LinkError) -> Self {
        match e {
            LinkError::ResourceNotFound { kind, id } => {
                NegotiationError::NotFound(format!("{kind} {id}"))
            }
            LinkError::Storage(e) => e.into(),
        }
    }
}

impl From<ResolverError> for NegotiationError {
    fn from(e: ResolverError) -> Self {
        match e {
            ResolverError::ResourceNotFound(what) => NegotiationError::NotFound(what),
            other => NegotiationError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_details_are_not_public() {
        let err = NegotiationError::Internal("db password rejected".into());
        assert_eq!(err.rejection_reason(), RejectionReason::InternalRecipientError);
        assert!(!err.public_message().contains("password"));

        let err = NegotiationError::Conflict("rules differ".into());
        assert_eq!(err.rejection_reason(), RejectionReason::BadParameters);
        assert!(err.public_message().contains("rules differ"));
    }

    #[test]
    fn resolver_failures_split_into_not_found_and_internal() {
        let err: NegotiationError = ResolverError::ResourceNotFound("artifact 1".into()).into();
        assert_eq!(err.rejection_reason(), RejectionReason::NotFound);

        let err: NegotiationError = ResolverError::Resource("backend answered 503".into()).into();
        assert_eq!(err.rejection_reason(), RejectionReason::InternalRecipientError);

        let err: NegotiationError = ResolverError::Remote("provider unreachable".into()).into();
        assert_eq!(err.rejection_reason(), RejectionReason::InternalRecipientError);
    }
}
