//! Handlers for the inbound message types.

mod artifact;
mod contract_agreement;
mod contract_request;
mod description;

pub use artifact::ArtifactRequestHandler;
pub use contract_agreement::ContractAgreementHandler;
pub use contract_request::ContractRequestHandler;
pub use description::DescriptionRequestHandler;

use crate::context::ConnectorContext;
use crate::error::{NegotiationError, NegotiationResult};
use async_trait::async_trait;
use dsc_types::{Document, DocumentKind, Envelope, MessageKind, Payload};

/// Successful outcome of a handler: the response kind and its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub kind: MessageKind,
    pub payload: Payload,
}

impl Reply {
    pub fn new(kind: MessageKind, payload: Payload) -> Self {
        Self { kind, payload }
    }
}

/// Handles one inbound message type.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// The inbound message type this handler is registered for.
    fn kind(&self) -> MessageKind;

    /// Kind of the error response sent when handling fails.
    fn rejection_kind(&self) -> MessageKind {
        MessageKind::Rejection
    }

    async fn handle(&self, ctx: &ConnectorContext, message: &Envelope) -> NegotiationResult<Reply>;
}

/// The payload of `message` as text, failing if it is missing or blank.
pub(crate) fn required_payload(message: &Envelope) -> NegotiationResult<&str> {
    match &message.payload {
        Some(payload) if !payload.is_empty() => payload
            .as_text()
            .ok_or_else(|| NegotiationError::MalformedRequest("payload is not text".into())),
        _ => Err(NegotiationError::MalformedRequest(
            "missing message payload".into(),
        )),
    }
}

/// Decode `raw` as a document of `kind`.
pub(crate) fn decode(
    ctx: &ConnectorContext,
    raw: &str,
    kind: DocumentKind,
) -> NegotiationResult<Document> {
    ctx.serializer
        .deserialize(raw, kind)
        .map_err(|e| NegotiationError::MalformedRequest(e.to_string()))
}

/// Serialize an outbound document. Failing here is our fault, not the peer's.
pub(crate) fn encode(ctx: &ConnectorContext, document: &Document) -> NegotiationResult<Payload> {
    ctx.serializer
        .serialize(document)
        .map(Payload::text)
        .map_err(|e| NegotiationError::Internal(e.to_string()))
}
