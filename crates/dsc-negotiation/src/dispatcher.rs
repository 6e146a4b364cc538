use crate::context::ConnectorContext;
use crate::error::NegotiationError;
use crate::handlers::{
    ArtifactRequestHandler, ContractAgreementHandler, ContractRequestHandler,
    DescriptionRequestHandler, MessageHandler, Reply,
};
use dsc_types::{Envelope, MessageHeader, MessageKind, MessageResponse};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

/// Routes inbound messages to the handler registered for their type.
///
/// Each message runs on its own task; at most `max_concurrent_messages`
/// run at once. Every outcome, including panics, becomes a
/// [`MessageResponse`].
pub struct MessageDispatcher {
    ctx: Arc<ConnectorContext>,
    handlers: HashMap<MessageKind, Arc<dyn MessageHandler>>,
    permits: Arc<Semaphore>,
}

impl MessageDispatcher {
    /// Dispatcher without any handler.
    pub fn new(ctx: Arc<ConnectorContext>) -> Self {
        let permits = Arc::new(Semaphore::new(ctx.config.max_concurrent_messages.max(1)));
        Self {
            ctx,
            handlers: HashMap::new(),
            permits,
        }
    }

    /// Dispatcher with the description, contract request, contract
    /// agreement and artifact request handlers.
    pub fn with_default_handlers(ctx: Arc<ConnectorContext>) -> Self {
        let mut dispatcher = Self::new(ctx);
        dispatcher.register(Arc::new(DescriptionRequestHandler));
        dispatcher.register(Arc::new(ContractRequestHandler));
        dispatcher.register(Arc::new(ContractAgreementHandler));
        dispatcher.register(Arc::new(ArtifactRequestHandler));
        dispatcher
    }

    /// Register `handler`, replacing any handler for the same type.
    pub fn register(&mut self, handler: Arc<dyn MessageHandler>) {
        self.handlers.insert(handler.kind(), handler);
    }

    pub fn supports(&self, kind: MessageKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    pub fn context(&self) -> &Arc<ConnectorContext> {
        &self.ctx
    }

    pub async fn dispatch(&self, message: Envelope) -> MessageResponse {
        let kind = message.header.kind;
        debug!(
            kind = %kind,
            message_id = %message.header.id,
            issuer = %message.header.issuer_connector,
            "Dispatching message"
        );

        if !self.ctx.config.supports(&message.header.model_version) {
            let err = NegotiationError::VersionNotSupported(message.header.model_version.clone());
            return self.reject(&message.header, MessageKind::Rejection, err);
        }

        let Some(handler) = self.handlers.get(&kind).cloned() else {
            let err = NegotiationError::MalformedRequest(format!("unsupported message type {kind}"));
            return self.reject(&message.header, MessageKind::Rejection, err);
        };
        let rejection_kind = handler.rejection_kind();

        let permit = match self.permits.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                let err = NegotiationError::Internal("dispatcher is shutting down".into());
                return self.reject(&message.header, rejection_kind, err);
            }
        };

        let ctx = self.ctx.clone();
        let header = message.header.clone();
        let outcome = tokio::spawn(async move {
            let _permit = permit;
            handler.handle(&ctx, &message).await
        })
        .await;

        match outcome {
            Ok(Ok(reply)) => self.respond(&header, reply),
            Ok(Err(err)) => self.reject(&header, rejection_kind, err),
            Err(join) => {
                let err = NegotiationError::Internal(format!("handler task failed: {join}"));
                self.reject(&header, rejection_kind, err)
            }
        }
    }

    fn response_header(&self, inbound: &MessageHeader, kind: MessageKind) -> MessageHeader {
        MessageHeader::new(
            kind,
            self.ctx.config.connector_id.clone(),
            self.ctx.config.model_version.clone(),
        )
        .with_recipient(inbound.issuer_connector.clone())
        .with_correlation(inbound.id)
    }

    fn respond(&self, inbound: &MessageHeader, reply: Reply) -> MessageResponse {
        MessageResponse::Body {
            header: self.response_header(inbound, reply.kind),
            payload: reply.payload,
        }
    }

    fn reject(
        &self,
        inbound: &MessageHeader,
        kind: MessageKind,
        err: NegotiationError,
    ) -> MessageResponse {
        let reason = err.rejection_reason();
        match &err {
            NegotiationError::Internal(detail) => error!(
                kind = %inbound.kind,
                message_id = %inbound.id,
                detail = %detail,
                "Message handling failed"
            ),
            _ => warn!(
                kind = %inbound.kind,
                message_id = %inbound.id,
                reason = %reason,
                error = %err,
                "Message rejected"
            ),
        }
        MessageResponse::Error {
            header: self.response_header(inbound, kind),
            reason,
            message: err.public_message(),
        }
    }
}
