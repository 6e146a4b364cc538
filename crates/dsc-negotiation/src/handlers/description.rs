use super::{encode, MessageHandler, Reply};
use crate::context::ConnectorContext;
use crate::description::DescriptionBuilder;
use crate::error::NegotiationResult;
use async_trait::async_trait;
use dsc_types::{Document, Envelope, MessageKind};
use tracing::debug;

/// Answers description requests with the connector's self-description or
/// the description of one requested element.
pub struct DescriptionRequestHandler;

#[async_trait]
impl MessageHandler for DescriptionRequestHandler {
    fn kind(&self) -> MessageKind {
        MessageKind::DescriptionRequest
    }

    async fn handle(&self, ctx: &ConnectorContext, message: &Envelope) -> NegotiationResult<Reply> {
        let builder = DescriptionBuilder::new(ctx);
        let document = match &message.header.requested_element {
            Some(element) => {
                debug!(element = %element, "Describing requested element");
                builder.element(element).await?
            }
            None => {
                debug!("Describing connector");
                Document::Connector(builder.connector().await?)
            }
        };
        Ok(Reply::new(
            MessageKind::DescriptionResponse,
            encode(ctx, &document)?,
        ))
    }
}
