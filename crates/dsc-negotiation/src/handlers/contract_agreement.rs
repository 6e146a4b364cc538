use super::{decode, required_payload, MessageHandler, Reply};
use crate::context::ConnectorContext;
use crate::error::{NegotiationError, NegotiationResult};
use async_trait::async_trait;
use dsc_store::Repository;
use dsc_types::{
    rule_sets_equal, Agreement, DocumentKind, EntityKind, Envelope, MessageKind, Payload,
    SelfLinkResolver,
};
use tracing::{info, warn};

/// Confirms an agreement once the consumer echoes it back unchanged.
pub struct ContractAgreementHandler;

#[async_trait]
impl MessageHandler for ContractAgreementHandler {
    fn kind(&self) -> MessageKind {
        MessageKind::ContractAgreement
    }

    async fn handle(&self, ctx: &ConnectorContext, message: &Envelope) -> NegotiationResult<Reply> {
        let raw = required_payload(message)?;
        let received = decode(ctx, raw, DocumentKind::ContractAgreement)?
            .into_contract()
            .ok_or_else(|| NegotiationError::MalformedRequest("not a contract agreement".into()))?;

        let id = SelfLinkResolver::parse_as(&received.id, EntityKind::Agreement)
            .map_err(|_| NegotiationError::NotFound(format!("agreement {}", received.id)))?;

        // Unknown ids are rejected before they can claim a lock entry.
        if !ctx.store.agreements.exists(id).await? {
            return Err(NegotiationError::NotFound(format!("agreement {id}")));
        }

        let _guard = ctx.locks.lock(id).await;
        let stored = ctx
            .store
            .agreements
            .get(id)
            .await?
            .ok_or_else(|| NegotiationError::NotFound(format!("agreement {id}")))?;

        let stored_document = ctx
            .serializer
            .deserialize(&stored.value, DocumentKind::ContractAgreement)
            .ok()
            .and_then(|document| document.into_contract())
            .ok_or_else(|| NegotiationError::Internal(format!("stored agreement {id} is unreadable")))?;

        if !rule_sets_equal(&stored_document.rules, &received.rules) {
            warn!(
                agreement_id = %id,
                issuer = %message.header.issuer_connector,
                "Echoed agreement differs from stored one"
            );
            return Err(NegotiationError::Conflict(format!(
                "agreement {} does not match the stored agreement",
                received.id
            )));
        }

        if !stored.confirmed {
            ctx.store
                .agreements
                .modify(
                    id,
                    Box::new(|agreement: &mut Agreement| {
                        agreement.confirmed = true;
                        Ok(())
                    }),
                )
                .await?;
            info!(agreement_id = %id, "Agreement confirmed");
        }

        let clearing_house = ctx.clearing_house.clone();
        let agreement = received.id.clone();
        let document = stored.value.clone();
        tokio::spawn(async move {
            if let Err(e) = clearing_house.send(&agreement, &document).await {
                warn!(agreement = %agreement, error = %e, "Clearing house logging failed");
            }
        });

        Ok(Reply::new(
            MessageKind::MessageProcessedNotification,
            Payload::text(""),
        ))
    }
}
