use super::{MessageHandler, Reply};
use crate::context::ConnectorContext;
use crate::description::DescriptionBuilder;
use crate::error::{NegotiationError, NegotiationResult};
use async_trait::async_trait;
use chrono::Utc;
use dsc_policy::{PolicyContext, PolicyDecision};
use dsc_store::{QueryWindow, Repository};
use dsc_types::{
    Agreement, DocumentKind, Entity, EntityKind, Envelope, MessageKind, Payload, QueryInput,
    SelfLinkResolver, Uri, UsageRule,
};
use tracing::{debug, warn};
use uuid::Uuid;

/// Delivers artifact data to a peer holding a valid transfer contract.
///
/// Checks run in a fixed order: the artifact, the transfer contract, then
/// the usage policy. Data is only read once all of them pass.
pub struct ArtifactRequestHandler;

#[async_trait]
impl MessageHandler for ArtifactRequestHandler {
    fn kind(&self) -> MessageKind {
        MessageKind::ArtifactRequest
    }

    async fn handle(&self, ctx: &ConnectorContext, message: &Envelope) -> NegotiationResult<Reply> {
        let header = &message.header;
        let issuer = &header.issuer_connector;
        let requested = header.requested_artifact.as_ref().ok_or_else(|| {
            NegotiationError::MalformedRequest("missing requested artifact".into())
        })?;

        let artifact_id = SelfLinkResolver::parse_as(requested, EntityKind::Artifact)
            .map_err(|_| NegotiationError::NotFound(format!("artifact {requested}")))?;
        let artifact = ctx
            .store
            .artifacts
            .get(artifact_id)
            .await?
            .ok_or_else(|| NegotiationError::NotFound(format!("artifact {requested}")))?;

        let rules = match &header.transfer_contract {
            Some(contract) => validate_transfer_contract(ctx, contract, artifact_id, issuer).await?,
            None if ctx.config.negotiation_required => {
                return Err(NegotiationError::MalformedRequest(
                    "missing transfer contract".into(),
                ));
            }
            None => offered_rules(ctx, artifact_id).await?,
        };

        let mut policy = PolicyContext::new(rules, issuer.clone(), requested.clone())
            .with_access_count(artifact.access_counter);
        if let Some(contract) = &header.transfer_contract {
            policy = policy.with_agreement(contract.clone());
        }
        if let PolicyDecision::Deny(reason) = ctx.gate.evaluate(&policy).await {
            return Err(NegotiationError::Unauthorized(reason));
        }

        let query = query_input(message)?;
        let data = ctx
            .resolver
            .get_data(artifact_id, query.as_ref(), None)
            .await?;
        debug!(artifact_id = %artifact_id, bytes = data.len(), "Artifact delivered");

        Ok(Reply::new(
            MessageKind::ArtifactResponse,
            Payload::from_bytes(&data),
        ))
    }
}

/// Check the presented agreement and return its rules.
async fn validate_transfer_contract(
    ctx: &ConnectorContext,
    contract: &Uri,
    artifact: Uuid,
    issuer: &Uri,
) -> NegotiationResult<Vec<UsageRule>> {
    let reject = |why: &str| {
        warn!(contract = %contract, artifact_id = %artifact, reason = why, "Transfer contract rejected");
        NegotiationError::Conflict(format!("transfer contract {contract}: {why}"))
    };

    let id = SelfLinkResolver::parse_as(contract, EntityKind::Agreement)
        .map_err(|_| reject("not an agreement"))?;
    let agreement: Agreement = ctx
        .store
        .agreements
        .get(id)
        .await?
        .ok_or_else(|| reject("unknown agreement"))?;

    let governed = ctx.relations.agreement_artifacts.get_ids(id).await?;
    if !governed.contains(&artifact) {
        return Err(reject("artifact is not covered"));
    }
    if agreement.archived {
        return Err(reject("agreement is archived"));
    }
    if ctx.config.require_confirmed_agreement && !agreement.confirmed {
        return Err(reject("agreement is not confirmed"));
    }

    let document = ctx
        .serializer
        .deserialize(&agreement.value, DocumentKind::ContractAgreement)
        .ok()
        .and_then(|document| document.into_contract())
        .ok_or_else(|| NegotiationError::Internal(format!("stored agreement {id} is unreadable")))?;
    if document.is_expired_at(Utc::now()) {
        return Err(reject("agreement has expired"));
    }
    if document.consumer.as_ref() != Some(issuer) {
        return Err(reject("issuer is not the consumer"));
    }
    Ok(document.rules)
}

/// Rules of every offer covering the artifact, used when no agreement is
/// presented.
async fn offered_rules(ctx: &ConnectorContext, artifact: Uuid) -> NegotiationResult<Vec<UsageRule>> {
    let builder = DescriptionBuilder::new(ctx);
    let relations = &ctx.relations;
    let mut rules = Vec::new();
    for representation in relations
        .artifact_representations
        .get(artifact, QueryWindow::all())
        .await?
    {
        for resource in relations
            .representation_resources
            .get(representation.id(), QueryWindow::all())
            .await?
        {
            for contract in relations
                .resource_contracts
                .get(resource.id(), QueryWindow::all())
                .await?
            {
                rules.extend(builder.contract_rules(contract.id()).await?);
            }
        }
    }
    Ok(rules)
}

/// Backend query parameters sent as JSON payload, if any.
fn query_input(message: &Envelope) -> NegotiationResult<Option<QueryInput>> {
    let Some(payload) = message.payload.as_ref().filter(|p| !p.is_empty()) else {
        return Ok(None);
    };
    let raw = payload
        .as_text()
        .ok_or_else(|| NegotiationError::MalformedRequest("query input is not text".into()))?;
    serde_json::from_str(raw)
        .map(Some)
        .map_err(|e| NegotiationError::MalformedRequest(format!("invalid query input: {e}")))
}
