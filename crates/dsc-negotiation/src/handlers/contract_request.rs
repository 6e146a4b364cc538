use super::{decode, required_payload, MessageHandler, Reply};
use crate::context::ConnectorContext;
use crate::description::DescriptionBuilder;
use crate::error::{NegotiationError, NegotiationResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dsc_store::{QueryWindow, Repository};
use dsc_types::{
    rule_sets_equal, AgreementDesc, AgreementFactory, Contract, ContractDocument, Document,
    DocumentKind, Entity, EntityKind, Envelope, Factory, MessageKind, Payload, SelfLinkResolver,
    Uri, UsageRule,
};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Turns a consumer's rule proposal into an agreement.
///
/// Matching is all-or-nothing: every targeted artifact needs an applicable
/// offer with exactly the requested rules, otherwise nothing is stored.
pub struct ContractRequestHandler;

#[async_trait]
impl MessageHandler for ContractRequestHandler {
    fn kind(&self) -> MessageKind {
        MessageKind::ContractRequest
    }

    fn rejection_kind(&self) -> MessageKind {
        MessageKind::ContractRejection
    }

    async fn handle(&self, ctx: &ConnectorContext, message: &Envelope) -> NegotiationResult<Reply> {
        let raw = required_payload(message)?;
        let request = decode(ctx, raw, DocumentKind::ContractRequest)?
            .into_contract()
            .ok_or_else(|| NegotiationError::MalformedRequest("not a contract request".into()))?;
        let issuer = &message.header.issuer_connector;

        if request.rules.is_empty() {
            return Err(NegotiationError::MalformedRequest(
                "contract request carries no rules".into(),
            ));
        }
        let targets = group_by_target(&request.rules)?;

        let mut artifacts = Vec::with_capacity(targets.len());
        for target in targets.keys() {
            let id = SelfLinkResolver::parse_as(target, EntityKind::Artifact)
                .map_err(|_| NegotiationError::NotFound(format!("artifact {target}")))?;
            if !ctx.store.artifacts.exists(id).await? {
                return Err(NegotiationError::NotFound(format!("artifact {target}")));
            }
            artifacts.push(id);
        }

        // Held until the agreement is stored and linked.
        let _guards = ctx.locks.lock_all(&artifacts).await;

        let now = Utc::now();
        let mut matched = Vec::with_capacity(targets.len());
        for ((target, rules), artifact) in targets.iter().zip(&artifacts) {
            matched.push(match_offer(ctx, *artifact, target, rules, issuer, now).await?);
        }

        // The agreement ends with the first matched offer to end, whatever
        // the consumer asked for.
        let end = matched.iter().filter_map(|offer| offer.end).min();
        if request.contract_end != end {
            debug!(requested = ?request.contract_end, granted = ?end, "Agreement end taken from offers");
        }

        let value = create_agreement(ctx, &request, issuer, now, end, &artifacts).await?;
        Ok(Reply::new(MessageKind::ContractAgreement, Payload::text(value)))
    }
}

/// Requested rules keyed by target artifact. Every rule needs a target.
fn group_by_target(rules: &[UsageRule]) -> NegotiationResult<BTreeMap<Uri, Vec<UsageRule>>> {
    let mut targets: BTreeMap<Uri, Vec<UsageRule>> = BTreeMap::new();
    for rule in rules {
        let target = rule.target.clone().ok_or_else(|| {
            NegotiationError::MalformedRequest("rule without target artifact".into())
        })?;
        targets.entry(target).or_default().push(rule.clone());
    }
    Ok(targets)
}

/// Offers reachable from an artifact through its representations and their
/// offered resources.
async fn contract_offers(ctx: &ConnectorContext, artifact: Uuid) -> NegotiationResult<Vec<Contract>> {
    let relations = &ctx.relations;
    let mut offers: Vec<Contract> = Vec::new();
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
            if !resource.kind.is_offered() {
                continue;
            }
            for contract in relations
                .resource_contracts
                .get(resource.id(), QueryWindow::all())
                .await?
            {
                if !offers.iter().any(|c| c.id() == contract.id()) {
                    offers.push(contract);
                }
            }
        }
    }
    Ok(offers)
}

async fn match_offer(
    ctx: &ConnectorContext,
    artifact: Uuid,
    target: &Uri,
    rules: &[UsageRule],
    issuer: &Uri,
    now: DateTime<Utc>,
) -> NegotiationResult<Contract> {
    let offers = contract_offers(ctx, artifact).await?;
    if offers.is_empty() {
        return Err(NegotiationError::NotFound(format!(
            "no contract offers for {target}"
        )));
    }

    let usable: Vec<_> = offers
        .into_iter()
        .filter(|offer| offer.is_valid_at(now) && offer.admits(issuer))
        .collect();
    if usable.is_empty() {
        return Err(NegotiationError::NotFound(format!(
            "no contract offer for {target} applies to {issuer}"
        )));
    }

    let builder = DescriptionBuilder::new(ctx);
    let offered = usable.len();
    for offer in usable {
        if rule_sets_equal(&builder.contract_rules(offer.id()).await?, rules) {
            debug!(artifact_id = %artifact, contract_id = %offer.id(), "Rules match offer");
            return Ok(offer);
        }
    }

    warn!(artifact_id = %artifact, offers = offered, "Requested rules match no offer");
    Err(NegotiationError::Conflict(format!(
        "rules for {target} match no contract offer"
    )))
}

/// Store the agreement, link it to the artifacts and return its serialized
/// document. A failed link removes the agreement again.
async fn create_agreement(
    ctx: &ConnectorContext,
    request: &ContractDocument,
    issuer: &Uri,
    now: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    artifacts: &[Uuid],
) -> NegotiationResult<String> {
    let internal = |e: dsc_types::TypesError| NegotiationError::Internal(e.to_string());

    let mut agreement = AgreementFactory::create(AgreementDesc::default()).map_err(internal)?;
    let link = ctx.self_links.resolve(&agreement).map_err(internal)?;

    let mut document = ContractDocument::new(link.clone()).with_rules(request.rules.clone());
    document.consumer = Some(issuer.clone());
    document.provider = Some(ctx.config.connector_id.clone());
    document.contract_date = Some(now);
    document.contract_start = Some(now);
    document.contract_end = end;
    let value = ctx
        .serializer
        .serialize(&Document::ContractAgreement(document))
        .map_err(internal)?;

    AgreementFactory::update(
        &mut agreement,
        AgreementDesc {
            remote_id: Some(link),
            confirmed: false,
            value: value.clone(),
        },
    )
    .map_err(internal)?;
    let id = ctx.store.agreements.save(agreement).await?.id();

    if let Err(e) = ctx.relations.agreement_artifacts.add(id, artifacts).await {
        warn!(agreement_id = %id, error = %e, "Linking agreement failed, removing it");
        if let Err(undo) = ctx.store.agreements.delete(id).await {
            warn!(agreement_id = %id, error = %undo, "Could not remove unlinked agreement");
        }
        return Err(NegotiationError::Internal(e.to_string()));
    }

    info!(
        agreement_id = %id,
        consumer = %issuer,
        artifacts = artifacts.len(),
        "Agreement created"
    );
    Ok(value)
}
