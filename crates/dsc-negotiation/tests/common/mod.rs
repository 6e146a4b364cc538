#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dsc_negotiation::{
    ClearingHouse, ConnectorContext, MessageDispatcher, NegotiationConfig, NegotiationResult,
};
use dsc_policy::MockDecisionPoint;
use dsc_resolver::{ArtifactPuller, PullRequest, ReqwestFetcher, ResolverError, ResolverResult};
use dsc_store::{ConnectorStore, Repository};
use dsc_types::{
    ArtifactDesc, ArtifactFactory, Catalog, CatalogDesc, CatalogFactory, ContractDesc,
    ContractDocument, ContractFactory, ContractRuleDesc, ContractRuleFactory, Document,
    DocumentKind, Entity, Envelope, Factory, JsonSerializer, MessageHeader, MessageKind,
    MessageResponse, Payload, RepresentationDesc, RepresentationFactory, ResourceDesc,
    ResourceFactory, Serializer, Uri, UsageRule,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

pub const VERSION: &str = "4.2.0";

pub fn uri(s: &str) -> Uri {
    Uri::parse(s).unwrap()
}

pub fn provider_id() -> Uri {
    uri("https://provider.example")
}

pub fn consumer_id() -> Uri {
    uri("https://consumer.example")
}

/// Providers never pull in these tests.
pub struct NoPull;

#[async_trait]
impl ArtifactPuller for NoPull {
    async fn pull(&self, _request: &PullRequest) -> ResolverResult<Bytes> {
        Err(ResolverError::Remote("pulling is disabled".into()))
    }
}

/// Clearing house remembering what it was sent.
#[derive(Default)]
pub struct RecordingClearingHouse {
    pub sent: Mutex<Vec<Uri>>,
}

#[async_trait]
impl ClearingHouse for RecordingClearingHouse {
    async fn send(&self, agreement: &Uri, _document: &str) -> NegotiationResult<()> {
        self.sent.lock().unwrap().push(agreement.clone());
        Ok(())
    }
}

/// One offered artifact with its surrounding graph.
pub struct Offer {
    pub artifact: Uuid,
    pub link: Uri,
    pub representation: Uuid,
    pub resource: Uuid,
    pub rules: Vec<UsageRule>,
}

pub struct Provider {
    pub ctx: Arc<ConnectorContext>,
    pub dispatcher: MessageDispatcher,
    pub pdp: Arc<MockDecisionPoint>,
    pub clearing_house: Arc<RecordingClearingHouse>,
    pub catalog: Uuid,
}

impl Provider {
    pub async fn new() -> Self {
        Self::configured(MockDecisionPoint::permit_all(), |_| {}).await
    }

    pub async fn configured(
        pdp: MockDecisionPoint,
        configure: impl FnOnce(&mut NegotiationConfig),
    ) -> Self {
        let mut config = NegotiationConfig::new(provider_id(), provider_id());
        configure(&mut config);

        let pdp = Arc::new(pdp);
        let clearing_house = Arc::new(RecordingClearingHouse::default());
        let ctx = ConnectorContext::new(
            config,
            ConnectorStore::in_memory(),
            pdp.clone(),
            Arc::new(ReqwestFetcher::new(Duration::from_secs(5)).unwrap()),
            Arc::new(NoPull),
        )
        .unwrap()
        .with_clearing_house(clearing_house.clone());
        let ctx = Arc::new(ctx);

        let catalog: Catalog = CatalogFactory::create(CatalogDesc {
            title: Some("weather".into()),
            description: None,
        })
        .unwrap();
        let catalog = ctx.store.catalogs.save(catalog).await.unwrap().id();

        Self {
            dispatcher: MessageDispatcher::with_default_handlers(ctx.clone()),
            ctx,
            pdp,
            clearing_house,
            catalog,
        }
    }

    pub async fn offer(&self, value: &str) -> Offer {
        self.offer_restricted(value, None, None).await
    }

    /// Offer `value` under a single permission, optionally restricted to a
    /// consumer and ending at `end`.
    pub async fn offer_restricted(
        &self,
        value: &str,
        consumer: Option<Uri>,
        end: Option<DateTime<Utc>>,
    ) -> Offer {
        let store = &self.ctx.store;
        let relations = &self.ctx.relations;

        let artifact = ArtifactFactory::create(ArtifactDesc::local("data", value.to_string())).unwrap();
        let artifact = store.artifacts.save(artifact).await.unwrap();
        let link = self.ctx.self_links.resolve(&artifact).unwrap();

        let representation = RepresentationFactory::create(RepresentationDesc {
            media_type: Some("text/plain".into()),
            ..RepresentationDesc::default()
        })
        .unwrap();
        let representation = store.representations.save(representation).await.unwrap().id();

        let resource = ResourceFactory::create(ResourceDesc::offered("weather data")).unwrap();
        let resource = store.resources.save(resource).await.unwrap().id();

        let contract = ContractFactory::create(ContractDesc {
            title: Some("standard offer".into()),
            consumer,
            end,
            ..ContractDesc::default()
        })
        .unwrap();
        let contract = store.contracts.save(contract).await.unwrap().id();

        let rules = vec![UsageRule::permission(link.clone())];
        let mut rule_ids = Vec::new();
        for rule in &rules {
            let stored = ContractRuleFactory::create(ContractRuleDesc::from_rule("use", rule).unwrap())
                .unwrap();
            rule_ids.push(store.rules.save(stored).await.unwrap().id());
        }

        relations
            .catalog_offered_resources
            .add(self.catalog, &[resource])
            .await
            .unwrap();
        relations
            .resource_representations
            .add(resource, &[representation])
            .await
            .unwrap();
        relations
            .representation_artifacts
            .add(representation, &[artifact.id()])
            .await
            .unwrap();
        relations
            .resource_contracts
            .add(resource, &[contract])
            .await
            .unwrap();
        relations.contract_rules.add(contract, &rule_ids).await.unwrap();

        Offer {
            artifact: artifact.id(),
            link,
            representation,
            resource,
            rules,
        }
    }

    pub async fn send(&self, message: Envelope) -> MessageResponse {
        self.dispatcher.dispatch(message).await
    }

    /// Negotiate `rules` as the consumer and return the agreement document.
    pub async fn negotiate(&self, rules: Vec<UsageRule>) -> ContractDocument {
        let response = self.send(contract_request(rules, None)).await;
        assert_eq!(response.rejection_reason(), None, "negotiation failed: {response:?}");
        assert_eq!(response.header().kind, MessageKind::ContractAgreement);
        decode_contract(&response, DocumentKind::ContractAgreement)
    }

    pub async fn access_counter(&self, artifact: Uuid) -> u64 {
        self.ctx
            .store
            .artifacts
            .get(artifact)
            .await
            .unwrap()
            .unwrap()
            .access_counter
    }

    pub async fn agreement_count(&self) -> usize {
        self.ctx
            .store
            .agreements
            .list(Default::default())
            .await
            .unwrap()
            .len()
    }
}

pub fn header(kind: MessageKind) -> MessageHeader {
    MessageHeader::new(kind, consumer_id(), VERSION).with_recipient(provider_id())
}

pub fn contract_request(rules: Vec<UsageRule>, end: Option<DateTime<Utc>>) -> Envelope {
    let mut document =
        ContractDocument::new(uri("https://consumer.example/api/requests/1")).with_rules(rules);
    document.contract_end = end;
    let payload = JsonSerializer
        .serialize(&Document::ContractRequest(document))
        .unwrap();
    Envelope::new(header(MessageKind::ContractRequest)).with_payload(Payload::text(payload))
}

pub fn agreement_echo(agreement: &ContractDocument) -> Envelope {
    let payload = JsonSerializer
        .serialize(&Document::ContractAgreement(agreement.clone()))
        .unwrap();
    Envelope::new(header(MessageKind::ContractAgreement)).with_payload(Payload::text(payload))
}

pub fn artifact_request(artifact: &Uri, contract: Option<&Uri>) -> Envelope {
    let mut header = header(MessageKind::ArtifactRequest).with_requested_artifact(artifact.clone());
    if let Some(contract) = contract {
        header = header.with_transfer_contract(contract.clone());
    }
    Envelope::new(header)
}

pub fn payload_text(response: &MessageResponse) -> String {
    response
        .payload()
        .and_then(|p| p.as_text())
        .unwrap_or_else(|| panic!("expected a text body, got {response:?}"))
        .to_string()
}

pub fn decode(response: &MessageResponse, kind: DocumentKind) -> Document {
    JsonSerializer.deserialize(&payload_text(response), kind).unwrap()
}

pub fn decode_contract(response: &MessageResponse, kind: DocumentKind) -> ContractDocument {
    decode(response, kind).into_contract().unwrap()
}
