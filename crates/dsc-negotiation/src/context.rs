use crate::clearing_house::{ClearingHouse, NoopClearingHouse};
use crate::config::NegotiationConfig;
use crate::error::NegotiationResult;
use crate::locks::KeyedLocks;
use crate::notifier::SubscriberNotifier;
use crate::updates::NotifyOnDataUpdate;
use dsc_linker::Relations;
use dsc_policy::{PolicyDecisionPoint, PolicyGate};
use dsc_resolver::{ArtifactPuller, ArtifactResolver, HttpFetcher};
use dsc_store::ConnectorStore;
use dsc_types::{JsonSerializer, SelfLinkResolver, Serializer};
use std::sync::Arc;

/// Everything the message handlers work with, wired once at startup and
/// shared by reference.
pub struct ConnectorContext {
    pub config: NegotiationConfig,
    pub store: ConnectorStore,
    pub relations: Relations,
    pub gate: PolicyGate,
    pub resolver: ArtifactResolver,
    pub serializer: Arc<dyn Serializer>,
    pub self_links: SelfLinkResolver,
    pub clearing_house: Arc<dyn ClearingHouse>,
    pub notifier: SubscriberNotifier,
    pub locks: KeyedLocks,
}

impl ConnectorContext {
    pub fn new(
        config: NegotiationConfig,
        store: ConnectorStore,
        pdp: Arc<dyn PolicyDecisionPoint>,
        fetcher: Arc<dyn HttpFetcher>,
        puller: Arc<dyn ArtifactPuller>,
    ) -> NegotiationResult<Self> {
        let relations = Relations::new(&store);
        let notifier = SubscriberNotifier::new(
            store.subscriptions.clone(),
            store.artifacts.clone(),
            config.notification,
        )?;
        let self_links = SelfLinkResolver::new(config.base_url.clone());
        let resolver = ArtifactResolver::new(&store, &relations, fetcher, puller).with_listener(
            Arc::new(NotifyOnDataUpdate::new(notifier.clone(), self_links.clone())),
        );

        Ok(Self {
            config,
            store,
            relations,
            gate: PolicyGate::new(pdp),
            resolver,
            serializer: Arc::new(JsonSerializer),
            self_links,
            clearing_house: Arc::new(NoopClearingHouse),
            notifier,
            locks: KeyedLocks::new(),
        })
    }

    pub fn with_clearing_house(mut self, clearing_house: Arc<dyn ClearingHouse>) -> Self {
        self.clearing_house = clearing_house;
        self
    }

    pub fn with_serializer(mut self, serializer: Arc<dyn Serializer>) -> Self {
        self.serializer = serializer;
        self
    }
}
