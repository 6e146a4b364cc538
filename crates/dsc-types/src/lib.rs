//! Core type definitions for the dataspace connector.
//!
//! This crate holds the connector's data model (catalogs, resources,
//! representations, artifacts, contracts, agreements, subscriptions), the
//! factories that create and update them from descriptions, the protocol
//! message vocabulary exchanged with other connectors, and the usage-rule
//! model with its structural comparison. No storage or network logic lives
//! here; every other connector crate depends on this one.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod document;
pub mod entity;
pub mod error;
pub mod message;
pub mod model;
pub mod rule;
pub mod self_link;
pub mod serializer;

pub use document::{ConnectorDescription, ContractDocument, Document, DocumentKind};
pub use entity::{Entity, EntityKind, EntityMeta};
pub use error::{TypesError, TypesResult};
pub use message::{
    Envelope, MessageHeader, MessageKind, MessageResponse, Payload, QueryInput, RejectionReason,
};
pub use model::{
    Agreement, AgreementDesc, AgreementFactory, Artifact, ArtifactDesc, ArtifactFactory,
    BasicAuth, Catalog, CatalogDesc, CatalogFactory, Contract, ContractDesc, ContractFactory,
    ContractRule, ContractRuleDesc, ContractRuleFactory, Data, Factory, Representation,
    RepresentationDesc, RepresentationFactory, Resource, ResourceDesc, ResourceFactory,
    ResourceKind, Subscription, SubscriptionDesc, SubscriptionFactory,
};
pub use rule::{rule_sets_equal, Constraint, RuleKind, UsageRule};
pub use self_link::SelfLinkResolver;
pub use serializer::{JsonSerializer, Serializer};

/// Connector URIs, self-links and rule targets.
pub type Uri = url::Url;
