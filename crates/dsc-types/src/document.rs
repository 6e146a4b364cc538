//! Protocol-visible documents carried as message payloads.
//!
//! Documents reference connector records only through self-links; internal
//! identifiers never leave the connector.

use crate::rule::UsageRule;
use crate::Uri;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    Connector,
    Catalog,
    Resource,
    Representation,
    Artifact,
    ContractOffer,
    ContractRequest,
    ContractAgreement,
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DocumentKind::Connector => "connector",
            DocumentKind::Catalog => "catalog",
            DocumentKind::Resource => "resource",
            DocumentKind::Representation => "representation",
            DocumentKind::Artifact => "artifact",
            DocumentKind::ContractOffer => "contract offer",
            DocumentKind::ContractRequest => "contract request",
            DocumentKind::ContractAgreement => "contract agreement",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum Document {
    #[serde(rename = "ids:BaseConnector")]
    Connector(ConnectorDescription),
    #[serde(rename = "ids:ResourceCatalog")]
    Catalog(CatalogDescription),
    #[serde(rename = "ids:Resource")]
    Resource(ResourceDescription),
    #[serde(rename = "ids:Representation")]
    Representation(RepresentationDescription),
    #[serde(rename = "ids:Artifact")]
    Artifact(ArtifactDescription),
    #[serde(rename = "ids:ContractOffer")]
    ContractOffer(ContractDocument),
    #[serde(rename = "ids:ContractRequest")]
    ContractRequest(ContractDocument),
    #[serde(rename = "ids:ContractAgreement")]
    ContractAgreement(ContractDocument),
}

impl Document {
    pub fn kind(&self) -> DocumentKind {
        match self {
            Document::Connector(_) => DocumentKind::Connector,
            Document::Catalog(_) => DocumentKind::Catalog,
            Document::Resource(_) => DocumentKind::Resource,
            Document::Representation(_) => DocumentKind::Representation,
            Document::Artifact(_) => DocumentKind::Artifact,
            Document::ContractOffer(_) => DocumentKind::ContractOffer,
            Document::ContractRequest(_) => DocumentKind::ContractRequest,
            Document::ContractAgreement(_) => DocumentKind::ContractAgreement,
        }
    }

    /// The contract body of offer, request and agreement documents.
    pub fn into_contract(self) -> Option<ContractDocument> {
        match self {
            Document::ContractOffer(doc)
            | Document::ContractRequest(doc)
            | Document::ContractAgreement(doc) => Some(doc),
            _ => None,
        }
    }
}

/// Self-description of a connector including its offered catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorDescription {
    #[serde(rename = "@id")]
    pub id: Uri,
    pub title: String,
    pub model_version: String,
    #[serde(default)]
    pub catalogs: Vec<CatalogDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogDescription {
    #[serde(rename = "@id")]
    pub id: Uri,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub offered_resources: Vec<ResourceDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescription {
    #[serde(rename = "@id")]
    pub id: Uri,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub publisher: Option<Uri>,
    pub license: Option<Uri>,
    pub sovereign: Option<Uri>,
    pub language: String,
    pub endpoint_documentation: Option<Uri>,
    pub version: u64,
    #[serde(default)]
    pub representations: Vec<RepresentationDescription>,
    #[serde(default)]
    pub contract_offers: Vec<ContractDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepresentationDescription {
    #[serde(rename = "@id")]
    pub id: Uri,
    pub title: String,
    pub media_type: String,
    pub language: String,
    pub standard: String,
    #[serde(default)]
    pub instances: Vec<ArtifactDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactDescription {
    #[serde(rename = "@id")]
    pub id: Uri,
    pub title: String,
    pub byte_size: u64,
    pub checksum: Option<String>,
    pub creation_date: DateTime<Utc>,
}

/// Body shared by contract offers, requests and agreements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractDocument {
    #[serde(rename = "@id")]
    pub id: Uri,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer: Option<Uri>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<Uri>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rules: Vec<UsageRule>,
}

impl ContractDocument {
    pub fn new(id: Uri) -> Self {
        Self {
            id,
            consumer: None,
            provider: None,
            contract_date: None,
            contract_start: None,
            contract_end: None,
            rules: Vec::new(),
        }
    }

    pub fn with_rules(mut self, rules: Vec<UsageRule>) -> Self {
        self.rules = rules;
        self
    }

    /// Whether the document has expired at `at`. Without an end it never does.
    pub fn is_expired_at(&self, at: DateTime<Utc>) -> bool {
        self.contract_end.map_or(false, |end| end < at)
    }
}
