//! Seeding the store from catalog files at startup
//!
//! A bootstrap file lists catalogs with their offered resources. Each
//! resource carries its representations with their artifacts and the
//! contracts under which the artifacts are offered. JSON and TOML are both
//! accepted; the format follows the file extension.
//!
//! ```json
//! { "catalogs": [{
//!     "id": "weather",
//!     "title": "Weather",
//!     "offers": [{
//!         "title": "Hourly readings",
//!         "representations": [{
//!             "media_type": "text/csv",
//!             "artifacts": [{ "title": "readings", "value": "t,temp\n0,11.2" }]
//!         }],
//!         "contracts": [{
//!             "title": "open use",
//!             "rules": [{ "artifact": "readings" }]
//!         }]
//!     }]
//! }]}
//! ```
//!
//! A resource without contracts is offered under one plain permission per
//! artifact. Catalog ids seen before are skipped, and unreadable files are
//! logged and skipped as well.

use crate::error::{DaemonError, DaemonResult};
use chrono::{DateTime, Utc};
use dsc_negotiation::ConnectorContext;
use dsc_store::Repository;
use dsc_types::{
    ArtifactDesc, ArtifactFactory, BasicAuth, CatalogDesc, CatalogFactory, Constraint,
    ContractDesc, ContractFactory, ContractRuleDesc, ContractRuleFactory, Entity, Factory,
    RepresentationDesc, RepresentationFactory, ResourceDesc, ResourceFactory, ResourceKind,
    RuleKind, Uri, UsageRule,
};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Contents of one bootstrap file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BootstrapFile {
    #[serde(default)]
    pub catalogs: Vec<CatalogSeed>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSeed {
    /// Identifies the catalog across bootstrap files
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub offers: Vec<OfferSeed>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OfferSeed {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub publisher: Option<Uri>,
    #[serde(default)]
    pub license: Option<Uri>,
    #[serde(default)]
    pub sovereign: Option<Uri>,
    #[serde(default)]
    pub endpoint_documentation: Option<Uri>,
    #[serde(default)]
    pub representations: Vec<RepresentationSeed>,
    #[serde(default)]
    pub contracts: Vec<ContractSeed>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepresentationSeed {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub standard: Option<String>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactSeed>,
}

/// Either inline data (`value`) or a backend read on every request
/// (`access_url`).
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactSeed {
    /// Rules refer to the artifact by this title
    pub title: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub access_url: Option<String>,
    #[serde(default)]
    pub basic_auth: Option<BasicAuth>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractSeed {
    #[serde(default)]
    pub title: Option<String>,
    /// Restricts the offer to one consumer
    #[serde(default)]
    pub consumer: Option<Uri>,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rules: Vec<RuleSeed>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuleSeed {
    #[serde(default)]
    pub title: Option<String>,
    /// Title of an artifact of the same resource
    pub artifact: String,
    #[serde(default)]
    pub kind: SeedRuleKind,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedRuleKind {
    #[default]
    Permission,
    Prohibition,
}

impl From<SeedRuleKind> for RuleKind {
    fn from(kind: SeedRuleKind) -> Self {
        match kind {
            SeedRuleKind::Permission => RuleKind::Permission,
            SeedRuleKind::Prohibition => RuleKind::Prohibition,
        }
    }
}

/// What a bootstrap run stored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapSummary {
    pub catalogs: usize,
    pub resources: usize,
    pub artifacts: usize,
    pub contracts: usize,
    /// Catalogs skipped because their id was already bootstrapped
    pub duplicates: usize,
}

/// Read one bootstrap file through the same loader as the daemon config.
pub fn load(path: &str) -> DaemonResult<BootstrapFile> {
    let file = config::Config::builder()
        .add_source(config::File::with_name(path))
        .build()?
        .try_deserialize()?;
    Ok(file)
}

/// Seed every catalog in `paths` into the connector's store.
pub async fn bootstrap(ctx: &ConnectorContext, paths: &[String]) -> DaemonResult<BootstrapSummary> {
    tracing::info!(files = paths.len(), "Bootstrapping catalogs");

    let mut seen = HashSet::new();
    let mut summary = BootstrapSummary::default();
    for path in paths {
        let file = match load(path) {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "Skipping unreadable bootstrap file");
                continue;
            }
        };

        for catalog in &file.catalogs {
            if !seen.insert(catalog.id.clone()) {
                tracing::info!(catalog_id = %catalog.id, "Catalog already bootstrapped, skipping");
                summary.duplicates += 1;
                continue;
            }
            seed_catalog(ctx, catalog, &mut summary).await?;
        }
    }

    tracing::info!(
        catalogs = summary.catalogs,
        resources = summary.resources,
        artifacts = summary.artifacts,
        contracts = summary.contracts,
        "Finished bootstrapping"
    );
    Ok(summary)
}

async fn seed_catalog(
    ctx: &ConnectorContext,
    seed: &CatalogSeed,
    summary: &mut BootstrapSummary,
) -> DaemonResult<()> {
    let catalog = CatalogFactory::create(CatalogDesc {
        title: Some(seed.title.clone().unwrap_or_else(|| seed.id.clone())),
        description: seed.description.clone(),
    })
    .map_err(init)?;
    let catalog = ctx.store.catalogs.save(catalog).await.map_err(init)?.id();

    for offer in &seed.offers {
        let resource = seed_offer(ctx, offer, summary).await?;
        ctx.relations
            .catalog_offered_resources
            .add(catalog, &[resource])
            .await
            .map_err(init)?;
    }

    summary.catalogs += 1;
    tracing::info!(catalog_id = %seed.id, offers = seed.offers.len(), "Bootstrapped catalog");
    Ok(())
}

async fn seed_offer(
    ctx: &ConnectorContext,
    seed: &OfferSeed,
    summary: &mut BootstrapSummary,
) -> DaemonResult<Uuid> {
    let resource = ResourceFactory::create(ResourceDesc {
        kind: ResourceKind::Offered,
        title: Some(seed.title.clone()),
        description: seed.description.clone(),
        keywords: Some(seed.keywords.clone()),
        publisher: seed.publisher.clone(),
        license: seed.license.clone(),
        sovereign: seed.sovereign.clone(),
        language: seed.language.clone(),
        endpoint_documentation: seed.endpoint_documentation.clone(),
    })
    .map_err(init)?;
    let resource = ctx.store.resources.save(resource).await.map_err(init)?.id();
    summary.resources += 1;

    // Artifact title -> self-link, for the rules below.
    let mut artifacts = HashMap::new();
    for representation in &seed.representations {
        let id = seed_representation(ctx, representation, &mut artifacts, summary).await?;
        ctx.relations
            .resource_representations
            .add(resource, &[id])
            .await
            .map_err(init)?;
    }

    let contracts = if seed.contracts.is_empty() {
        default_contracts(&seed.representations)
    } else {
        seed.contracts.clone()
    };
    for contract in &contracts {
        let id = seed_contract(ctx, contract, &artifacts).await?;
        ctx.relations
            .resource_contracts
            .add(resource, &[id])
            .await
            .map_err(init)?;
        summary.contracts += 1;
    }

    tracing::debug!(
        resource_id = %resource,
        title = %seed.title,
        artifacts = artifacts.len(),
        contracts = contracts.len(),
        "Bootstrapped resource"
    );
    Ok(resource)
}

async fn seed_representation(
    ctx: &ConnectorContext,
    seed: &RepresentationSeed,
    links: &mut HashMap<String, Uri>,
    summary: &mut BootstrapSummary,
) -> DaemonResult<Uuid> {
    let representation = RepresentationFactory::create(RepresentationDesc {
        title: seed.title.clone(),
        media_type: seed.media_type.clone(),
        language: seed.language.clone(),
        standard: seed.standard.clone(),
        remote_id: None,
    })
    .map_err(init)?;
    let representation = ctx
        .store
        .representations
        .save(representation)
        .await
        .map_err(init)?
        .id();

    for artifact in &seed.artifacts {
        if links.contains_key(&artifact.title) {
            return Err(DaemonError::Config(format!(
                "bootstrap artifact title '{}' is used twice in one resource",
                artifact.title
            )));
        }

        let stored = ArtifactFactory::create(ArtifactDesc {
            title: Some(artifact.title.clone()),
            value: artifact.value.clone().map(Into::into),
            access_url: artifact.access_url.clone(),
            basic_auth: artifact.basic_auth.clone(),
            ..ArtifactDesc::default()
        })
        .map_err(init)?;
        let stored = ctx.store.artifacts.save(stored).await.map_err(init)?;
        ctx.relations
            .representation_artifacts
            .add(representation, &[stored.id()])
            .await
            .map_err(init)?;

        let link = ctx.self_links.resolve(&stored).map_err(init)?;
        links.insert(artifact.title.clone(), link);
        summary.artifacts += 1;
    }

    Ok(representation)
}

async fn seed_contract(
    ctx: &ConnectorContext,
    seed: &ContractSeed,
    artifacts: &HashMap<String, Uri>,
) -> DaemonResult<Uuid> {
    let contract = ContractFactory::create(ContractDesc {
        title: seed.title.clone(),
        consumer: seed.consumer.clone(),
        provider: Some(ctx.config.connector_id.clone()),
        start: seed.start,
        end: seed.end,
        remote_id: None,
    })
    .map_err(|e| DaemonError::Config(format!("bootstrap contract: {e}")))?;
    let contract = ctx.store.contracts.save(contract).await.map_err(init)?.id();

    let mut rule_ids = Vec::with_capacity(seed.rules.len());
    for rule in &seed.rules {
        let target = artifacts.get(&rule.artifact).ok_or_else(|| {
            DaemonError::Config(format!(
                "bootstrap rule targets unknown artifact '{}'",
                rule.artifact
            ))
        })?;
        let mut usage = UsageRule::new(rule.kind.into(), target.clone());
        usage.constraints = rule.constraints.clone();

        let title = rule.title.clone().unwrap_or_else(|| rule.artifact.clone());
        let stored = ContractRuleFactory::create(
            ContractRuleDesc::from_rule(title, &usage).map_err(init)?,
        )
        .map_err(init)?;
        rule_ids.push(ctx.store.rules.save(stored).await.map_err(init)?.id());
    }
    ctx.relations
        .contract_rules
        .add(contract, &rule_ids)
        .await
        .map_err(init)?;

    Ok(contract)
}

/// One open permission contract per artifact.
fn default_contracts(representations: &[RepresentationSeed]) -> Vec<ContractSeed> {
    representations
        .iter()
        .flat_map(|representation| &representation.artifacts)
        .map(|artifact| ContractSeed {
            title: Some(format!("{} usage", artifact.title)),
            rules: vec![RuleSeed {
                title: None,
                artifact: artifact.title.clone(),
                kind: SeedRuleKind::Permission,
                constraints: Vec::new(),
            }],
            ..ContractSeed::default()
        })
        .collect()
}

fn init(e: impl std::fmt::Display) -> DaemonError {
    DaemonError::Init(e.to_string())
}
