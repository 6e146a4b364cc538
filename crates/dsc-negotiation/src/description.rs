//! Self-descriptions of the connector and its records.

use crate::context::ConnectorContext;
use crate::error::{NegotiationError, NegotiationResult};
use dsc_store::{QueryWindow, Repository};
use dsc_types::document::{
    ArtifactDescription, CatalogDescription, RepresentationDescription, ResourceDescription,
};
use dsc_types::{
    Artifact, Catalog, ConnectorDescription, Contract, ContractDocument, Document, Entity,
    EntityKind, Representation, Resource, SelfLinkResolver, Uri, UsageRule,
};
use uuid::Uuid;

/// Builds protocol documents from stored records. Records are referenced
/// by self-link only.
pub struct DescriptionBuilder<'a> {
    ctx: &'a ConnectorContext,
}

impl<'a> DescriptionBuilder<'a> {
    pub fn new(ctx: &'a ConnectorContext) -> Self {
        Self { ctx }
    }

    /// The connector with every catalog and its offered resources.
    pub async fn connector(&self) -> NegotiationResult<ConnectorDescription> {
        let mut catalogs = Vec::new();
        for catalog in self.ctx.store.catalogs.list(QueryWindow::all()).await? {
            catalogs.push(self.catalog(&catalog).await?);
        }
        Ok(ConnectorDescription {
            id: self.ctx.config.connector_id.clone(),
            title: self.ctx.config.title.clone(),
            model_version: self.ctx.config.model_version.clone(),
            catalogs,
        })
    }

    /// The document for the record a self-link points at.
    pub async fn element(&self, element: &Uri) -> NegotiationResult<Document> {
        let (kind, id) = SelfLinkResolver::parse(element)
            .map_err(|_| NegotiationError::NotFound(format!("element {element}")))?;
        let missing = || NegotiationError::NotFound(format!("{kind} {id}"));

        match kind {
            EntityKind::Catalog => {
                let catalog = self.ctx.store.catalogs.get(id).await?.ok_or_else(missing)?;
                Ok(Document::Catalog(self.catalog(&catalog).await?))
            }
            EntityKind::Resource => {
                let resource = self
                    .ctx
                    .store
                    .resources
                    .get(id)
                    .await?
                    .filter(|r| r.kind.is_offered())
                    .ok_or_else(missing)?;
                Ok(Document::Resource(self.resource(&resource).await?))
            }
            EntityKind::Representation => {
                let representation = self
                    .ctx
                    .store
                    .representations
                    .get(id)
                    .await?
                    .ok_or_else(missing)?;
                Ok(Document::Representation(
                    self.representation(&representation).await?,
                ))
            }
            EntityKind::Artifact => {
                let artifact = self.ctx.store.artifacts.get(id).await?.ok_or_else(missing)?;
                Ok(Document::Artifact(self.artifact(&artifact)?))
            }
            EntityKind::Contract => {
                let contract = self.ctx.store.contracts.get(id).await?.ok_or_else(missing)?;
                Ok(Document::ContractOffer(self.contract(&contract).await?))
            }
            _ => Err(NegotiationError::NotFound(format!(
                "{kind} records are not described"
            ))),
        }
    }

    pub async fn catalog(&self, catalog: &Catalog) -> NegotiationResult<CatalogDescription> {
        let mut offered_resources = Vec::new();
        for resource in self
            .ctx
            .relations
            .catalog_offered_resources
            .get(catalog.id(), QueryWindow::all())
            .await?
        {
            offered_resources.push(self.resource(&resource).await?);
        }
        Ok(CatalogDescription {
            id: self.link(catalog)?,
            title: catalog.title.clone(),
            description: catalog.description.clone(),
            offered_resources,
        })
    }

    pub async fn resource(&self, resource: &Resource) -> NegotiationResult<ResourceDescription> {
        let relations = &self.ctx.relations;
        let mut representations = Vec::new();
        for representation in relations
            .resource_representations
            .get(resource.id(), QueryWindow::all())
            .await?
        {
            representations.push(self.representation(&representation).await?);
        }
        let mut contract_offers = Vec::new();
        for contract in relations
            .resource_contracts
            .get(resource.id(), QueryWindow::all())
            .await?
        {
            contract_offers.push(self.contract(&contract).await?);
        }

        Ok(ResourceDescription {
            id: self.link(resource)?,
            title: resource.title.clone(),
            description: resource.description.clone(),
            keywords: resource.keywords.clone(),
            publisher: resource.publisher.clone(),
            license: resource.license.clone(),
            sovereign: resource.sovereign.clone(),
            language: resource.language.clone(),
            endpoint_documentation: resource.endpoint_documentation.clone(),
            version: resource.version,
            representations,
            contract_offers,
        })
    }

    pub async fn representation(
        &self,
        representation: &Representation,
    ) -> NegotiationResult<RepresentationDescription> {
        let instances = self
            .ctx
            .relations
            .representation_artifacts
            .get(representation.id(), QueryWindow::all())
            .await?
            .iter()
            .map(|artifact| self.artifact(artifact))
            .collect::<NegotiationResult<Vec<_>>>()?;

        Ok(RepresentationDescription {
            id: self.link(representation)?,
            title: representation.title.clone(),
            media_type: representation.media_type.clone(),
            language: representation.language.clone(),
            standard: representation.standard.clone(),
            instances,
        })
    }

    pub fn artifact(&self, artifact: &Artifact) -> NegotiationResult<ArtifactDescription> {
        Ok(ArtifactDescription {
            id: self.link(artifact)?,
            title: artifact.title.clone(),
            byte_size: artifact.byte_size,
            checksum: artifact.checksum.clone(),
            creation_date: artifact.meta.created_at,
        })
    }

    /// A stored contract rendered as an offer.
    pub async fn contract(&self, contract: &Contract) -> NegotiationResult<ContractDocument> {
        let mut document = ContractDocument::new(self.link(contract)?)
            .with_rules(self.contract_rules(contract.id()).await?);
        document.consumer = contract.consumer.clone();
        document.provider = contract
            .provider
            .clone()
            .or_else(|| Some(self.ctx.config.connector_id.clone()));
        document.contract_start = contract.start;
        document.contract_end = contract.end;
        Ok(document)
    }

    /// Decoded rules of a stored contract, in link order.
    pub async fn contract_rules(&self, contract: Uuid) -> NegotiationResult<Vec<UsageRule>> {
        self.ctx
            .relations
            .contract_rules
            .get(contract, QueryWindow::all())
            .await?
            .iter()
            .map(|rule| {
                rule.rule()
                    .map_err(|e| NegotiationError::Internal(format!("stored rule {}: {e}", rule.id())))
            })
            .collect()
    }

    fn link<E: Entity>(&self, entity: &E) -> NegotiationResult<Uri> {
        self.ctx
            .self_links
            .resolve(entity)
            .map_err(|e| NegotiationError::Internal(e.to_string()))
    }
}
