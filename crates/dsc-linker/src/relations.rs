//! The connector's relation graph, one linker per edge type.

use crate::linker::Linker;
use dsc_store::ConnectorStore;
use dsc_types::{
    Agreement, Artifact, Catalog, Contract, ContractRule, Representation, Resource,
};
use uuid::Uuid;

fn offered_resources(catalog: &Catalog) -> &[Uuid] {
    &catalog.offered_resources
}

fn set_offered_resources(catalog: &mut Catalog, ids: Vec<Uuid>) {
    catalog.offered_resources = ids;
}

fn requested_resources(catalog: &Catalog) -> &[Uuid] {
    &catalog.requested_resources
}

fn set_requested_resources(catalog: &mut Catalog, ids: Vec<Uuid>) {
    catalog.requested_resources = ids;
}

fn representations(resource: &Resource) -> &[Uuid] {
    &resource.representations
}

fn set_representations(resource: &mut Resource, ids: Vec<Uuid>) {
    resource.representations = ids;
}

fn contracts(resource: &Resource) -> &[Uuid] {
    &resource.contracts
}

fn set_contracts(resource: &mut Resource, ids: Vec<Uuid>) {
    resource.contracts = ids;
}

fn artifacts(representation: &Representation) -> &[Uuid] {
    &representation.artifacts
}

fn set_artifacts(representation: &mut Representation, ids: Vec<Uuid>) {
    representation.artifacts = ids;
}

fn rules(contract: &Contract) -> &[Uuid] {
    &contract.rules
}

fn set_rules(contract: &mut Contract, ids: Vec<Uuid>) {
    contract.rules = ids;
}

fn agreement_artifacts(agreement: &Agreement) -> &[Uuid] {
    &agreement.artifacts
}

fn set_agreement_artifacts(agreement: &mut Agreement, ids: Vec<Uuid>) {
    agreement.artifacts = ids;
}

/// Every edge type of the connector graph.
///
/// The owning direction of each many-to-many relation stores the edges; the
/// inverse direction is a non-owning view over the same lists.
#[derive(Clone)]
pub struct Relations {
    pub catalog_offered_resources: Linker<Catalog, Resource>,
    pub catalog_requested_resources: Linker<Catalog, Resource>,
    pub resource_representations: Linker<Resource, Representation>,
    pub resource_contracts: Linker<Resource, Contract>,
    pub representation_artifacts: Linker<Representation, Artifact>,
    pub contract_rules: Linker<Contract, ContractRule>,
    pub agreement_artifacts: Linker<Agreement, Artifact>,

    pub offered_resource_catalogs: Linker<Resource, Catalog>,
    pub representation_resources: Linker<Representation, Resource>,
    pub contract_resources: Linker<Contract, Resource>,
    pub artifact_representations: Linker<Artifact, Representation>,
    pub rule_contracts: Linker<ContractRule, Contract>,
    pub artifact_agreements: Linker<Artifact, Agreement>,
}

impl Relations {
    pub fn new(store: &ConnectorStore) -> Self {
        Self {
            catalog_offered_resources: Linker::owning(
                store.catalogs.clone(),
                store.resources.clone(),
                offered_resources,
                set_offered_resources,
            ),
            catalog_requested_resources: Linker::owning(
                store.catalogs.clone(),
                store.resources.clone(),
                requested_resources,
                set_requested_resources,
            ),
            resource_representations: Linker::owning(
                store.resources.clone(),
                store.representations.clone(),
                representations,
                set_representations,
            ),
            resource_contracts: Linker::owning(
                store.resources.clone(),
                store.contracts.clone(),
                contracts,
                set_contracts,
            ),
            representation_artifacts: Linker::owning(
                store.representations.clone(),
                store.artifacts.clone(),
                artifacts,
                set_artifacts,
            ),
            contract_rules: Linker::owning(
                store.contracts.clone(),
                store.rules.clone(),
                rules,
                set_rules,
            ),
            agreement_artifacts: Linker::owning(
                store.agreements.clone(),
                store.artifacts.clone(),
                agreement_artifacts,
                set_agreement_artifacts,
            ),

            offered_resource_catalogs: Linker::non_owning(
                store.resources.clone(),
                store.catalogs.clone(),
                offered_resources,
                set_offered_resources,
            ),
            representation_resources: Linker::non_owning(
                store.representations.clone(),
                store.resources.clone(),
                representations,
                set_representations,
            ),
            contract_resources: Linker::non_owning(
                store.contracts.clone(),
                store.resources.clone(),
                contracts,
                set_contracts,
            ),
            artifact_representations: Linker::non_owning(
                store.artifacts.clone(),
                store.representations.clone(),
                artifacts,
                set_artifacts,
            ),
            rule_contracts: Linker::non_owning(
                store.rules.clone(),
                store.contracts.clone(),
                rules,
                set_rules,
            ),
            artifact_agreements: Linker::non_owning(
                store.artifacts.clone(),
                store.agreements.clone(),
                agreement_artifacts,
                set_agreement_artifacts,
            ),
        }
    }
}
