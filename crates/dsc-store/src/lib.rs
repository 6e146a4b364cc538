//! Connector persistence contract.
//!
//! This crate defines the storage contract connector components rely on:
//! - one generic [`Repository`] per record type
//! - soft deletion, so historical agreements stay resolvable
//! - atomic read-modify-write through [`Repository::modify`]
//!
//! The in-memory adapter is the reference implementation and backs the
//! daemon and all tests.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod error;
pub mod memory;
mod traits;

pub use error::{StorageError, StorageResult};
pub use memory::InMemoryRepository;
pub use traits::{Mutation, QueryWindow, Repository};

use dsc_types::{
    Agreement, Artifact, Catalog, Contract, ContractRule, Representation, Resource, Subscription,
};
use std::sync::Arc;

/// One repository per connector record type.
#[derive(Clone)]
pub struct ConnectorStore {
    pub catalogs: Arc<dyn Repository<Catalog>>,
    pub resources: Arc<dyn Repository<Resource>>,
    pub representations: Arc<dyn Repository<Representation>>,
    pub artifacts: Arc<dyn Repository<Artifact>>,
    pub contracts: Arc<dyn Repository<Contract>>,
    pub rules: Arc<dyn Repository<ContractRule>>,
    pub agreements: Arc<dyn Repository<Agreement>>,
    pub subscriptions: Arc<dyn Repository<Subscription>>,
}

impl ConnectorStore {
    pub fn in_memory() -> Self {
        Self {
            catalogs: Arc::new(InMemoryRepository::new()),
            resources: Arc::new(InMemoryRepository::new()),
            representations: Arc::new(InMemoryRepository::new()),
            artifacts: Arc::new(InMemoryRepository::new()),
            contracts: Arc::new(InMemoryRepository::new()),
            rules: Arc::new(InMemoryRepository::new()),
            agreements: Arc::new(InMemoryRepository::new()),
            subscriptions: Arc::new(InMemoryRepository::new()),
        }
    }
}

impl Default for ConnectorStore {
    fn default() -> Self {
        Self::in_memory()
    }
}
