//! Local updates to the catalog graph and the notifications they cause.
//!
//! A change to a resource is also a change to everything below it, so its
//! representations and their artifacts notify their own subscribers too.

use crate::context::ConnectorContext;
use crate::error::{NegotiationError, NegotiationResult};
use crate::notifier::SubscriberNotifier;
use async_trait::async_trait;
use bytes::Bytes;
use dsc_resolver::ArtifactUpdateListener;
use dsc_store::{QueryWindow, Repository, StorageError};
use dsc_types::{
    Artifact, Entity, EntityKind, Factory, Resource, ResourceDesc, ResourceFactory, SelfLinkResolver, Uri,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

/// Notifies an artifact's subscribers whenever the resolver replaced its data.
pub struct NotifyOnDataUpdate {
    notifier: SubscriberNotifier,
    self_links: SelfLinkResolver,
}

impl NotifyOnDataUpdate {
    pub fn new(notifier: SubscriberNotifier, self_links: SelfLinkResolver) -> Self {
        Self {
            notifier,
            self_links,
        }
    }
}

#[async_trait]
impl ArtifactUpdateListener for NotifyOnDataUpdate {
    async fn artifact_updated(&self, artifact: &Artifact) {
        match self.self_links.resolve(artifact) {
            Ok(link) => {
                debug!(artifact = %link, "Artifact data updated");
                self.notifier.notify_subscribers(link);
            }
            Err(e) => warn!(error = %e, "Updated artifact has no self-link"),
        }
    }
}

impl ConnectorContext {
    /// Notify the subscribers of `target` and of every element below it.
    ///
    /// Resources cascade to their representations and those to their
    /// artifacts; children are notified before their parent. Returns one
    /// delivery handle per notified element.
    pub async fn notify_on_update(&self, target: &Uri) -> NegotiationResult<Vec<JoinHandle<usize>>> {
        let (kind, id) = SelfLinkResolver::parse(target)
            .map_err(|_| NegotiationError::NotFound(format!("element {target}")))?;

        let mut links = Vec::new();
        match kind {
            EntityKind::Resource => {
                for representation in self
                    .relations
                    .resource_representations
                    .get(id, QueryWindow::all())
                    .await?
                {
                    self.collect_artifact_links(representation.id(), &mut links)
                        .await?;
                    links.push(self.link(&representation)?);
                }
            }
            EntityKind::Representation => self.collect_artifact_links(id, &mut links).await?,
            _ => {}
        }
        links.push(target.clone());

        debug!(target = %target, elements = links.len(), "Notifying on update");
        Ok(links
            .into_iter()
            .map(|link| self.notifier.notify_subscribers(link))
            .collect())
    }

    /// Replace the local data of artifact `id`. Its subscribers are notified
    /// through the resolver's update listener.
    pub async fn update_artifact_data(&self, id: Uuid, data: Bytes) -> NegotiationResult<Artifact> {
        Ok(self.resolver.set_data(id, data).await?)
    }

    /// Apply `desc` to resource `id`. A real change bumps the resource's
    /// version and notifies down the resource's subtree.
    pub async fn update_resource(&self, id: Uuid, desc: ResourceDesc) -> NegotiationResult<Resource> {
        let changed = Arc::new(AtomicBool::new(false));
        let flag = changed.clone();
        let resource = self
            .store
            .resources
            .modify(
                id,
                Box::new(move |resource: &mut Resource| {
                    let updated = ResourceFactory::update(resource, desc)
                        .map_err(|e| StorageError::InvalidInput(e.to_string()))?;
                    flag.store(updated, Ordering::SeqCst);
                    Ok(())
                }),
            )
            .await
            .map_err(|e| match e {
                StorageError::NotFound(_) => NegotiationError::NotFound(format!("resource {id}")),
                StorageError::InvalidInput(msg) => NegotiationError::MalformedRequest(msg),
                other => other.into(),
            })?;

        if changed.load(Ordering::SeqCst) {
            let link = self.link(&resource)?;
            self.notify_on_update(&link).await?;
        } else {
            debug!(resource = %id, "Resource unchanged, nobody notified");
        }
        Ok(resource)
    }

    async fn collect_artifact_links(
        &self,
        representation: Uuid,
        links: &mut Vec<Uri>,
    ) -> NegotiationResult<()> {
        for artifact in self
            .relations
            .representation_artifacts
            .get(representation, QueryWindow::all())
            .await?
        {
            links.push(self.link(&artifact)?);
        }
        Ok(())
    }

    fn link<E: Entity>(&self, entity: &E) -> NegotiationResult<Uri> {
        self.self_links
            .resolve(entity)
            .map_err(|e| NegotiationError::Internal(e.to_string()))
    }
}
