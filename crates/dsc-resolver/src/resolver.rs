use crate::error::{ResolverError, ResolverResult};
use crate::fetcher::HttpFetcher;
use crate::listener::ArtifactUpdateListener;
use crate::puller::{ArtifactPuller, PullRequest};
use bytes::Bytes;
use dsc_linker::{Linker, Relations};
use dsc_store::{ConnectorStore, QueryWindow, Repository, StorageError};
use dsc_types::{Agreement, Artifact, Data, Entity, QueryInput};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Resolves the bytes behind an artifact.
///
/// A read runs three steps: an optional download from the providing
/// connector, the actual read (local bytes or a live backend call), and the
/// access counter increment. The counter only moves when the read succeeds.
pub struct ArtifactResolver {
    artifacts: Arc<dyn Repository<Artifact>>,
    agreements: Linker<Artifact, Agreement>,
    fetcher: Arc<dyn HttpFetcher>,
    puller: Arc<dyn ArtifactPuller>,
    listener: Option<Arc<dyn ArtifactUpdateListener>>,
}

impl ArtifactResolver {
    pub fn new(
        store: &ConnectorStore,
        relations: &Relations,
        fetcher: Arc<dyn HttpFetcher>,
        puller: Arc<dyn ArtifactPuller>,
    ) -> Self {
        Self {
            artifacts: store.artifacts.clone(),
            agreements: relations.artifact_agreements.clone(),
            fetcher,
            puller,
            listener: None,
        }
    }

    pub fn with_listener(mut self, listener: Arc<dyn ArtifactUpdateListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Whether a read should first pull fresh data. An explicit override
    /// wins; otherwise automated artifacts and artifacts already holding
    /// local data are refreshed.
    pub fn should_download(artifact: &Artifact, force_download: Option<bool>) -> bool {
        force_download.unwrap_or(artifact.automated_download || artifact.has_local_data())
    }

    /// Read the data of artifact `id`.
    pub async fn get_data(
        &self,
        id: Uuid,
        query: Option<&QueryInput>,
        force_download: Option<bool>,
    ) -> ResolverResult<Bytes> {
        let mut artifact = self.require(id).await?;

        if artifact.has_remote_origin() && Self::should_download(&artifact, force_download) {
            artifact = self.download(&artifact, query).await?;
        }

        let data = self.read(&artifact, query).await?;

        self.artifacts
            .modify(
                id,
                Box::new(|a: &mut Artifact| {
                    a.increment_access_counter();
                    Ok(())
                }),
            )
            .await
            .map_err(|e| not_found_or_storage(id, e))?;

        debug!(artifact = %id, bytes = data.len(), "artifact data served");
        Ok(data)
    }

    /// Store `value` as the artifact's local data and tell the listener.
    pub async fn set_data(&self, id: Uuid, value: Bytes) -> ResolverResult<Artifact> {
        let artifact = self
            .artifacts
            .modify(
                id,
                Box::new(move |a: &mut Artifact| {
                    a.set_local_data(value);
                    Ok(())
                }),
            )
            .await
            .map_err(|e| not_found_or_storage(id, e))?;

        if let Some(listener) = &self.listener {
            listener.artifact_updated(&artifact).await;
        }
        Ok(artifact)
    }

    async fn require(&self, id: Uuid) -> ResolverResult<Artifact> {
        self.artifacts
            .get(id)
            .await?
            .ok_or_else(|| ResolverError::ResourceNotFound(format!("artifact {id}")))
    }

    async fn read(&self, artifact: &Artifact, query: Option<&QueryInput>) -> ResolverResult<Bytes> {
        match &artifact.data {
            Data::Local { value } => Ok(value.clone()),
            Data::Remote {
                access_url,
                credentials,
            } => {
                let empty = QueryInput::default();
                self.fetcher
                    .fetch(access_url, credentials.as_ref(), query.unwrap_or(&empty))
                    .await
            }
        }
    }

    /// Pull the artifact from its provider, trying each linked agreement as
    /// transfer contract until one succeeds.
    async fn download(
        &self,
        artifact: &Artifact,
        query: Option<&QueryInput>,
    ) -> ResolverResult<Artifact> {
        let id = artifact.id();
        let (Some(remote_address), Some(remote_id)) =
            (artifact.remote_address.clone(), artifact.remote_id.clone())
        else {
            return Err(ResolverError::Resource(format!(
                "artifact {id} has no remote id"
            )));
        };

        let contracts: Vec<_> = self
            .agreements
            .get(id, QueryWindow::all())
            .await?
            .into_iter()
            .filter_map(|agreement| agreement.remote_id)
            .collect();
        if contracts.is_empty() {
            return Err(ResolverError::Resource(format!(
                "no agreement covers artifact {id}"
            )));
        }

        let mut last_error = None;
        for contract in contracts {
            let request = PullRequest {
                remote_address: remote_address.clone(),
                artifact: remote_id.clone(),
                transfer_contract: contract.clone(),
                query: query.cloned(),
            };
            match self.puller.pull(&request).await {
                Ok(data) => {
                    info!(artifact = %id, contract = %contract, bytes = data.len(), "artifact downloaded");
                    return self.set_data(id, data).await;
                }
                Err(e) => {
                    warn!(artifact = %id, contract = %contract, error = %e, "artifact pull failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ResolverError::Remote(format!("artifact {id} could not be pulled"))
        }))
    }
}

fn not_found_or_storage(id: Uuid, e: StorageError) -> ResolverError {
    match e {
        StorageError::NotFound(_) => ResolverError::ResourceNotFound(format!("artifact {id}")),
        other => ResolverError::Storage(other),
    }
}
