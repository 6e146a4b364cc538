use async_trait::async_trait;
use dsc_types::Artifact;

/// Told whenever an artifact's data was replaced, either by a direct write
/// or by a download from the providing connector.
#[async_trait]
pub trait ArtifactUpdateListener: Send + Sync {
    async fn artifact_updated(&self, artifact: &Artifact);
}
