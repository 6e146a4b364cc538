//! Pulling artifact data from the connector that provides it.

use crate::error::{ResolverError, ResolverResult};
use async_trait::async_trait;
use bytes::Bytes;
use dsc_types::{
    Envelope, MessageHeader, MessageKind, MessageResponse, Payload, QueryInput, Uri,
};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// One artifact request sent to a providing connector.
#[derive(Debug, Clone)]
pub struct PullRequest {
    /// Message endpoint of the providing connector.
    pub remote_address: Uri,
    /// The artifact's id on the providing connector.
    pub artifact: Uri,
    /// Agreement presented as transfer contract.
    pub transfer_contract: Uri,
    pub query: Option<QueryInput>,
}

#[async_trait]
pub trait ArtifactPuller: Send + Sync {
    async fn pull(&self, request: &PullRequest) -> ResolverResult<Bytes>;
}

/// Sends `ArtifactRequest` messages over HTTP and unwraps the response.
pub struct HttpArtifactPuller {
    client: Client,
    connector_id: Uri,
    model_version: String,
}

impl HttpArtifactPuller {
    pub fn new(
        connector_id: Uri,
        model_version: impl Into<String>,
        timeout: Duration,
    ) -> ResolverResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ResolverError::Remote(format!("http client: {e}")))?;
        Ok(Self {
            client,
            connector_id,
            model_version: model_version.into(),
        })
    }

    fn envelope(&self, request: &PullRequest) -> ResolverResult<Envelope> {
        let header = MessageHeader::new(
            MessageKind::ArtifactRequest,
            self.connector_id.clone(),
            self.model_version.clone(),
        )
        .with_recipient(request.remote_address.clone())
        .with_requested_artifact(request.artifact.clone())
        .with_transfer_contract(request.transfer_contract.clone());

        let mut envelope = Envelope::new(header);
        if let Some(query) = request.query.as_ref().filter(|q| !q.is_empty()) {
            let encoded = serde_json::to_string(query)
                .map_err(|e| ResolverError::Remote(format!("encode query: {e}")))?;
            envelope = envelope.with_payload(Payload::text(encoded));
        }
        Ok(envelope)
    }
}

#[async_trait]
impl ArtifactPuller for HttpArtifactPuller {
    async fn pull(&self, request: &PullRequest) -> ResolverResult<Bytes> {
        let envelope = self.envelope(request)?;
        debug!(
            artifact = %request.artifact,
            contract = %request.transfer_contract,
            "requesting artifact from provider"
        );

        let response = self
            .client
            .post(request.remote_address.clone())
            .json(&envelope)
            .send()
            .await
            .map_err(|e| ResolverError::Remote(format!("provider unreachable: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ResolverError::Remote(format!(
                "provider answered {status}"
            )));
        }

        let reply: MessageResponse = response
            .json()
            .await
            .map_err(|e| ResolverError::Remote(format!("unreadable provider response: {e}")))?;
        match reply {
            MessageResponse::Body { payload, .. } => payload
                .to_bytes()
                .map_err(|e| ResolverError::Remote(e.to_string())),
            MessageResponse::Error {
                reason, message, ..
            } => Err(ResolverError::Remote(format!(
                "provider rejected request ({reason}): {message}"
            ))),
        }
    }
}
