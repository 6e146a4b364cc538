//! Append-only sink recording confirmed agreements.

use crate::error::{NegotiationError, NegotiationResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dsc_types::Uri;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

#[async_trait]
pub trait ClearingHouse: Send + Sync {
    /// Record the serialized agreement `document` identified by `agreement`.
    async fn send(&self, agreement: &Uri, document: &str) -> NegotiationResult<()>;
}

/// Clearing house that records nothing. Used when none is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopClearingHouse;

#[async_trait]
impl ClearingHouse for NoopClearingHouse {
    async fn send(&self, agreement: &Uri, _document: &str) -> NegotiationResult<()> {
        debug!(agreement = %agreement, "No clearing house configured");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct LogEntry<'a> {
    issuer_connector: &'a Uri,
    agreement: &'a Uri,
    logged_at: DateTime<Utc>,
    payload: &'a str,
}

/// Posts agreements to a clearing house over HTTP.
pub struct HttpClearingHouse {
    client: Client,
    url: Uri,
    connector_id: Uri,
}

impl HttpClearingHouse {
    pub fn new(url: Uri, connector_id: Uri, timeout: Duration) -> NegotiationResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NegotiationError::Internal(format!("http client: {e}")))?;
        Ok(Self {
            client,
            url,
            connector_id,
        })
    }
}

#[async_trait]
impl ClearingHouse for HttpClearingHouse {
    async fn send(&self, agreement: &Uri, document: &str) -> NegotiationResult<()> {
        let entry = LogEntry {
            issuer_connector: &self.connector_id,
            agreement,
            logged_at: Utc::now(),
            payload: document,
        };
        let response = self
            .client
            .post(self.url.clone())
            .json(&entry)
            .send()
            .await
            .map_err(|e| NegotiationError::Internal(format!("clearing house unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NegotiationError::Internal(format!(
                "clearing house answered {status}"
            )));
        }
        debug!(agreement = %agreement, "Agreement logged at clearing house");
        Ok(())
    }
}
