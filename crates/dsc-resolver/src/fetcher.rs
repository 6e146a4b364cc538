//! HTTP(S) backend access for artifacts backed by a remote data source.

use crate::error::{ResolverError, ResolverResult};
use async_trait::async_trait;
use bytes::Bytes;
use dsc_types::{BasicAuth, QueryInput};
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::debug;

/// Reads artifact data from an HTTP(S) backend.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// GET `access_url` with `query` applied. Any non-2xx answer is an error.
    async fn fetch(
        &self,
        access_url: &str,
        credentials: Option<&BasicAuth>,
        query: &QueryInput,
    ) -> ResolverResult<Bytes>;
}

/// Build the final backend URL: substitute `{name}` placeholders, append the
/// optional extra path, then add the query parameters.
pub fn build_url(access_url: &str, query: &QueryInput) -> ResolverResult<Url> {
    let mut raw = access_url.to_string();
    for (name, value) in &query.path_variables {
        raw = raw.replace(&format!("{{{name}}}"), value);
    }
    if raw.contains('{') || raw.contains('}') {
        return Err(ResolverError::Resource(format!(
            "unresolved placeholder in backend url {access_url}"
        )));
    }

    if let Some(extra) = query.optional.as_deref().filter(|p| !p.is_empty()) {
        raw = format!(
            "{}/{}",
            raw.trim_end_matches('/'),
            extra.trim_start_matches('/')
        );
    }

    let mut url = Url::parse(&raw)
        .map_err(|e| ResolverError::Resource(format!("malformed backend url {raw}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ResolverError::Resource(format!(
            "unsupported backend scheme {}",
            url.scheme()
        )));
    }

    if !query.params.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (name, value) in &query.params {
            pairs.append_pair(name, value);
        }
    }
    Ok(url)
}

/// [`HttpFetcher`] on top of a shared reqwest client.
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    /// Client whose requests fail after `timeout`.
    pub fn new(timeout: Duration) -> ResolverResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ResolverError::Resource(format!("http client: {e}")))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn fetch(
        &self,
        access_url: &str,
        credentials: Option<&BasicAuth>,
        query: &QueryInput,
    ) -> ResolverResult<Bytes> {
        let url = build_url(access_url, query)?;
        debug!(host = url.host_str().unwrap_or_default(), "fetching backend data");

        let mut request = self.client.get(url);
        for (name, value) in &query.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(auth) = credentials {
            request = request.basic_auth(&auth.username, Some(&auth.password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| ResolverError::Resource(format!("backend unreachable: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ResolverError::Resource(format!(
                "backend answered {status}"
            )));
        }

        response
            .bytes()
            .await
            .map_err(|e| ResolverError::Resource(format!("backend body: {e}")))
    }
}
