//! Configuration for the connector daemon

use crate::error::{DaemonError, DaemonResult};
use dsc_negotiation::config::{DEFAULT_MODEL_VERSION, DEFAULT_SUPPORTED_VERSIONS};
use dsc_negotiation::{NegotiationConfig, NotificationConfig};
use dsc_policy::StaticDecisionPoint;
use dsc_types::Uri;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectorConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// Identity and protocol settings of this connector
    #[serde(default)]
    pub connector: ConnectorSection,

    #[serde(default)]
    pub policy: PolicyConfig,

    /// Outbound HTTP (backends and remote connectors)
    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub clearing_house: ClearingHouseConfig,

    #[serde(default)]
    pub notification: NotificationSection,

    #[serde(default)]
    pub dispatcher: DispatcherConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            enable_cors: true,
            request_timeout_secs: default_request_timeout(),
            max_body_size: default_max_body_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorSection {
    /// Connector identity, used as issuer on every outbound message
    #[serde(default = "default_connector_id")]
    pub connector_id: String,

    /// Base of the self-links handed out to peers
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_model_version")]
    pub model_version: String,

    #[serde(default = "default_supported_versions")]
    pub supported_versions: Vec<String>,
}

impl Default for ConnectorSection {
    fn default() -> Self {
        Self {
            connector_id: default_connector_id(),
            base_url: default_base_url(),
            title: default_title(),
            model_version: default_model_version(),
            supported_versions: default_supported_versions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Artifact requests must present a transfer contract
    #[serde(default = "default_true")]
    pub negotiation_required: bool,

    /// Transfer contracts must have been confirmed by the consumer
    #[serde(default)]
    pub require_confirmed_agreement: bool,

    /// Answer of the built-in decision point
    #[serde(default)]
    pub pdp_decision: StaticDecisionPoint,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            negotiation_required: true,
            require_confirmed_agreement: false,
            pdp_decision: StaticDecisionPoint::Permit,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_http_timeout(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Clearing house sink. Without a URL, confirmations are not logged anywhere.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClearingHouseConfig {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSection {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
}

impl Default for NotificationSection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_secs: default_retry_delay(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Upper bound of inbound messages handled at once
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_messages: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_concurrent_messages: default_max_concurrent(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Catalog files seeded into the store at startup, in order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BootstrapConfig {
    #[serde(default)]
    pub paths: Vec<String>,
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, 8080))
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_body_size() -> usize {
    10 * 1024 * 1024
}

fn default_connector_id() -> String {
    "https://connector.localhost".to_string()
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_title() -> String {
    "Dataspace Connector".to_string()
}

fn default_model_version() -> String {
    DEFAULT_MODEL_VERSION.to_string()
}

fn default_supported_versions() -> Vec<String> {
    DEFAULT_SUPPORTED_VERSIONS.iter().map(|v| v.to_string()).collect()
}

fn default_http_timeout() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    5
}

fn default_retry_delay() -> u64 {
    5
}

fn default_max_concurrent() -> usize {
    64
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ConnectorConfig {
    /// Load configuration: built-in defaults, then the optional file, then
    /// `DSC_` environment variables (`DSC_SERVER__LISTEN_ADDR` and so on).
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&ConnectorConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("DSC")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("connector.supported_versions")
                .with_list_parse_key("bootstrap.paths")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    pub fn connector_id(&self) -> DaemonResult<Uri> {
        parse_uri("connector.connector_id", &self.connector.connector_id)
    }

    pub fn clearing_house_url(&self) -> DaemonResult<Option<Uri>> {
        self.clearing_house
            .url
            .as_deref()
            .map(|url| parse_uri("clearing_house.url", url))
            .transpose()
    }

    /// Settings of the message handlers derived from this configuration.
    pub fn negotiation_config(&self) -> DaemonResult<NegotiationConfig> {
        if self.connector.supported_versions.is_empty() {
            return Err(DaemonError::Config(
                "connector.supported_versions must not be empty".to_string(),
            ));
        }

        let mut config = NegotiationConfig::new(
            self.connector_id()?,
            parse_uri("connector.base_url", &self.connector.base_url)?,
        );
        config.title = self.connector.title.clone();
        config.model_version = self.connector.model_version.clone();
        config.supported_versions = self.connector.supported_versions.clone();
        config.negotiation_required = self.policy.negotiation_required;
        config.require_confirmed_agreement = self.policy.require_confirmed_agreement;
        config.max_concurrent_messages = self.dispatcher.max_concurrent_messages;
        config.notification = NotificationConfig {
            max_attempts: self.notification.max_attempts.max(1),
            retry_delay: Duration::from_secs(self.notification.retry_delay_secs),
            timeout: self.http.timeout(),
        };
        Ok(config)
    }
}

fn parse_uri(key: &str, value: &str) -> DaemonResult<Uri> {
    Uri::parse(value).map_err(|e| DaemonError::Config(format!("invalid {key} '{value}': {e}")))
}
