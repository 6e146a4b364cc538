use dsc_types::Uri;
use std::time::Duration;

/// Protocol versions accepted on inbound messages by default.
pub const DEFAULT_SUPPORTED_VERSIONS: &[&str] = &["4.0.0", "4.1.0", "4.2.0"];

/// Model version stamped on outbound messages by default.
pub const DEFAULT_MODEL_VERSION: &str = "4.2.0";

/// Runtime settings of the message handlers.
#[derive(Debug, Clone)]
pub struct NegotiationConfig {
    /// Identity of this connector, used as issuer and provider.
    pub connector_id: Uri,
    /// Base of the self-links handed to peers.
    pub base_url: Uri,
    pub title: String,
    pub model_version: String,
    pub supported_versions: Vec<String>,
    /// Artifact requests must present a transfer contract.
    pub negotiation_required: bool,
    /// Transfer contracts must be confirmed agreements.
    pub require_confirmed_agreement: bool,
    /// Upper bound of messages handled at once.
    pub max_concurrent_messages: usize,
    pub notification: NotificationConfig,
}

impl NegotiationConfig {
    pub fn new(connector_id: Uri, base_url: Uri) -> Self {
        Self {
            connector_id,
            base_url,
            title: "Dataspace Connector".to_string(),
            model_version: DEFAULT_MODEL_VERSION.to_string(),
            supported_versions: DEFAULT_SUPPORTED_VERSIONS
                .iter()
                .map(|v| v.to_string())
                .collect(),
            negotiation_required: true,
            require_confirmed_agreement: false,
            max_concurrent_messages: 64,
            notification: NotificationConfig::default(),
        }
    }

    pub fn supports(&self, version: &str) -> bool {
        self.supported_versions.iter().any(|v| v == version)
    }
}

/// Retry policy of subscriber notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationConfig {
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub timeout: Duration,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_delay: Duration::from_secs(5),
            timeout: Duration::from_secs(30),
        }
    }
}
