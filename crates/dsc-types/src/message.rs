//! Protocol messages exchanged between connectors.
//!
//! An inbound message is an [`Envelope`]: a typed [`MessageHeader`] plus an
//! optional [`Payload`]. Every inbound message is answered with a
//! [`MessageResponse`], either a body or a rejection.

use crate::error::{TypesError, TypesResult};
use crate::Uri;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Header type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    #[serde(rename = "ids:DescriptionRequestMessage")]
    DescriptionRequest,
    #[serde(rename = "ids:DescriptionResponseMessage")]
    DescriptionResponse,
    #[serde(rename = "ids:ContractRequestMessage")]
    ContractRequest,
    /// Sent by the provider when accepting a request, and echoed back by the
    /// consumer to confirm it.
    #[serde(rename = "ids:ContractAgreementMessage")]
    ContractAgreement,
    #[serde(rename = "ids:ContractRejectionMessage")]
    ContractRejection,
    #[serde(rename = "ids:ArtifactRequestMessage")]
    ArtifactRequest,
    #[serde(rename = "ids:ArtifactResponseMessage")]
    ArtifactResponse,
    #[serde(rename = "ids:MessageProcessedNotificationMessage")]
    MessageProcessedNotification,
    #[serde(rename = "ids:RejectionMessage")]
    Rejection,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::DescriptionRequest => "description-request",
            MessageKind::DescriptionResponse => "description-response",
            MessageKind::ContractRequest => "contract-request",
            MessageKind::ContractAgreement => "contract-agreement",
            MessageKind::ContractRejection => "contract-rejection",
            MessageKind::ArtifactRequest => "artifact-request",
            MessageKind::ArtifactResponse => "artifact-response",
            MessageKind::MessageProcessedNotification => "message-processed-notification",
            MessageKind::Rejection => "rejection",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed, exhaustive rejection vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    VersionNotSupported,
    NotFound,
    BadParameters,
    NotAuthorized,
    InternalRecipientError,
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RejectionReason::VersionNotSupported => "VERSION_NOT_SUPPORTED",
            RejectionReason::NotFound => "NOT_FOUND",
            RejectionReason::BadParameters => "BAD_PARAMETERS",
            RejectionReason::NotAuthorized => "NOT_AUTHORIZED",
            RejectionReason::InternalRecipientError => "INTERNAL_RECIPIENT_ERROR",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHeader {
    #[serde(rename = "@type")]
    pub kind: MessageKind,

    #[serde(rename = "@id")]
    pub id: Uuid,

    pub model_version: String,

    pub issuer_connector: Uri,

    pub issued: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recipient_connector: Vec<Uri>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_message: Option<Uuid>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_element: Option<Uri>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_artifact: Option<Uri>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer_contract: Option<Uri>,
}

impl MessageHeader {
    pub fn new(kind: MessageKind, issuer_connector: Uri, model_version: impl Into<String>) -> Self {
        Self {
            kind,
            id: Uuid::new_v4(),
            model_version: model_version.into(),
            issuer_connector,
            issued: Utc::now(),
            recipient_connector: Vec::new(),
            correlation_message: None,
            requested_element: None,
            requested_artifact: None,
            transfer_contract: None,
        }
    }

    pub fn with_recipient(mut self, recipient: Uri) -> Self {
        self.recipient_connector.push(recipient);
        self
    }

    pub fn with_correlation(mut self, message: Uuid) -> Self {
        self.correlation_message = Some(message);
        self
    }

    pub fn with_requested_element(mut self, element: Uri) -> Self {
        self.requested_element = Some(element);
        self
    }

    pub fn with_requested_artifact(mut self, artifact: Uri) -> Self {
        self.requested_artifact = Some(artifact);
        self
    }

    pub fn with_transfer_contract(mut self, contract: Uri) -> Self {
        self.transfer_contract = Some(contract);
        self
    }
}

/// Message payload. Binary data that is not valid UTF-8 travels base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "encoding", content = "value", rename_all = "lowercase")]
pub enum Payload {
    Text(String),
    Base64(String),
}

impl Payload {
    pub fn text(value: impl Into<String>) -> Self {
        Payload::Text(value.into())
    }

    pub fn from_bytes(data: &[u8]) -> Self {
        match std::str::from_utf8(data) {
            Ok(text) => Payload::Text(text.to_string()),
            Err(_) => Payload::Base64(STANDARD.encode(data)),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            Payload::Base64(_) => None,
        }
    }

    pub fn to_bytes(&self) -> TypesResult<Bytes> {
        match self {
            Payload::Text(text) => Ok(Bytes::copy_from_slice(text.as_bytes())),
            Payload::Base64(encoded) => STANDARD
                .decode(encoded)
                .map(Bytes::from)
                .map_err(|e| TypesError::IllegalArgument(format!("invalid base64 payload: {e}"))),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Payload::Text(text) => text.trim().is_empty(),
            Payload::Base64(encoded) => encoded.is_empty(),
        }
    }
}

/// An inbound or outbound protocol message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub header: MessageHeader,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
}

impl Envelope {
    pub fn new(header: MessageHeader) -> Self {
        Self {
            header,
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Reply to an inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "response", rename_all = "snake_case")]
pub enum MessageResponse {
    Body {
        header: MessageHeader,
        payload: Payload,
    },
    Error {
        header: MessageHeader,
        reason: RejectionReason,
        message: String,
    },
}

impl MessageResponse {
    pub fn header(&self) -> &MessageHeader {
        match self {
            MessageResponse::Body { header, .. } => header,
            MessageResponse::Error { header, .. } => header,
        }
    }

    pub fn rejection_reason(&self) -> Option<RejectionReason> {
        match self {
            MessageResponse::Body { .. } => None,
            MessageResponse::Error { reason, .. } => Some(*reason),
        }
    }

    pub fn payload(&self) -> Option<&Payload> {
        match self {
            MessageResponse::Body { payload, .. } => Some(payload),
            MessageResponse::Error { .. } => None,
        }
    }
}

/// Request-time parameters applied when fetching artifact data from a backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryInput {
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    /// Values substituted into `{name}` placeholders of the backend URL.
    #[serde(default)]
    pub path_variables: BTreeMap<String, String>,
    /// Extra path appended to the backend URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<String>,
}

impl QueryInput {
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
            && self.params.is_empty()
            && self.path_variables.is_empty()
            && self.optional.is_none()
    }
}
