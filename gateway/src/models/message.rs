//! Protocol message headers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::{Ack, MapperAction, RequestStatus};

/// Protocol version stamped on every outbound header.
pub const PROTOCOL_VERSION: &str = "1.0.0";

/// Header of an outbound request message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgHeader {
    /// Protocol version.
    pub version: String,

    /// Unique id of this message.
    pub message_id: String,

    /// Message creation timestamp.
    pub message_ts: DateTime<Utc>,

    /// Action the message carries.
    pub action: MapperAction,

    /// Sender identifier.
    pub sender_id: String,

    /// Callback URI the receiver should report outcomes to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_uri: Option<String>,

    /// Receiver identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_id: Option<String>,

    /// Number of sub-requests in the message body.
    pub total_count: u64,

    /// Whether the message body is encrypted.
    pub is_msg_encrypted: bool,

    /// Free-form metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl MsgHeader {
    /// Build a header for `action` with a fresh message id and the
    /// current timestamp.
    #[must_use]
    pub fn new(action: MapperAction, sender_id: String, total_count: u64) -> Self {
        Self {
            version: PROTOCOL_VERSION.to_string(),
            message_id: uuid::Uuid::new_v4().to_string(),
            message_ts: Utc::now(),
            action,
            sender_id,
            sender_uri: None,
            receiver_id: None,
            total_count,
            is_msg_encrypted: false,
            meta: None,
        }
    }

    /// Set the callback URI.
    #[must_use]
    pub fn with_sender_uri(mut self, sender_uri: String) -> Self {
        self.sender_uri = Some(sender_uri);
        self
    }
}

/// Header of an inbound callback message.
///
/// Mirrors [`MsgHeader`] but also carries the outcome summary the
/// mapper computed for the whole original message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCallbackHeader {
    /// Protocol version.
    pub version: String,

    /// Message id of the original request this callback answers.
    pub message_id: String,

    /// Callback creation timestamp.
    pub message_ts: DateTime<Utc>,

    /// Action the callback answers.
    pub action: MapperAction,

    /// Overall processing status reported by the mapper.
    pub status: RequestStatus,

    /// Machine-readable status code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_reason_code: Option<String>,

    /// Human-readable status detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_reason_message: Option<String>,

    /// Sender identifier of the callback (the mapper).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,

    /// Receiver identifier of the callback (this gateway).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_id: Option<String>,

    /// Number of sub-responses in the callback body.
    pub total_count: u64,

    /// Number of sub-requests that completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_count: Option<u64>,

    /// Acknowledgement echoed by some mapper implementations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack_status: Option<Ack>,

    /// Whether the callback body is encrypted.
    pub is_msg_encrypted: bool,

    /// Free-form metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}
