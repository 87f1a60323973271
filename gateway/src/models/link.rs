//! Wire types for the link action.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::{AdditionalInfo, RequestStatus};
use super::message::{MsgCallbackHeader, MsgHeader};

/// Status reason codes a mapper may attach to a link outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkStatusReasonCode {
    /// Reference id is malformed or unknown.
    #[serde(rename = "rjct.reference_id.invalid")]
    RjctReferenceIdInvalid,

    /// Reference id was already used.
    #[serde(rename = "rjct.reference_id.duplicate")]
    RjctReferenceIdDuplicate,

    /// Timestamp is malformed or out of the accepted window.
    #[serde(rename = "rjct.timestamp.invalid")]
    RjctTimestampInvalid,

    /// Identity reference failed validation.
    #[serde(rename = "rjct.id.invalid")]
    RjctIdInvalid,

    /// Financial address failed validation.
    #[serde(rename = "rjct.fa.invalid")]
    RjctFaInvalid,

    /// Name failed validation.
    #[serde(rename = "rjct.name.invalid")]
    RjctNameInvalid,

    /// Mobile number failed validation.
    #[serde(rename = "rjct.mobile_number.invalid")]
    RjctMobileNumberInvalid,

    /// Transient failure; the caller may retry.
    #[serde(rename = "rjct.unknown.retry")]
    RjctUnknownRetry,

    /// Unclassified failure.
    #[serde(rename = "rjct.other.error")]
    RjctOtherError,
}

/// One link sub-request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleLinkRequest {
    /// Reference id correlating this sub-request with its callback
    /// sub-response.
    pub reference_id: String,

    /// Request creation timestamp.
    pub timestamp: DateTime<Utc>,

    /// Identity reference to link.
    pub id: String,

    /// Financial address to link.
    pub fa: String,

    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,

    /// Supplementary fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<Vec<AdditionalInfo>>,

    /// Locale of the textual fields.
    pub locale: String,
}

/// Body of a link request message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRequest {
    /// Transaction id shared by every sub-request in the batch.
    pub transaction_id: String,

    /// Sub-requests.
    pub link_request: Vec<SingleLinkRequest>,
}

/// Full link request message (header + signed body).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkHttpRequest {
    /// Detached signature over header and message.
    pub signature: String,

    /// Message header.
    pub header: MsgHeader,

    /// Message body.
    pub message: LinkRequest,
}

/// One link sub-response inside a callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleLinkCallbackRequest {
    /// Reference id of the sub-request this answers.
    pub reference_id: String,

    /// Response timestamp.
    pub timestamp: DateTime<Utc>,

    /// Financial address the reference was linked against, echoed by
    /// the mapper.
    pub fa: String,

    /// Outcome for this reference.
    pub status: RequestStatus,

    /// Machine-readable reason accompanying a rejection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_reason_code: Option<LinkStatusReasonCode>,

    /// Human-readable reason detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_reason_message: Option<String>,

    /// Supplementary fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<Vec<AdditionalInfo>>,

    /// Locale of the textual fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

/// Body of a link callback message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCallbackRequest {
    /// Transaction id of the original batch.
    pub transaction_id: String,

    /// Correlation id assigned by the mapper, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,

    /// Sub-responses.
    pub link_response: Vec<SingleLinkCallbackRequest>,

    /// Free-form metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Full link callback message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCallbackHttpRequest {
    /// Detached signature over header and message.
    pub signature: String,

    /// Callback header.
    pub header: MsgCallbackHeader,

    /// Callback body.
    pub message: LinkCallbackRequest,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;

    #[test]
    fn test_reason_code_wire_values() {
        assert_eq!(
            serde_json::to_string(&LinkStatusReasonCode::RjctFaInvalid).unwrap(),
            "\"rjct.fa.invalid\""
        );
        assert_eq!(
            serde_json::from_str::<LinkStatusReasonCode>("\"rjct.unknown.retry\"").unwrap(),
            LinkStatusReasonCode::RjctUnknownRetry
        );
    }

    #[test]
    fn test_callback_parses_wire_payload() {
        let json = serde_json::json!({
            "signature": "sig",
            "header": {
                "version": "1.0.0",
                "message_id": "msg-1",
                "message_ts": "2024-05-01T10:00:00Z",
                "action": "link",
                "status": "succ",
                "total_count": 1,
                "is_msg_encrypted": false
            },
            "message": {
                "transaction_id": "txn-1",
                "link_response": [{
                    "reference_id": "ref-1",
                    "timestamp": "2024-05-01T10:00:01Z",
                    "fa": "acct-1@bank",
                    "status": "rjct",
                    "status_reason_code": "rjct.id.invalid",
                    "status_reason_message": "unknown beneficiary"
                }]
            }
        });
        let callback: LinkCallbackHttpRequest = serde_json::from_value(json).unwrap();

        assert_eq!(callback.message.transaction_id, "txn-1");
        let sub = &callback.message.link_response[0];
        assert_eq!(sub.fa, "acct-1@bank");
        assert_eq!(sub.status, RequestStatus::Rjct);
        assert_eq!(
            sub.status_reason_code,
            Some(LinkStatusReasonCode::RjctIdInvalid)
        );
    }
}
