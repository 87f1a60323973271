//! Wire types for the update action.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::{AdditionalInfo, RequestStatus};
use super::message::{MsgCallbackHeader, MsgHeader};

/// Status reason codes a mapper may attach to an update outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateStatusReasonCode {
    /// Reference id is malformed or unknown.
    #[serde(rename = "rjct.reference_id.invalid")]
    RjctReferenceIdInvalid,

    /// Reference id was already used.
    #[serde(rename = "rjct.reference_id.duplicate")]
    RjctReferenceIdDuplicate,

    /// Timestamp is malformed or out of the accepted window.
    #[serde(rename = "rjct.timestamp.invalid")]
    RjctTimestampInvalid,

    /// Beneficiary name failed validation.
    #[serde(rename = "rjct.beneficiary_name.invalid")]
    RjctBeneficiaryNameInvalid,
}

/// One update sub-request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleUpdateRequest {
    /// Reference id correlating this sub-request with its callback
    /// sub-response.
    pub reference_id: String,

    /// Request creation timestamp.
    pub timestamp: DateTime<Utc>,

    /// Identity reference whose registration is modified.
    pub id: String,

    /// Replacement financial address.
    pub fa: String,

    /// Replacement display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Replacement phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,

    /// Supplementary field. Update carries a single value, not the
    /// list the other actions accept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<AdditionalInfo>,

    /// Locale of the textual fields.
    pub locale: String,
}

/// Body of an update request message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRequest {
    /// Transaction id shared by every sub-request in the batch.
    pub transaction_id: String,

    /// Sub-requests.
    pub update_request: Vec<SingleUpdateRequest>,
}

/// Full update request message (header + signed body).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateHttpRequest {
    /// Detached signature over header and message.
    pub signature: String,

    /// Message header.
    pub header: MsgHeader,

    /// Message body.
    pub message: UpdateRequest,
}

/// One update sub-response inside a callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleUpdateCallbackRequest {
    /// Reference id of the sub-request this answers.
    pub reference_id: String,

    /// Response timestamp.
    pub timestamp: DateTime<Utc>,

    /// Identity reference echoed by the mapper, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Outcome for this reference.
    pub status: RequestStatus,

    /// Machine-readable reason accompanying a rejection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_reason_code: Option<UpdateStatusReasonCode>,

    /// Human-readable reason detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_reason_message: Option<String>,

    /// Supplementary field. Update carries a single value, not the
    /// list the other actions accept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<AdditionalInfo>,

    /// Locale of the textual fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

/// Body of an update callback message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCallbackRequest {
    /// Transaction id of the original batch.
    pub transaction_id: String,

    /// Correlation id assigned by the mapper, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,

    /// Sub-responses.
    pub update_response: Vec<SingleUpdateCallbackRequest>,

    /// Free-form metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Full update callback message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCallbackHttpRequest {
    /// Detached signature over header and message.
    pub signature: String,

    /// Callback header.
    pub header: MsgCallbackHeader,

    /// Callback body.
    pub message: UpdateCallbackRequest,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;

    #[test]
    fn test_reason_code_wire_values() {
        assert_eq!(
            serde_json::to_string(&UpdateStatusReasonCode::RjctBeneficiaryNameInvalid).unwrap(),
            "\"rjct.beneficiary_name.invalid\""
        );
    }

    #[test]
    fn test_sub_request_omits_empty_optionals() {
        let sub = SingleUpdateRequest {
            reference_id: "ref-1".to_string(),
            timestamp: Utc::now(),
            id: "token-1".to_string(),
            fa: "acct-1@bank".to_string(),
            name: None,
            phone_number: None,
            additional_info: None,
            locale: "eng".to_string(),
        };
        let json = serde_json::to_value(&sub).unwrap();

        assert_eq!(json["id"], "token-1");
        assert_eq!(json["locale"], "eng");
        assert!(json.get("name").is_none());
        assert!(json.get("additional_info").is_none());
    }
}
