//! Wire types for the resolve action.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::{AdditionalInfo, RequestStatus};
use super::message::{MsgCallbackHeader, MsgHeader};

/// Status reason codes a mapper may attach to a resolve outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolveStatusReasonCode {
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

    /// No registration matched the lookup key.
    #[serde(rename = "succ.id.not_found")]
    SuccIdNotFound,

    /// Identity is registered and active.
    #[serde(rename = "succ.id.active")]
    SuccIdActive,

    /// Identity is registered but inactive.
    #[serde(rename = "succ.id.inactive")]
    SuccIdInactive,

    /// Financial address is registered and active.
    #[serde(rename = "succ.fa.active")]
    SuccFaActive,

    /// Financial address is registered but inactive.
    #[serde(rename = "succ.fa.inactive")]
    SuccFaInactive,
}

/// Scope qualifier for a resolve lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveScope {
    /// Return the full registration details.
    Details,

    /// Only confirm whether a registration exists.
    YesNo,
}

/// One resolve sub-request; exactly one of `id`/`fa` is the lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleResolveRequest {
    /// Reference id correlating this sub-request with its callback
    /// sub-response.
    pub reference_id: String,

    /// Request creation timestamp.
    pub timestamp: DateTime<Utc>,

    /// Identity reference to resolve, when resolving id → fa.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Financial address to resolve, when resolving fa → id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fa: Option<String>,

    /// Lookup scope.
    pub scope: ResolveScope,

    /// Supplementary fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<Vec<AdditionalInfo>>,

    /// Locale of the textual fields.
    pub locale: String,
}

/// Body of a resolve request message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveRequest {
    /// Transaction id shared by every sub-request in the batch.
    pub transaction_id: String,

    /// Sub-requests.
    pub resolve_request: Vec<SingleResolveRequest>,
}

/// Full resolve request message (header + signed body).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveHttpRequest {
    /// Detached signature over header and message.
    pub signature: String,

    /// Message header.
    pub header: MsgHeader,

    /// Message body.
    pub message: ResolveRequest,
}

/// One resolve sub-response inside a callback.
///
/// On success `id` and `fa` carry the resolved pair; whichever side was
/// the lookup key is echoed back alongside its counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleResolveCallbackRequest {
    /// Reference id of the sub-request this answers.
    pub reference_id: String,

    /// Response timestamp.
    pub timestamp: DateTime<Utc>,

    /// Outcome for this reference.
    pub status: RequestStatus,

    /// Machine-readable reason detailing the outcome.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_reason_code: Option<ResolveStatusReasonCode>,

    /// Human-readable reason detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_reason_message: Option<String>,

    /// Resolved identity reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Resolved financial address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fa: Option<String>,

    /// Supplementary fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<Vec<AdditionalInfo>>,

    /// Locale of the textual fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

/// Body of a resolve callback message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveCallbackRequest {
    /// Transaction id of the original batch.
    pub transaction_id: String,

    /// Correlation id assigned by the mapper, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,

    /// Sub-responses.
    pub resolve_response: Vec<SingleResolveCallbackRequest>,

    /// Free-form metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Full resolve callback message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveCallbackHttpRequest {
    /// Detached signature over header and message.
    pub signature: String,

    /// Callback header.
    pub header: MsgCallbackHeader,

    /// Callback body.
    pub message: ResolveCallbackRequest,
}
