//! Core status model shared by every mapper action.
//!
//! These types track one batch submission (a *transaction*) and the
//! per-item records (*references*) inside it, plus the acknowledgement
//! envelope the ID Mapper returns synchronously.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════
// Wire Enums
// ═══════════════════════════════════════════════════════════════════════

/// Synchronous accept/reject signal returned by the ID Mapper endpoint.
///
/// `Ack` only means "request accepted for processing"; the final
/// per-reference outcome arrives later through the callback path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ack {
    /// Request accepted for processing.
    #[serde(rename = "ACK")]
    Ack,

    /// Request rejected at the protocol boundary.
    #[serde(rename = "NACK")]
    Nack,
}

/// Lifecycle status of a reference or of a whole transaction.
///
/// Transitions are `Rcvd → Pdng → {Succ, Rjct}`. Dispatch writes at
/// most one transition per transaction; after that only the callback
/// path moves individual references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Received; initial state before the dispatch outcome is known.
    Rcvd,

    /// Dispatched and positively acknowledged; awaiting the final outcome.
    Pdng,

    /// Succeeded (terminal).
    Succ,

    /// Rejected (terminal).
    Rjct,
}

impl RequestStatus {
    /// Whether this status ends a record's lifecycle.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succ | Self::Rjct)
    }
}

/// The three usage patterns this gateway implements against the ID Mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapperAction {
    /// Register id ↔ financial-address associations.
    Link,

    /// Modify previously registered associations.
    Update,

    /// Look up the counterpart of an id or a financial address.
    Resolve,
}

impl MapperAction {
    /// Wire name carried in message headers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Link => "link",
            Self::Update => "update",
            Self::Resolve => "resolve",
        }
    }
}

impl fmt::Display for MapperAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Caller Input
// ═══════════════════════════════════════════════════════════════════════

/// One identity ↔ financial-address mapping submitted by a caller.
///
/// Link and update expect both `id` and `fa`; resolve requires at least
/// one of them (enforced by the resolve service before any dispatch).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapperValue {
    /// Beneficiary identity reference.
    pub id: Option<String>,

    /// Financial address.
    pub fa: Option<String>,

    /// Display name.
    pub name: Option<String>,

    /// Phone number.
    pub phone_number: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════
// Transaction Records
// ═══════════════════════════════════════════════════════════════════════

/// Lifecycle record for a single reference within a transaction.
///
/// Owned exclusively by the transaction that created it; a reference id
/// is never shared across transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleTxnRefStatus {
    /// System-generated unique token identifying this reference.
    pub reference_id: String,

    /// Identity reference copied from the originating mapping.
    pub id: Option<String>,

    /// Financial address copied from the originating mapping.
    pub fa: Option<String>,

    /// Display name copied from the originating mapping.
    pub name: Option<String>,

    /// Phone number copied from the originating mapping.
    pub phone_number: Option<String>,

    /// Current lifecycle status.
    pub status: RequestStatus,
}

impl SingleTxnRefStatus {
    /// Create a reference record in [`RequestStatus::Rcvd`] from its
    /// input mapping.
    #[must_use]
    pub fn received(reference_id: String, mapping: &MapperValue) -> Self {
        Self {
            reference_id,
            id: mapping.id.clone(),
            fa: mapping.fa.clone(),
            name: mapping.name.clone(),
            phone_number: mapping.phone_number.clone(),
            status: RequestStatus::Rcvd,
        }
    }
}

/// Aggregate record for one batch submission.
///
/// The aggregate `status` is the authoritative status of the whole batch
/// at a given instant. The dispatch layer only ever broadcasts one value
/// to the aggregate and every reference together; per-reference
/// divergence can only arrive through the callback path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxnStatus {
    /// Transaction id.
    pub txn_id: String,

    /// Aggregate status for the whole batch.
    pub status: RequestStatus,

    /// Per-reference records, keyed by reference id.
    pub refs: HashMap<String, SingleTxnRefStatus>,
}

impl TxnStatus {
    /// Create a transaction record in [`RequestStatus::Rcvd`].
    #[must_use]
    pub const fn received(txn_id: String, refs: HashMap<String, SingleTxnRefStatus>) -> Self {
        Self {
            txn_id,
            status: RequestStatus::Rcvd,
            refs,
        }
    }

    /// Assign `status` to the aggregate and to every reference in one
    /// call.
    ///
    /// This is the only status mutation the dispatch layer performs.
    pub fn set_all_statuses(&mut self, status: RequestStatus) {
        self.status = status;
        for r in self.refs.values_mut() {
            r.status = status;
        }
    }

    /// Recompute the aggregate from the per-reference statuses.
    ///
    /// Used after a callback applied per-reference outcomes: the
    /// aggregate stays [`RequestStatus::Pdng`] while any reference is
    /// non-terminal, becomes [`RequestStatus::Succ`] only when every
    /// reference succeeded, and [`RequestStatus::Rjct`] otherwise.
    pub fn recompute_aggregate(&mut self) {
        if self.refs.values().any(|r| !r.status.is_terminal()) {
            self.status = RequestStatus::Pdng;
        } else if self.refs.values().all(|r| r.status == RequestStatus::Succ) {
            self.status = RequestStatus::Succ;
        } else {
            self.status = RequestStatus::Rjct;
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Acknowledgement Envelope
// ═══════════════════════════════════════════════════════════════════════

/// Acknowledgement payload returned synchronously by the ID Mapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonResponse {
    /// Accept/reject signal.
    pub ack_status: Ack,

    /// Acknowledgement timestamp.
    pub timestamp: DateTime<Utc>,

    /// Error detail accompanying a negative acknowledgement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<CommonResponseError>,

    /// Correlation id assigned by the mapper.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

/// Error member of a [`CommonResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonResponseError {
    /// Machine-readable error code.
    pub code: String,

    /// Human-readable description.
    pub message: String,
}

/// Envelope wrapping the acknowledgement payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonResponseMessage {
    /// Acknowledgement payload.
    pub message: CommonResponse,
}

/// Free-form name/value supplement carried by update requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalInfo {
    /// Field name.
    pub name: String,

    /// Field value.
    pub value: serde_json::Value,
}
