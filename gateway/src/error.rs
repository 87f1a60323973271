//! Gateway error types.

use thiserror::Error;

use crate::models::MapperAction;

/// Result type alias for mapper operations.
pub type Result<T> = std::result::Result<T, MapperError>;

/// Transport-level failures talking to the ID Mapper endpoint.
///
/// Dispatch treats [`TransportError::Timeout`] differently from every
/// other variant, so the classification here must stay faithful to what
/// actually happened on the wire.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The endpoint did not answer before the read timeout elapsed.
    #[error("Request timed out")]
    Timeout,

    /// A connection could not be established.
    #[error("Connection failed: {0}")]
    Connect(String),

    /// The endpoint answered with a non-success HTTP status.
    #[error("Endpoint returned HTTP {0}")]
    Status(u16),

    /// The response body could not be decoded as an acknowledgement.
    #[error("Malformed acknowledgement: {0}")]
    Malformed(String),
}

/// Errors surfaced by the mapper services.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MapperError {
    // ═══════════════════════════════════════════════════════════════
    // Outcome Errors
    // ═══════════════════════════════════════════════════════════════
    /// The poll budget ran out before the transaction reached a
    /// terminal status.
    #[error("Max poll retries exhausted for {action} status")]
    RetriesExhausted {
        /// Action whose status was being awaited.
        action: MapperAction,
    },

    /// A resolve value carried neither an id nor a financial address.
    #[error("Resolve value at index {index} has neither id nor fa")]
    MissingIdentifier {
        /// Position of the offending value in the submitted batch.
        index: usize,
    },

    /// No status record exists for the given transaction id.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    // ═══════════════════════════════════════════════════════════════
    // Infrastructure Errors
    // ═══════════════════════════════════════════════════════════════
    /// Status store operation failed.
    #[error("Store error: {0}")]
    Store(String),

    /// Payload could not be serialized or deserialized.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Transport-level failure talking to the endpoint.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Internal invariant violation.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MapperError {
    /// Protocol error code for errors that carry one.
    #[must_use]
    pub const fn code(&self) -> Option<&'static str> {
        match self {
            Self::RetriesExhausted { action } => Some(match action {
                MapperAction::Link => "G2P-MAP-100",
                MapperAction::Resolve => "G2P-MAP-101",
                MapperAction::Update => "G2P-MAP-102",
            }),
            _ => None,
        }
    }
}
