//! Mock ID Mapper endpoint for testing.

use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::error::TransportError;
use crate::models::{
    Ack, CommonResponse, CommonResponseError, CommonResponseMessage, LinkHttpRequest,
    MapperAction, ResolveHttpRequest, UpdateHttpRequest,
};
use crate::providers::{BlockingMapperEndpoint, MapperEndpoint};

/// Scripted response behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Behavior {
    /// Positive acknowledgement.
    Ack,

    /// Negative acknowledgement with a canned error detail.
    Nack,

    /// Read timeout.
    Timeout,

    /// Non-success HTTP status.
    HttpStatus(u16),

    /// Connection failure.
    ConnectError,
}

/// Mock ID Mapper endpoint.
///
/// Answers every request with one scripted behavior and records which
/// actions it received, so tests can assert on dispatch counts.
#[derive(Debug, Clone)]
pub struct MockMapperEndpoint {
    behavior: Behavior,
    requests: Arc<Mutex<Vec<(MapperAction, String)>>>,
}

impl MockMapperEndpoint {
    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Endpoint that acknowledges every request.
    #[must_use]
    pub fn acking() -> Self {
        Self::with_behavior(Behavior::Ack)
    }

    /// Endpoint that rejects every request with a NACK.
    #[must_use]
    pub fn nacking() -> Self {
        Self::with_behavior(Behavior::Nack)
    }

    /// Endpoint whose requests always time out.
    #[must_use]
    pub fn timing_out() -> Self {
        Self::with_behavior(Behavior::Timeout)
    }

    /// Endpoint that answers every request with the given HTTP status.
    #[must_use]
    pub fn returning_status(status: u16) -> Self {
        Self::with_behavior(Behavior::HttpStatus(status))
    }

    /// Endpoint that refuses every connection.
    #[must_use]
    pub fn refusing_connections() -> Self {
        Self::with_behavior(Behavior::ConnectError)
    }

    /// Snapshot of the recorded `(action, transaction_id)` pairs.
    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    #[must_use]
    pub fn requests(&self) -> Vec<(MapperAction, String)> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests this endpoint received.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests().len()
    }

    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    fn record(&self, action: MapperAction, txn_id: &str) {
        self.requests
            .lock()
            .unwrap()
            .push((action, txn_id.to_string()));
    }

    fn respond(&self) -> Result<CommonResponseMessage, TransportError> {
        match self.behavior {
            Behavior::Ack => Ok(envelope(Ack::Ack, None)),
            Behavior::Nack => Ok(envelope(
                Ack::Nack,
                Some(CommonResponseError {
                    code: "err.request.rejected".to_string(),
                    message: "scripted rejection".to_string(),
                }),
            )),
            Behavior::Timeout => Err(TransportError::Timeout),
            Behavior::HttpStatus(status) => Err(TransportError::Status(status)),
            Behavior::ConnectError => {
                Err(TransportError::Connect("connection refused".to_string()))
            }
        }
    }
}

fn envelope(ack_status: Ack, error: Option<CommonResponseError>) -> CommonResponseMessage {
    CommonResponseMessage {
        message: CommonResponse {
            ack_status,
            timestamp: Utc::now(),
            error,
            correlation_id: None,
        },
    }
}

impl MapperEndpoint for MockMapperEndpoint {
    async fn link(
        &self,
        request: &LinkHttpRequest,
    ) -> Result<CommonResponseMessage, TransportError> {
        self.record(MapperAction::Link, &request.message.transaction_id);
        self.respond()
    }

    async fn update(
        &self,
        request: &UpdateHttpRequest,
    ) -> Result<CommonResponseMessage, TransportError> {
        self.record(MapperAction::Update, &request.message.transaction_id);
        self.respond()
    }

    async fn resolve(
        &self,
        request: &ResolveHttpRequest,
    ) -> Result<CommonResponseMessage, TransportError> {
        self.record(MapperAction::Resolve, &request.message.transaction_id);
        self.respond()
    }
}

impl BlockingMapperEndpoint for MockMapperEndpoint {
    fn link(&self, request: &LinkHttpRequest) -> Result<CommonResponseMessage, TransportError> {
        self.record(MapperAction::Link, &request.message.transaction_id);
        self.respond()
    }

    fn update(
        &self,
        request: &UpdateHttpRequest,
    ) -> Result<CommonResponseMessage, TransportError> {
        self.record(MapperAction::Update, &request.message.transaction_id);
        self.respond()
    }
}
