//! Ack interpretation and status transitions for dispatched requests.
//!
//! Every service executor funnels its endpoint result through these
//! three pure functions, so the decision table lives in exactly one
//! place. Dispatch runs once per transaction; a terminal status written
//! here is never revisited by this layer.

use crate::error::TransportError;
use crate::models::{Ack, CommonResponseMessage, MapperAction, RequestStatus};

/// What one dispatch attempt amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DispatchOutcome {
    /// Positive acknowledgement: the mapper will process the batch.
    Acked,

    /// Negative acknowledgement, with the error detail when present.
    Nacked(Option<String>),

    /// The endpoint did not answer before the read timeout.
    TimedOut,

    /// Any other transport failure.
    Failed(String),
}

/// How a timed-out dispatch affects the stored status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimeoutRule {
    /// Keep the status as-is; the mapper may still have accepted the
    /// request and a later callback or poll can resolve it. Link and
    /// update use this.
    LeaveUnchanged,

    /// Treat the timeout as a rejection. Resolve uses this: a lookup
    /// nobody answered has no value later.
    Reject,
}

/// Classify an endpoint result into a dispatch outcome.
pub(crate) fn classify(
    result: &Result<CommonResponseMessage, TransportError>,
) -> DispatchOutcome {
    match result {
        Ok(envelope) => match envelope.message.ack_status {
            Ack::Ack => DispatchOutcome::Acked,
            Ack::Nack => DispatchOutcome::Nacked(
                envelope
                    .message
                    .error
                    .as_ref()
                    .map(|e| format!("{}: {}", e.code, e.message)),
            ),
        },
        Err(TransportError::Timeout) => DispatchOutcome::TimedOut,
        Err(e) => DispatchOutcome::Failed(e.to_string()),
    }
}

/// Status to write for an outcome, or `None` to leave it untouched.
pub(crate) const fn transition_for(
    outcome: &DispatchOutcome,
    rule: TimeoutRule,
) -> Option<RequestStatus> {
    match outcome {
        DispatchOutcome::Acked => Some(RequestStatus::Pdng),
        DispatchOutcome::Nacked(_) | DispatchOutcome::Failed(_) => Some(RequestStatus::Rjct),
        DispatchOutcome::TimedOut => match rule {
            TimeoutRule::LeaveUnchanged => None,
            TimeoutRule::Reject => Some(RequestStatus::Rjct),
        },
    }
}

/// Log one dispatch outcome with action and transaction context.
pub(crate) fn log_outcome(action: MapperAction, txn_id: &str, outcome: &DispatchOutcome) {
    match outcome {
        DispatchOutcome::Acked => {
            tracing::debug!(action = %action, txn_id = %txn_id, "Mapper acknowledged request");
        }
        DispatchOutcome::Nacked(detail) => {
            tracing::error!(
                action = %action,
                txn_id = %txn_id,
                detail = detail.as_deref().unwrap_or("none"),
                "Mapper rejected request"
            );
        }
        DispatchOutcome::TimedOut => {
            tracing::warn!(action = %action, txn_id = %txn_id, "Mapper request timed out");
        }
        DispatchOutcome::Failed(reason) => {
            tracing::error!(
                action = %action,
                txn_id = %txn_id,
                reason = %reason,
                "Mapper request failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CommonResponse, CommonResponseError};
    use chrono::Utc;

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

    #[test]
    fn test_classify_ack() {
        let result = Ok(envelope(Ack::Ack, None));
        assert_eq!(classify(&result), DispatchOutcome::Acked);
    }

    #[test]
    fn test_classify_nack_carries_error_detail() {
        let result = Ok(envelope(
            Ack::Nack,
            Some(CommonResponseError {
                code: "err.request.bad".to_string(),
                message: "malformed batch".to_string(),
            }),
        ));
        assert_eq!(
            classify(&result),
            DispatchOutcome::Nacked(Some("err.request.bad: malformed batch".to_string()))
        );

        let bare = Ok(envelope(Ack::Nack, None));
        assert_eq!(classify(&bare), DispatchOutcome::Nacked(None));
    }

    #[test]
    fn test_classify_transport_failures() {
        assert_eq!(
            classify(&Err(TransportError::Timeout)),
            DispatchOutcome::TimedOut
        );
        assert_eq!(
            classify(&Err(TransportError::Status(503))),
            DispatchOutcome::Failed("Endpoint returned HTTP 503".to_string())
        );
        assert_eq!(
            classify(&Err(TransportError::Connect("refused".to_string()))),
            DispatchOutcome::Failed("Connection failed: refused".to_string())
        );
        assert_eq!(
            classify(&Err(TransportError::Malformed("bad json".to_string()))),
            DispatchOutcome::Failed("Malformed acknowledgement: bad json".to_string())
        );
    }

    #[test]
    fn test_transition_decision_table() {
        for rule in [TimeoutRule::LeaveUnchanged, TimeoutRule::Reject] {
            assert_eq!(
                transition_for(&DispatchOutcome::Acked, rule),
                Some(RequestStatus::Pdng)
            );
            assert_eq!(
                transition_for(&DispatchOutcome::Nacked(None), rule),
                Some(RequestStatus::Rjct)
            );
            assert_eq!(
                transition_for(&DispatchOutcome::Failed("x".to_string()), rule),
                Some(RequestStatus::Rjct)
            );
        }

        assert_eq!(
            transition_for(&DispatchOutcome::TimedOut, TimeoutRule::LeaveUnchanged),
            None
        );
        assert_eq!(
            transition_for(&DispatchOutcome::TimedOut, TimeoutRule::Reject),
            Some(RequestStatus::Rjct)
        );
    }
}
