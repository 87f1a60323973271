//! Link service: registers id ↔ financial-address associations.

use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use crate::config::{MapperConfig, PollPolicy};
use crate::dispatch::{classify, log_outcome, transition_for, TimeoutRule};
use crate::error::{MapperError, Result};
use crate::models::{
    LinkCallbackRequest, LinkHttpRequest, LinkRequest, MapperAction, MapperValue, MsgHeader,
    RequestStatus, SingleLinkRequest, SingleTxnRefStatus, TxnStatus,
};
use crate::providers::{BlockingMapperEndpoint, BlockingStatusStore, MapperEndpoint, StatusStore};

/// Build the wire request and the initial status record for one batch.
///
/// Every mapping gets a fresh `reference_id` correlating its wire
/// sub-request with its status record.
fn build_link_request(
    mappings: &[MapperValue],
    txn_id: String,
    config: &MapperConfig,
) -> (LinkHttpRequest, TxnStatus) {
    let timestamp = Utc::now();
    let mut refs = HashMap::with_capacity(mappings.len());
    let mut link_request = Vec::with_capacity(mappings.len());

    for mapping in mappings {
        let reference_id = Uuid::new_v4().to_string();
        refs.insert(
            reference_id.clone(),
            SingleTxnRefStatus::received(reference_id.clone(), mapping),
        );
        link_request.push(SingleLinkRequest {
            reference_id,
            timestamp,
            id: mapping.id.clone().unwrap_or_default(),
            fa: mapping.fa.clone().unwrap_or_default(),
            name: mapping.name.clone(),
            phone_number: mapping.phone_number.clone(),
            additional_info: None,
            locale: "eng".to_string(),
        });
    }

    let header = MsgHeader::new(
        MapperAction::Link,
        config.sender_id.clone(),
        mappings.len() as u64,
    )
    .with_sender_uri(config.link_callback_url.clone());

    let request = LinkHttpRequest {
        signature: config.signature.clone(),
        header,
        message: LinkRequest {
            transaction_id: txn_id.clone(),
            link_request,
        },
    };

    (request, TxnStatus::received(txn_id, refs))
}

/// One-shot dispatch: POST the batch, interpret the acknowledgement,
/// persist the resulting status.
///
/// A read timeout leaves the stored record untouched so a later
/// callback or poll can still resolve it. Store failures are logged,
/// never propagated.
async fn dispatch_link<E: MapperEndpoint, S: StatusStore>(
    endpoint: &E,
    store: &S,
    request: &LinkHttpRequest,
    mut status: TxnStatus,
) {
    let result = endpoint.link(request).await;
    let outcome = classify(&result);
    log_outcome(MapperAction::Link, &status.txn_id, &outcome);

    let Some(next) = transition_for(&outcome, TimeoutRule::LeaveUnchanged) else {
        return;
    };
    status.set_all_statuses(next);
    if let Err(e) = store.put(&status).await {
        tracing::error!(
            txn_id = %status.txn_id,
            error = %e,
            "Failed to persist dispatch outcome"
        );
    }
}

/// Submits link batches to the ID Mapper and correlates outcomes
/// through the durable status store.
///
/// # Example
///
/// ```no_run
/// use idmap_gateway::config::MapperConfig;
/// use idmap_gateway::mocks::{MockMapperEndpoint, MockStatusStore};
/// use idmap_gateway::models::MapperValue;
/// use idmap_gateway::services::LinkService;
///
/// # async fn example() -> Result<(), idmap_gateway::error::MapperError> {
/// let service = LinkService::new(
///     MockMapperEndpoint::acking(),
///     MockStatusStore::new(),
///     MapperConfig::default(),
/// );
///
/// let mapping = MapperValue {
///     id: Some("token-1".to_string()),
///     fa: Some("acct-1@bank".to_string()),
///     ..MapperValue::default()
/// };
/// let status = service.submit(&[mapping], None).await?;
/// println!("submitted txn {}", status.txn_id);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LinkService<E, S> {
    endpoint: E,
    store: S,
    config: MapperConfig,
}

impl<E, S> LinkService<E, S>
where
    E: MapperEndpoint + Clone + 'static,
    S: StatusStore + Clone + 'static,
{
    /// Create a new link service.
    #[must_use]
    pub const fn new(endpoint: E, store: S, config: MapperConfig) -> Self {
        Self {
            endpoint,
            store,
            config,
        }
    }

    /// Submit a batch without waiting for its outcome.
    ///
    /// Persists the initial record, hands the batch to a background
    /// dispatch task, and returns the `Rcvd` snapshot immediately. An
    /// empty batch performs no dispatch and returns `Succ`.
    ///
    /// # Errors
    ///
    /// Returns error if the initial record cannot be persisted.
    pub async fn submit(
        &self,
        mappings: &[MapperValue],
        txn_id: Option<String>,
    ) -> Result<TxnStatus> {
        let txn_id = txn_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let (request, mut status) = build_link_request(mappings, txn_id, &self.config);

        self.store.put(&status).await?;

        if mappings.is_empty() {
            status.set_all_statuses(RequestStatus::Succ);
            return Ok(status);
        }

        let endpoint = self.endpoint.clone();
        let store = self.store.clone();
        let dispatched = status.clone();
        tokio::spawn(async move {
            dispatch_link(&endpoint, &store, &request, dispatched).await;
        });

        Ok(status)
    }

    /// Submit a batch and poll the store until it reaches a terminal
    /// status.
    ///
    /// The dispatch runs inline; polling then re-reads the stored
    /// record up to `poll.max_attempts` times. The transaction is not
    /// cancelled when the budget runs out; a callback can still
    /// complete it later.
    ///
    /// # Errors
    ///
    /// - [`MapperError::RetriesExhausted`] if no terminal status was
    ///   observed within the poll budget.
    /// - [`MapperError::TransactionNotFound`] if the stored record
    ///   vanished mid-poll.
    /// - Store errors from persisting or reading the record.
    pub async fn submit_and_wait(
        &self,
        mappings: &[MapperValue],
        txn_id: Option<String>,
        poll: &PollPolicy,
    ) -> Result<TxnStatus> {
        let txn_id = txn_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let (request, mut status) = build_link_request(mappings, txn_id, &self.config);

        self.store.put(&status).await?;

        if mappings.is_empty() {
            status.set_all_statuses(RequestStatus::Succ);
            return Ok(status);
        }

        dispatch_link(&self.endpoint, &self.store, &request, status.clone()).await;

        for _ in 0..poll.max_attempts {
            let current = self
                .store
                .get(&status.txn_id)
                .await?
                .ok_or_else(|| MapperError::TransactionNotFound(status.txn_id.clone()))?;
            if current.status.is_terminal() {
                return Ok(current);
            }
            if !poll.interval.is_zero() {
                tokio::time::sleep(poll.interval).await;
            }
        }

        Err(MapperError::RetriesExhausted {
            action: MapperAction::Link,
        })
    }

    /// Apply a callback's per-reference outcomes to the stored record.
    ///
    /// Unknown reference ids are logged and skipped. The aggregate is
    /// recomputed from the references and the record persisted once.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::TransactionNotFound`] if no record exists
    /// for the callback's transaction id, or a store error.
    pub async fn apply_callback(&self, callback: &LinkCallbackRequest) -> Result<TxnStatus> {
        let txn_id = &callback.transaction_id;
        let mut status = self
            .store
            .get(txn_id)
            .await?
            .ok_or_else(|| MapperError::TransactionNotFound(txn_id.clone()))?;

        for response in &callback.link_response {
            let Some(r) = status.refs.get_mut(&response.reference_id) else {
                tracing::warn!(
                    txn_id = %txn_id,
                    reference_id = %response.reference_id,
                    "Callback for unknown reference id, skipping"
                );
                continue;
            };
            r.status = response.status;
            if response.status == RequestStatus::Rjct {
                tracing::warn!(
                    txn_id = %txn_id,
                    reference_id = %response.reference_id,
                    reason = ?response.status_reason_code,
                    "Link rejected for reference"
                );
            }
        }

        status.recompute_aggregate();
        self.store.put(&status).await?;

        Ok(status)
    }
}

/// Blocking twin of [`LinkService`] for callers without an async
/// runtime.
///
/// The dispatch always completes synchronously inside `submit`, so the
/// returned record already reflects the acknowledgement outcome.
#[derive(Clone)]
pub struct BlockingLinkService<E, S> {
    endpoint: E,
    store: S,
    config: MapperConfig,
}

impl<E, S> BlockingLinkService<E, S>
where
    E: BlockingMapperEndpoint,
    S: BlockingStatusStore,
{
    /// Create a new blocking link service.
    #[must_use]
    pub const fn new(endpoint: E, store: S, config: MapperConfig) -> Self {
        Self {
            endpoint,
            store,
            config,
        }
    }

    /// Submit a batch, dispatching before returning.
    ///
    /// # Errors
    ///
    /// Returns error if the initial record cannot be persisted.
    pub fn submit(&self, mappings: &[MapperValue], txn_id: Option<String>) -> Result<TxnStatus> {
        let txn_id = txn_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let (request, mut status) = build_link_request(mappings, txn_id, &self.config);

        self.store.put(&status)?;

        if mappings.is_empty() {
            status.set_all_statuses(RequestStatus::Succ);
            return Ok(status);
        }

        Ok(self.dispatch(&request, status))
    }

    /// Submit a batch and poll the store until it reaches a terminal
    /// status, sleeping `poll.interval` between attempts.
    ///
    /// # Errors
    ///
    /// Same contract as [`LinkService::submit_and_wait`].
    pub fn submit_and_wait(
        &self,
        mappings: &[MapperValue],
        txn_id: Option<String>,
        poll: &PollPolicy,
    ) -> Result<TxnStatus> {
        let status = self.submit(mappings, txn_id)?;
        if mappings.is_empty() {
            return Ok(status);
        }

        for _ in 0..poll.max_attempts {
            let current = self
                .store
                .get(&status.txn_id)?
                .ok_or_else(|| MapperError::TransactionNotFound(status.txn_id.clone()))?;
            if current.status.is_terminal() {
                return Ok(current);
            }
            if !poll.interval.is_zero() {
                std::thread::sleep(poll.interval);
            }
        }

        Err(MapperError::RetriesExhausted {
            action: MapperAction::Link,
        })
    }

    fn dispatch(&self, request: &LinkHttpRequest, mut status: TxnStatus) -> TxnStatus {
        let result = self.endpoint.link(request);
        let outcome = classify(&result);
        log_outcome(MapperAction::Link, &status.txn_id, &outcome);

        if let Some(next) = transition_for(&outcome, TimeoutRule::LeaveUnchanged) {
            status.set_all_statuses(next);
            if let Err(e) = self.store.put(&status) {
                tracing::error!(
                    txn_id = %status.txn_id,
                    error = %e,
                    "Failed to persist dispatch outcome"
                );
            }
        }
        status
    }
}
