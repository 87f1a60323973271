//! Update service: modifies previously registered associations.
//!
//! Mirrors the link flow with its own endpoint method, callback URI,
//! and reason-code taxonomy. Keep the two in step when touching either.

use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use crate::config::{MapperConfig, PollPolicy};
use crate::dispatch::{classify, log_outcome, transition_for, TimeoutRule};
use crate::error::{MapperError, Result};
use crate::models::{
    MapperAction, MapperValue, MsgHeader, RequestStatus, SingleTxnRefStatus, SingleUpdateRequest,
    TxnStatus, UpdateCallbackRequest, UpdateHttpRequest, UpdateRequest,
};
use crate::providers::{BlockingMapperEndpoint, BlockingStatusStore, MapperEndpoint, StatusStore};

fn build_update_request(
    mappings: &[MapperValue],
    txn_id: String,
    config: &MapperConfig,
) -> (UpdateHttpRequest, TxnStatus) {
    let timestamp = Utc::now();
    let mut refs = HashMap::with_capacity(mappings.len());
    let mut update_request = Vec::with_capacity(mappings.len());

    for mapping in mappings {
        let reference_id = Uuid::new_v4().to_string();
        refs.insert(
            reference_id.clone(),
            SingleTxnRefStatus::received(reference_id.clone(), mapping),
        );
        update_request.push(SingleUpdateRequest {
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
        MapperAction::Update,
        config.sender_id.clone(),
        mappings.len() as u64,
    )
    .with_sender_uri(config.update_callback_url.clone());

    let request = UpdateHttpRequest {
        signature: config.signature.clone(),
        header,
        message: UpdateRequest {
            transaction_id: txn_id.clone(),
            update_request,
        },
    };

    (request, TxnStatus::received(txn_id, refs))
}

async fn dispatch_update<E: MapperEndpoint, S: StatusStore>(
    endpoint: &E,
    store: &S,
    request: &UpdateHttpRequest,
    mut status: TxnStatus,
) {
    let result = endpoint.update(request).await;
    let outcome = classify(&result);
    log_outcome(MapperAction::Update, &status.txn_id, &outcome);

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

/// Submits update batches to the ID Mapper and correlates outcomes
/// through the durable status store.
#[derive(Clone)]
pub struct UpdateService<E, S> {
    endpoint: E,
    store: S,
    config: MapperConfig,
}

impl<E, S> UpdateService<E, S>
where
    E: MapperEndpoint + Clone + 'static,
    S: StatusStore + Clone + 'static,
{
    /// Create a new update service.
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
    /// # Errors
    ///
    /// Returns error if the initial record cannot be persisted.
    pub async fn submit(
        &self,
        mappings: &[MapperValue],
        txn_id: Option<String>,
    ) -> Result<TxnStatus> {
        let txn_id = txn_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let (request, mut status) = build_update_request(mappings, txn_id, &self.config);

        self.store.put(&status).await?;

        if mappings.is_empty() {
            status.set_all_statuses(RequestStatus::Succ);
            return Ok(status);
        }

        let endpoint = self.endpoint.clone();
        let store = self.store.clone();
        let dispatched = status.clone();
        tokio::spawn(async move {
            dispatch_update(&endpoint, &store, &request, dispatched).await;
        });

        Ok(status)
    }

    /// Submit a batch and poll the store until it reaches a terminal
    /// status.
    ///
    /// # Errors
    ///
    /// Same contract as [`crate::services::LinkService::submit_and_wait`],
    /// with [`MapperAction::Update`] in the exhaustion error.
    pub async fn submit_and_wait(
        &self,
        mappings: &[MapperValue],
        txn_id: Option<String>,
        poll: &PollPolicy,
    ) -> Result<TxnStatus> {
        let txn_id = txn_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let (request, mut status) = build_update_request(mappings, txn_id, &self.config);

        self.store.put(&status).await?;

        if mappings.is_empty() {
            status.set_all_statuses(RequestStatus::Succ);
            return Ok(status);
        }

        dispatch_update(&self.endpoint, &self.store, &request, status.clone()).await;

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
            action: MapperAction::Update,
        })
    }

    /// Apply a callback's per-reference outcomes to the stored record.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::TransactionNotFound`] if no record exists
    /// for the callback's transaction id, or a store error.
    pub async fn apply_callback(&self, callback: &UpdateCallbackRequest) -> Result<TxnStatus> {
        let txn_id = &callback.transaction_id;
        let mut status = self
            .store
            .get(txn_id)
            .await?
            .ok_or_else(|| MapperError::TransactionNotFound(txn_id.clone()))?;

        for response in &callback.update_response {
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
                    "Update rejected for reference"
                );
            }
        }

        status.recompute_aggregate();
        self.store.put(&status).await?;

        Ok(status)
    }
}

/// Blocking twin of [`UpdateService`] for callers without an async
/// runtime.
#[derive(Clone)]
pub struct BlockingUpdateService<E, S> {
    endpoint: E,
    store: S,
    config: MapperConfig,
}

impl<E, S> BlockingUpdateService<E, S>
where
    E: BlockingMapperEndpoint,
    S: BlockingStatusStore,
{
    /// Create a new blocking update service.
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
        let (request, mut status) = build_update_request(mappings, txn_id, &self.config);

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
    /// Same contract as [`UpdateService::submit_and_wait`].
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
            action: MapperAction::Update,
        })
    }

    fn dispatch(&self, request: &UpdateHttpRequest, mut status: TxnStatus) -> TxnStatus {
        let result = self.endpoint.update(request);
        let outcome = classify(&result);
        log_outcome(MapperAction::Update, &status.txn_id, &outcome);

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
