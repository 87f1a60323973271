//! Resolve service: looks up the counterpart of an id or a financial
//! address.
//!
//! Resolve outcomes never touch the durable store. Transactions live in
//! a process-local [`TxnTable`]; waiting callers hold a completion
//! handle that fires on the first terminal transition, whether that is
//! a dispatch-level rejection or a callback completion.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::config::{MapperConfig, PollPolicy};
use crate::dispatch::{classify, log_outcome, transition_for, TimeoutRule};
use crate::error::{MapperError, Result};
use crate::models::{
    MapperAction, MapperValue, MsgHeader, RequestStatus, ResolveCallbackRequest,
    ResolveHttpRequest, ResolveRequest, ResolveScope, SingleResolveRequest, SingleTxnRefStatus,
    TxnStatus,
};
use crate::providers::MapperEndpoint;
use crate::stores::TxnTable;

/// Reject mappings carrying no identifying field before any dispatch.
fn validate(mappings: &[MapperValue]) -> Result<()> {
    for (index, mapping) in mappings.iter().enumerate() {
        if mapping.id.is_none() && mapping.fa.is_none() {
            return Err(MapperError::MissingIdentifier { index });
        }
    }
    Ok(())
}

fn build_resolve_request(
    mappings: &[MapperValue],
    txn_id: String,
    config: &MapperConfig,
) -> (ResolveHttpRequest, TxnStatus) {
    let timestamp = Utc::now();
    let mut refs = HashMap::with_capacity(mappings.len());
    let mut resolve_request = Vec::with_capacity(mappings.len());

    for mapping in mappings {
        let reference_id = Uuid::new_v4().to_string();
        refs.insert(
            reference_id.clone(),
            SingleTxnRefStatus::received(reference_id.clone(), mapping),
        );
        // The lookup key prefers id over fa; validation guarantees one
        // of them is present.
        let (id, fa) = match (&mapping.id, &mapping.fa) {
            (Some(id), _) => (Some(id.clone()), None),
            (None, fa) => (None, fa.clone()),
        };
        resolve_request.push(SingleResolveRequest {
            reference_id,
            timestamp,
            id,
            fa,
            scope: ResolveScope::Details,
            additional_info: None,
            locale: "eng".to_string(),
        });
    }

    let header = MsgHeader::new(
        MapperAction::Resolve,
        config.sender_id.clone(),
        mappings.len() as u64,
    )
    .with_sender_uri(config.resolve_callback_url.clone());

    let request = ResolveHttpRequest {
        signature: config.signature.clone(),
        header,
        message: ResolveRequest {
            transaction_id: txn_id.clone(),
            resolve_request,
        },
    };

    (request, TxnStatus::received(txn_id, refs))
}

/// One-shot dispatch against the resolve endpoint.
///
/// Resolve has no timeout carve-out: a lookup nobody acknowledged is
/// rejected outright.
async fn dispatch_resolve<E: MapperEndpoint>(
    endpoint: &E,
    table: &TxnTable,
    request: &ResolveHttpRequest,
    txn_id: &str,
) {
    let result = endpoint.resolve(request).await;
    let outcome = classify(&result);
    log_outcome(MapperAction::Resolve, txn_id, &outcome);

    let Some(next) = transition_for(&outcome, TimeoutRule::Reject) else {
        return;
    };
    let updated = table
        .update(txn_id, |record| record.set_all_statuses(next))
        .await;
    if updated.is_none() {
        tracing::warn!(txn_id = %txn_id, "Dispatched txn no longer in table");
    }
}

/// Submits resolve batches to the ID Mapper and correlates outcomes
/// through the in-process transaction table.
#[derive(Clone)]
pub struct ResolveService<E> {
    endpoint: E,
    table: TxnTable,
    config: MapperConfig,
}

impl<E> ResolveService<E>
where
    E: MapperEndpoint + Clone + 'static,
{
    /// Create a new resolve service with the default table reap policy.
    #[must_use]
    pub fn new(endpoint: E, config: MapperConfig) -> Self {
        Self {
            endpoint,
            table: TxnTable::new(),
            config,
        }
    }

    /// Evict waiter-less table entries once older than `ttl`.
    ///
    /// Call at construction time, before any submission.
    #[must_use]
    pub fn with_entry_ttl(mut self, ttl: Duration) -> Self {
        self.table = TxnTable::with_max_age(ttl);
        self
    }

    /// Submit a batch without waiting for its outcome.
    ///
    /// Inserts the initial record into the table and spawns the
    /// dispatch task. An empty batch inserts nothing and returns
    /// `Succ`.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::MissingIdentifier`] when a mapping
    /// carries neither `id` nor `fa`; no dispatch happens then.
    pub async fn submit(&self, mappings: &[MapperValue]) -> Result<TxnStatus> {
        validate(mappings)?;

        let txn_id = Uuid::new_v4().to_string();
        let (request, mut status) = build_resolve_request(mappings, txn_id, &self.config);

        if mappings.is_empty() {
            status.set_all_statuses(RequestStatus::Succ);
            return Ok(status);
        }

        self.table.insert(status.clone()).await;
        self.spawn_dispatch(request, status.txn_id.clone());

        Ok(status)
    }

    /// Submit a batch and wait for its first terminal status.
    ///
    /// Registers a completion handle on the table entry at creation,
    /// then awaits it with deadline [`PollPolicy::deadline`]. The
    /// handle fires on any terminal transition, so a dispatch-level
    /// rejection returns promptly instead of burning the whole budget.
    ///
    /// # Errors
    ///
    /// - [`MapperError::MissingIdentifier`] for invalid input.
    /// - [`MapperError::RetriesExhausted`] when the deadline expires.
    ///   The transaction is not cancelled; its handle is deregistered
    ///   so the entry becomes evictable.
    pub async fn submit_and_wait(
        &self,
        mappings: &[MapperValue],
        poll: &PollPolicy,
    ) -> Result<TxnStatus> {
        validate(mappings)?;

        let txn_id = Uuid::new_v4().to_string();
        let (request, mut status) = build_resolve_request(mappings, txn_id, &self.config);

        if mappings.is_empty() {
            status.set_all_statuses(RequestStatus::Succ);
            return Ok(status);
        }

        let completion = self.table.insert_with_completion(status.clone()).await;
        self.spawn_dispatch(request, status.txn_id.clone());

        match tokio::time::timeout(poll.deadline(), completion).await {
            Ok(Ok(completed)) => Ok(completed),
            Ok(Err(_)) => Err(MapperError::TransactionNotFound(status.txn_id.clone())),
            Err(_) => {
                self.table.deregister_completion(&status.txn_id).await;
                Err(MapperError::RetriesExhausted {
                    action: MapperAction::Resolve,
                })
            }
        }
    }

    /// Apply a callback's outcomes to the table entry.
    ///
    /// Sets per-reference statuses, copies resolved `id`/`fa` values
    /// onto the reference records, and recomputes the aggregate. A
    /// terminal aggregate fires the registered completion handle.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::TransactionNotFound`] if the transaction
    /// is not in the table.
    pub async fn apply_callback(&self, callback: &ResolveCallbackRequest) -> Result<TxnStatus> {
        let txn_id = &callback.transaction_id;
        let updated = self
            .table
            .update(txn_id, |record| {
                for response in &callback.resolve_response {
                    let Some(r) = record.refs.get_mut(&response.reference_id) else {
                        tracing::warn!(
                            txn_id = %txn_id,
                            reference_id = %response.reference_id,
                            "Callback for unknown reference id, skipping"
                        );
                        continue;
                    };
                    r.status = response.status;
                    if response.id.is_some() {
                        r.id = response.id.clone();
                    }
                    if response.fa.is_some() {
                        r.fa = response.fa.clone();
                    }
                }
                record.recompute_aggregate();
            })
            .await;

        updated.ok_or_else(|| MapperError::TransactionNotFound(txn_id.clone()))
    }

    /// Snapshot of an in-flight transaction, if the table holds it.
    pub async fn transaction(&self, txn_id: &str) -> Option<TxnStatus> {
        self.table.get(txn_id).await
    }

    fn spawn_dispatch(&self, request: ResolveHttpRequest, txn_id: String) {
        let endpoint = self.endpoint.clone();
        let table = self.table.clone();
        tokio::spawn(async move {
            dispatch_resolve(&endpoint, &table, &request, &txn_id).await;
        });
    }
}
