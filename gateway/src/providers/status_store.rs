//! Transaction status store traits.
//!
//! The status store is the durable, cross-process source of truth for
//! link and update transactions. Both the dispatch task and waiting
//! pollers go through this seam.

use crate::error::Result;
use crate::models::TxnStatus;

/// Async transaction status store.
///
/// # Implementation Notes
///
/// - `put` replaces the whole record atomically; there are no partial
///   writes a reader could observe.
/// - Concurrent `put`/`get` must be safe; last-writer-wins is
///   acceptable.
pub trait StatusStore: Send + Sync {
    /// Store (or replace) the record for `status.txn_id`.
    ///
    /// # Errors
    ///
    /// Returns error if the storage operation fails.
    fn put(&self, status: &TxnStatus) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Fetch the record for `txn_id`, if one exists.
    ///
    /// # Errors
    ///
    /// Returns error if the storage operation fails or the stored
    /// payload cannot be decoded.
    fn get(
        &self,
        txn_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<TxnStatus>>> + Send;
}

/// Blocking transaction status store.
pub trait BlockingStatusStore: Send + Sync {
    /// Store (or replace) the record for `status.txn_id`.
    ///
    /// # Errors
    ///
    /// Returns error if the storage operation fails.
    fn put(&self, status: &TxnStatus) -> Result<()>;

    /// Fetch the record for `txn_id`, if one exists.
    ///
    /// # Errors
    ///
    /// Returns error if the storage operation fails or the stored
    /// payload cannot be decoded.
    fn get(&self, txn_id: &str) -> Result<Option<TxnStatus>>;
}
