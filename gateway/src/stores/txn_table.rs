//! In-process transaction table for the resolve path.
//!
//! Resolve outcomes never touch the durable store; they are correlated
//! through this process-local table instead. Entries are bounded by a
//! reap policy: every insert first evicts entries past the configured
//! max age that no longer hold a registered completion handle, so an
//! abandoned transaction cannot pin memory forever.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{oneshot, RwLock};

use crate::models::TxnStatus;

/// Default maximum age of an entry with no registered waiter.
pub const DEFAULT_ENTRY_MAX_AGE: Duration = Duration::from_secs(15 * 60);

struct TableEntry {
    /// Current status record.
    record: TxnStatus,

    /// Fires on the first terminal transition, if a waiter registered.
    completion: Option<oneshot::Sender<TxnStatus>>,

    /// Insertion time, used by the reap policy.
    created_at: Instant,
}

/// Process-local table of in-flight resolve transactions.
///
/// # Thread Safety
///
/// This type is `Clone` and can be safely shared across tasks. Each
/// clone shares the same underlying map; access is guarded by an async
/// `RwLock` so the dispatch task, the callback path, and pollers never
/// observe a half-applied update.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
///
/// use idmap_gateway::stores::TxnTable;
/// use idmap_gateway::{RequestStatus, TxnStatus};
///
/// let table = TxnTable::new();
/// tokio_test::block_on(async {
///     let record = TxnStatus::received("txn-1".to_string(), HashMap::new());
///     table.insert(record).await;
///
///     let updated = table
///         .update("txn-1", |record| record.set_all_statuses(RequestStatus::Succ))
///         .await;
///     assert_eq!(updated.map(|record| record.status), Some(RequestStatus::Succ));
/// });
/// ```
#[derive(Clone)]
pub struct TxnTable {
    entries: Arc<RwLock<HashMap<String, TableEntry>>>,
    max_age: Duration,
}

impl TxnTable {
    /// Create a table with the default entry max age.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_age(DEFAULT_ENTRY_MAX_AGE)
    }

    /// Create a table whose waiter-less entries are evicted once older
    /// than `max_age`.
    #[must_use]
    pub fn with_max_age(max_age: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            max_age,
        }
    }

    /// Insert a record without a completion handle.
    pub async fn insert(&self, record: TxnStatus) {
        let mut entries = self.entries.write().await;
        Self::reap(&mut entries, self.max_age);
        entries.insert(
            record.txn_id.clone(),
            TableEntry {
                record,
                completion: None,
                created_at: Instant::now(),
            },
        );
    }

    /// Insert a record and register a completion handle.
    ///
    /// The returned receiver resolves with the record snapshot taken at
    /// its first terminal transition, whether that comes from the
    /// dispatch task or from a callback.
    pub async fn insert_with_completion(&self, record: TxnStatus) -> oneshot::Receiver<TxnStatus> {
        let (tx, rx) = oneshot::channel();
        let mut entries = self.entries.write().await;
        Self::reap(&mut entries, self.max_age);
        entries.insert(
            record.txn_id.clone(),
            TableEntry {
                record,
                completion: Some(tx),
                created_at: Instant::now(),
            },
        );
        rx
    }

    /// Snapshot of the record for `txn_id`, if present.
    pub async fn get(&self, txn_id: &str) -> Option<TxnStatus> {
        let entries = self.entries.read().await;
        entries.get(txn_id).map(|entry| entry.record.clone())
    }

    /// Apply `f` to the record for `txn_id` under the write lock and
    /// return the updated snapshot.
    ///
    /// Fires the registered completion handle when the update left the
    /// record in a terminal state.
    pub async fn update<F>(&self, txn_id: &str, f: F) -> Option<TxnStatus>
    where
        F: FnOnce(&mut TxnStatus),
    {
        let mut entries = self.entries.write().await;
        let entry = entries.get_mut(txn_id)?;
        f(&mut entry.record);

        if entry.record.status.is_terminal() {
            if let Some(tx) = entry.completion.take() {
                // The waiter may have given up; a dead receiver is fine.
                let _ = tx.send(entry.record.clone());
            }
        }

        Some(entry.record.clone())
    }

    /// Drop the completion handle for `txn_id`, making the entry
    /// evictable again. Waiters that give up call this.
    pub async fn deregister_completion(&self, txn_id: &str) {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(txn_id) {
            entry.completion = None;
        }
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the table holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn reap(entries: &mut HashMap<String, TableEntry>, max_age: Duration) {
        let before = entries.len();
        entries
            .retain(|_, entry| entry.completion.is_some() || entry.created_at.elapsed() <= max_age);
        let evicted = before - entries.len();
        if evicted > 0 {
            tracing::debug!(evicted = evicted, "Reaped stale txn table entries");
        }
    }
}

impl Default for TxnTable {
    fn default() -> Self {
        Self::new()
    }
}
