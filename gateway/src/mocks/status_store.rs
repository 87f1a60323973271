//! Mock transaction status store for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::Result;
use crate::models::TxnStatus;
use crate::providers::{BlockingStatusStore, StatusStore};

/// Mock status store.
///
/// Uses in-memory storage and counts every put/get, so tests can assert
/// on write counts and polling activity.
#[derive(Debug, Clone)]
pub struct MockStatusStore {
    records: Arc<Mutex<HashMap<String, TxnStatus>>>,
    puts: Arc<AtomicUsize>,
    gets: Arc<AtomicUsize>,
}

impl MockStatusStore {
    /// Create a new mock status store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
            puts: Arc::new(AtomicUsize::new(0)),
            gets: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Stored record for `txn_id`, bypassing the trait seams.
    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    #[must_use]
    pub fn stored(&self, txn_id: &str) -> Option<TxnStatus> {
        self.records.lock().unwrap().get(txn_id).cloned()
    }

    /// Overwrite a record directly, simulating the callback handler or
    /// another process completing the transaction.
    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    pub fn store_directly(&self, status: TxnStatus) {
        self.records
            .lock()
            .unwrap()
            .insert(status.txn_id.clone(), status);
    }

    /// Drop a record directly, simulating expiry in the backing store.
    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    pub fn remove(&self, txn_id: &str) {
        self.records.lock().unwrap().remove(txn_id);
    }

    /// Number of writes performed through the trait seams.
    #[must_use]
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Number of reads performed through the trait seams.
    #[must_use]
    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }
}

impl Default for MockStatusStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusStore for MockStatusStore {
    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    async fn put(&self, status: &TxnStatus) -> Result<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.records
            .lock()
            .unwrap()
            .insert(status.txn_id.clone(), status.clone());
        Ok(())
    }

    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    async fn get(&self, txn_id: &str) -> Result<Option<TxnStatus>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.lock().unwrap().get(txn_id).cloned())
    }
}

impl BlockingStatusStore for MockStatusStore {
    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    fn put(&self, status: &TxnStatus) -> Result<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.records
            .lock()
            .unwrap()
            .insert(status.txn_id.clone(), status.clone());
        Ok(())
    }

    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    fn get(&self, txn_id: &str) -> Result<Option<TxnStatus>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.lock().unwrap().get(txn_id).cloned())
    }
}
