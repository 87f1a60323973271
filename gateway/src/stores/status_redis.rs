//! Redis-based transaction status store.
//!
//! # Architecture
//!
//! One record per transaction:
//! - **Key**: `{prefix}{txn_id}`; link and update transactions live
//!   under distinct prefixes so their id spaces cannot collide.
//! - **Value**: JSON-serialized [`TxnStatus`].
//! - **TTL**: none by default (records persist until overwritten);
//!   opt-in via [`RedisStatusStore::with_ttl`].
//!
//! Every write replaces the whole record in a single SET, so readers
//! always observe a complete status snapshot.

use std::time::Duration;

use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Commands};

use crate::error::{MapperError, Result};
use crate::models::TxnStatus;
use crate::providers::{BlockingStatusStore, StatusStore};

/// Default key prefix for link transactions.
pub const LINK_STATUS_PREFIX: &str = "mapper:link:";

/// Default key prefix for update transactions.
pub const UPDATE_STATUS_PREFIX: &str = "mapper:update:";

/// `Redis`-based transaction status store.
///
/// # Thread Safety
///
/// This type is `Clone` and can be safely shared across tasks. Each
/// clone shares the same `ConnectionManager` (connection pool).
pub struct RedisStatusStore {
    /// Connection manager for connection pooling.
    conn_manager: ConnectionManager,

    /// Key prefix namespacing this store's records.
    prefix: String,

    /// Optional record TTL in seconds.
    ttl_seconds: Option<u64>,
}

impl RedisStatusStore {
    /// Create a new `Redis` status store.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - `Redis` connection URL (e.g., "<redis://127.0.0.1:6379>")
    /// * `prefix` - key prefix, e.g. [`LINK_STATUS_PREFIX`]
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - `Redis` URL is malformed
    /// - Connection to `Redis` server fails
    pub async fn new(redis_url: &str, prefix: impl Into<String>) -> Result<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| MapperError::Store(format!("Failed to create Redis client: {e}")))?;

        let conn_manager = ConnectionManager::new(client).await.map_err(|e| {
            MapperError::Store(format!("Failed to create Redis connection manager: {e}"))
        })?;

        let prefix = prefix.into();
        tracing::info!(prefix = %prefix, "RedisStatusStore initialized successfully");

        Ok(Self {
            conn_manager,
            prefix,
            ttl_seconds: None,
        })
    }

    /// Expire records after `ttl`.
    ///
    /// Default is no expiry; reclamation then falls to whoever owns the
    /// Redis instance.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_seconds = Some(ttl.as_secs().max(1));
        self
    }

    /// Get the `Redis` key for a transaction.
    fn status_key(&self, txn_id: &str) -> String {
        format!("{}{txn_id}", self.prefix)
    }
}

impl Clone for RedisStatusStore {
    fn clone(&self) -> Self {
        Self {
            conn_manager: self.conn_manager.clone(),
            prefix: self.prefix.clone(),
            ttl_seconds: self.ttl_seconds,
        }
    }
}

impl StatusStore for RedisStatusStore {
    async fn put(&self, status: &TxnStatus) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let key = self.status_key(&status.txn_id);

        let payload =
            serde_json::to_vec(status).map_err(|e| MapperError::Serialization(e.to_string()))?;

        if let Some(ttl_seconds) = self.ttl_seconds {
            let _: () = conn
                .set_ex(&key, payload, ttl_seconds)
                .await
                .map_err(|e| MapperError::Store(format!("Failed to store txn status: {e}")))?;
        } else {
            let _: () = conn
                .set(&key, payload)
                .await
                .map_err(|e| MapperError::Store(format!("Failed to store txn status: {e}")))?;
        }

        tracing::debug!(
            txn_id = %status.txn_id,
            status = ?status.status,
            "Stored txn status in Redis"
        );

        Ok(())
    }

    async fn get(&self, txn_id: &str) -> Result<Option<TxnStatus>> {
        let mut conn = self.conn_manager.clone();
        let key = self.status_key(txn_id);

        let payload: Option<Vec<u8>> = conn
            .get(&key)
            .await
            .map_err(|e| MapperError::Store(format!("Failed to fetch txn status: {e}")))?;

        payload
            .map(|bytes| {
                serde_json::from_slice(&bytes)
                    .map_err(|e| MapperError::Serialization(e.to_string()))
            })
            .transpose()
    }
}

/// Blocking twin of [`RedisStatusStore`].
///
/// Opens a dedicated connection per operation via [`Client`]; intended
/// for callers without an async runtime.
#[derive(Clone)]
pub struct BlockingRedisStatusStore {
    /// Redis client (connections opened per operation).
    client: Client,

    /// Key prefix namespacing this store's records.
    prefix: String,

    /// Optional record TTL in seconds.
    ttl_seconds: Option<u64>,
}

impl BlockingRedisStatusStore {
    /// Create a new blocking `Redis` status store.
    ///
    /// # Errors
    ///
    /// Returns error if the `Redis` URL is malformed.
    pub fn new(redis_url: &str, prefix: impl Into<String>) -> Result<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| MapperError::Store(format!("Failed to create Redis client: {e}")))?;

        Ok(Self {
            client,
            prefix: prefix.into(),
            ttl_seconds: None,
        })
    }

    /// Expire records after `ttl`.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_seconds = Some(ttl.as_secs().max(1));
        self
    }

    fn status_key(&self, txn_id: &str) -> String {
        format!("{}{txn_id}", self.prefix)
    }
}

impl BlockingStatusStore for BlockingRedisStatusStore {
    fn put(&self, status: &TxnStatus) -> Result<()> {
        let mut conn = self
            .client
            .get_connection()
            .map_err(|e| MapperError::Store(format!("Failed to connect to Redis: {e}")))?;
        let key = self.status_key(&status.txn_id);

        let payload =
            serde_json::to_vec(status).map_err(|e| MapperError::Serialization(e.to_string()))?;

        if let Some(ttl_seconds) = self.ttl_seconds {
            let _: () = conn
                .set_ex(&key, payload, ttl_seconds)
                .map_err(|e| MapperError::Store(format!("Failed to store txn status: {e}")))?;
        } else {
            let _: () = conn
                .set(&key, payload)
                .map_err(|e| MapperError::Store(format!("Failed to store txn status: {e}")))?;
        }

        Ok(())
    }

    fn get(&self, txn_id: &str) -> Result<Option<TxnStatus>> {
        let mut conn = self
            .client
            .get_connection()
            .map_err(|e| MapperError::Store(format!("Failed to connect to Redis: {e}")))?;
        let key = self.status_key(txn_id);

        let payload: Option<Vec<u8>> = conn
            .get(&key)
            .map_err(|e| MapperError::Store(format!("Failed to fetch txn status: {e}")))?;

        payload
            .map(|bytes| {
                serde_json::from_slice(&bytes)
                    .map_err(|e| MapperError::Serialization(e.to_string()))
            })
            .transpose()
    }
}
