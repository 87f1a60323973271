//! Storage for transaction status.
//!
//! - **Redis status store** - durable, cross-process record per link or
//!   update transaction (async and blocking variants)
//! - **Txn table** - process-local table correlating resolve
//!   transactions with their callbacks

pub mod status_redis;
pub mod txn_table;

// Re-exports
pub use status_redis::{
    BlockingRedisStatusStore, RedisStatusStore, LINK_STATUS_PREFIX, UPDATE_STATUS_PREFIX,
};
pub use txn_table::{TxnTable, DEFAULT_ENTRY_MAX_AGE};
