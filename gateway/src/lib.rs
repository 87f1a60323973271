//! # G2P Connect ID-Mapper Gateway
//!
//! This crate provides a typed client gateway for the G2P Connect ID-Mapper
//! protocol: linking beneficiary identifiers to financial addresses and
//! resolving or updating those links.
//!
//! ## Features
//!
//! - **Batch-native**: Every submission carries one or more mapping values
//! - **Background dispatch**: Submissions return a `rcvd` receipt immediately
//! - **Callback-driven**: Terminal status arrives on the mapper's callback
//! - **Pluggable**: Transport and storage sit behind traits
//! - **Testable**: Scripted mocks exercise the decision table at memory speed
//!
//! ## Architecture
//!
//! Every operation follows the same lifecycle:
//!
//! ```text
//! Submit → Store (rcvd) → Dispatch → ACK/NACK → Store (pdng/rjct) → Callback → Store (succ/rjct)
//! ```
//!
//! ## Example: Linking a Batch
//!
//! ```rust,ignore
//! use idmap_gateway::*;
//!
//! // 1. Wire up transport and storage
//! let config = MapperConfig::new("https://mapper.example.org");
//! let endpoint = providers::HttpMapperEndpoint::new(config.clone())?;
//! let store =
//!     stores::RedisStatusStore::new("redis://127.0.0.1/", stores::LINK_STATUS_PREFIX).await?;
//!
//! // 2. Submit a batch; dispatch runs in the background
//! let service = LinkService::new(endpoint, store, config);
//! let receipt = service.submit(&mappings, None).await?;
//! assert_eq!(receipt.status, RequestStatus::Rcvd);
//!
//! // 3. Apply the mapper's callback when it lands
//! service.apply_callback(&callback).await?;
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod config;
pub mod error;
pub mod models;
pub mod providers;
pub mod services;
pub mod stores;

#[cfg(feature = "test-utils")]
pub mod mocks;

// Acknowledgement handling shared by the three services
mod dispatch;

// Re-export main types for convenience
pub use config::{MapperConfig, PollPolicy};
pub use error::{MapperError, Result, TransportError};
pub use models::{Ack, MapperAction, MapperValue, RequestStatus, TxnStatus};
pub use services::{LinkService, ResolveService, UpdateService};
