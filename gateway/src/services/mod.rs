//! Correlation engines for the three mapper actions.
//!
//! Each service turns a batch of [`crate::models::MapperValue`] into a
//! tracked transaction, dispatches it once, and gives callers either a
//! fire-and-forget snapshot or a bounded wait for the terminal status.

pub mod link;
pub mod resolve;
pub mod update;

// Re-exports
pub use link::{BlockingLinkService, LinkService};
pub use resolve::ResolveService;
pub use update::{BlockingUpdateService, UpdateService};
