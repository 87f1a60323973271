//! Mock provider implementations for testing.
//!
//! In-memory, deterministic stand-ins for the endpoint and store
//! traits, used by unit and integration tests.

pub mod endpoint;
pub mod status_store;

pub use endpoint::MockMapperEndpoint;
pub use status_store::MockStatusStore;
