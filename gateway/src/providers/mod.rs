//! Provider seams for the gateway's external dependencies.
//!
//! The services depend on these traits, never on concrete transports or
//! stores. Production wiring uses [`HttpMapperEndpoint`] and the Redis
//! stores; tests use the in-memory mocks.

pub mod endpoint;
pub mod http;
pub mod status_store;

// Re-export provider traits and the HTTP implementations
pub use endpoint::{BlockingMapperEndpoint, MapperEndpoint};
pub use http::{BlockingHttpMapperEndpoint, HttpMapperEndpoint};
pub use status_store::{BlockingStatusStore, StatusStore};
