//! ID Mapper endpoint traits.
//!
//! This module defines the outbound seam to the external ID Mapper: one
//! POST per action, answered synchronously with an acknowledgement
//! envelope. The final per-reference outcomes arrive separately through
//! the callback path.

use crate::error::TransportError;
use crate::models::{CommonResponseMessage, LinkHttpRequest, ResolveHttpRequest, UpdateHttpRequest};

/// Async ID Mapper endpoint.
///
/// # Implementation Notes
///
/// - Each method performs exactly one request; retrying is the caller's
///   decision, never the endpoint's.
/// - Failures must be classified faithfully into [`TransportError`]:
///   the dispatch layer gives read timeouts special treatment.
pub trait MapperEndpoint: Send + Sync {
    /// Submit a link request.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] describing the transport-level
    /// failure mode.
    fn link(
        &self,
        request: &LinkHttpRequest,
    ) -> impl std::future::Future<Output = Result<CommonResponseMessage, TransportError>> + Send;

    /// Submit an update request.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] describing the transport-level
    /// failure mode.
    fn update(
        &self,
        request: &UpdateHttpRequest,
    ) -> impl std::future::Future<Output = Result<CommonResponseMessage, TransportError>> + Send;

    /// Submit a resolve request.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] describing the transport-level
    /// failure mode.
    fn resolve(
        &self,
        request: &ResolveHttpRequest,
    ) -> impl std::future::Future<Output = Result<CommonResponseMessage, TransportError>> + Send;
}

/// Blocking ID Mapper endpoint.
///
/// Covers link and update only; resolve has no blocking execution form.
pub trait BlockingMapperEndpoint: Send + Sync {
    /// Submit a link request.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] describing the transport-level
    /// failure mode.
    fn link(&self, request: &LinkHttpRequest) -> Result<CommonResponseMessage, TransportError>;

    /// Submit an update request.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] describing the transport-level
    /// failure mode.
    fn update(&self, request: &UpdateHttpRequest)
        -> Result<CommonResponseMessage, TransportError>;
}
