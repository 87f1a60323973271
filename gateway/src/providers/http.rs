//! HTTP implementation of the ID Mapper endpoint traits.

use reqwest::Client;
use serde::Serialize;

use crate::config::MapperConfig;
use crate::error::{Result, TransportError};
use crate::models::{CommonResponseMessage, LinkHttpRequest, ResolveHttpRequest, UpdateHttpRequest};
use crate::providers::{BlockingMapperEndpoint, MapperEndpoint};

/// Classify a reqwest failure into the transport taxonomy.
///
/// Read timeouts must come out as [`TransportError::Timeout`]; the
/// dispatch layer leaves link and update statuses untouched for those.
fn classify(e: &reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if let Some(status) = e.status() {
        TransportError::Status(status.as_u16())
    } else if e.is_decode() {
        TransportError::Malformed(e.to_string())
    } else {
        TransportError::Connect(e.to_string())
    }
}

/// ID Mapper endpoint over HTTP.
///
/// Each action POSTs its typed request to the URL configured for it and
/// decodes the synchronous acknowledgement envelope. The client carries
/// a bounded read timeout from [`MapperConfig::api_timeout`].
#[derive(Debug, Clone)]
pub struct HttpMapperEndpoint {
    /// HTTP client for making requests.
    client: Client,

    /// Endpoint URLs and timeout.
    config: MapperConfig,
}

impl HttpMapperEndpoint {
    /// Create a new HTTP endpoint.
    ///
    /// # Errors
    ///
    /// Returns error if the underlying HTTP client cannot be built.
    pub fn new(config: MapperConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.api_timeout)
            .build()
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        Ok(Self { client, config })
    }

    async fn post_ack<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> std::result::Result<CommonResponseMessage, TransportError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| classify(&e))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            tracing::error!(url = %url, status = %status, body = %error_body, "Mapper endpoint returned error status");
            return Err(TransportError::Status(status.as_u16()));
        }

        response.json().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Malformed(e.to_string())
            }
        })
    }
}

impl MapperEndpoint for HttpMapperEndpoint {
    async fn link(
        &self,
        request: &LinkHttpRequest,
    ) -> std::result::Result<CommonResponseMessage, TransportError> {
        self.post_ack(&self.config.link_url, request).await
    }

    async fn update(
        &self,
        request: &UpdateHttpRequest,
    ) -> std::result::Result<CommonResponseMessage, TransportError> {
        self.post_ack(&self.config.update_url, request).await
    }

    async fn resolve(
        &self,
        request: &ResolveHttpRequest,
    ) -> std::result::Result<CommonResponseMessage, TransportError> {
        self.post_ack(&self.config.resolve_url, request).await
    }
}

/// Blocking twin of [`HttpMapperEndpoint`].
///
/// Must not be used from within an async runtime; it exists for callers
/// that have no runtime at all.
#[derive(Debug, Clone)]
pub struct BlockingHttpMapperEndpoint {
    /// Blocking HTTP client.
    client: reqwest::blocking::Client,

    /// Endpoint URLs and timeout.
    config: MapperConfig,
}

impl BlockingHttpMapperEndpoint {
    /// Create a new blocking HTTP endpoint.
    ///
    /// # Errors
    ///
    /// Returns error if the underlying HTTP client cannot be built.
    pub fn new(config: MapperConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.api_timeout)
            .build()
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn post_ack<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> std::result::Result<CommonResponseMessage, TransportError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .map_err(|e| classify(&e))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().unwrap_or_default();
            tracing::error!(url = %url, status = %status, body = %error_body, "Mapper endpoint returned error status");
            return Err(TransportError::Status(status.as_u16()));
        }

        response.json().map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Malformed(e.to_string())
            }
        })
    }
}

impl BlockingMapperEndpoint for BlockingHttpMapperEndpoint {
    fn link(
        &self,
        request: &LinkHttpRequest,
    ) -> std::result::Result<CommonResponseMessage, TransportError> {
        self.post_ack(&self.config.link_url, request)
    }

    fn update(
        &self,
        request: &UpdateHttpRequest,
    ) -> std::result::Result<CommonResponseMessage, TransportError> {
        self.post_ack(&self.config.update_url, request)
    }
}
