//! The HTTP transport contract.
//!
//! The hooks never perform network I/O themselves: they call one of the
//! verb-named methods of an injected [`Transport`] and interpret its result.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use typed_hooks_contract::Verb;

/// Per-request configuration handed to the transport.
///
/// An absent `data` is omitted when serialized, so a transport can tell
/// "no body" apart from a `null` body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestConfig {
    /// Query parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Request payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A response as received from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Parsed JSON body; `Null` for empty bodies.
    pub data: Value,
}

impl TransportResponse {
    /// A response with the given status and body.
    pub fn new(status: u16, data: Value) -> Self {
        Self { status, data }
    }

    /// A `200 OK` response.
    pub fn ok(data: Value) -> Self {
        Self::new(200, data)
    }
}

/// Failures reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The server answered with a non-success status.
    #[error("request failed with status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Parsed JSON body.
        body: Value,
    },
    /// No response was received.
    #[error("network error: {0}")]
    Network(String),
}

/// An HTTP client with one method per verb.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a `GET`.
    async fn get(
        &self,
        url: &str,
        config: RequestConfig,
    ) -> Result<TransportResponse, TransportError>;

    /// Send a `POST`.
    async fn post(
        &self,
        url: &str,
        config: RequestConfig,
    ) -> Result<TransportResponse, TransportError>;

    /// Send a `PUT`.
    async fn put(
        &self,
        url: &str,
        config: RequestConfig,
    ) -> Result<TransportResponse, TransportError>;

    /// Send a `DELETE`.
    async fn delete(
        &self,
        url: &str,
        config: RequestConfig,
    ) -> Result<TransportResponse, TransportError>;

    /// Send a `PATCH`.
    async fn patch(
        &self,
        url: &str,
        config: RequestConfig,
    ) -> Result<TransportResponse, TransportError>;
}

/// Call the verb-named method of `transport`.
pub async fn dispatch<T>(
    transport: &T,
    verb: Verb,
    url: &str,
    config: RequestConfig,
) -> Result<TransportResponse, TransportError>
where
    T: Transport + ?Sized,
{
    match verb {
        Verb::Get => transport.get(url, config).await,
        Verb::Post => transport.post(url, config).await,
        Verb::Put => transport.put(url, config).await,
        Verb::Delete => transport.delete(url, config).await,
        Verb::Patch => transport.patch(url, config).await,
    }
}
