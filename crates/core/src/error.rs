//! Errors delivered through the hooks' result channel.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use typed_hooks_contract::{ContractError, is_success};

use crate::endpoint::ErrorResponses;
use crate::transport::{TransportError, TransportResponse};

/// Body of a non-success response.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorPayload<E> {
    /// The contract declares a payload for the returned status.
    Typed(E),
    /// No payload is declared for the returned status.
    Untyped(Value),
}

impl<E> ErrorPayload<E> {
    /// The decoded payload, if typed.
    pub fn typed(&self) -> Option<&E> {
        match self {
            ErrorPayload::Typed(payload) => Some(payload),
            ErrorPayload::Untyped(_) => None,
        }
    }

    /// Whether the payload decoded against the contract.
    pub fn is_typed(&self) -> bool {
        matches!(self, ErrorPayload::Typed(_))
    }
}

/// Failure of a read or write operation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HookError<E> {
    /// The server answered with a non-success status.
    #[error("request failed with status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body.
        payload: ErrorPayload<E>,
    },

    /// The transport could not complete the request.
    #[error("transport error: {0}")]
    Transport(String),

    /// A success body did not match the success type.
    #[error("failed to decode response body: {0}")]
    Decode(String),

    /// Call arguments could not be serialized.
    #[error("failed to encode call arguments: {0}")]
    Encode(String),

    /// Call arguments do not match the contract.
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl<E> HookError<E> {
    /// Status code of a [`HookError::Status`] failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            HookError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Payload of a [`HookError::Status`] failure.
    pub fn payload(&self) -> Option<&ErrorPayload<E>> {
        match self {
            HookError::Status { payload, .. } => Some(payload),
            _ => None,
        }
    }
}

/// Payload classification through the endpoint's [`ErrorResponses`].
pub(crate) fn classify_typed<E: ErrorResponses>(status: u16, body: Value) -> ErrorPayload<E> {
    match E::from_response(status, &body) {
        Some(payload) => ErrorPayload::Typed(payload),
        None => ErrorPayload::Untyped(body),
    }
}

/// Turn a transport outcome into the operation's result.
///
/// Success statuses decode into `S`; any other status, whether returned or
/// raised by the transport, becomes [`HookError::Status`] with its payload
/// classified by `classify`.
pub(crate) fn decode_response<S, E>(
    result: Result<TransportResponse, TransportError>,
    classify: impl FnOnce(u16, Value) -> ErrorPayload<E>,
) -> Result<S, HookError<E>>
where
    S: DeserializeOwned,
{
    match result {
        Ok(response) if is_success(response.status) => {
            serde_json::from_value(response.data).map_err(|err| HookError::Decode(err.to_string()))
        }
        Ok(TransportResponse { status, data })
        | Err(TransportError::Status { status, body: data }) => {
            debug!(status, "Request returned a non-success status.");
            Err(HookError::Status {
                status,
                payload: classify(status, data),
            })
        }
        Err(TransportError::Network(message)) => Err(HookError::Transport(message)),
    }
}
