//! Static endpoint descriptions.
//!
//! An [`Endpoint`] is a marker type naming one (endpoint, verb) pair of the
//! contract together with the Rust types of its inputs and outputs. The path
//! and body members are tagged variants ([`NoPath`]/[`WithPath`],
//! [`NoBody`]/[`WithBody`]), so a call that omits a required member, or
//! supplies one the contract does not declare, does not compile.
//!
//! ```ignore
//! struct GetWidget;
//!
//! impl Endpoint for GetWidget {
//!     const PATH: &'static str = "/widgets/{id}";
//!     const VERB: Verb = Verb::Get;
//!     type Query = ();
//!     type Path = WithPath<WidgetPath>;
//!     type Body = NoBody;
//!     type Success = Widget;
//!     type Error = GetWidgetError;
//! }
//!
//! let args = CallArgs::new().with_path(WidgetPath { id: 42 });
//! ```

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde::ser::Error as _;
use serde_json::{Map, Value};
use typed_hooks_contract::Verb;

use crate::args::ArgValues;

/// One declared (endpoint, verb) pair with its derived types.
pub trait Endpoint: Send + Sync + 'static {
    /// Endpoint template, e.g. `/widgets/{id}`.
    const PATH: &'static str;
    /// Operation verb.
    const VERB: Verb;

    /// Query parameters. The member itself is always optional.
    type Query: Serialize + Send + Sync;
    /// [`NoPath`] or [`WithPath`].
    type Path: PathArg + Send + Sync;
    /// [`NoBody`] or [`WithBody`].
    type Body: BodyArg + Send + Sync;
    /// JSON content of the success responses.
    type Success: DeserializeOwned + Clone + Send + Sync + 'static;
    /// Union of the declared error payloads, or [`Untyped`].
    type Error: ErrorResponses + Clone + Send + Sync + 'static;
}

/// The path-parameter member of a call.
pub trait PathArg {
    /// Path parameters by name, or `None` when the member is absent.
    fn path_params(&self) -> Result<Option<Map<String, Value>>, serde_json::Error>;
}

/// The request-body member of a call.
pub trait BodyArg {
    /// The JSON payload, or `None` when the member is absent.
    fn body(&self) -> Result<Option<Value>, serde_json::Error>;
}

/// Marker for endpoints without path parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NoPath;

/// Required path parameters; `T` must serialize to a JSON object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WithPath<T>(pub T);

/// Marker for endpoints without a request body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NoBody;

/// Required request body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WithBody<T>(pub T);

impl PathArg for NoPath {
    fn path_params(&self) -> Result<Option<Map<String, Value>>, serde_json::Error> {
        Ok(None)
    }
}

impl<T: Serialize> PathArg for WithPath<T> {
    fn path_params(&self) -> Result<Option<Map<String, Value>>, serde_json::Error> {
        match serde_json::to_value(&self.0)? {
            Value::Object(map) => Ok(Some(map)),
            other => Err(serde_json::Error::custom(format!(
                "path parameters must serialize to an object, got {other}"
            ))),
        }
    }
}

impl BodyArg for NoBody {
    fn body(&self) -> Result<Option<Value>, serde_json::Error> {
        Ok(None)
    }
}

impl<T: Serialize> BodyArg for WithBody<T> {
    fn body(&self) -> Result<Option<Value>, serde_json::Error> {
        serde_json::to_value(&self.0).map(Some)
    }
}

/// Typed decoding of non-success responses.
pub trait ErrorResponses: Sized {
    /// Decode the body of a response with the given `status`.
    ///
    /// Returns `None` when the contract declares no payload for `status`
    /// (or the body does not match it); the caller then reports the body
    /// as untyped.
    fn from_response(status: u16, body: &Value) -> Option<Self>;
}

/// Error type of endpoints that declare no non-success response.
///
/// Uninhabited: every error payload of such an endpoint is untyped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Untyped {}

impl ErrorResponses for Untyped {
    fn from_response(_status: u16, _body: &Value) -> Option<Self> {
        None
    }
}

/// Decode `body` as `T`, or `None` if it does not match.
///
/// Helper for [`ErrorResponses`] implementations.
pub fn decode_payload<T: DeserializeOwned>(body: &Value) -> Option<T> {
    T::deserialize(body).ok()
}

/// Arguments of one call: optional query plus the path and body members.
///
/// Built with [`CallArgs::new`] and the `with_*` methods; `with_path` and
/// `with_body` are only available while the member is still absent.
#[derive(Debug, Clone, PartialEq)]
pub struct CallArgs<Q, P = NoPath, B = NoBody> {
    /// Query parameters, if any.
    pub query: Option<Q>,
    /// [`NoPath`] or [`WithPath`].
    pub path: P,
    /// [`NoBody`] or [`WithBody`].
    pub body: B,
}

/// The argument type of endpoint `E`.
pub type Args<E> = CallArgs<<E as Endpoint>::Query, <E as Endpoint>::Path, <E as Endpoint>::Body>;

impl<Q> CallArgs<Q> {
    /// Arguments with no members.
    pub fn new() -> Self {
        Self {
            query: None,
            path: NoPath,
            body: NoBody,
        }
    }
}

impl<Q> Default for CallArgs<Q> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Q, P, B> CallArgs<Q, P, B> {
    /// Set the query member.
    pub fn with_query(mut self, query: Q) -> Self {
        self.query = Some(query);
        self
    }
}

impl<Q, B> CallArgs<Q, NoPath, B> {
    /// Supply the path parameters.
    pub fn with_path<T>(self, path: T) -> CallArgs<Q, WithPath<T>, B> {
        CallArgs {
            query: self.query,
            path: WithPath(path),
            body: self.body,
        }
    }
}

impl<Q, P> CallArgs<Q, P, NoBody> {
    /// Supply the request body.
    pub fn with_body<T>(self, body: T) -> CallArgs<Q, P, WithBody<T>> {
        CallArgs {
            query: self.query,
            path: self.path,
            body: WithBody(body),
        }
    }
}

impl<Q, P, B> CallArgs<Q, P, B>
where
    Q: Serialize,
    P: PathArg,
    B: BodyArg,
{
    /// Serialize the present members.
    pub fn values(&self) -> Result<ArgValues, serde_json::Error> {
        Ok(ArgValues {
            query: self.query.as_ref().map(serde_json::to_value).transpose()?,
            path: self.path.path_params()?,
            body: self.body.body()?,
        })
    }
}
