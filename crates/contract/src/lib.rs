//! Contract index for typed hooks.
//!
//! Loads an OpenAPI document (or a hand-written descriptor table) and
//! derives, per (endpoint, verb):
//! - the argument shape: optional query, `NoPath | WithPath`, `NoBody | WithBody`
//! - the success schemas (statuses 200-208 and 226)
//! - the error schemas (every other declared status), or an untyped fallback
//!
//! The pipeline is:
//! 1. Parse: OpenAPI JSON -> [`OpenApiSpec`]
//! 2. Normalize: [`OpenApiSpec`] -> [`ContractIndex`] of [`EndpointContract`]s

mod error;
mod http;
mod index;
mod shape;
mod spec;
mod template;

pub use error::ContractError;
pub use http::{SUCCESS_STATUSES, StatusKey, Verb, is_success};
pub use index::{ContractIndex, EndpointContract};
pub use shape::{ArgShape, BodyShape, PathShape, ResponseShape};
pub use spec::{
    JSON_CONTENT, MediaType, OpenApiSpec, Operation, Parameter, PathItem, RequestBody, Response,
    Schema, SchemaType,
};
pub use template::placeholders;
