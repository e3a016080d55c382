//! Typed data-access hooks over an API contract.
//!
//! Every declared (endpoint, verb) pair of a contract gets a read hook
//! ([`QueryHook`]) or a write hook ([`MutationHook`]) whose arguments,
//! success value and error payloads follow the contract. Hooks only build
//! keys and URLs and interpret responses: network I/O goes through an
//! injected [`Transport`], caching and de-duplication through an injected
//! cache layer ([`QueryCache`], [`MutationCache`]).
//!
//! Contracts known at compile time are described with the [`Endpoint`]
//! trait. Contracts loaded at run time go through [`DynamicHooks`], which
//! checks arguments against a [`ContractIndex`] before any I/O.

mod args;
mod cache;
mod dynamic;
mod endpoint;
mod error;
mod hooks;
mod key;
mod transport;
mod url;

pub use args::ArgValues;
pub use cache::{
    MemoryCache, MutationCache, MutationOptions, MutationState, QueryCache, QueryOptions,
    QueryResult, Status,
};
pub use dynamic::{DynamicArgs, DynamicError, DynamicHooks};
pub use endpoint::{
    Args, BodyArg, CallArgs, Endpoint, ErrorResponses, NoBody, NoPath, PathArg, Untyped, WithBody,
    WithPath, decode_payload,
};
pub use error::{ErrorPayload, HookError};
pub use hooks::{Mutation, MutationHook, QueryHook};
pub use key::{CacheKey, build_key};
pub use transport::{RequestConfig, Transport, TransportError, TransportResponse, dispatch};
pub use typed_hooks_contract::{ContractError, ContractIndex, EndpointContract, Verb};
pub use url::{build_url, path_value_string};
