//! Hooks over a contract loaded at run time.
//!
//! [`DynamicHooks`] takes endpoint and verb as values and checks each call's
//! arguments against the [`ContractIndex`] before touching the transport.
//! Success bodies stay JSON; error payloads are tagged with whether the
//! contract declares a schema for the returned status.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;
use typed_hooks_contract::{ContractIndex, EndpointContract, Verb};

use crate::args::ArgValues;
use crate::cache::{MutationCache, MutationOptions, QueryCache, QueryOptions, QueryResult};
use crate::error::{ErrorPayload, HookError, decode_response};
use crate::key::{CacheKey, build_key};
use crate::transport::{RequestConfig, Transport, dispatch};
use crate::url::build_url;

/// Untyped call arguments.
pub type DynamicArgs = ArgValues;

/// Error of a dynamic call; payloads are raw JSON.
pub type DynamicError = HookError<Value>;

fn classify(contract: &EndpointContract, status: u16, body: Value) -> ErrorPayload<Value> {
    if contract.responses.error_schema(status).is_some() {
        ErrorPayload::Typed(body)
    } else {
        ErrorPayload::Untyped(body)
    }
}

/// Read and write hooks for every pair of a [`ContractIndex`].
pub struct DynamicHooks<T: ?Sized, C> {
    index: Arc<ContractIndex>,
    transport: Arc<T>,
    cache: Arc<C>,
}

impl<T: ?Sized, C> Clone for DynamicHooks<T, C> {
    fn clone(&self) -> Self {
        Self {
            index: Arc::clone(&self.index),
            transport: Arc::clone(&self.transport),
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<T: ?Sized, C> fmt::Debug for DynamicHooks<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicHooks")
            .field("endpoints", &self.index.len())
            .finish_non_exhaustive()
    }
}

impl<T, C> DynamicHooks<T, C>
where
    T: Transport + ?Sized,
{
    /// Hooks for every pair of `index`.
    pub fn new(index: Arc<ContractIndex>, transport: Arc<T>, cache: Arc<C>) -> Self {
        Self {
            index,
            transport,
            cache,
        }
    }

    /// The contract the hooks check against.
    pub fn index(&self) -> &ContractIndex {
        &self.index
    }

    /// The declared contract of `(endpoint, verb)`, after checking `args` against it.
    fn checked(
        &self,
        endpoint: &str,
        verb: Verb,
        args: &DynamicArgs,
    ) -> Result<&EndpointContract, DynamicError> {
        let contract = self.index.lookup(endpoint, verb)?;
        contract.check_args(args.path.as_ref(), args.body.is_some())?;
        Ok(contract)
    }

    /// Cache key of a read, after checking the arguments.
    pub fn get_key(
        &self,
        endpoint: &str,
        verb: Verb,
        args: &DynamicArgs,
    ) -> Result<CacheKey, DynamicError> {
        let contract = self.checked(endpoint, verb, args)?;
        Ok(build_key(&contract.endpoint, args))
    }

    async fn send(
        &self,
        contract: &EndpointContract,
        url: &str,
        config: RequestConfig,
    ) -> Result<Value, DynamicError> {
        debug!(verb = %contract.verb, %url, "Dispatching dynamic call.");
        let result = dispatch(&*self.transport, contract.verb, url, config).await;
        decode_response(result, |status, body| classify(contract, status, body))
    }
}

impl<T, C> DynamicHooks<T, C>
where
    T: Transport + ?Sized,
    C: QueryCache,
{
    /// Resolve a read through the cache layer.
    pub async fn read(
        &self,
        endpoint: &str,
        verb: Verb,
        args: &DynamicArgs,
        options: &QueryOptions,
    ) -> QueryResult<Value, DynamicError> {
        let contract = match self.checked(endpoint, verb, args) {
            Ok(contract) => contract,
            Err(err) => return QueryResult::from_result(Err(err)),
        };
        let key = build_key(&contract.endpoint, args);
        let url = build_url(&contract.endpoint, args.path.as_ref());
        let config = RequestConfig {
            params: args.query.clone(),
            data: None,
        };

        let url = url.as_str();
        let fetch = move || self.send(contract, url, config.clone());
        self.cache.query(key, options, fetch).await
    }

    /// Drop the cached result of a read.
    pub fn invalidate(
        &self,
        endpoint: &str,
        verb: Verb,
        args: &DynamicArgs,
    ) -> Result<bool, DynamicError> {
        Ok(self.cache.invalidate(&self.get_key(endpoint, verb, args)?))
    }
}

impl<T, C> DynamicHooks<T, C>
where
    T: Transport + ?Sized,
    C: MutationCache,
{
    /// Run a write through the cache layer.
    pub async fn write(
        &self,
        endpoint: &str,
        verb: Verb,
        args: &DynamicArgs,
        options: &MutationOptions,
    ) -> Result<Value, DynamicError> {
        let contract = self.checked(endpoint, verb, args)?;
        let url = build_url(&contract.endpoint, args.path.as_ref());
        let config = RequestConfig {
            params: args.query.clone(),
            data: args.body.clone(),
        };

        let url = url.as_str();
        let mutation = move || self.send(contract, url, config.clone());
        self.cache.mutate(options, mutation).await
    }
}
