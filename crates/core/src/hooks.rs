//! Read and write hooks bound to a static [`Endpoint`].
//!
//! A hook holds nothing but the injected transport and cache layer. Every
//! call reduces its [`Args`] to JSON values, derives the URL (and for reads
//! the cache key), and hands a fetch function to the cache layer.

use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::args::ArgValues;
use crate::cache::{
    MutationCache, MutationOptions, MutationState, QueryCache, QueryOptions, QueryResult,
};
use crate::endpoint::{Args, Endpoint};
use crate::error::{HookError, classify_typed, decode_response};
use crate::key::{CacheKey, build_key};
use crate::transport::{RequestConfig, Transport, dispatch};
use crate::url::build_url;

fn encode<E: Endpoint>(args: &Args<E>) -> Result<ArgValues, HookError<E::Error>> {
    args.values().map_err(|err| HookError::Encode(err.to_string()))
}

/// Read-operation factory for endpoint `E`.
pub struct QueryHook<E, T: ?Sized, C> {
    transport: Arc<T>,
    cache: Arc<C>,
    endpoint: PhantomData<fn() -> E>,
}

impl<E, T: ?Sized, C> Clone for QueryHook<E, T, C> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            cache: Arc::clone(&self.cache),
            endpoint: PhantomData,
        }
    }
}

impl<E: Endpoint, T: ?Sized, C> fmt::Debug for QueryHook<E, T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryHook")
            .field("endpoint", &E::PATH)
            .field("verb", &E::VERB)
            .finish_non_exhaustive()
    }
}

impl<E, T, C> QueryHook<E, T, C>
where
    E: Endpoint,
    T: Transport + ?Sized,
    C: QueryCache,
{
    /// A read hook over `transport` and `cache`.
    pub fn new(transport: Arc<T>, cache: Arc<C>) -> Self {
        Self {
            transport,
            cache,
            endpoint: PhantomData,
        }
    }

    /// The cache key a read with `args` is stored under.
    pub fn get_key(&self, args: &Args<E>) -> Result<CacheKey, HookError<E::Error>> {
        Ok(build_key(E::PATH, &encode::<E>(args)?))
    }

    /// Resolve the read through the cache layer.
    pub async fn read(
        &self,
        args: &Args<E>,
        options: &QueryOptions,
    ) -> QueryResult<E::Success, HookError<E::Error>> {
        let values = match encode::<E>(args) {
            Ok(values) => values,
            Err(err) => return QueryResult::from_result(Err(err)),
        };
        let key = build_key(E::PATH, &values);
        let url = build_url(E::PATH, values.path.as_ref());
        let config = RequestConfig {
            params: values.query,
            data: None,
        };

        let transport = &*self.transport;
        let fetch = move || {
            let url = url.clone();
            let config = config.clone();
            async move {
                debug!(verb = %E::VERB, %url, "Fetching.");
                let result = dispatch(transport, E::VERB, &url, config).await;
                decode_response(result, classify_typed::<E::Error>)
            }
        };
        self.cache.query(key, options, fetch).await
    }

    /// Drop the cached result of the read with `args`.
    pub fn invalidate(&self, args: &Args<E>) -> Result<bool, HookError<E::Error>> {
        Ok(self.cache.invalidate(&self.get_key(args)?))
    }
}

/// Write-operation factory for endpoint `E`.
pub struct MutationHook<E, T: ?Sized, C> {
    transport: Arc<T>,
    cache: Arc<C>,
    endpoint: PhantomData<fn() -> E>,
}

impl<E, T: ?Sized, C> Clone for MutationHook<E, T, C> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            cache: Arc::clone(&self.cache),
            endpoint: PhantomData,
        }
    }
}

impl<E: Endpoint, T: ?Sized, C> fmt::Debug for MutationHook<E, T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationHook")
            .field("endpoint", &E::PATH)
            .field("verb", &E::VERB)
            .finish_non_exhaustive()
    }
}

impl<E, T, C> MutationHook<E, T, C>
where
    E: Endpoint,
    T: Transport + ?Sized,
    C: MutationCache,
{
    /// A write hook over `transport` and `cache`.
    pub fn new(transport: Arc<T>, cache: Arc<C>) -> Self {
        Self {
            transport,
            cache,
            endpoint: PhantomData,
        }
    }

    /// A fresh write handle carrying `options`.
    pub fn write(&self, options: MutationOptions) -> Mutation<E, T, C> {
        Mutation {
            transport: Arc::clone(&self.transport),
            cache: Arc::clone(&self.cache),
            options,
            state: Mutex::new(MutationState::idle()),
        }
    }
}

/// Handle of a write operation.
///
/// Each [`Mutation::trigger`] runs the write once through the cache layer and
/// records its outcome, readable with [`Mutation::state`].
pub struct Mutation<E: Endpoint, T: ?Sized, C> {
    transport: Arc<T>,
    cache: Arc<C>,
    options: MutationOptions,
    state: Mutex<MutationState<E::Success, HookError<E::Error>>>,
}

impl<E: Endpoint, T: ?Sized, C> fmt::Debug for Mutation<E, T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutation")
            .field("endpoint", &E::PATH)
            .field("verb", &E::VERB)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<E, T, C> Mutation<E, T, C>
where
    E: Endpoint,
    T: Transport + ?Sized,
    C: MutationCache,
{
    /// Run the write with `args`.
    pub async fn trigger(&self, args: &Args<E>) -> Result<E::Success, HookError<E::Error>> {
        self.set_state(MutationState::pending());
        let result = self.run(args).await;
        self.set_state(MutationState::from_result(result.clone()));
        result
    }

    async fn run(&self, args: &Args<E>) -> Result<E::Success, HookError<E::Error>> {
        let values = encode::<E>(args)?;
        let url = build_url(E::PATH, values.path.as_ref());
        let config = RequestConfig {
            params: values.query,
            data: values.body,
        };

        let transport = &*self.transport;
        let mutation = move || {
            let url = url.clone();
            let config = config.clone();
            async move {
                debug!(verb = %E::VERB, %url, has_body = config.data.is_some(), "Sending write.");
                let result = dispatch(transport, E::VERB, &url, config).await;
                decode_response(result, classify_typed::<E::Error>)
            }
        };
        self.cache.mutate(&self.options, mutation).await
    }

    /// Status, data and error of the last invocation.
    pub fn state(&self) -> MutationState<E::Success, HookError<E::Error>> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Forget the last invocation.
    pub fn reset(&self) {
        self.set_state(MutationState::idle());
    }

    fn set_state(&self, state: MutationState<E::Success, HookError<E::Error>>) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::cache::{MemoryCache, Status};
    use crate::endpoint::{
        CallArgs, ErrorResponses, NoBody, NoPath, Untyped, WithBody, WithPath, decode_payload,
    };
    use crate::error::ErrorPayload;
    use crate::transport::{TransportError, TransportResponse};
    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};
    use serde_json::{Value, json};
    use typed_hooks_contract::Verb;

    type Respond = fn(&RequestConfig) -> Result<TransportResponse, TransportError>;
    type Call = (&'static str, String, RequestConfig);

    /// Records every call and answers through `respond`.
    struct StubTransport {
        respond: Respond,
        calls: Mutex<Vec<Call>>,
    }

    impl StubTransport {
        fn new(respond: Respond) -> Arc<Self> {
            Arc::new(Self {
                respond,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn record(
            &self,
            method: &'static str,
            url: &str,
            config: RequestConfig,
        ) -> Result<TransportResponse, TransportError> {
            let response = (self.respond)(&config);
            self.calls
                .lock()
                .unwrap()
                .push((method, url.to_string(), config));
            response
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn get(
            &self,
            url: &str,
            config: RequestConfig,
        ) -> Result<TransportResponse, TransportError> {
            self.record("get", url, config)
        }

        async fn post(
            &self,
            url: &str,
            config: RequestConfig,
        ) -> Result<TransportResponse, TransportError> {
            self.record("post", url, config)
        }

        async fn put(
            &self,
            url: &str,
            config: RequestConfig,
        ) -> Result<TransportResponse, TransportError> {
            self.record("put", url, config)
        }

        async fn delete(
            &self,
            url: &str,
            config: RequestConfig,
        ) -> Result<TransportResponse, TransportError> {
            self.record("delete", url, config)
        }

        async fn patch(
            &self,
            url: &str,
            config: RequestConfig,
        ) -> Result<TransportResponse, TransportError> {
            self.record("patch", url, config)
        }
    }

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Counter {
        value: u32,
    }

    #[derive(Debug, Clone, Serialize)]
    struct Page {
        limit: u32,
    }

    #[derive(Debug, Clone, Serialize)]
    struct ItemPath {
        id: String,
    }

    #[derive(Debug, Clone, Serialize)]
    struct NewItem {
        name: String,
    }

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Message {
        message: String,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum ItemError {
        NotFound(Message),
    }

    impl ErrorResponses for ItemError {
        fn from_response(status: u16, body: &Value) -> Option<Self> {
            if status == 404 {
                decode_payload(body).map(Self::NotFound)
            } else {
                None
            }
        }
    }

    struct ListWidgets;

    impl Endpoint for ListWidgets {
        const PATH: &'static str = "/widgets";
        const VERB: Verb = Verb::Get;
        type Query = Page;
        type Path = NoPath;
        type Body = NoBody;
        type Success = Counter;
        type Error = Untyped;
    }

    struct GetItem;

    impl Endpoint for GetItem {
        const PATH: &'static str = "/items/{id}";
        const VERB: Verb = Verb::Get;
        type Query = ();
        type Path = WithPath<ItemPath>;
        type Body = NoBody;
        type Success = Value;
        type Error = ItemError;
    }

    struct UpdateItem;

    impl Endpoint for UpdateItem {
        const PATH: &'static str = "/items/{id}";
        const VERB: Verb = Verb::Put;
        type Query = ();
        type Path = WithPath<ItemPath>;
        type Body = WithBody<NewItem>;
        type Success = Value;
        type Error = ItemError;
    }

    struct DeleteItem;

    impl Endpoint for DeleteItem {
        const PATH: &'static str = "/items/{id}";
        const VERB: Verb = Verb::Delete;
        type Query = ();
        type Path = WithPath<ItemPath>;
        type Body = NoBody;
        type Success = Value;
        type Error = ItemError;
    }

    fn item(id: &str) -> ItemPath {
        ItemPath { id: id.to_string() }
    }

    fn echo(config: &RequestConfig) -> Result<TransportResponse, TransportError> {
        Ok(TransportResponse::ok(serde_json::to_value(config).unwrap()))
    }

    #[tokio::test]
    async fn test_read_round_trip() {
        let transport = StubTransport::new(|_| Ok(TransportResponse::ok(json!({ "value": 1 }))));
        let hook = QueryHook::<ListWidgets, _, _>::new(
            Arc::clone(&transport),
            Arc::new(MemoryCache::new()),
        );
        let args = CallArgs::new().with_query(Page { limit: 10 });

        let result = hook.read(&args, &QueryOptions::default()).await;
        assert_eq!(result.status, Status::Success);
        assert_eq!(result.data, Some(Counter { value: 1 }));

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "get");
        assert_eq!(calls[0].1, "/widgets");
        assert_eq!(calls[0].2.params, Some(json!({ "limit": 10 })));
        assert!(calls[0].2.data.is_none());
    }

    #[tokio::test]
    async fn test_repeated_reads_hit_the_cache() {
        let transport = StubTransport::new(|_| Ok(TransportResponse::ok(json!({ "value": 1 }))));
        let hook = QueryHook::<ListWidgets, _, _>::new(
            Arc::clone(&transport),
            Arc::new(MemoryCache::new()),
        );
        let args = CallArgs::new().with_query(Page { limit: 10 });

        hook.read(&args, &QueryOptions::default()).await;
        hook.read(&args, &QueryOptions::default()).await;
        assert_eq!(transport.calls().len(), 1);

        assert!(hook.invalidate(&args).unwrap());
        hook.read(&args, &QueryOptions::default()).await;
        assert_eq!(transport.calls().len(), 2);
    }

    #[test]
    fn test_get_key() {
        let transport = StubTransport::new(echo);
        let hook = QueryHook::<GetItem, _, _>::new(transport, Arc::new(MemoryCache::new()));
        let key = hook.get_key(&CallArgs::new().with_path(item("42"))).unwrap();
        assert_eq!(key.parts(), [json!("/items/{id}"), json!({ "id": "42" })]);
    }

    #[tokio::test]
    async fn test_read_substitutes_path() {
        let transport = StubTransport::new(|_| Ok(TransportResponse::ok(json!({ "id": "42" }))));
        let hook = QueryHook::<GetItem, _, _>::new(
            Arc::clone(&transport),
            Arc::new(MemoryCache::new()),
        );

        let result = hook
            .read(&CallArgs::new().with_path(item("42")), &QueryOptions::default())
            .await;
        assert!(result.is_success());
        assert_eq!(transport.calls()[0].1, "/items/42");
        assert!(transport.calls()[0].2.params.is_none());
    }

    #[tokio::test]
    async fn test_declared_error_is_typed() {
        let transport = StubTransport::new(|_| {
            Err(TransportError::Status {
                status: 404,
                body: json!({ "message": "no such item" }),
            })
        });
        let hook = QueryHook::<GetItem, _, _>::new(transport, Arc::new(MemoryCache::new()));

        let result = hook
            .read(&CallArgs::new().with_path(item("7")), &QueryOptions::default())
            .await;
        assert_eq!(result.status, Status::Error);
        let err = result.error.unwrap();
        assert_eq!(err.status(), Some(404));
        assert_eq!(
            err.payload().and_then(ErrorPayload::typed),
            Some(&ItemError::NotFound(Message {
                message: "no such item".into()
            }))
        );
    }

    #[tokio::test]
    async fn test_undeclared_error_is_untyped() {
        let transport = StubTransport::new(|_| Ok(TransportResponse::new(503, json!("busy"))));
        let hook = QueryHook::<GetItem, _, _>::new(transport, Arc::new(MemoryCache::new()));

        let result = hook
            .read(&CallArgs::new().with_path(item("7")), &QueryOptions::default())
            .await;
        assert_eq!(
            result.error,
            Some(HookError::Status {
                status: 503,
                payload: ErrorPayload::Untyped(json!("busy")),
            })
        );
    }

    #[tokio::test]
    async fn test_write_sends_body() {
        let transport = StubTransport::new(echo);
        let hook = MutationHook::<UpdateItem, _, _>::new(
            Arc::clone(&transport),
            Arc::new(MemoryCache::new()),
        );
        let mutation = hook.write(MutationOptions::default());
        assert_eq!(mutation.state().status, Status::Idle);

        let args = CallArgs::new()
            .with_path(item("1"))
            .with_body(NewItem { name: "x".into() });
        let echoed = mutation.trigger(&args).await.unwrap();
        assert_eq!(echoed, json!({ "data": { "name": "x" } }));

        let calls = transport.calls();
        assert_eq!(calls[0].0, "put");
        assert_eq!(calls[0].1, "/items/1");

        let state = mutation.state();
        assert_eq!(state.status, Status::Success);
        assert_eq!(state.data, Some(echoed));

        mutation.reset();
        assert_eq!(mutation.state(), MutationState::idle());
    }

    #[tokio::test]
    async fn test_write_without_body_omits_data() {
        let transport = StubTransport::new(echo);
        let hook = MutationHook::<DeleteItem, _, _>::new(
            Arc::clone(&transport),
            Arc::new(MemoryCache::new()),
        );

        let echoed = hook
            .write(MutationOptions::default())
            .trigger(&CallArgs::new().with_path(item("1")))
            .await
            .unwrap();
        assert_eq!(echoed, json!({}));
        assert!(transport.calls()[0].2.data.is_none());
        assert_eq!(transport.calls()[0].0, "delete");
    }

    #[tokio::test]
    async fn test_write_failure_is_recorded() {
        let transport = StubTransport::new(|_| Err(TransportError::Network("reset".into())));
        let hook = MutationHook::<DeleteItem, _, _>::new(transport, Arc::new(MemoryCache::new()));
        let mutation = hook.write(MutationOptions::default());

        let err = mutation
            .trigger(&CallArgs::new().with_path(item("1")))
            .await
            .unwrap_err();
        assert_eq!(err, HookError::Transport("reset".into()));
        assert_eq!(mutation.state().status, Status::Error);
    }

    #[tokio::test]
    async fn test_write_invalidates_reads() {
        let transport = StubTransport::new(echo);
        let cache = Arc::new(MemoryCache::new());
        let reads = QueryHook::<GetItem, _, _>::new(Arc::clone(&transport), Arc::clone(&cache));
        let writes =
            MutationHook::<DeleteItem, _, _>::new(Arc::clone(&transport), Arc::clone(&cache));
        let args = CallArgs::new().with_path(item("5"));

        reads.read(&args, &QueryOptions::default()).await;
        assert_eq!(cache.len(), 1);

        let options = MutationOptions {
            retry: 0,
            invalidates: vec![reads.get_key(&args).unwrap()],
        };
        writes.write(options).trigger(&args).await.unwrap();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_hooks_accept_a_trait_object_transport() {
        let transport: Arc<dyn Transport> =
            StubTransport::new(|_| Ok(TransportResponse::ok(json!({ "value": 3 }))));
        let hook = QueryHook::<ListWidgets, _, _>::new(transport, Arc::new(MemoryCache::new()));
        let result = hook.read(&CallArgs::new(), &QueryOptions::default()).await;
        assert_eq!(result.data, Some(Counter { value: 3 }));
    }
}
