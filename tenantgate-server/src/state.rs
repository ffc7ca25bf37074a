use std::sync::Arc;
use tenantgate::{
    DocumentStore, FixedWindowLimiter, LogSink, QueryDispatcher, SearchBackend, TenantId,
};

/// A backend that can both answer searches and hold documents.
pub trait GatewayBackend: SearchBackend + DocumentStore + 'static {}

impl<T: SearchBackend + DocumentStore + 'static> GatewayBackend for T {}

/// Shared handler state. Clones share the limiter buckets, the cache and the backend.
pub struct AppState<B: ?Sized> {
    pub limiter: FixedWindowLimiter,
    pub dispatcher: QueryDispatcher<B, LogSink>,
    pub backend: Arc<B>,
    pub sink: LogSink,
}

impl<B: ?Sized> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            limiter: self.limiter.clone(),
            dispatcher: self.dispatcher.clone(),
            backend: self.backend.clone(),
            sink: self.sink.clone(),
        }
    }
}

impl<B: GatewayBackend> AppState<B> {
    /// State over `backend`; `dispatcher` must have been built over the same backend.
    pub fn new(
        limiter: FixedWindowLimiter,
        dispatcher: QueryDispatcher<B, LogSink>,
        backend: Arc<B>,
    ) -> Self {
        Self { limiter, dispatcher, backend, sink: LogSink }
    }
}

/// Tenant resolved by the admission middleware, available to handlers as an extension.
#[derive(Debug, Clone)]
pub struct AdmittedTenant(pub TenantId);
