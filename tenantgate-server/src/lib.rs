//! HTTP frontend for `tenantgate`.
//!
//! - `GET /search?tenant=&q=&vector=true`
//! - `POST /documents?tenant=`
//! - `GET|DELETE /documents/{id}?tenant=`
//! - `GET /health`
//!
//! The tenant may also be given in the `x-tenant-id` header.

use std::sync::Arc;
use tenantgate::{FixedWindowLimiter, LogSink, QueryDispatcher};

pub mod error;
pub mod middleware;
pub mod routes;
pub mod settings;
pub mod state;

pub use error::ApiError;
pub use routes::router;
pub use settings::{Settings, SettingsError};
pub use state::{AppState, GatewayBackend};

/// Wire the core components over `backend` according to `settings`.
pub fn build_state<B: GatewayBackend>(
    settings: &Settings,
    backend: Arc<B>,
) -> Result<AppState<B>, SettingsError> {
    let limiter = FixedWindowLimiter::new(settings.admission()?);
    let dispatcher = QueryDispatcher::new(backend.clone(), settings.cache()?)
        .with_timeout(settings.timeout()?)
        .with_config(settings.dispatcher()?)
        .with_extractor(Arc::new(settings.extractor()?))
        .with_sink(LogSink);
    Ok(AppState::new(limiter, dispatcher, backend))
}
