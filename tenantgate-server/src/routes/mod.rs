//! Route table.

use crate::middleware::admission_middleware;
use crate::state::{AppState, GatewayBackend};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

pub mod documents;
pub mod health;
pub mod search;

/// Build the gateway router. `/health` sits outside admission; search
/// parameters are validated before admission runs.
pub fn router<B: GatewayBackend>(state: AppState<B>) -> Router {
    let admission = from_fn_with_state(state.clone(), admission_middleware::<B>);

    let searches = Router::new()
        .route("/search", get(search::search::<B>))
        .layer(admission.clone())
        .layer(from_fn(search::validate_search));

    let documents = Router::new()
        .route("/documents", post(documents::create::<B>))
        .route("/documents/{id}", get(documents::fetch::<B>).delete(documents::delete::<B>))
        .layer(admission);

    Router::new()
        .merge(searches)
        .merge(documents)
        .route("/health", get(health::health::<B>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
