use crate::state::{AppState, GatewayBackend};
use axum::extract::State;
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

/// Always 200; a failing backend probe reports `"vespa": "DOWN"`.
pub async fn health<B: GatewayBackend>(State(state): State<AppState<B>>) -> Json<Value> {
    let vespa = match state.backend.health().await {
        Ok(code) => code,
        Err(err) => {
            tracing::warn!(error = %err, "backend health probe failed");
            "DOWN".to_string()
        }
    };

    Json(json!({
        "status": "UP",
        "vespa": vespa,
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}
