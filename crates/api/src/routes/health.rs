use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::AppState;

pub fn health_router() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}

/// Health check endpoint — no auth required.
/// Probes exchange connectivity so deploy checks catch bad API keys early.
async fn health(State(state): State<AppState>) -> Json<Value> {
    let bybit_connected = state.exchange.ping().await.is_ok();
    Json(json!({
        "status": "running",
        "bybit_connected": bybit_connected,
        "components": {
            "exchange_client": true,
            "strategy_registry": true,
            "api": true,
        },
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
