use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::error;

use common::{Error, StrategyConfig};

use crate::AppState;

// ─── Start ────────────────────────────────────────────────────────────────────

/// Start a strategy from a submitted config.
///
/// The API-model bounds (leverage, risk_per_trade) are enforced here; the
/// registry owns the core field checks and reports them as 400s.
pub async fn start_strategy(
    State(state): State<AppState>,
    Json(config): Json<StrategyConfig>,
) -> Response {
    if !(1..=100).contains(&config.leverage) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"error": "leverage must be between 1 and 100"})),
        )
            .into_response();
    }
    if !(0.001..=0.1).contains(&config.risk_per_trade) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"error": "risk_per_trade must be between 0.001 and 0.1"})),
        )
            .into_response();
    }

    match state.registry.start(config).await {
        Ok(id) => Json(json!({"status": "success", "strategy_id": id})).into_response(),
        Err(e @ Error::Validation(_)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Strategy start failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response()
        }
    }
}

// ─── Stop ─────────────────────────────────────────────────────────────────────

/// Stop one strategy. Unknown ids report `success: false`, not an error.
pub async fn stop_strategy(State(state): State<AppState>, Path(id): Path<String>) -> Json<Value> {
    let success = state.registry.stop(&id).await;
    Json(json!({"success": success, "strategy_id": id}))
}

pub async fn stop_all_strategies(State(state): State<AppState>) -> Json<Value> {
    state.registry.stop_all().await;
    Json(json!({"status": "success"}))
}

// ─── List ─────────────────────────────────────────────────────────────────────

pub async fn get_running_strategies(State(state): State<AppState>) -> Json<Value> {
    let strategies = state.registry.list_running().await;
    Json(json!({"strategies": strategies}))
}

pub async fn get_all_strategies(State(state): State<AppState>) -> Json<Value> {
    let strategies = state.registry.list_all().await;
    Json(json!({"strategies": strategies}))
}
