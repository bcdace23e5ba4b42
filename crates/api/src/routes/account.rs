use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::error;

use crate::AppState;

/// Wallet balance and open positions, straight from the exchange.
/// Upstream failures surface as 502 so the dashboard can tell exchange
/// trouble apart from its own backend being down.
pub async fn get_account(State(state): State<AppState>) -> Response {
    let balance = match state.exchange.wallet_balance().await {
        Ok(b) => b,
        Err(e) => return upstream_error("account balance", e),
    };
    let positions = match state.exchange.open_positions().await {
        Ok(p) => p,
        Err(e) => return upstream_error("open positions", e),
    };

    Json(json!({
        "balance": balance,
        "positions": positions,
        "timestamp": Utc::now(),
    }))
    .into_response()
}

/// Ticker plus order book for one symbol.
pub async fn get_market(State(state): State<AppState>, Path(symbol): Path<String>) -> Response {
    match state.exchange.market_snapshot(&symbol).await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => upstream_error("market data", e),
    }
}

/// Redacted settings snapshot captured at startup.
pub async fn get_settings(State(state): State<AppState>) -> Json<Value> {
    Json(state.settings.clone())
}

fn upstream_error(what: &str, e: common::Error) -> Response {
    error!(error = %e, "Failed to fetch {what} from exchange");
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({"error": e.to_string()})),
    )
        .into_response()
}
