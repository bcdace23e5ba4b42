use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use engine::StrategyRegistry;

use crate::AppState;

pub fn ws_router() -> Router<AppState> {
    Router::new().route("/ws/events", get(ws_events_handler))
}

#[derive(Deserialize)]
struct WsQuery {
    token: Option<String>,
}

/// WebSocket endpoint streaming strategy lifecycle events to the dashboard.
/// Auth via query param `?token=<DASHBOARD_TOKEN>` (header auth not supported
/// in browser WebSocket API).
async fn ws_events_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(q): Query<WsQuery>,
) -> Response {
    let authed = q
        .token
        .as_deref()
        .map(|t| t == state.dashboard_token)
        .unwrap_or(false);

    if !authed {
        return axum::response::IntoResponse::into_response((
            axum::http::StatusCode::UNAUTHORIZED,
            "unauthorized",
        ));
    }

    let registry = state.registry.clone();
    ws.on_upgrade(move |socket| handle_ws(socket, registry))
}

async fn handle_ws(mut socket: WebSocket, registry: Arc<StrategyRegistry>) {
    // Subscribe before snapshotting so no event between the two is lost;
    // a client may see a stop for a strategy already absent from the snapshot.
    let mut events = registry.subscribe();

    let running = registry.list_running().await;
    let snapshot = json!({"event": "snapshot", "strategies": running});
    if socket.send(Message::Text(snapshot.to_string())).await.is_err() {
        return;
    }

    loop {
        match events.recv().await {
            Ok(event) => {
                let line = match serde_json::to_string(&event) {
                    Ok(line) => line,
                    Err(_) => continue,
                };
                if socket.send(Message::Text(line)).await.is_err() {
                    break;
                }
            }
            Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                warn!(dropped = n, "WebSocket event client lagged");
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                break;
            }
        }
    }
}
