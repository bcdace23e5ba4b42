mod auth;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use common::ExchangeClient;
use engine::StrategyRegistry;

/// Shared application state injected into every route handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<StrategyRegistry>,
    pub exchange: Arc<dyn ExchangeClient>,
    pub dashboard_token: String,
    /// Redacted settings snapshot served on /api/settings.
    pub settings: Value,
}

/// Build and run the Axum control API.
pub async fn serve(state: AppState, port: u16) {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods(Any);

    let app = Router::new()
        .merge(routes::api_router(state.clone()))
        .merge(routes::ws_router())
        .merge(routes::health_router())
        .with_state(state)
        .layer(cors);

    info!(%addr, "Control API listening");
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
