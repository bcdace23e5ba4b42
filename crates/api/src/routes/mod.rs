mod account;
mod health;
mod strategies;
mod ws;

use axum::{middleware, routing::get, routing::post, Router};

use crate::{auth::require_auth, AppState};

pub use health::health_router;
pub use ws::ws_router;

/// All authenticated /api routes.
pub fn api_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/strategies/start", post(strategies::start_strategy))
        .route("/api/strategies/stop/:id", post(strategies::stop_strategy))
        .route("/api/strategies/stop-all", post(strategies::stop_all_strategies))
        .route("/api/strategies", get(strategies::get_running_strategies))
        .route("/api/strategies/all", get(strategies::get_all_strategies))
        .route("/api/account", get(account::get_account))
        .route("/api/market/:symbol", get(account::get_market))
        .route("/api/settings", get(account::get_settings))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
