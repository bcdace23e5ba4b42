use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

use crate::AppState;

/// Bearer-token gate on every protected `/api` route.
///
/// The expected token is the dashboard token from config. Health stays open
/// so deploy probes work without credentials; everything that can start or
/// stop a strategy sits behind this check. Rejections use the same
/// `{"error": ...}` payload shape as the rest of the API and are logged
/// with the request path.
pub async fn require_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    let token = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match token {
        Some(t) if t == state.dashboard_token => next.run(request).await,
        provided => {
            warn!(
                path = %request.uri().path(),
                token_present = provided.is_some(),
                "Rejected unauthenticated API request"
            );
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "unauthorized"})),
            )
                .into_response()
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{body::Body, http::Request, middleware, routing::get, Router};
    use serde_json::json;
    use tower::ServiceExt;

    use common::{
        Error, ExchangeClient, MarketSnapshot, Order, OrderAck, Position, Result, WalletBalance,
    };
    use engine::StrategyRegistry;

    /// Exchange stub for tests that never touch the exchange.
    struct OfflineExchange;

    #[async_trait]
    impl ExchangeClient for OfflineExchange {
        async fn ping(&self) -> Result<()> {
            Err(Error::Exchange("offline".into()))
        }
        async fn wallet_balance(&self) -> Result<Vec<WalletBalance>> {
            Err(Error::Exchange("offline".into()))
        }
        async fn open_positions(&self) -> Result<Vec<Position>> {
            Err(Error::Exchange("offline".into()))
        }
        async fn market_snapshot(&self, _symbol: &str) -> Result<MarketSnapshot> {
            Err(Error::Exchange("offline".into()))
        }
        async fn submit_order(&self, _order: &Order) -> Result<OrderAck> {
            Err(Error::Exchange("offline".into()))
        }
        async fn cancel_order(&self, _symbol: &str, _order_id: &str) -> Result<()> {
            Err(Error::Exchange("offline".into()))
        }
    }

    fn test_app() -> Router {
        let state = AppState {
            registry: Arc::new(StrategyRegistry::new()),
            exchange: Arc::new(OfflineExchange),
            dashboard_token: "secret".into(),
            settings: json!({}),
        };
        Router::new()
            .route("/api/strategies", get(|| async { "ok" }))
            .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
            .with_state(state)
    }

    fn request(auth_header: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/api/strategies");
        if let Some(value) = auth_header {
            builder = builder.header("Authorization", value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn missing_token_is_rejected() {
        let resp = test_app().oneshot(request(None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_token_is_rejected() {
        let resp = test_app()
            .oneshot(request(Some("Bearer wrong")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_rejected() {
        let resp = test_app()
            .oneshot(request(Some("Basic secret")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_token_passes_through() {
        let resp = test_app()
            .oneshot(request(Some("Bearer secret")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
