use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use common::{Config, ExchangeClient};
use engine::{BybitClient, StrategyRegistry};

#[tokio::main]
async fn main() {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    // ── Config ───────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    info!(testnet = cfg.testnet, "ByBot starting");

    // ── Exchange client ──────────────────────────────────────────────────────
    let exchange: Arc<dyn ExchangeClient> = Arc::new(BybitClient::new(
        &cfg.bybit_api_key,
        &cfg.bybit_api_secret,
        cfg.testnet,
    ));

    match exchange.ping().await {
        Ok(()) => info!("Connected to Bybit API"),
        Err(e) => warn!(error = %e, "Could not reach Bybit API — check your credentials"),
    }

    // ── Strategy registry ────────────────────────────────────────────────────
    let registry = Arc::new(StrategyRegistry::new());

    // ── Control API ──────────────────────────────────────────────────────────
    let api_state = api::AppState {
        registry: registry.clone(),
        exchange,
        dashboard_token: cfg.dashboard_token.clone(),
        settings: cfg.summary(),
    };
    let port = cfg.dashboard_port;
    tokio::spawn(api::serve(api_state, port));

    info!("All subsystems started. Waiting for shutdown signal.");
    tokio::signal::ctrl_c().await.unwrap();

    // ── Shutdown ─────────────────────────────────────────────────────────────
    info!("Shutdown signal received");
    registry.shutdown().await;
    info!("All trading strategies stopped. Exiting.");
}
