use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Supported strategy families, matching the dashboard's strategy picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyType {
    Grid,
    MeanReversion,
    Momentum,
}

impl std::fmt::Display for StrategyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyType::Grid => write!(f, "grid"),
            StrategyType::MeanReversion => write!(f, "mean_reversion"),
            StrategyType::Momentum => write!(f, "momentum"),
        }
    }
}

/// Lifecycle status of a registered strategy.
/// `Stopped` is terminal; there is no restart of the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyStatus {
    Running,
    Stopped,
}

impl std::fmt::Display for StrategyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyStatus::Running => write!(f, "running"),
            StrategyStatus::Stopped => write!(f, "stopped"),
        }
    }
}

/// Strategy configuration as submitted over the control API.
///
/// The structurally required fields (`symbol`, `type`, `volume`) are
/// `Option`s here: the registry owns the presence checks, so a missing
/// field reports as a validation error rather than a deserialization
/// failure the caller cannot tell apart from malformed JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Display name used in logs and the dashboard.
    #[serde(default)]
    pub name: Option<String>,
    /// Trading pair, e.g. "BTCUSDT".
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(rename = "type", default)]
    pub strategy_type: Option<StrategyType>,
    /// Order volume in base asset units. Must be strictly positive.
    #[serde(default)]
    pub volume: Option<f64>,
    /// Leverage multiplier, bounded [1, 100] at the API layer.
    #[serde(default = "default_leverage")]
    pub leverage: u32,
    /// Fraction of equity risked per trade, bounded [0.001, 0.1] at the API layer.
    #[serde(default = "default_risk_per_trade")]
    pub risk_per_trade: f64,
    /// Strategy-specific parameters, opaque to the registry.
    #[serde(default)]
    pub parameters: HashMap<String, serde_json::Value>,
}

fn default_leverage() -> u32 {
    10
}

fn default_risk_per_trade() -> f64 {
    0.02
}

impl StrategyConfig {
    /// Name for log lines; configs without a name get a placeholder.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unnamed")
    }
}

/// Execution summary. Zeroed at creation and left untouched until a live
/// execution path reports fills back.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Performance {
    pub trades_count: u64,
    pub total_pnl: f64,
    pub win_rate: f64,
}

/// A strategy instance owned by the registry. Callers only ever receive
/// clones of this; the registry keeps the sole mutable copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Strategy {
    pub id: String,
    pub config: StrategyConfig,
    pub status: StrategyStatus,
    pub started_at: DateTime<Utc>,
    /// Set exactly when `status` becomes `Stopped`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<DateTime<Utc>>,
    pub performance: Performance,
}

/// Lifecycle events broadcast to dashboard WebSocket clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StrategyEvent {
    Started { id: String, name: String },
    Stopped { id: String },
    AllStopped { stopped: usize },
}

/// Side of an order or position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "Buy"),
            OrderSide::Sell => write!(f, "Sell"),
        }
    }
}

/// An order to be submitted to the exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub symbol: String,
    pub side: OrderSide,
    pub qty: f64,
    /// `None` = market order; `Some(price)` = limit order.
    pub price: Option<f64>,
}

impl Order {
    pub fn market(symbol: impl Into<String>, side: OrderSide, qty: f64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            symbol: symbol.into(),
            side,
            qty,
            price: None,
        }
    }
}

/// Acknowledgement of an accepted order returned by the exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAck {
    pub order_id: String,
    pub symbol: String,
    pub side: OrderSide,
    pub qty: f64,
    pub timestamp: DateTime<Utc>,
}

/// Per-coin balance inside the unified trading account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletBalance {
    pub coin: String,
    pub equity: f64,
    pub available: f64,
}

/// An open derivatives position reported by the exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub side: OrderSide,
    pub size: f64,
    pub entry_price: f64,
    pub leverage: f64,
    pub unrealised_pnl: f64,
}

/// Latest ticker for a trading pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    pub last_price: f64,
    pub bid: f64,
    pub ask: f64,
    pub volume_24h: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBookLevel {
    pub price: f64,
    pub qty: f64,
}

/// Order book snapshot, best levels first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBook {
    pub symbol: String,
    pub bids: Vec<OrderBookLevel>,
    pub asks: Vec<OrderBookLevel>,
}

/// Ticker plus order book, as served by the market-data endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol: String,
    pub ticker: Ticker,
    pub order_book: OrderBook,
}
