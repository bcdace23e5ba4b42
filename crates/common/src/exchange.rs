use async_trait::async_trait;

use crate::{MarketSnapshot, Order, OrderAck, Position, Result, WalletBalance};

/// Abstraction over the exchange connection.
///
/// `BybitClient` in `crates/engine` implements this for the live API.
/// The strategy registry holds no reference to it; only the account and
/// market routes of the control API (and any future order-placing
/// extension) consume it. Every method is independently retryable by the
/// caller — no retries happen behind this trait.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Cheap connectivity probe used by the health endpoint.
    async fn ping(&self) -> Result<()>;

    /// Per-coin balances of the unified trading account.
    async fn wallet_balance(&self) -> Result<Vec<WalletBalance>>;

    /// Currently open derivatives positions.
    async fn open_positions(&self) -> Result<Vec<Position>>;

    /// Latest ticker and order book for a trading pair.
    async fn market_snapshot(&self, symbol: &str) -> Result<MarketSnapshot>;

    /// Submit an order and return the exchange acknowledgement.
    async fn submit_order(&self, order: &Order) -> Result<OrderAck>;

    /// Cancel an open order by exchange order id.
    async fn cancel_order(&self, symbol: &str, order_id: &str) -> Result<()>;
}
