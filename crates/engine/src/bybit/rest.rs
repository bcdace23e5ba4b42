use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;
use tracing::debug;

use common::{
    Error, ExchangeClient, MarketSnapshot, Order, OrderAck, OrderBook, OrderBookLevel, OrderSide,
    Position, Result, Ticker, WalletBalance,
};

const MAINNET_URL: &str = "https://api.bybit.com";
const TESTNET_URL: &str = "https://api-testnet.bybit.com";

/// Signed requests are rejected once server time drifts past this window (ms).
const RECV_WINDOW: &str = "5000";

/// REST client for the Bybit v5 unified trading API.
/// Used for account queries, market data and order placement.
pub struct BybitClient {
    api_key: String,
    secret: String,
    base_url: &'static str,
    http: Client,
}

impl BybitClient {
    pub fn new(api_key: impl Into<String>, secret: impl Into<String>, testnet: bool) -> Self {
        Self {
            api_key: api_key.into(),
            secret: secret.into(),
            base_url: if testnet { TESTNET_URL } else { MAINNET_URL },
            http: Client::builder()
                .use_rustls_tls()
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    fn timestamp_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64
    }

    /// Bybit v5 signature: HMAC-SHA256 over timestamp + key + window + payload,
    /// where payload is the query string for GET and the raw body for POST.
    fn sign(&self, timestamp: u64, payload: &str) -> String {
        type HmacSha256 = Hmac<Sha256>;
        let message = format!("{timestamp}{}{RECV_WINDOW}{payload}", self.api_key);
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(message.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    async fn signed_get(&self, path: &str, query: &str) -> Result<String> {
        let ts = Self::timestamp_ms();
        let signature = self.sign(ts, query);
        let url = format!("{}{path}?{query}", self.base_url);

        let resp = self
            .http
            .get(&url)
            .header("X-BAPI-API-KEY", &self.api_key)
            .header("X-BAPI-SIGN", signature)
            .header("X-BAPI-TIMESTAMP", ts.to_string())
            .header("X-BAPI-RECV-WINDOW", RECV_WINDOW)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Exchange(format!("HTTP {status}: {body}")));
        }
        Ok(body)
    }

    async fn signed_post(&self, path: &str, body: &serde_json::Value) -> Result<String> {
        let ts = Self::timestamp_ms();
        let raw = body.to_string();
        let signature = self.sign(ts, &raw);
        let url = format!("{}{path}", self.base_url);

        let resp = self
            .http
            .post(&url)
            .header("X-BAPI-API-KEY", &self.api_key)
            .header("X-BAPI-SIGN", signature)
            .header("X-BAPI-TIMESTAMP", ts.to_string())
            .header("X-BAPI-RECV-WINDOW", RECV_WINDOW)
            .header("Content-Type", "application/json")
            .body(raw)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Exchange(format!("HTTP {status}: {text}")));
        }
        Ok(text)
    }

    async fn public_get(&self, path: &str, query: &str) -> Result<String> {
        let url = format!("{}{path}?{query}", self.base_url);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Exchange(format!("HTTP {status}: {body}")));
        }
        Ok(body)
    }
}

/// Unwrap the Bybit response envelope, turning non-zero `retCode` into an
/// exchange error.
fn unwrap_envelope<T: serde::de::DeserializeOwned>(body: &str) -> Result<T> {
    let envelope: Envelope<T> =
        serde_json::from_str(body).map_err(|e| Error::Exchange(e.to_string()))?;
    if envelope.ret_code != 0 {
        return Err(Error::Exchange(format!(
            "retCode {}: {}",
            envelope.ret_code, envelope.ret_msg
        )));
    }
    envelope
        .result
        .ok_or_else(|| Error::Exchange("missing result payload".into()))
}

fn parse_f64(s: &str) -> f64 {
    s.parse().unwrap_or(0.0)
}

#[async_trait]
impl ExchangeClient for BybitClient {
    async fn ping(&self) -> Result<()> {
        // Cheapest authenticated call; also verifies the API key works.
        self.wallet_balance().await.map(|_| ())
    }

    async fn wallet_balance(&self) -> Result<Vec<WalletBalance>> {
        let body = self
            .signed_get("/v5/account/wallet-balance", "accountType=UNIFIED")
            .await?;
        let result: WalletResult = unwrap_envelope(&body)?;

        let balances = result
            .list
            .into_iter()
            .flat_map(|account| account.coin)
            .map(|c| WalletBalance {
                coin: c.coin,
                equity: parse_f64(&c.equity),
                available: parse_f64(&c.available_to_withdraw),
            })
            .collect();
        Ok(balances)
    }

    async fn open_positions(&self) -> Result<Vec<Position>> {
        let body = self
            .signed_get("/v5/position/list", "category=linear&settleCoin=USDT")
            .await?;
        let result: PositionResult = unwrap_envelope(&body)?;

        let positions = result
            .list
            .into_iter()
            .filter_map(|p| {
                // Flat symbols report side "None" with zero size; skip them.
                let side = match p.side.as_str() {
                    "Buy" => OrderSide::Buy,
                    "Sell" => OrderSide::Sell,
                    _ => return None,
                };
                Some(Position {
                    symbol: p.symbol,
                    side,
                    size: parse_f64(&p.size),
                    entry_price: parse_f64(&p.avg_price),
                    leverage: parse_f64(&p.leverage),
                    unrealised_pnl: parse_f64(&p.unrealised_pnl),
                })
            })
            .collect();
        Ok(positions)
    }

    async fn market_snapshot(&self, symbol: &str) -> Result<MarketSnapshot> {
        let ticker_body = self
            .public_get(
                "/v5/market/tickers",
                &format!("category=linear&symbol={symbol}"),
            )
            .await?;
        let ticker_result: TickerResult = unwrap_envelope(&ticker_body)?;
        let raw = ticker_result
            .list
            .into_iter()
            .next()
            .ok_or_else(|| Error::Exchange(format!("no ticker for symbol '{symbol}'")))?;

        let book_body = self
            .public_get(
                "/v5/market/orderbook",
                &format!("category=linear&symbol={symbol}"),
            )
            .await?;
        let book: OrderBookResult = unwrap_envelope(&book_body)?;

        let to_levels = |raw: Vec<[String; 2]>| -> Vec<OrderBookLevel> {
            raw.into_iter()
                .map(|[price, qty]| OrderBookLevel {
                    price: parse_f64(&price),
                    qty: parse_f64(&qty),
                })
                .collect()
        };

        Ok(MarketSnapshot {
            symbol: symbol.to_string(),
            ticker: Ticker {
                symbol: raw.symbol,
                last_price: parse_f64(&raw.last_price),
                bid: parse_f64(&raw.bid1_price),
                ask: parse_f64(&raw.ask1_price),
                volume_24h: parse_f64(&raw.volume_24h),
            },
            order_book: OrderBook {
                symbol: book.symbol,
                bids: to_levels(book.bids),
                asks: to_levels(book.asks),
            },
        })
    }

    async fn submit_order(&self, order: &Order) -> Result<OrderAck> {
        let mut body = json!({
            "category": "linear",
            "symbol": order.symbol,
            "side": order.side.to_string(),
            "orderType": if order.price.is_some() { "Limit" } else { "Market" },
            "qty": order.qty.to_string(),
            "orderLinkId": order.id,
        });
        if let Some(price) = order.price {
            body["price"] = json!(price.to_string());
            body["timeInForce"] = json!("GTC");
        }

        debug!(symbol = %order.symbol, side = %order.side, "Submitting order to Bybit");
        let text = self.signed_post("/v5/order/create", &body).await?;
        let result: OrderCreateResult = unwrap_envelope(&text)?;

        Ok(OrderAck {
            order_id: result.order_id,
            symbol: order.symbol.clone(),
            side: order.side,
            qty: order.qty,
            timestamp: Utc::now(),
        })
    }

    async fn cancel_order(&self, symbol: &str, order_id: &str) -> Result<()> {
        let body = json!({
            "category": "linear",
            "symbol": symbol,
            "orderId": order_id,
        });

        debug!(symbol = %symbol, order_id = %order_id, "Cancelling Bybit order");
        let text = self.signed_post("/v5/order/cancel", &body).await?;
        let _: OrderCreateResult = unwrap_envelope(&text)?;
        Ok(())
    }
}

// ─── Response types ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(rename = "retCode")]
    ret_code: i64,
    #[serde(rename = "retMsg")]
    ret_msg: String,
    result: Option<T>,
}

#[derive(Deserialize)]
struct WalletResult {
    list: Vec<WalletAccount>,
}

#[derive(Deserialize)]
struct WalletAccount {
    coin: Vec<WalletCoin>,
}

#[derive(Deserialize)]
struct WalletCoin {
    coin: String,
    equity: String,
    #[serde(rename = "availableToWithdraw")]
    available_to_withdraw: String,
}

#[derive(Deserialize)]
struct PositionResult {
    list: Vec<RawPosition>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPosition {
    symbol: String,
    side: String,
    size: String,
    avg_price: String,
    leverage: String,
    unrealised_pnl: String,
}

#[derive(Deserialize)]
struct TickerResult {
    list: Vec<RawTicker>,
}

#[derive(Deserialize)]
struct RawTicker {
    symbol: String,
    #[serde(rename = "lastPrice")]
    last_price: String,
    #[serde(rename = "bid1Price")]
    bid1_price: String,
    #[serde(rename = "ask1Price")]
    ask1_price: String,
    #[serde(rename = "volume24h")]
    volume_24h: String,
}

#[derive(Deserialize)]
struct OrderBookResult {
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "b")]
    bids: Vec<[String; 2]>,
    #[serde(rename = "a")]
    asks: Vec<[String; 2]>,
}

#[derive(Deserialize)]
struct OrderCreateResult {
    #[serde(rename = "orderId")]
    order_id: String,
}
