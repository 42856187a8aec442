//! External reference price feed
//!
//! Polls an HTTP endpoint returning `{ "price": "<decimal>", "timestamp": <secs> }`.
//! `time` is accepted in place of `timestamp`, and non-numeric times are ignored so the
//! caller stamps the quote with its own clock. Failures are reported, never fatal.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::error::FeedError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceQuote {
    pub price: Decimal,
    pub timestamp: Option<u64>,
}

#[async_trait]
pub trait PriceFeed: Send + Sync {
    async fn fetch(&self) -> Result<PriceQuote, FeedError>;
}

pub struct HttpPriceFeed {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpPriceFeed {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(2)
            .tcp_nodelay(true)
            .user_agent(concat!("vigil-fee-controller/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FeedError::Configuration(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
            timeout,
        })
    }
}

#[async_trait]
impl PriceFeed for HttpPriceFeed {
    async fn fetch(&self) -> Result<PriceQuote, FeedError> {
        let timeout_error = FeedError::Timeout {
            after_ms: self.timeout.as_millis() as u64,
        };
        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                timeout_error.clone()
            } else {
                FeedError::Transport(e.to_string())
            }
        };

        let response = self.client.get(&self.url).send().await.map_err(map_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Http {
                status: status.as_u16(),
            });
        }
        let body = response.text().await.map_err(map_err)?;
        let quote = parse_quote(&body)?;
        debug!(price = %quote.price, "Fetched external price");
        Ok(quote)
    }
}

/// Parse a price response body
pub fn parse_quote(body: &str) -> Result<PriceQuote, FeedError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| FeedError::Parse(e.to_string()))?;

    let price = match value.get("price") {
        Some(Value::String(s)) => {
            Decimal::from_str(s.trim()).map_err(|e| FeedError::Parse(format!("price: {}", e)))?
        }
        Some(Value::Number(n)) => Decimal::from_str(&n.to_string())
            .map_err(|e| FeedError::Parse(format!("price: {}", e)))?,
        _ => return Err(FeedError::Parse("missing price".to_string())),
    };
    if price <= Decimal::ZERO {
        return Err(FeedError::Parse(format!("non-positive price {}", price)));
    }

    let timestamp = value
        .get("timestamp")
        .or_else(|| value.get("time"))
        .and_then(|t| match t {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse::<u64>().ok(),
            _ => None,
        });

    Ok(PriceQuote { price, timestamp })
}
