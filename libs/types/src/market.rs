//! Market observations and estimator outputs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Where a price came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    /// The pool's own price (derived from sqrtPriceX96)
    Internal,
    /// Reference price from an external venue
    External,
}

/// One immutable price sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub price: Decimal,
    pub timestamp: u64,
    pub source: PriceSource,
}

impl PriceObservation {
    /// `None` unless `price` is strictly positive
    pub fn new(price: Decimal, timestamp: u64, source: PriceSource) -> Option<Self> {
        if price <= Decimal::ZERO {
            return None;
        }
        Some(Self {
            price,
            timestamp,
            source,
        })
    }
}

/// Point estimates for one analysis cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Population standard deviation of consecutive fractional returns
    pub volatility: Decimal,
    /// `|pool - external| / external`, zero until both sources are known
    pub spread: Decimal,
    pub liquidity_depth: u128,
    /// In `[0, 1]`
    pub confidence: Decimal,
}

/// Fee proposal produced once per analysis cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub recommended_fee: u32,
    pub volatility: Decimal,
    pub spread: Decimal,
    pub liquidity_depth: u128,
    pub confidence: Decimal,
    pub timestamp: u64,
}

impl Recommendation {
    pub fn from_snapshot(snapshot: &MarketSnapshot, recommended_fee: u32, timestamp: u64) -> Self {
        Self {
            recommended_fee,
            volatility: snapshot.volatility,
            spread: snapshot.spread,
            liquidity_depth: snapshot.liquidity_depth,
            confidence: snapshot.confidence,
            timestamp,
        }
    }
}
