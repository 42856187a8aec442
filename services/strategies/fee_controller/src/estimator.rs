//! Market estimator
//!
//! Keeps one ring buffer per price source and turns them into a [`MarketSnapshot`] and a
//! threshold-tiered fee [`Recommendation`]:
//!
//! ```text
//! fee = base
//!     + (vol > high ? high_surcharge : vol > medium ? medium_surcharge : 0)
//!     + (spread > emergency ? emergency_surcharge : spread > wide ? wide_surcharge : 0)
//!     + (0 < liquidity < low_liquidity_threshold ? low_liquidity_surcharge : 0)
//! ```
//!
//! Missing data is never an error: no prices means zero volatility and zero spread.

use amm::{fractional_returns, population_std_dev, relative_spread, PoolSlot, V3Math};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, warn};
use types::{MarketSnapshot, PriceObservation, PriceSource, Recommendation, SharedClock};
use vigil_config::EstimatorConfig;

use crate::ring_buffer::RingBuffer;

const BASE_CONFIDENCE: Decimal = dec!(0.5);
const FILL_CONFIDENCE: Decimal = dec!(0.3);
const DUAL_SOURCE_CONFIDENCE: Decimal = dec!(0.2);

pub struct MarketEstimator {
    config: EstimatorConfig,
    clock: SharedClock,
    external: RingBuffer<PriceObservation>,
    pool: RingBuffer<PriceObservation>,
    liquidity_depth: u128,
}

impl MarketEstimator {
    pub fn new(config: EstimatorConfig, clock: SharedClock) -> Self {
        let capacity = config.buffer_capacity;
        Self {
            config,
            clock,
            external: RingBuffer::new(capacity),
            pool: RingBuffer::new(capacity),
            liquidity_depth: 0,
        }
    }

    /// Returns false when the price is not strictly positive
    pub fn record_external_price(&mut self, price: Decimal) -> bool {
        self.record(price, PriceSource::External)
    }

    pub fn record_pool_price(&mut self, price: Decimal) -> bool {
        self.record(price, PriceSource::Internal)
    }

    fn record(&mut self, price: Decimal, source: PriceSource) -> bool {
        let Some(observation) = PriceObservation::new(price, self.clock.now(), source) else {
            debug!(%price, ?source, "Ignoring non-positive price");
            return false;
        };
        match source {
            PriceSource::External => self.external.push(observation),
            PriceSource::Internal => self.pool.push(observation),
        }
        true
    }

    /// Pool price and liquidity from on-chain state
    pub fn record_pool_state(&mut self, slot: &PoolSlot, decimals0: u8, decimals1: u8) -> bool {
        self.liquidity_depth = slot.liquidity;
        match V3Math::sqrt_price_to_price(slot.sqrt_price_x96, decimals0, decimals1) {
            Ok(price) => self.record_pool_price(price),
            Err(e) => {
                debug!("Pool price unavailable: {}", e);
                false
            }
        }
    }

    pub fn last_external_price(&self) -> Option<Decimal> {
        self.external.latest().map(|o| o.price)
    }

    pub fn last_pool_price(&self) -> Option<Decimal> {
        self.pool.latest().map(|o| o.price)
    }

    pub fn external_observations(&self) -> usize {
        self.external.len()
    }

    pub fn pool_observations(&self) -> usize {
        self.pool.len()
    }

    /// Read-only copy of the series volatility is computed on
    pub fn price_series(&self) -> Vec<Decimal> {
        let source = if self.external.len() >= 2 {
            &self.external
        } else {
            &self.pool
        };
        source.iter().map(|o| o.price).collect()
    }

    pub fn volatility(&self) -> Decimal {
        let prices = self.price_series();
        if prices.len() < 2 {
            return Decimal::ZERO;
        }
        match fractional_returns(&prices).and_then(|returns| population_std_dev(&returns)) {
            Ok(volatility) => volatility,
            Err(e) => {
                warn!("Volatility calculation failed: {}", e);
                Decimal::ZERO
            }
        }
    }

    pub fn spread(&self) -> Decimal {
        match (self.last_pool_price(), self.last_external_price()) {
            (Some(pool), Some(external)) => relative_spread(pool, external).unwrap_or_else(|e| {
                warn!("Spread calculation failed: {}", e);
                Decimal::ZERO
            }),
            _ => Decimal::ZERO,
        }
    }

    pub fn confidence(&self) -> Decimal {
        let fill = Decimal::from(self.external.len()) / Decimal::from(self.external.capacity());
        let mut confidence = BASE_CONFIDENCE + FILL_CONFIDENCE * fill.min(Decimal::ONE);
        if !self.external.is_empty() && !self.pool.is_empty() {
            confidence += DUAL_SOURCE_CONFIDENCE;
        }
        confidence.min(Decimal::ONE)
    }

    pub fn compute_snapshot(&self) -> MarketSnapshot {
        MarketSnapshot {
            volatility: self.volatility(),
            spread: self.spread(),
            liquidity_depth: self.liquidity_depth,
            confidence: self.confidence(),
        }
    }

    pub fn recommend(&self, snapshot: &MarketSnapshot) -> Recommendation {
        let c = &self.config;
        let mut fee = c.base_fee_bps;

        if snapshot.volatility > c.high_volatility {
            fee += c.high_volatility_surcharge_bps;
        } else if snapshot.volatility > c.medium_volatility {
            fee += c.medium_volatility_surcharge_bps;
        }

        if snapshot.spread > c.emergency_spread {
            fee += c.emergency_spread_surcharge_bps;
        } else if snapshot.spread > c.wide_spread {
            fee += c.wide_spread_surcharge_bps;
        }

        if snapshot.liquidity_depth > 0
            && snapshot.liquidity_depth < u128::from(c.low_liquidity_threshold)
        {
            fee += c.low_liquidity_surcharge_bps;
        }

        Recommendation::from_snapshot(snapshot, fee, self.clock.now())
    }

    /// One analysis cycle
    pub fn analyze(&self) -> Recommendation {
        let snapshot = self.compute_snapshot();
        self.recommend(&snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amm::{Q96, U256};
    use std::sync::Arc;
    use types::ManualClock;

    fn estimator() -> MarketEstimator {
        MarketEstimator::new(EstimatorConfig::default(), Arc::new(ManualClock::new(1_000)))
    }

    #[test]
    fn test_reference_series_volatility() {
        let mut est = estimator();
        for p in [2000, 2010, 2005, 2020, 2015] {
            assert!(est.record_external_price(Decimal::from(p)));
        }
        let vol = est.volatility();
        assert!(vol > Decimal::ZERO);
        assert!(vol < Decimal::ONE);
    }

    #[test]
    fn test_empty_estimator_is_neutral() {
        let est = estimator();
        let snapshot = est.compute_snapshot();
        assert_eq!(snapshot.volatility, Decimal::ZERO);
        assert_eq!(snapshot.spread, Decimal::ZERO);
        assert_eq!(snapshot.confidence, dec!(0.5));
        assert_eq!(est.recommend(&snapshot).recommended_fee, 300);
    }

    #[test]
    fn test_single_price_has_zero_volatility() {
        let mut est = estimator();
        est.record_external_price(dec!(2000));
        assert_eq!(est.volatility(), Decimal::ZERO);
        assert!(!est.record_external_price(dec!(0)));
        assert!(!est.record_external_price(dec!(-1)));
        assert_eq!(est.external_observations(), 1);
    }

    #[test]
    fn test_extreme_prices_degrade_to_zero() {
        let mut est = estimator();
        est.record_external_price(dec!(0.000000000000001));
        est.record_external_price(dec!(2000));
        est.record_external_price(dec!(2000));
        let snapshot = est.compute_snapshot();
        assert_eq!(snapshot.volatility, Decimal::ZERO);

        let mut est = estimator();
        est.record_external_price(dec!(0.0000000000000000000001));
        est.record_pool_price(dec!(79000000000000));
        let snapshot = est.compute_snapshot();
        assert_eq!(snapshot.spread, Decimal::ZERO);
        assert_eq!(est.analyze().recommended_fee, 300);
    }

    #[test]
    fn test_pool_series_fallback() {
        let mut est = estimator();
        est.record_pool_price(dec!(100));
        est.record_pool_price(dec!(110));
        assert_eq!(est.price_series(), vec![dec!(100), dec!(110)]);
        // One return, so population deviation is zero
        assert_eq!(est.volatility(), Decimal::ZERO);
    }

    #[test]
    fn test_spread_and_confidence() {
        let mut est = estimator();
        est.record_external_price(dec!(2000));
        assert_eq!(est.spread(), Decimal::ZERO);

        est.record_pool_price(dec!(2060));
        assert_eq!(est.spread(), dec!(0.03));
        // 0.5 + 0.3 * 1/100 + 0.2
        assert_eq!(est.confidence(), dec!(0.703));

        for _ in 0..200 {
            est.record_external_price(dec!(2000));
        }
        assert_eq!(est.confidence(), Decimal::ONE);
    }

    #[test]
    fn test_tiered_fee() {
        let est = estimator();
        let snapshot = MarketSnapshot {
            volatility: dec!(0.06),
            spread: dec!(0.01),
            liquidity_depth: 50_000,
            confidence: dec!(0.9),
        };
        // 300 + 300 + 100 + 50
        assert_eq!(est.recommend(&snapshot).recommended_fee, 750);

        let calm = MarketSnapshot {
            volatility: dec!(0.03),
            spread: dec!(0.025),
            liquidity_depth: 0,
            confidence: dec!(0.9),
        };
        // 300 + 100 + 200, zero liquidity carries no surcharge
        assert_eq!(est.recommend(&calm).recommended_fee, 600);
    }

    #[test]
    fn test_pool_state_updates_price_and_depth() {
        let mut est = estimator();
        let slot = PoolSlot {
            sqrt_price_x96: U256::from(Q96),
            liquidity: 75_000,
            ..Default::default()
        };
        assert!(est.record_pool_state(&slot, 18, 18));
        assert_eq!(est.last_pool_price(), Some(dec!(1)));
        assert_eq!(est.compute_snapshot().liquidity_depth, 75_000);

        let uninitialized = PoolSlot::default();
        assert!(!est.record_pool_state(&uninitialized, 18, 18));
    }
}
