//! Property-based tests for market estimator statistics

use fee_controller::MarketEstimator;
use proptest::prelude::*;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use types::ManualClock;
use vigil_config::EstimatorConfig;

fn estimator() -> MarketEstimator {
    MarketEstimator::new(EstimatorConfig::default(), Arc::new(ManualClock::new(1_000)))
}

/// Population standard deviation of fractional returns, in floating point
fn reference_volatility(prices: &[f64]) -> f64 {
    let returns: Vec<f64> = prices.windows(2).map(|w| (w[1] - w[0]) / w[0]).collect();
    if returns.is_empty() {
        return 0.0;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// Prices between 1.00 and 5000.00
fn price() -> impl Strategy<Value = Decimal> {
    (100i64..500_000).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #[test]
    fn volatility_matches_population_std_dev(prices in prop::collection::vec(price(), 0..60)) {
        let mut est = estimator();
        for p in &prices {
            prop_assert!(est.record_external_price(*p));
        }

        let floats: Vec<f64> = prices.iter().map(|p| p.to_f64().unwrap()).collect();
        let expected = reference_volatility(&floats);
        let actual = est.volatility().to_f64().unwrap();

        prop_assert!(actual >= 0.0);
        prop_assert!(
            (actual - expected).abs() < 1e-9 + expected * 1e-9,
            "volatility {} vs reference {}",
            actual,
            expected
        );
    }

    #[test]
    fn constant_series_has_zero_volatility(p in price(), n in 2usize..30) {
        let mut est = estimator();
        for _ in 0..n {
            est.record_external_price(p);
        }
        prop_assert_eq!(est.volatility(), Decimal::ZERO);
    }
}
