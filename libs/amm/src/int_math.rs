//! Integer-only statistics for the on-chain gate
//!
//! Mirrors what a contract can compute: `U256` arithmetic, no fractions, overflow
//! saturates instead of trapping so a pathological price never blocks a swap.

use ethereum_types::U256;

/// Basis-point scale for the volatility index
const BPS: u64 = 10_000;

/// Integer square root by Babylonian iteration (floor)
pub fn isqrt(x: U256) -> U256 {
    if x.is_zero() {
        return U256::zero();
    }

    let mut z = (x >> 1) + U256::one();
    let mut y = x;
    while z < y {
        y = z;
        z = (x / z + z) >> 1;
    }
    y
}

/// Population variance `Σ(p - mean)² / n`. Zero for fewer than two samples.
pub fn population_variance(samples: &[U256]) -> U256 {
    if samples.len() < 2 {
        return U256::zero();
    }

    let n = U256::from(samples.len());
    let sum = samples
        .iter()
        .fold(U256::zero(), |acc, &p| acc.saturating_add(p));
    let mean = sum / n;

    let squared = samples.iter().fold(U256::zero(), |acc, &p| {
        let diff = if p > mean { p - mean } else { mean - p };
        acc.saturating_add(diff.saturating_mul(diff))
    });
    squared / n
}

/// Standard deviation relative to the mean, in basis points
pub fn volatility_index_bps(samples: &[U256]) -> U256 {
    if samples.len() < 2 {
        return U256::zero();
    }

    let sum = samples
        .iter()
        .fold(U256::zero(), |acc, &p| acc.saturating_add(p));
    let mean = sum / U256::from(samples.len());
    if mean.is_zero() {
        return U256::zero();
    }

    isqrt(population_variance(samples)).saturating_mul(U256::from(BPS)) / mean
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_isqrt_exact_and_floor() {
        assert_eq!(isqrt(U256::zero()), U256::zero());
        assert_eq!(isqrt(U256::one()), U256::one());
        assert_eq!(isqrt(U256::from(15u64)), U256::from(3u64));
        assert_eq!(isqrt(U256::from(16u64)), U256::from(4u64));
        assert_eq!(isqrt(U256::MAX), (U256::one() << 128) - U256::one());
    }

    #[test]
    fn test_variance_of_known_series() {
        // mean 5, squared deviations 9 + 1 + 1 + 9 = 20, / 4 = 5
        let samples = [2u64, 4, 6, 8].map(U256::from);
        assert_eq!(population_variance(&samples), U256::from(5u64));
        assert_eq!(population_variance(&samples[..1]), U256::zero());
    }

    #[test]
    fn test_volatility_index() {
        let flat = [U256::from(1_000u64); 5];
        assert_eq!(volatility_index_bps(&flat), U256::zero());

        // std dev 100 on a mean of 1000 = 1000 bps
        let samples = [900u64, 1_100].map(U256::from);
        assert_eq!(volatility_index_bps(&samples), U256::from(1_000u64));
    }

    proptest! {
        #[test]
        fn isqrt_is_floor_root(x in any::<u128>()) {
            let x = U256::from(x);
            let r = isqrt(x);
            prop_assert!(r * r <= x);
            let next = r + U256::one();
            prop_assert!(next * next > x);
        }
    }
}
