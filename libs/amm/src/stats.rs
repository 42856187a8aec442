//! Decimal statistics for the market estimator
//!
//! All values stay in `Decimal`; the square root uses Newton's method rather than a
//! round trip through `f64`.

use anyhow::{anyhow, bail, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Square root of a Decimal using Newton's method
pub fn decimal_sqrt(value: Decimal) -> Result<Decimal> {
    if value < dec!(0) {
        bail!("Cannot calculate square root of negative number");
    }
    if value == dec!(0) {
        return Ok(dec!(0));
    }

    // Start above the root so the iteration decreases monotonically
    let mut x = if value > dec!(1) { value } else { dec!(1) };
    let epsilon = dec!(0.000000000001);

    for _ in 0..128 {
        let next_x = (x + value / x) / dec!(2);
        if (x - next_x).abs() < epsilon {
            return Ok(next_x);
        }
        x = next_x;
    }

    // Best approximation if not fully converged
    Ok(x)
}

/// `(p[i] - p[i-1]) / p[i-1]` for each consecutive pair. Pairs with a zero base are skipped.
pub fn fractional_returns(prices: &[Decimal]) -> Result<Vec<Decimal>> {
    prices
        .windows(2)
        .filter(|w| !w[0].is_zero())
        .map(|w| {
            w[1].checked_sub(w[0])
                .and_then(|delta| delta.checked_div(w[0]))
                .ok_or_else(|| anyhow!("Return from {} to {} overflows", w[0], w[1]))
        })
        .collect()
}

/// Population standard deviation. Zero for an empty slice.
pub fn population_std_dev(values: &[Decimal]) -> Result<Decimal> {
    if values.is_empty() {
        return Ok(dec!(0));
    }

    let n = Decimal::from(values.len());
    let mut sum = dec!(0);
    for &x in values {
        sum = sum
            .checked_add(x)
            .ok_or_else(|| anyhow!("Sum overflows"))?;
    }
    let mean = sum / n;

    let mut squares = dec!(0);
    for &x in values {
        squares = x
            .checked_sub(mean)
            .and_then(|diff| diff.checked_mul(diff))
            .and_then(|sq| squares.checked_add(sq))
            .ok_or_else(|| anyhow!("Variance overflows at {}", x))?;
    }

    decimal_sqrt(squares / n)
}

/// `|a - reference| / reference`; zero when the reference is not positive
pub fn relative_spread(a: Decimal, reference: Decimal) -> Result<Decimal> {
    if reference <= dec!(0) {
        return Ok(dec!(0));
    }
    a.checked_sub(reference)
        .and_then(|delta| delta.abs().checked_div(reference))
        .ok_or_else(|| anyhow!("Spread of {} against {} overflows", a, reference))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqrt_accuracy() {
        assert_eq!(decimal_sqrt(dec!(0)).unwrap(), dec!(0));
        let root = decimal_sqrt(dec!(2)).unwrap();
        assert!((root - dec!(1.41421356237)).abs() < dec!(0.0000000001));
        let small = decimal_sqrt(dec!(0.0004)).unwrap();
        assert!((small - dec!(0.02)).abs() < dec!(0.0000000001));
        assert!(decimal_sqrt(dec!(-1)).is_err());
    }

    #[test]
    fn test_returns_and_volatility() {
        let prices = [dec!(100), dec!(110), dec!(99)];
        let returns = fractional_returns(&prices).unwrap();
        assert_eq!(returns, vec![dec!(0.1), dec!(-0.1)]);
        // Mean zero, both deviations 0.1
        let vol = population_std_dev(&returns).unwrap();
        assert!((vol - dec!(0.1)).abs() < dec!(0.0000000001));
    }

    #[test]
    fn test_single_return_has_zero_volatility() {
        let returns = fractional_returns(&[dec!(100), dec!(105)]).unwrap();
        assert_eq!(population_std_dev(&returns).unwrap(), dec!(0));
        assert_eq!(population_std_dev(&[]).unwrap(), dec!(0));
    }

    #[test]
    fn test_relative_spread() {
        assert_eq!(relative_spread(dec!(2020), dec!(2000)).unwrap(), dec!(0.01));
        assert_eq!(relative_spread(dec!(1980), dec!(2000)).unwrap(), dec!(0.01));
        assert_eq!(relative_spread(dec!(1980), dec!(0)).unwrap(), dec!(0));
    }

    #[test]
    fn test_extreme_prices_report_overflow() {
        let tiny = dec!(0.0000000000000000000001);
        let large = dec!(79000000000000);
        assert!(fractional_returns(&[tiny, large]).is_err());
        assert!(relative_spread(large, tiny).is_err());

        // Returns fit, squared deviations do not
        let returns = fractional_returns(&[dec!(0.000000000000001), dec!(2000), dec!(2000)]).unwrap();
        assert!(population_std_dev(&returns).is_err());

        let huge = Decimal::MAX / dec!(2);
        assert!(population_std_dev(&[dec!(0), huge]).is_err());
    }
}
