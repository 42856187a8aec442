//! # Vigil AMM Library - Deterministic Pool Mathematics
//!
//! ## Purpose
//!
//! Mathematical foundation shared by the off-chain fee controller and the on-chain gate.
//! Off-chain statistics run on `Decimal` (no floating point in any value that feeds a fee
//! decision); on-chain statistics run on `U256` integers only, because the gate's execution
//! environment has no native fractional arithmetic.
//!
//! ## Integration Points
//!
//! - **Market Estimator**: fractional returns, population volatility, relative spread
//! - **On-Chain Gate**: Babylonian integer square root, population-variance volatility index
//! - **Pool State Readers**: sqrtPriceX96 → human price and → Q96 integer price
//!
//! ## Architecture Role
//!
//! ```text
//! Pool Slot0 (sqrtPriceX96) → [v3_math] → Decimal price → [stats] → volatility / spread
//!                                 ↓
//!                          Q96 integer price → [int_math] → volatility index (bps)
//! ```

pub mod int_math;
pub mod stats;
pub mod v3_math;

pub use int_math::{isqrt, population_variance, volatility_index_bps};
pub use stats::{decimal_sqrt, fractional_returns, population_std_dev, relative_spread};
pub use v3_math::{PoolSlot, V3Math, Q96};

/// Common types for AMM calculations
pub use ethereum_types::{U256, U512};
pub use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;
