//! Concentrated-liquidity price math
//!
//! Pools report price as `sqrtPriceX96 = sqrt(token1/token0) * 2^96`. Off-chain we need a
//! human price adjusted for token decimals; on-chain we need a Q96 integer price that fits
//! in `U256`. Both go through a 512-bit intermediate so no realistic price overflows.

use anyhow::{bail, Result};
use ethereum_types::{U256, U512};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lower sqrt price bound (v3/v4 TickMath)
pub const MIN_SQRT_RATIO: u128 = 4295128739;

/// 2^96
pub const Q96: u128 = 1u128 << 96;

/// Decimal places kept when converting to a human price
const PRICE_SCALE: u32 = 18;

/// Pool state as reported by the pool manager / state view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PoolSlot {
    pub sqrt_price_x96: U256,
    pub tick: i32,
    /// Protocol fee, pips
    pub protocol_fee: u32,
    /// LP fee, pips
    pub lp_fee: u32,
    pub liquidity: u128,
}

/// V3-style price conversions
pub struct V3Math;

impl V3Math {
    /// `sqrtPriceX96² / 2^96`, the pool price as a Q96 integer. Saturates at `U256::MAX`.
    pub fn price_x96(sqrt_price_x96: U256) -> U256 {
        let squared: U512 = sqrt_price_x96.full_mul(sqrt_price_x96) >> 96;
        u512_to_u256(squared).unwrap_or(U256::MAX)
    }

    /// Human price of token0 in token1, adjusted for token decimals
    pub fn sqrt_price_to_price(sqrt_price_x96: U256, decimals0: u8, decimals1: u8) -> Result<Decimal> {
        if sqrt_price_x96.is_zero() {
            bail!("Pool is not initialized (sqrtPriceX96 = 0)");
        }
        // sqrtPriceX96 is a uint160 on-chain
        if sqrt_price_x96.bits() > 160 {
            bail!("sqrtPriceX96 {} exceeds 160 bits", sqrt_price_x96);
        }
        if decimals0 > 38 || decimals1 > 38 {
            bail!("Unsupported token decimals: {} / {}", decimals0, decimals1);
        }

        // price = sqrtP² * 10^(scale + dec0) / (2^192 * 10^dec1)
        let numerator = sqrt_price_x96.full_mul(sqrt_price_x96)
            * U512::exp10(PRICE_SCALE as usize + decimals0 as usize);
        let denominator = (U512::one() << 192) * U512::exp10(decimals1 as usize);
        let scaled = numerator / denominator;

        // Decimal mantissa is 96 bits
        if scaled.bits() > 96 {
            bail!("Price out of Decimal range for sqrtPriceX96 {}", sqrt_price_x96);
        }
        let mantissa = scaled.low_u128() as i128;
        match Decimal::try_from_i128_with_scale(mantissa, PRICE_SCALE) {
            Ok(price) => Ok(price.normalize()),
            Err(e) => bail!("Price conversion failed: {}", e),
        }
    }

    /// Whether a sqrt price is inside the representable tick range
    pub fn is_valid_sqrt_price(sqrt_price_x96: U256) -> bool {
        sqrt_price_x96 >= U256::from(MIN_SQRT_RATIO)
    }
}

fn u512_to_u256(value: U512) -> Option<U256> {
    if value.bits() > 256 {
        return None;
    }
    let mut bytes = [0u8; 64];
    value.to_little_endian(&mut bytes);
    Some(U256::from_little_endian(&bytes[..32]))
}
