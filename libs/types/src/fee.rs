//! Fee units and hard bounds
//!
//! Fees are integers in basis points. The gate and the policy engine both clamp into
//! [`FeeBounds`]; neither trusts the other to have done it.

use serde::{Deserialize, Serialize};

use crate::errors::{Result, TypesError};

/// Lowest fee the gate will ever commit
pub const MIN_FEE: u32 = 500;

/// Highest fee the gate will ever commit
pub const MAX_FEE: u32 = 10_000;

/// Fee used when no (acceptable) instruction accompanies a swap
pub const DEFAULT_FEE: u32 = 3_000;

/// Closed interval `[min, max]` of admissible fees in basis points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBounds {
    pub min: u32,
    pub max: u32,
}

impl FeeBounds {
    pub fn new(min: u32, max: u32) -> Result<Self> {
        if min > max {
            return Err(TypesError::InvalidBounds { min, max });
        }
        Ok(Self { min, max })
    }

    /// Force `fee` into the interval. Idempotent.
    pub fn clamp(&self, fee: u32) -> u32 {
        fee.clamp(self.min, self.max)
    }

    pub fn contains(&self, fee: u32) -> bool {
        (self.min..=self.max).contains(&fee)
    }
}

impl Default for FeeBounds {
    fn default() -> Self {
        Self {
            min: MIN_FEE,
            max: MAX_FEE,
        }
    }
}
