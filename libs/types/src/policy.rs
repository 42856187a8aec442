//! Policy engine verdicts

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which rule determined the final fee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// Confidence below the gate; nothing changes
    LowConfidence,
    /// Attached attestation failed verification; nothing changes
    AttestationRejected,
    /// Recommendation accepted as-is
    Approved,
    /// Change limited to the maximum step
    RateLimited,
    /// Spread beyond the emergency threshold forced the maximum fee
    EmergencySpread,
    /// Decrease accepted under low volatility
    LowVolatilityReduction,
    /// Result forced into the hard bounds
    ClampedToBounds,
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::LowConfidence => "rejected: confidence below threshold",
            Self::AttestationRejected => "rejected: attestation failed verification",
            Self::Approved => "approved",
            Self::RateLimited => "approved: change rate limited",
            Self::EmergencySpread => "approved: emergency spread override",
            Self::LowVolatilityReduction => "approved: fee reduction under low volatility",
            Self::ClampedToBounds => "approved: clamped to fee bounds",
        };
        f.write_str(text)
    }
}

/// Outcome of one `decide` call. Ephemeral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDecision {
    pub approved: bool,
    pub approved_fee: u32,
    pub reason: DecisionReason,
}

impl PolicyDecision {
    pub fn rejected(last_fee: u32, reason: DecisionReason) -> Self {
        Self {
            approved: false,
            approved_fee: last_fee,
            reason,
        }
    }

    pub fn approved(fee: u32, reason: DecisionReason) -> Self {
        Self {
            approved: true,
            approved_fee: fee,
            reason,
        }
    }
}
