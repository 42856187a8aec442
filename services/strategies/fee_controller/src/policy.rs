//! Policy engine
//!
//! Rules run in a fixed order; later rules see the result of earlier ones:
//!
//! 1. confidence gate, reject below `min_confidence`
//! 2. change-rate limit of `max_fee_step_bps` against the last approved fee
//! 3. emergency override to the maximum fee when spread exceeds `emergency_spread`
//! 4. low-volatility decreases pass without further limiting
//! 5. clamp into the hard bounds
//!
//! `last_fee` and `nonce` only change after an instruction has been signed. The engine is
//! driven through `&mut self`, so a single owner processes recommendations one at a time.

use ethers::signers::{LocalWallet, Signer};
use tracing::{debug, info};
use types::{
    Address, DecisionReason, FeeBounds, PolicyDecision, PoolId, Recommendation, SharedClock,
    SignedInstruction,
};
use vigil_config::PolicyConfig;

use crate::attestation::{AttestedRecommendation, Attestor};
use crate::error::Result;
use std::sync::Arc;

/// Decision plus the instruction it produced, if approved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyOutcome {
    pub decision: PolicyDecision,
    pub instruction: Option<SignedInstruction>,
}

pub struct PolicyEngine {
    config: PolicyConfig,
    bounds: FeeBounds,
    wallet: LocalWallet,
    pool_id: PoolId,
    clock: SharedClock,
    verifier: Option<Arc<Attestor>>,
    last_fee: u32,
    /// Nonce of the last emitted instruction
    nonce: u64,
}

impl PolicyEngine {
    pub fn new(
        config: PolicyConfig,
        wallet: LocalWallet,
        pool_id: PoolId,
        clock: SharedClock,
        verifier: Option<Arc<Attestor>>,
    ) -> Self {
        let bounds = config.bounds();
        let last_fee = bounds.clamp(config.initial_fee_bps);
        Self {
            config,
            bounds,
            wallet,
            pool_id,
            clock,
            verifier,
            last_fee,
            nonce: 0,
        }
    }

    pub fn last_fee(&self) -> u32 {
        self.last_fee
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn signer(&self) -> Address {
        self.wallet.address()
    }

    /// Pure rule chain over the current baseline
    pub fn decide(&self, recommendation: &Recommendation) -> PolicyDecision {
        let last = self.last_fee;

        if recommendation.confidence < self.config.min_confidence {
            return PolicyDecision::rejected(last, DecisionReason::LowConfidence);
        }

        let mut fee = recommendation.recommended_fee;
        let mut reason = DecisionReason::Approved;

        let step = self.config.max_fee_step_bps;
        if fee > last.saturating_add(step) {
            fee = last.saturating_add(step);
            reason = DecisionReason::RateLimited;
        } else if fee < last.saturating_sub(step) {
            fee = last.saturating_sub(step);
            reason = DecisionReason::RateLimited;
        }

        if recommendation.spread > self.config.emergency_spread {
            fee = self.bounds.max;
            reason = DecisionReason::EmergencySpread;
        } else if recommendation.volatility < self.config.low_volatility && fee < last {
            // Decrease stands as limited above; no extra damping on the way down
            reason = DecisionReason::LowVolatilityReduction;
        }

        let clamped = self.bounds.clamp(fee);
        if clamped != fee && reason == DecisionReason::Approved {
            reason = DecisionReason::ClampedToBounds;
        }

        PolicyDecision::approved(clamped, reason)
    }

    /// Sign an instruction for `fee`. Advances the nonce only when signing succeeds.
    pub fn create_instruction(&mut self, fee: u32) -> Result<SignedInstruction> {
        let nonce = self.nonce + 1;
        let deadline = self.clock.now() + self.config.instruction_ttl_secs;
        let instruction = SignedInstruction::sign(&self.wallet, fee, self.pool_id, nonce, deadline)?;
        self.nonce = nonce;
        Ok(instruction)
    }

    /// Verify, decide and, when approved, sign. Rejections leave all state untouched.
    pub fn process(&mut self, input: &AttestedRecommendation) -> Result<PolicyOutcome> {
        if self.config.require_attestation {
            let verdict = match &self.verifier {
                Some(verifier) => verifier.verify(input),
                None => Err(crate::error::AttestationError::Missing),
            };
            if let Err(e) = verdict {
                info!(error = %e, "Recommendation attestation rejected");
                return Ok(PolicyOutcome {
                    decision: PolicyDecision::rejected(
                        self.last_fee,
                        DecisionReason::AttestationRejected,
                    ),
                    instruction: None,
                });
            }
        }

        let decision = self.decide(&input.recommendation);
        if !decision.approved {
            crate::log_policy!(
                "Recommendation {} bps declined ({}), confidence {}",
                input.recommendation.recommended_fee,
                decision.reason,
                input.recommendation.confidence
            );
            return Ok(PolicyOutcome {
                decision,
                instruction: None,
            });
        }

        let instruction = self.create_instruction(decision.approved_fee)?;
        debug!(
            from = self.last_fee,
            to = decision.approved_fee,
            reason = %decision.reason,
            nonce = instruction.nonce,
            "Fee approved"
        );
        self.last_fee = decision.approved_fee;

        Ok(PolicyOutcome {
            decision,
            instruction: Some(instruction),
        })
    }
}
