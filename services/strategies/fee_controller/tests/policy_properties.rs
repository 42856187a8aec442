//! Property-based tests for policy engine invariants

use fee_controller::{AttestedRecommendation, PolicyEngine};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;
use types::{DecisionReason, ManualClock, PoolId, Recommendation};
use vigil_config::PolicyConfig;

const AGENT_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

fn engine(config: PolicyConfig) -> PolicyEngine {
    PolicyEngine::new(
        config,
        AGENT_KEY.parse().unwrap(),
        PoolId([3; 32]),
        Arc::new(ManualClock::new(1_000)),
        None,
    )
}

fn unattested_config() -> PolicyConfig {
    PolicyConfig {
        require_attestation: false,
        ..Default::default()
    }
}

/// Decimal in `[0, 1)` with four places
fn ratio() -> impl Strategy<Value = Decimal> {
    (0u32..10_000).prop_map(|n| Decimal::new(n as i64, 4))
}

prop_compose! {
    fn recommendation()(
        fee in 0u32..20_000,
        volatility in ratio(),
        spread in (0u32..500).prop_map(|n| Decimal::new(n as i64, 4)),
        confidence in ratio(),
    ) -> Recommendation {
        Recommendation {
            recommended_fee: fee,
            volatility,
            spread,
            liquidity_depth: 1_000_000,
            confidence,
            timestamp: 1_000,
        }
    }
}

proptest! {
    #[test]
    fn approved_fees_stay_in_bounds(recs in prop::collection::vec(recommendation(), 1..20)) {
        let config = unattested_config();
        let bounds = config.bounds();
        let mut engine = engine(config);

        for rec in recs {
            let outcome = engine.process(&AttestedRecommendation::unattested(rec)).unwrap();
            prop_assert!(bounds.contains(outcome.decision.approved_fee));
            prop_assert!(bounds.contains(engine.last_fee()));
        }
    }

    #[test]
    fn step_limited_unless_emergency(rec in recommendation()) {
        let config = unattested_config();
        let step = config.max_fee_step_bps;
        let emergency = config.emergency_spread;
        let max = config.max_fee_bps;
        let min_confidence = config.min_confidence;
        let engine = engine(config);
        let last = engine.last_fee();

        let decision = engine.decide(&rec);
        if rec.confidence < min_confidence {
            prop_assert!(!decision.approved);
            prop_assert_eq!(decision.reason, DecisionReason::LowConfidence);
            prop_assert_eq!(decision.approved_fee, last);
        } else if rec.spread > emergency {
            prop_assert!(decision.approved);
            prop_assert_eq!(decision.approved_fee, max);
            prop_assert_eq!(decision.reason, DecisionReason::EmergencySpread);
        } else {
            prop_assert!(decision.approved);
            prop_assert!(decision.approved_fee.abs_diff(last) <= step);
        }
    }

    #[test]
    fn consecutive_approvals_step_limited(recs in prop::collection::vec(recommendation(), 1..40)) {
        let config = unattested_config();
        let step = config.max_fee_step_bps;
        let mut engine = engine(config);
        let mut previous = engine.last_fee();

        for rec in recs {
            let outcome = engine.process(&AttestedRecommendation::unattested(rec)).unwrap();
            if !outcome.decision.approved {
                prop_assert_eq!(engine.last_fee(), previous);
                continue;
            }
            let fee = outcome.decision.approved_fee;
            if outcome.decision.reason != DecisionReason::EmergencySpread {
                prop_assert!(
                    fee.abs_diff(previous) <= step,
                    "{} -> {} exceeds step {} ({})",
                    previous,
                    fee,
                    step,
                    outcome.decision.reason
                );
            }
            previous = fee;
        }
    }

    #[test]
    fn nonce_advances_only_on_approval(recs in prop::collection::vec(recommendation(), 1..20)) {
        let mut engine = engine(unattested_config());
        let mut expected_nonce = 0;

        for rec in recs {
            let before_fee = engine.last_fee();
            let outcome = engine.process(&AttestedRecommendation::unattested(rec)).unwrap();
            if outcome.decision.approved {
                expected_nonce += 1;
                let instruction = outcome.instruction.unwrap();
                prop_assert_eq!(instruction.nonce, expected_nonce);
                prop_assert_eq!(instruction.fee, outcome.decision.approved_fee);
                prop_assert_eq!(engine.last_fee(), instruction.fee);
            } else {
                prop_assert!(outcome.instruction.is_none());
                prop_assert_eq!(engine.last_fee(), before_fee);
            }
            prop_assert_eq!(engine.nonce(), expected_nonce);
        }
    }

    #[test]
    fn missing_attestation_never_signs(rec in recommendation()) {
        let mut engine = engine(PolicyConfig::default());
        let outcome = engine.process(&AttestedRecommendation::unattested(rec)).unwrap();

        prop_assert!(!outcome.decision.approved);
        prop_assert_eq!(outcome.decision.reason, DecisionReason::AttestationRejected);
        prop_assert!(outcome.instruction.is_none());
        prop_assert_eq!(engine.nonce(), 0);
    }
}
