//! Property-based tests for gate invariants

use amm::PoolSlot;
use ethers::signers::{LocalWallet, Signer};
use gate::*;
use proptest::prelude::*;
use types::{sign_digest, Address, PoolId, MAX_FEE, MIN_FEE, U256};

const AGENT_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

struct PriceSequence(U256);

impl PoolManager for PriceSequence {
    fn pool_slot(&self, _pool_id: &PoolId) -> PoolSlot {
        PoolSlot {
            sqrt_price_x96: self.0,
            ..Default::default()
        }
    }
}

fn ctx(block: u64) -> SwapContext {
    SwapContext {
        pool_id: PoolId([9; 32]),
        sender: Address::zero(),
        block_number: block,
        timestamp: block,
    }
}

proptest! {
    #[test]
    fn authorization_is_active_and_reputable(
        reputation in 0u64..200,
        active in any::<bool>(),
    ) {
        let owner = Address::repeat_byte(0xAA);
        let agent = Address::repeat_byte(0x01);
        let mut registry = AgentRegistry::new(owner);
        registry.register_agent(owner, agent, "a", "", 0).unwrap();
        registry.update_reputation(owner, agent, reputation).unwrap();
        if !active {
            registry.deactivate_agent(owner, agent).unwrap();
        }

        prop_assert_eq!(
            registry.is_authorized(agent),
            active && reputation >= MIN_AUTHORIZED_REPUTATION
        );
    }

    #[test]
    fn history_index_tracks_callback_count(
        prices in prop::collection::vec(1u128..u64::MAX as u128, 0..40),
    ) {
        let owner = Address::repeat_byte(0xAA);
        let mut hook = FeeHook::new(owner, AgentRegistry::shared(owner), GateConfig::default());
        for (i, p) in prices.iter().enumerate() {
            hook.after_swap(&ctx(i as u64), &PriceSequence(U256::from(*p) << 96));
        }

        let n = prices.len();
        match hook.pool_state(&ctx(0).pool_id) {
            None => prop_assert_eq!(n, 0),
            Some(state) => {
                prop_assert_eq!(state.price_history.index(), n % PRICE_HISTORY_LEN);
                // Q96 price of sqrt = p << 96 is p² << 96
                let expected: Vec<U256> = prices[n.saturating_sub(PRICE_HISTORY_LEN)..]
                    .iter()
                    .map(|p| (U256::from(*p) * U256::from(*p)) << 96)
                    .collect();
                prop_assert_eq!(state.price_history.chronological(), expected);
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn committed_fee_always_within_bounds(fee in 0u32..=0x00FF_FFFF) {
        let owner = Address::repeat_byte(0xAA);
        let wallet: LocalWallet = AGENT_KEY.parse().unwrap();
        let registry = AgentRegistry::shared(owner);
        registry.write().register_agent(owner, wallet.address(), "a", "", 0).unwrap();
        let mut hook = FeeHook::new(owner, registry, GateConfig::default());

        let payload = HookPayload::Legacy {
            fee,
            agent: wallet.address(),
            signature: sign_digest(&wallet, legacy_digest(fee, &ctx(1).pool_id)).unwrap(),
        };
        let result = hook.before_swap(&ctx(1), &payload.encode()).unwrap();

        prop_assert!((MIN_FEE..=MAX_FEE).contains(&result.fee));
        prop_assert_eq!(result.fee, fee.clamp(MIN_FEE, MAX_FEE));
        prop_assert_eq!(result.lp_fee_override() & !LP_FEE_OVERRIDE_FLAG, result.fee);
    }
}
