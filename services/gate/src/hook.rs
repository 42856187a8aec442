//! Swap-path callbacks
//!
//! Each callback runs inside the swap's transaction. Only a structurally invalid payload
//! aborts it ([`GateError::MalformedPayload`]); unauthorized agents and failed attestations
//! fall back to the default fee, and every accepted fee is clamped to the hard bounds no
//! matter what upstream already did.
//!
//! Signed policy instructions arrive outside the swap path through
//! [`FeeHook::accept_signed_instruction`]. The accepted fee waits as the pool's pending
//! instruction and is applied by the next swap on that pool that carries no hook data.

use amm::{volatility_index_bps, PoolSlot, V3Math};
use ethers::utils::keccak256;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, trace, warn};
use types::{
    Address, FeeBounds, PoolId, ReplayGuard, ReplayGuardConfig, SignedInstruction, DEFAULT_FEE,
    H256, U256,
};

use crate::error::{GateError, Result};
use crate::events::HookEvent;
use crate::payload::{legacy_digest, HookPayload};
use crate::registry::SharedRegistry;
use crate::state::{PendingInstruction, PoolFeeState};

/// Uniswap v4 flag marking a returned LP fee as a per-swap override
pub const LP_FEE_OVERRIDE_FLAG: u32 = 0x40_0000;

/// 0.1 ether in wei
pub const MEV_CAPTURE_THRESHOLD_WEI: u128 = 100_000_000_000_000_000;

#[derive(Debug, Clone)]
pub struct GateConfig {
    pub bounds: FeeBounds,
    pub default_fee: u32,
    pub mev_threshold: U256,
    pub replay: ReplayGuardConfig,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            bounds: FeeBounds::default(),
            default_fee: DEFAULT_FEE,
            mev_threshold: U256::from(MEV_CAPTURE_THRESHOLD_WEI),
            replay: ReplayGuardConfig::default(),
        }
    }
}

/// Transaction context passed to every callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapContext {
    pub pool_id: PoolId,
    pub sender: Address,
    pub block_number: u64,
    pub timestamp: u64,
}

/// Read access to pool state after a swap settles
pub trait PoolManager {
    fn pool_slot(&self, pool_id: &PoolId) -> PoolSlot;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeSource {
    Default,
    Agent(Address),
    Attested(Address),
    /// Pending signed instruction from this agent
    Instruction(Address),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeforeSwapResult {
    /// Committed fee, always within bounds
    pub fee: u32,
    pub source: FeeSource,
    pub top_of_block: bool,
}

impl BeforeSwapResult {
    /// Value handed back to the pool manager
    pub fn lp_fee_override(&self) -> u32 {
        self.fee | LP_FEE_OVERRIDE_FLAG
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AfterSwapResult {
    pub volatility_index: U256,
    pub mev_captured: Option<U256>,
}

pub struct FeeHook {
    owner: Address,
    config: GateConfig,
    registry: SharedRegistry,
    /// O(1) allow-list consulted before the registry
    pre_authorized: HashSet<Address>,
    pools: HashMap<PoolId, PoolFeeState>,
    attestations: ReplayGuard,
    events: Vec<HookEvent>,
}

impl FeeHook {
    pub fn new(owner: Address, registry: SharedRegistry, mut config: GateConfig) -> Self {
        config.default_fee = config.bounds.clamp(config.default_fee);
        let attestations = ReplayGuard::new(config.replay);
        Self {
            owner,
            config,
            registry,
            pre_authorized: HashSet::new(),
            pools: HashMap::new(),
            attestations,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn set_pre_authorized(&mut self, caller: Address, agent: Address, allowed: bool) -> Result<()> {
        if caller != self.owner {
            return Err(GateError::NotOwner { caller });
        }
        if allowed {
            self.pre_authorized.insert(agent);
        } else {
            self.pre_authorized.remove(&agent);
        }
        Ok(())
    }

    /// Allow-list first, registry second
    pub fn is_agent_allowed(&self, agent: Address) -> bool {
        self.pre_authorized.contains(&agent) || self.registry.read().is_authorized(agent)
    }

    pub fn pool_state(&self, pool_id: &PoolId) -> Option<&PoolFeeState> {
        self.pools.get(pool_id)
    }

    pub fn events(&self) -> &[HookEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<HookEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn before_swap(&mut self, ctx: &SwapContext, hook_data: &[u8]) -> Result<BeforeSwapResult> {
        let payload = HookPayload::decode(hook_data)?;

        let state = self.pools.entry(ctx.pool_id).or_default();
        let top_of_block = state.mark_block(ctx.block_number);
        if top_of_block {
            // Reserved for block-level fee auctions
            trace!(pool = %ctx.pool_id, block = ctx.block_number, "Top of block");
        }
        let pending = if matches!(payload, HookPayload::None) {
            state.pending_instruction.take()
        } else {
            None
        };

        let (requested, source) = match &payload {
            HookPayload::None => match pending {
                Some(pending) => {
                    debug!(
                        agent = ?pending.agent,
                        nonce = pending.nonce,
                        fee = pending.fee,
                        "Applying signed instruction"
                    );
                    (pending.fee, FeeSource::Instruction(pending.agent))
                }
                None => (self.config.default_fee, FeeSource::Default),
            },
            HookPayload::Legacy {
                fee,
                agent,
                signature,
            } => {
                let digest = legacy_digest(*fee, &ctx.pool_id);
                if self.is_agent_allowed(*agent)
                    && self.registry.read().verify_signature(*agent, digest, signature)
                {
                    (*fee, FeeSource::Agent(*agent))
                } else {
                    warn!(agent = ?agent, pool = %ctx.pool_id, "Unauthorized instruction, using default fee");
                    (self.config.default_fee, FeeSource::Default)
                }
            }
            HookPayload::Attested { fee, attestation } => {
                let agent = attestation.agent_identity;
                if !self.is_agent_allowed(agent) {
                    warn!(agent = ?agent, pool = %ctx.pool_id, "Unauthorized attestation, using default fee");
                    (self.config.default_fee, FeeSource::Default)
                } else {
                    match self.attestations.verify(attestation, ctx.timestamp) {
                        Ok(()) => (*fee, FeeSource::Attested(agent)),
                        Err(rejection) => {
                            warn!(agent = ?agent, %rejection, "Attestation rejected, using default fee");
                            (self.config.default_fee, FeeSource::Default)
                        }
                    }
                }
            }
        };

        let fee = self.config.bounds.clamp(requested);
        if fee != requested {
            debug!(requested, fee, "Fee clamped to bounds");
        }

        if let FeeSource::Agent(agent) | FeeSource::Attested(agent) = source {
            self.events.push(HookEvent::AgentInstruction {
                agent,
                instruction_hash: H256(keccak256(hook_data)),
                fee,
                timestamp: ctx.timestamp,
            });
        }

        Ok(BeforeSwapResult {
            fee,
            source,
            top_of_block,
        })
    }

    pub fn after_swap(&mut self, ctx: &SwapContext, pool_manager: &dyn PoolManager) -> AfterSwapResult {
        let slot = pool_manager.pool_slot(&ctx.pool_id);
        let price = V3Math::price_x96(slot.sqrt_price_x96);

        let state = self.pools.entry(ctx.pool_id).or_default();
        state.price_history.push(price);
        let volatility_index = volatility_index_bps(state.price_history.samples());

        self.events.push(HookEvent::MarketHealth {
            pool_id: ctx.pool_id,
            volatility_index,
            liquidity_depth: slot.liquidity,
            imbalance_ratio: U256::zero(),
            timestamp: ctx.timestamp,
        });

        // Redistribution is not implemented; the accumulator is only reported and reset
        let mev_captured = if state.captured_mev >= self.config.mev_threshold {
            let amount = std::mem::take(&mut state.captured_mev);
            info!(pool = %ctx.pool_id, %amount, "MEV captured");
            self.events.push(HookEvent::MevCaptured {
                pool_id: ctx.pool_id,
                amount,
                capturer: ctx.sender,
            });
            Some(amount)
        } else {
            None
        };

        AfterSwapResult {
            volatility_index,
            mev_captured,
        }
    }

    pub fn accrue_mev(&mut self, pool_id: PoolId, amount: U256) {
        let state = self.pools.entry(pool_id).or_default();
        state.captured_mev = state.captured_mev.saturating_add(amount);
    }

    /// Pass-through; reserved for agent-driven range placement
    pub fn before_add_liquidity(&mut self, ctx: &SwapContext) -> Result<()> {
        trace!(pool = %ctx.pool_id, sender = ?ctx.sender, "beforeAddLiquidity");
        Ok(())
    }

    /// Consume a policy-engine instruction for `pool_id` through the registry.
    ///
    /// The clamped fee becomes the pool's pending instruction, replacing any earlier one.
    pub fn accept_signed_instruction(
        &mut self,
        pool_id: PoolId,
        instruction: &SignedInstruction,
        now: u64,
    ) -> Result<u32> {
        self.registry
            .write()
            .consume_instruction(pool_id, instruction, now)?;

        let fee = self.config.bounds.clamp(instruction.fee);
        self.pools.entry(pool_id).or_default().pending_instruction = Some(PendingInstruction {
            agent: instruction.signer,
            fee,
            nonce: instruction.nonce,
        });
        self.events.push(HookEvent::AgentInstruction {
            agent: instruction.signer,
            instruction_hash: instruction.digest(),
            fee,
            timestamp: now,
        });
        info!(
            agent = ?instruction.signer,
            pool = %pool_id,
            nonce = instruction.nonce,
            fee,
            "Signed instruction accepted"
        );
        Ok(fee)
    }
}
