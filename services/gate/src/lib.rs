//! # On-Chain Fee Gate
//!
//! Deterministic model of the hook contract that sits in a pool's swap path.
//!
//! ## Callbacks
//!
//! - **before_swap**: decode the optional [`HookPayload`], authorize the agent (allow-list,
//!   then [`AgentRegistry`]), verify attestations, clamp, commit the fee with the
//!   [`LP_FEE_OVERRIDE_FLAG`] set
//! - **after_swap**: append the pool price to the 10-slot history, recompute the integer
//!   volatility index, emit `MarketHealth`, flush captured MEV past the threshold
//! - **before_add_liquidity**: pass-through
//!
//! Everything uses `U256` integer arithmetic, matching what the contract can compute.
//! Unauthorized or unverifiable instructions never revert a swap; they fall back to
//! [`types::DEFAULT_FEE`]. Only malformed payloads return an error.

pub mod error;
pub mod events;
pub mod hook;
pub mod payload;
pub mod registry;
pub mod state;

pub use error::{GateError, RegistryError, Result};
pub use events::HookEvent;
pub use hook::{
    AfterSwapResult, BeforeSwapResult, FeeHook, FeeSource, GateConfig, PoolManager, SwapContext,
    LP_FEE_OVERRIDE_FLAG, MEV_CAPTURE_THRESHOLD_WEI,
};
pub use payload::{decode_attestation, encode_attestation, legacy_digest, HookPayload};
pub use registry::{
    AgentIdentity, AgentRegistry, SharedRegistry, INITIAL_REPUTATION, MIN_AUTHORIZED_REPUTATION,
};
pub use state::{PendingInstruction, PoolFeeState, PriceHistory, PRICE_HISTORY_LEN};
