//! # Vigil Shared Types
//!
//! Domain model shared by the off-chain fee controller and the on-chain gate.
//!
//! ## Design Philosophy
//!
//! - **One definition per concept**: a `SignedInstruction` built by the policy engine is
//!   byte-for-byte the structure the gate verifies
//! - **Explicit units**: fees are `u32` basis points, timestamps are unix seconds,
//!   prices and ratios are `Decimal` off-chain and `U256` on-chain
//! - **Bit-exact digests**: instruction and attestation digests are keccak256 over
//!   ABI-encoded tuples, signed with the EIP-191 personal-message prefix
//! - **Injectable time**: everything that reads the clock takes a [`Clock`]
//!
//! ## Data Flow
//!
//! ```text
//! PriceObservation → MarketSnapshot → Recommendation → AttestationBundle
//!                                                            ↓
//!                     SignedInstruction ← PolicyDecision ← (verified)
//! ```

pub mod attestation;
pub mod clock;
pub mod errors;
pub mod fee;
pub mod identifiers;
pub mod instruction;
pub mod market;
pub mod policy;
pub mod signing;

pub use attestation::{
    attestation_digest, AttestationBundle, AttestationRejection, ReplayGuard, ReplayGuardConfig,
};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use errors::{Result, TypesError};
pub use fee::{FeeBounds, DEFAULT_FEE, MAX_FEE, MIN_FEE};
pub use identifiers::PoolId;
pub use instruction::{instruction_digest, SignedInstruction};
pub use market::{MarketSnapshot, PriceObservation, PriceSource, Recommendation};
pub use policy::{DecisionReason, PolicyDecision};
pub use signing::{recover_signer, sign_digest};

/// Re-exported so downstream crates agree on the EVM primitive types
pub use ethers::types::{Address, Bytes, H256, U256};
pub use rust_decimal::Decimal;
