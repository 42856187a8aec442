//! Error types for the on-chain gate

use thiserror::Error;
use types::{Address, AttestationRejection, PoolId};

/// Registry state-machine failures. Owner-only actions and instruction consumption.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Caller {caller:?} is not the registry owner")]
    NotOwner { caller: Address },

    #[error("Agent {0:?} is already registered")]
    AlreadyRegistered(Address),

    #[error("Agent {0:?} is not registered")]
    UnknownAgent(Address),

    #[error("Agent {0:?} is not authorized")]
    NotAuthorized(Address),

    #[error("Instruction expired at {deadline}, now {now}")]
    Expired { deadline: u64, now: u64 },

    #[error("Nonce {nonce} is not above last consumed nonce {last}")]
    StaleNonce { nonce: u64, last: u64 },

    #[error("Instruction targets pool {instructed}, not {pool}")]
    PoolMismatch { instructed: PoolId, pool: PoolId },

    #[error("Instruction signature does not recover to {0:?}")]
    InvalidSignature(Address),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GateError {
    /// Structurally invalid hook data. Reverts the enclosing swap.
    #[error("Malformed hook payload: {reason}")]
    MalformedPayload { reason: String },

    #[error("Caller {caller:?} is not the hook owner")]
    NotOwner { caller: Address },

    #[error("Attestation rejected: {0}")]
    Attestation(#[from] AttestationRejection),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl GateError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GateError>;
