//! Error types for the fee controller

use thiserror::Error;
use types::TypesError;

/// External data acquisition failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error("Request timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP status {status}")]
    Http { status: u16 },

    #[error("Unparseable response: {0}")]
    Parse(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl FeedError {
    /// Worth another attempt
    pub fn is_transient(&self) -> bool {
        match self {
            FeedError::Timeout { .. } | FeedError::Transport(_) | FeedError::Rpc(_) => true,
            FeedError::Http { status } => *status >= 500 || *status == 429,
            FeedError::Parse(_) | FeedError::Configuration(_) => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum AttestationError {
    #[error("Provider {provider} cannot execute {computation}")]
    UnsupportedComputation {
        provider: &'static str,
        computation: &'static str,
    },

    #[error("Computation failed: {message}")]
    Computation { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Signing error: {0}")]
    Signing(#[from] TypesError),

    #[error("Recommendation carries no attestations")]
    Missing,

    #[error("{provider} attestation failed verification")]
    Rejected { provider: &'static str },

    #[error("{provider} attestation does not cover this result")]
    HashMismatch { provider: &'static str },
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Signing error: {0}")]
    Signing(#[from] TypesError),

    #[error("Instruction sink closed")]
    SinkClosed,
}

pub type Result<T> = std::result::Result<T, ControllerError>;
