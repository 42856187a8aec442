//! Error types for identifier parsing and signing

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TypesError {
    /// Hex string did not decode to the expected number of bytes
    #[error("Invalid {kind}: '{input}' - expected {expected_len} hex-encoded bytes")]
    InvalidHex {
        kind: &'static str,
        input: String,
        expected_len: usize,
    },

    /// Fee bounds where the minimum exceeds the maximum
    #[error("Invalid fee bounds: min {min} > max {max}")]
    InvalidBounds { min: u32, max: u32 },

    /// Local wallet refused to sign
    #[error("Signing failed: {message}")]
    Signing { message: String },
}

pub type Result<T> = std::result::Result<T, TypesError>;
