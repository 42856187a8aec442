//! Hook payload codec
//!
//! Pre-swap hook data is a tagged union selected by its first byte:
//!
//! | tag    | body                                                                   |
//! |--------|------------------------------------------------------------------------|
//! | (none) | empty hook data, default fee                                           |
//! | `0x01` | `abi.encode(uint24 fee, address agent, bytes signature)`               |
//! | `0x02` | `abi.encode(uint24 fee, bytes attestation)`                            |
//!
//! The attestation bytes decode further to
//! `abi.encode(address agentId, uint256 timestamp, bytes32 resultHash, bytes signature)`.
//! Anything else is structurally invalid and reverts the swap.

use ethers::abi::{decode, encode, ParamType, Token};
use ethers::utils::keccak256;
use types::{Address, AttestationBundle, Bytes, PoolId, H256, U256};

use crate::error::{GateError, Result};

pub const TAG_LEGACY: u8 = 0x01;
pub const TAG_ATTESTED: u8 = 0x02;

/// Largest value a `uint24` can hold
pub const MAX_UINT24: u32 = 0x00FF_FFFF;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookPayload {
    None,
    Legacy {
        fee: u32,
        agent: Address,
        signature: Bytes,
    },
    Attested {
        fee: u32,
        attestation: AttestationBundle,
    },
}

/// Digest an agent signs for a legacy instruction
pub fn legacy_digest(fee: u32, pool_id: &PoolId) -> H256 {
    H256(keccak256(encode(&[
        Token::Uint(U256::from(fee)),
        Token::FixedBytes(pool_id.as_bytes().to_vec()),
    ])))
}

impl HookPayload {
    pub fn decode(hook_data: &[u8]) -> Result<Self> {
        let Some((&tag, body)) = hook_data.split_first() else {
            return Ok(HookPayload::None);
        };

        match tag {
            TAG_LEGACY => {
                let tokens = decode(
                    &[ParamType::Uint(24), ParamType::Address, ParamType::Bytes],
                    body,
                )
                .map_err(|e| GateError::malformed(format!("legacy instruction: {}", e)))?;
                let mut tokens = tokens.into_iter();
                let fee = take_fee(tokens.next())?;
                let agent = take_address(tokens.next())?;
                let signature = take_bytes(tokens.next())?;
                Ok(HookPayload::Legacy {
                    fee,
                    agent,
                    signature: Bytes::from(signature),
                })
            }
            TAG_ATTESTED => {
                let tokens = decode(&[ParamType::Uint(24), ParamType::Bytes], body)
                    .map_err(|e| GateError::malformed(format!("attested instruction: {}", e)))?;
                let mut tokens = tokens.into_iter();
                let fee = take_fee(tokens.next())?;
                let attestation = decode_attestation(&take_bytes(tokens.next())?)?;
                Ok(HookPayload::Attested { fee, attestation })
            }
            other => Err(GateError::malformed(format!(
                "unknown payload tag 0x{:02x}",
                other
            ))),
        }
    }

    /// Hook data bytes for this payload, the exact inverse of [`HookPayload::decode`]
    pub fn encode(&self) -> Vec<u8> {
        match self {
            HookPayload::None => Vec::new(),
            HookPayload::Legacy {
                fee,
                agent,
                signature,
            } => {
                let mut out = vec![TAG_LEGACY];
                out.extend(encode(&[
                    Token::Uint(U256::from(*fee)),
                    Token::Address(*agent),
                    Token::Bytes(signature.to_vec()),
                ]));
                out
            }
            HookPayload::Attested { fee, attestation } => {
                let mut out = vec![TAG_ATTESTED];
                out.extend(encode(&[
                    Token::Uint(U256::from(*fee)),
                    Token::Bytes(encode_attestation(attestation)),
                ]));
                out
            }
        }
    }

    pub fn fee(&self) -> Option<u32> {
        match self {
            HookPayload::None => None,
            HookPayload::Legacy { fee, .. } | HookPayload::Attested { fee, .. } => Some(*fee),
        }
    }
}

pub fn encode_attestation(bundle: &AttestationBundle) -> Vec<u8> {
    encode(&[
        Token::Address(bundle.agent_identity),
        Token::Uint(U256::from(bundle.timestamp)),
        Token::FixedBytes(bundle.result_hash.as_bytes().to_vec()),
        Token::Bytes(bundle.signature.to_vec()),
    ])
}

pub fn decode_attestation(data: &[u8]) -> Result<AttestationBundle> {
    let tokens = decode(
        &[
            ParamType::Address,
            ParamType::Uint(256),
            ParamType::FixedBytes(32),
            ParamType::Bytes,
        ],
        data,
    )
    .map_err(|e| GateError::malformed(format!("attestation: {}", e)))?;

    let mut tokens = tokens.into_iter();
    let agent_identity = take_address(tokens.next())?;
    let timestamp = match tokens.next() {
        Some(Token::Uint(value)) if value <= U256::from(u64::MAX) => value.as_u64(),
        Some(Token::Uint(value)) => {
            return Err(GateError::malformed(format!(
                "attestation timestamp {} out of range",
                value
            )))
        }
        _ => return Err(GateError::malformed("attestation timestamp missing")),
    };
    let result_hash = match tokens.next() {
        Some(Token::FixedBytes(bytes)) if bytes.len() == 32 => H256::from_slice(&bytes),
        _ => return Err(GateError::malformed("attestation result hash missing")),
    };
    let signature = take_bytes(tokens.next())?;

    Ok(AttestationBundle {
        agent_identity,
        timestamp,
        result_hash,
        signature: Bytes::from(signature),
    })
}

fn take_fee(token: Option<Token>) -> Result<u32> {
    match token {
        // The decoder reads a full word; enforce the uint24 width ourselves
        Some(Token::Uint(value)) if value <= U256::from(MAX_UINT24) => Ok(value.as_u32()),
        Some(Token::Uint(value)) => Err(GateError::malformed(format!(
            "fee {} does not fit uint24",
            value
        ))),
        _ => Err(GateError::malformed("fee missing")),
    }
}

fn take_address(token: Option<Token>) -> Result<Address> {
    match token {
        Some(Token::Address(address)) => Ok(address),
        _ => Err(GateError::malformed("address missing")),
    }
}

fn take_bytes(token: Option<Token>) -> Result<Vec<u8>> {
    match token {
        Some(Token::Bytes(bytes)) => Ok(bytes),
        _ => Err(GateError::malformed("bytes missing")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_hook_data_is_none() {
        assert_eq!(HookPayload::decode(&[]).unwrap(), HookPayload::None);
        assert!(HookPayload::None.encode().is_empty());
    }

    #[test]
    fn test_legacy_layout_is_abi_tuple() {
        let payload = HookPayload::Legacy {
            fee: 4_000,
            agent: Address::repeat_byte(0x11),
            signature: Bytes::from(vec![0xAB; 65]),
        };
        let encoded = payload.encode();

        assert_eq!(encoded[0], TAG_LEGACY);
        // Head: fee word, address word, offset word (0x60)
        assert_eq!(U256::from_big_endian(&encoded[1..33]), U256::from(4_000u64));
        assert_eq!(&encoded[45..65], Address::repeat_byte(0x11).as_bytes());
        assert_eq!(U256::from_big_endian(&encoded[65..97]), U256::from(0x60u64));
        assert_eq!(HookPayload::decode(&encoded).unwrap(), payload);
    }

    #[test]
    fn test_oversized_fee_is_malformed() {
        let mut encoded = vec![TAG_LEGACY];
        encoded.extend(encode(&[
            Token::Uint(U256::from(MAX_UINT24) + U256::one()),
            Token::Address(Address::zero()),
            Token::Bytes(vec![]),
        ]));
        assert!(matches!(
            HookPayload::decode(&encoded),
            Err(GateError::MalformedPayload { .. })
        ));
    }

    #[test]
    fn test_unknown_tag_and_truncation_are_malformed() {
        assert!(HookPayload::decode(&[0x07, 0, 0]).is_err());
        assert!(HookPayload::decode(&[TAG_LEGACY, 0, 1, 2]).is_err());
        assert!(HookPayload::decode(&[TAG_ATTESTED]).is_err());
    }

    #[test]
    fn test_legacy_digest_binds_pool() {
        assert_ne!(
            legacy_digest(3_000, &PoolId([1; 32])),
            legacy_digest(3_000, &PoolId([2; 32]))
        );
    }
}
