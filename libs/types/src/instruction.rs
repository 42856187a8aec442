//! Signed, replay-protected fee instructions
//!
//! The signed message is `keccak256(abi.encode(uint24 fee, bytes32 poolId, uint256 nonce,
//! uint256 deadline))`, signed as a personal message by the policy engine's key. Nonces are
//! strictly increasing per signer; the gate refuses anything at or below the last one seen.

use ethers::abi::{encode, Token};
use ethers::signers::{LocalWallet, Signer};
use ethers::utils::keccak256;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::identifiers::PoolId;
use crate::signing::{recover_signer, sign_digest};
use crate::{Address, Bytes, H256, U256};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedInstruction {
    pub fee: u32,
    pub pool_id: PoolId,
    pub nonce: u64,
    pub deadline: u64,
    pub signature: Bytes,
    pub signer: Address,
}

/// Digest covered by an instruction signature
pub fn instruction_digest(fee: u32, pool_id: &PoolId, nonce: u64, deadline: u64) -> H256 {
    let encoded = encode(&[
        Token::Uint(U256::from(fee)),
        Token::FixedBytes(pool_id.as_bytes().to_vec()),
        Token::Uint(U256::from(nonce)),
        Token::Uint(U256::from(deadline)),
    ]);
    H256(keccak256(encoded))
}

impl SignedInstruction {
    pub fn sign(
        wallet: &LocalWallet,
        fee: u32,
        pool_id: PoolId,
        nonce: u64,
        deadline: u64,
    ) -> Result<Self> {
        let digest = instruction_digest(fee, &pool_id, nonce, deadline);
        let signature = sign_digest(wallet, digest)?;
        Ok(Self {
            fee,
            pool_id,
            nonce,
            deadline,
            signature,
            signer: wallet.address(),
        })
    }

    pub fn digest(&self) -> H256 {
        instruction_digest(self.fee, &self.pool_id, self.nonce, self.deadline)
    }

    /// True when the signature recovers to the declared signer
    pub fn has_valid_signature(&self) -> bool {
        recover_signer(self.digest(), &self.signature) == Some(self.signer)
    }

    pub fn is_expired(&self, now: u64) -> bool {
        now > self.deadline
    }
}
