//! ECDSA helpers shared by signers and verifiers
//!
//! Digests are signed as EIP-191 personal messages, matching
//! `ECDSA.recover(MessageHashUtils.toEthSignedMessageHash(digest), sig)` on-chain.

use ethers::signers::LocalWallet;
use ethers::types::Signature;
use ethers::utils::hash_message;

use crate::errors::{Result, TypesError};
use crate::{Address, Bytes, H256};

/// Sign a 32-byte digest, returning the 65-byte `r || s || v` encoding
pub fn sign_digest(wallet: &LocalWallet, digest: H256) -> Result<Bytes> {
    let signature = wallet
        .sign_hash(hash_message(digest.as_bytes()))
        .map_err(|e| TypesError::Signing {
            message: e.to_string(),
        })?;
    Ok(Bytes::from(signature.to_vec()))
}

/// Recover the signer of `digest`. `None` for malformed or unrecoverable signatures.
pub fn recover_signer(digest: H256, signature: &[u8]) -> Option<Address> {
    let signature = Signature::try_from(signature).ok()?;
    signature.recover(digest.as_bytes().to_vec()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::signers::Signer;

    const TEST_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_sign_then_recover() {
        let wallet: LocalWallet = TEST_KEY.parse().unwrap();
        let digest = H256::repeat_byte(0x42);

        let signature = sign_digest(&wallet, digest).unwrap();
        assert_eq!(signature.len(), 65);
        assert_eq!(recover_signer(digest, &signature), Some(wallet.address()));

        // Different digest recovers a different address
        assert_ne!(
            recover_signer(H256::repeat_byte(0x43), &signature),
            Some(wallet.address())
        );
    }

    #[test]
    fn test_malformed_signature() {
        assert_eq!(recover_signer(H256::zero(), &[0u8; 12]), None);
    }
}
