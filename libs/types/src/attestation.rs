//! Attestation bundles and replay protection
//!
//! An attestation binds a result hash to the identity that produced it at a point in
//! time. The signed message is `keccak256(abi.encode(address agentId, uint256 timestamp,
//! bytes32 resultHash))`.
//!
//! Verifiers keep a [`ReplayGuard`]: a bounded set of `(agent, timestamp)` pairs already
//! consumed. When the set reaches capacity the oldest `eviction` entries are dropped in
//! one batch. Anything older than the freshness window is refused outright, so evicted
//! entries past that age cannot be replayed either.

use ethers::abi::{encode, Token};
use ethers::signers::{LocalWallet, Signer};
use ethers::utils::keccak256;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use thiserror::Error;

use crate::errors::Result;
use crate::signing::{recover_signer, sign_digest};
use crate::{Address, Bytes, H256, U256};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationBundle {
    pub agent_identity: Address,
    pub timestamp: u64,
    pub result_hash: H256,
    pub signature: Bytes,
}

/// Digest covered by an attestation signature
pub fn attestation_digest(agent: Address, timestamp: u64, result_hash: H256) -> H256 {
    let encoded = encode(&[
        Token::Address(agent),
        Token::Uint(U256::from(timestamp)),
        Token::FixedBytes(result_hash.as_bytes().to_vec()),
    ]);
    H256(keccak256(encoded))
}

impl AttestationBundle {
    pub fn sign(wallet: &LocalWallet, timestamp: u64, result_hash: H256) -> Result<Self> {
        let agent_identity = wallet.address();
        let digest = attestation_digest(agent_identity, timestamp, result_hash);
        Ok(Self {
            agent_identity,
            timestamp,
            result_hash,
            signature: sign_digest(wallet, digest)?,
        })
    }

    pub fn digest(&self) -> H256 {
        attestation_digest(self.agent_identity, self.timestamp, self.result_hash)
    }

    pub fn recover_signer(&self) -> Option<Address> {
        recover_signer(self.digest(), &self.signature)
    }
}

/// Why a verifier refused a bundle
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AttestationRejection {
    #[error("attestation ({agent:?}, {timestamp}) already consumed")]
    Replayed { agent: Address, timestamp: u64 },

    #[error("attestation is {age}s old, freshness window is {window}s")]
    Stale { age: u64, window: u64 },

    #[error("attestation timestamp {timestamp} is ahead of verifier time {now}")]
    FromFuture { timestamp: u64, now: u64 },

    #[error("recovered signer {recovered:?} does not match declared identity {declared:?}")]
    SignerMismatch {
        declared: Address,
        recovered: Option<Address>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayGuardConfig {
    /// Entries held before a batch eviction
    pub capacity: usize,
    /// Oldest entries dropped per eviction
    pub eviction: usize,
    pub freshness_window_secs: u64,
}

impl Default for ReplayGuardConfig {
    fn default() -> Self {
        Self {
            capacity: 1_000,
            eviction: 100,
            freshness_window_secs: 300,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReplayGuard {
    config: ReplayGuardConfig,
    seen: HashSet<(Address, u64)>,
    order: VecDeque<(Address, u64)>,
}

impl ReplayGuard {
    pub fn new(config: ReplayGuardConfig) -> Self {
        Self {
            config,
            seen: HashSet::with_capacity(config.capacity),
            order: VecDeque::with_capacity(config.capacity),
        }
    }

    pub fn config(&self) -> &ReplayGuardConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn has_seen(&self, agent: Address, timestamp: u64) -> bool {
        self.seen.contains(&(agent, timestamp))
    }

    /// Replay and freshness checks only. Does not consume the slot.
    pub fn check(
        &self,
        agent: Address,
        timestamp: u64,
        now: u64,
    ) -> std::result::Result<(), AttestationRejection> {
        if self.has_seen(agent, timestamp) {
            return Err(AttestationRejection::Replayed { agent, timestamp });
        }
        if timestamp > now {
            return Err(AttestationRejection::FromFuture { timestamp, now });
        }
        let age = now - timestamp;
        if age > self.config.freshness_window_secs {
            return Err(AttestationRejection::Stale {
                age,
                window: self.config.freshness_window_secs,
            });
        }
        Ok(())
    }

    /// Consume the `(agent, timestamp)` slot
    pub fn record(&mut self, agent: Address, timestamp: u64) {
        if self.order.len() >= self.config.capacity {
            let evict = self.config.eviction.clamp(1, self.order.len());
            for key in self.order.drain(..evict) {
                self.seen.remove(&key);
            }
        }
        if self.seen.insert((agent, timestamp)) {
            self.order.push_back((agent, timestamp));
        }
    }

    /// Full verification: replay, freshness, signer. Consumes the slot exactly once on success.
    pub fn verify(
        &mut self,
        bundle: &AttestationBundle,
        now: u64,
    ) -> std::result::Result<(), AttestationRejection> {
        self.check(bundle.agent_identity, bundle.timestamp, now)?;

        let recovered = bundle.recover_signer();
        if recovered != Some(bundle.agent_identity) {
            return Err(AttestationRejection::SignerMismatch {
                declared: bundle.agent_identity,
                recovered,
            });
        }

        self.record(bundle.agent_identity, bundle.timestamp);
        Ok(())
    }
}

impl Default for ReplayGuard {
    fn default() -> Self {
        Self::new(ReplayGuardConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const OTHER_KEY: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

    fn bundle(timestamp: u64) -> AttestationBundle {
        let wallet: LocalWallet = TEST_KEY.parse().unwrap();
        AttestationBundle::sign(&wallet, timestamp, H256::repeat_byte(9)).unwrap()
    }

    #[test]
    fn test_second_verification_is_replay() {
        let mut guard = ReplayGuard::default();
        let bundle = bundle(1_000);

        assert_eq!(guard.verify(&bundle, 1_010), Ok(()));
        assert!(matches!(
            guard.verify(&bundle, 1_010),
            Err(AttestationRejection::Replayed { .. })
        ));
    }

    #[test]
    fn test_stale_bundle_rejected_without_consuming() {
        let mut guard = ReplayGuard::default();
        let bundle = bundle(1_000);

        assert!(matches!(
            guard.verify(&bundle, 1_301),
            Err(AttestationRejection::Stale { age: 301, window: 300 })
        ));
        assert!(guard.is_empty());
        // Exactly at the window edge is still fresh
        assert_eq!(guard.verify(&bundle, 1_300), Ok(()));
    }

    #[test]
    fn test_future_bundle_rejected() {
        let mut guard = ReplayGuard::default();
        assert!(matches!(
            guard.verify(&bundle(2_000), 1_000),
            Err(AttestationRejection::FromFuture { .. })
        ));
    }

    #[test]
    fn test_declared_identity_must_match_signer() {
        let mut guard = ReplayGuard::default();
        let other: LocalWallet = OTHER_KEY.parse().unwrap();
        let mut forged = bundle(1_000);
        forged.agent_identity = other.address();

        assert!(matches!(
            guard.verify(&forged, 1_000),
            Err(AttestationRejection::SignerMismatch { .. })
        ));
        assert!(!guard.has_seen(other.address(), 1_000));
    }

    #[test]
    fn test_batch_eviction_when_full() {
        let mut guard = ReplayGuard::new(ReplayGuardConfig {
            capacity: 10,
            eviction: 3,
            freshness_window_secs: 300,
        });
        let agent = Address::repeat_byte(1);
        for ts in 0..10 {
            guard.record(agent, ts);
        }
        assert_eq!(guard.len(), 10);

        guard.record(agent, 10);
        assert_eq!(guard.len(), 8);
        assert!(!guard.has_seen(agent, 0));
        assert!(!guard.has_seen(agent, 2));
        assert!(guard.has_seen(agent, 3));
        assert!(guard.has_seen(agent, 10));
    }
}
