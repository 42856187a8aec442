//! Attestation providers
//!
//! Two independent providers wrap every recommendation:
//!
//! - [`IdentityAttestation`] proves *who* computed it. It dispatches on the declared
//!   computation type and signs `keccak256(result)`.
//! - [`CorrectnessProof`] proves *what* was computed. It passes a precomputed output
//!   through and signs `keccak256(input || output)`.
//!
//! Both satisfy [`AttestationProvider`], so either can be replaced by a hardware or
//! proof-system backend without touching the pipeline. `verify` consumes the bundle's
//! replay slot on success.

mod correctness;
mod identity;

pub use correctness::CorrectnessProof;
pub use identity::IdentityAttestation;

use ethers::signers::{LocalWallet, Signer};
use ethers::utils::keccak256;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use types::{
    AttestationBundle, MarketSnapshot, Recommendation, ReplayGuard, ReplayGuardConfig,
    SharedClock, H256,
};

use crate::error::AttestationError;

/// Work submitted to a provider
#[derive(Debug, Clone, PartialEq)]
pub enum Computation {
    /// Population volatility of a price series
    VolatilityAnalysis { prices: Vec<Decimal> },
    /// Attest an estimator recommendation
    FeeRecommendation { recommendation: Recommendation },
    /// Output computed elsewhere, bound to its input
    Precomputed { input: Value, output: Value },
}

impl Computation {
    pub fn kind(&self) -> &'static str {
        match self {
            Computation::VolatilityAnalysis { .. } => "volatility_analysis",
            Computation::FeeRecommendation { .. } => "fee_recommendation",
            Computation::Precomputed { .. } => "precomputed",
        }
    }
}

pub trait AttestationProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Run the computation and sign its result
    fn execute(&self, computation: &Computation) -> Result<(Value, AttestationBundle), AttestationError>;

    /// Identity, replay, freshness and signer checks. Consumes the replay slot on success.
    fn verify(&self, bundle: &AttestationBundle) -> bool;

    /// Hash this provider signs for `result` of `computation`
    fn result_hash(&self, computation: &Computation, result: &Value) -> Result<H256, AttestationError>;
}

/// Signing key, clock and replay guard common to both providers
pub(crate) struct ProviderCore {
    wallet: LocalWallet,
    clock: SharedClock,
    guard: Mutex<ReplayGuard>,
}

impl ProviderCore {
    pub(crate) fn new(wallet: LocalWallet, clock: SharedClock, replay: ReplayGuardConfig) -> Self {
        Self {
            wallet,
            clock,
            guard: Mutex::new(ReplayGuard::new(replay)),
        }
    }

    pub(crate) fn sign(&self, result_hash: H256) -> Result<AttestationBundle, AttestationError> {
        Ok(AttestationBundle::sign(&self.wallet, self.clock.now(), result_hash)?)
    }

    /// Only bundles issued under this provider's own key are accepted
    pub(crate) fn verify(&self, provider: &'static str, bundle: &AttestationBundle) -> bool {
        let expected = self.wallet.address();
        if bundle.agent_identity != expected {
            debug!(
                provider,
                identity = ?bundle.agent_identity,
                expected = ?expected,
                "Attestation from foreign key"
            );
            return false;
        }
        let now = self.clock.now();
        match self.guard.lock().verify(bundle, now) {
            Ok(()) => true,
            Err(rejection) => {
                debug!(provider, %rejection, "Attestation rejected");
                false
            }
        }
    }
}

pub(crate) fn hash_json(value: &Value) -> Result<H256, AttestationError> {
    Ok(H256(keccak256(serde_json::to_vec(value)?)))
}

/// Identity and correctness bundles for one recommendation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationPair {
    pub identity: AttestationBundle,
    pub correctness: AttestationBundle,
}

/// Policy engine input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestedRecommendation {
    pub recommendation: Recommendation,
    pub attestations: Option<AttestationPair>,
}

impl AttestedRecommendation {
    pub fn unattested(recommendation: Recommendation) -> Self {
        Self {
            recommendation,
            attestations: None,
        }
    }
}

fn snapshot_of(recommendation: &Recommendation) -> MarketSnapshot {
    MarketSnapshot {
        volatility: recommendation.volatility,
        spread: recommendation.spread,
        liquidity_depth: recommendation.liquidity_depth,
        confidence: recommendation.confidence,
    }
}

/// Runs both providers over a recommendation and verifies the resulting pair
pub struct Attestor {
    identity: Arc<dyn AttestationProvider>,
    correctness: Arc<dyn AttestationProvider>,
}

impl Attestor {
    pub fn new(identity: Arc<dyn AttestationProvider>, correctness: Arc<dyn AttestationProvider>) -> Self {
        Self {
            identity,
            correctness,
        }
    }

    /// Both providers share one key; each keeps its own replay guard
    pub fn from_wallet(wallet: LocalWallet, clock: SharedClock, replay: ReplayGuardConfig) -> Self {
        Self::new(
            Arc::new(IdentityAttestation::new(wallet.clone(), clock.clone(), replay)),
            Arc::new(CorrectnessProof::new(wallet, clock, replay)),
        )
    }

    fn identity_computation(recommendation: &Recommendation) -> Computation {
        Computation::FeeRecommendation {
            recommendation: *recommendation,
        }
    }

    fn correctness_computation(recommendation: &Recommendation) -> Result<Computation, AttestationError> {
        Ok(Computation::Precomputed {
            input: serde_json::to_value(snapshot_of(recommendation))?,
            output: serde_json::to_value(recommendation)?,
        })
    }

    pub fn attest(&self, recommendation: Recommendation) -> Result<AttestedRecommendation, AttestationError> {
        let (_, identity) = self
            .identity
            .execute(&Self::identity_computation(&recommendation))?;
        let (_, correctness) = self
            .correctness
            .execute(&Self::correctness_computation(&recommendation)?)?;

        Ok(AttestedRecommendation {
            recommendation,
            attestations: Some(AttestationPair {
                identity,
                correctness,
            }),
        })
    }

    /// Both bundles must verify and cover exactly this recommendation
    pub fn verify(&self, attested: &AttestedRecommendation) -> Result<(), AttestationError> {
        let pair = attested
            .attestations
            .as_ref()
            .ok_or(AttestationError::Missing)?;
        let recommendation = &attested.recommendation;
        let result = serde_json::to_value(recommendation)?;

        let checks: [(&Arc<dyn AttestationProvider>, &AttestationBundle, Computation); 2] = [
            (
                &self.identity,
                &pair.identity,
                Self::identity_computation(recommendation),
            ),
            (
                &self.correctness,
                &pair.correctness,
                Self::correctness_computation(recommendation)?,
            ),
        ];

        // Hash binding first so a mismatched bundle never burns a replay slot
        for (provider, bundle, computation) in &checks {
            if provider.result_hash(computation, &result)? != bundle.result_hash {
                return Err(AttestationError::HashMismatch {
                    provider: provider.name(),
                });
            }
        }
        for (provider, bundle, _) in &checks {
            if !provider.verify(bundle) {
                return Err(AttestationError::Rejected {
                    provider: provider.name(),
                });
            }
        }
        Ok(())
    }
}
