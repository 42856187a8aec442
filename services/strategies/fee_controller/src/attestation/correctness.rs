//! Correctness proof: what was computed
//!
//! Stands in for a proof system. The output is passed through unchanged and the bundle
//! binds it to its input.

use ethers::signers::LocalWallet;
use ethers::utils::keccak256;
use serde_json::Value;
use types::{AttestationBundle, ReplayGuardConfig, SharedClock, H256};

use super::{AttestationProvider, Computation, ProviderCore};
use crate::error::AttestationError;

const NAME: &str = "correctness";

pub struct CorrectnessProof {
    core: ProviderCore,
}

impl CorrectnessProof {
    pub fn new(wallet: LocalWallet, clock: SharedClock, replay: ReplayGuardConfig) -> Self {
        Self {
            core: ProviderCore::new(wallet, clock, replay),
        }
    }
}

impl AttestationProvider for CorrectnessProof {
    fn name(&self) -> &'static str {
        NAME
    }

    fn execute(&self, computation: &Computation) -> Result<(Value, AttestationBundle), AttestationError> {
        let Computation::Precomputed { output, .. } = computation else {
            return Err(AttestationError::UnsupportedComputation {
                provider: NAME,
                computation: computation.kind(),
            });
        };
        let result = output.clone();
        let bundle = self.core.sign(self.result_hash(computation, &result)?)?;
        Ok((result, bundle))
    }

    fn verify(&self, bundle: &AttestationBundle) -> bool {
        self.core.verify(NAME, bundle)
    }

    /// `keccak256(json(input) || json(result))`
    fn result_hash(&self, computation: &Computation, result: &Value) -> Result<H256, AttestationError> {
        let Computation::Precomputed { input, .. } = computation else {
            return Err(AttestationError::UnsupportedComputation {
                provider: NAME,
                computation: computation.kind(),
            });
        };
        let mut preimage = serde_json::to_vec(input)?;
        preimage.extend(serde_json::to_vec(result)?);
        Ok(H256(keccak256(preimage)))
    }
}
