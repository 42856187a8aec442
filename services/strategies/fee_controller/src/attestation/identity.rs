//! Identity attestation: who computed the result

use amm::{fractional_returns, population_std_dev};
use ethers::signers::LocalWallet;
use serde_json::{json, Value};
use types::{AttestationBundle, ReplayGuardConfig, SharedClock, H256};

use super::{hash_json, AttestationProvider, Computation, ProviderCore};
use crate::error::AttestationError;

const NAME: &str = "identity";

pub struct IdentityAttestation {
    core: ProviderCore,
}

impl IdentityAttestation {
    pub fn new(wallet: LocalWallet, clock: SharedClock, replay: ReplayGuardConfig) -> Self {
        Self {
            core: ProviderCore::new(wallet, clock, replay),
        }
    }

    fn compute(&self, computation: &Computation) -> Result<Value, AttestationError> {
        match computation {
            Computation::VolatilityAnalysis { prices } => {
                let volatility = if prices.len() < 2 {
                    Default::default()
                } else {
                    fractional_returns(prices)
                        .and_then(|returns| population_std_dev(&returns))
                        .map_err(|e| AttestationError::Computation {
                            message: e.to_string(),
                        })?
                };
                Ok(json!({
                    "samples": prices.len(),
                    "volatility": volatility,
                }))
            }
            Computation::FeeRecommendation { recommendation } => {
                Ok(serde_json::to_value(recommendation)?)
            }
            Computation::Precomputed { .. } => Err(AttestationError::UnsupportedComputation {
                provider: NAME,
                computation: computation.kind(),
            }),
        }
    }
}

impl AttestationProvider for IdentityAttestation {
    fn name(&self) -> &'static str {
        NAME
    }

    fn execute(&self, computation: &Computation) -> Result<(Value, AttestationBundle), AttestationError> {
        let result = self.compute(computation)?;
        let bundle = self.core.sign(self.result_hash(computation, &result)?)?;
        Ok((result, bundle))
    }

    fn verify(&self, bundle: &AttestationBundle) -> bool {
        self.core.verify(NAME, bundle)
    }

    fn result_hash(&self, _computation: &Computation, result: &Value) -> Result<H256, AttestationError> {
        hash_json(result)
    }
}
