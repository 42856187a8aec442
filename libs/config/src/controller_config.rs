//! Controller configuration loading and validation
//!
//! Every section carries production defaults so a deployment only overrides what differs.

use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use types::{Address, FeeBounds, PoolId, ReplayGuardConfig, DEFAULT_FEE, MAX_FEE, MIN_FEE};

use crate::defaults;

/// Complete configuration for the fee controller
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub network: NetworkConfig,
    pub signer: SignerConfig,
    pub estimator: EstimatorConfig,
    pub policy: PolicyConfig,
    pub attestation: AttestationSettings,
    pub schedule: ScheduleConfig,
}

/// Endpoints and contract addresses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// JSON-RPC endpoint for pool state reads
    pub rpc_url: String,
    /// External reference price endpoint
    pub price_feed_url: String,
    /// StateView-style contract exposing getSlot0 / getLiquidity
    pub state_view_address: String,
    pub hook_address: String,
    pub registry_address: String,
    pub pool_id: PoolId,
    pub token0_decimals: u8,
    pub token1_decimals: u8,
    pub request_timeout_secs: u64,
    pub rpc_retry_attempts: u32,
    pub rpc_retry_delay_ms: u64,
}

/// Signing key for instructions and attestations
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SignerConfig {
    /// Hex-encoded secp256k1 private key
    pub private_key: String,
}

impl fmt::Debug for SignerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = if self.private_key.is_empty() {
            "<unset>"
        } else {
            "<redacted>"
        };
        f.debug_struct("SignerConfig")
            .field("private_key", &shown)
            .finish()
    }
}

/// Threshold-tiered fee model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Observations kept per price source
    pub buffer_capacity: usize,
    pub base_fee_bps: u32,
    pub high_volatility: Decimal,
    pub high_volatility_surcharge_bps: u32,
    pub medium_volatility: Decimal,
    pub medium_volatility_surcharge_bps: u32,
    pub emergency_spread: Decimal,
    pub emergency_spread_surcharge_bps: u32,
    pub wide_spread: Decimal,
    pub wide_spread_surcharge_bps: u32,
    pub low_liquidity_threshold: u64,
    pub low_liquidity_surcharge_bps: u32,
}

/// Risk rules applied to every recommendation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub min_confidence: Decimal,
    pub max_fee_step_bps: u32,
    pub emergency_spread: Decimal,
    pub low_volatility: Decimal,
    pub min_fee_bps: u32,
    pub max_fee_bps: u32,
    /// Baseline before the first approval
    pub initial_fee_bps: u32,
    pub instruction_ttl_secs: u64,
    /// Reject recommendations whose attestations do not verify
    pub require_attestation: bool,
}

/// Replay protection for attestation verifiers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttestationSettings {
    pub freshness_window_secs: u64,
    pub replay_capacity: usize,
    pub replay_eviction: usize,
}

/// Task cadence and shutdown behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub tick_interval_secs: u64,
    pub analysis_interval_secs: u64,
    pub shutdown_grace_secs: u64,
    pub queue_capacity: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            price_feed_url: "https://api.exchange.coinbase.com/products/ETH-USD/ticker".to_string(),
            state_view_address: defaults::network::ZERO_ADDRESS.to_string(),
            hook_address: defaults::network::ZERO_ADDRESS.to_string(),
            registry_address: defaults::network::ZERO_ADDRESS.to_string(),
            pool_id: PoolId::default(),
            token0_decimals: 18,
            token1_decimals: 6,
            request_timeout_secs: defaults::network::REQUEST_TIMEOUT_SECS,
            rpc_retry_attempts: defaults::network::RPC_RETRY_ATTEMPTS,
            rpc_retry_delay_ms: defaults::network::RPC_RETRY_DELAY_MS,
        }
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: defaults::estimator::BUFFER_CAPACITY,
            base_fee_bps: defaults::estimator::BASE_FEE_BPS,
            high_volatility: dec!(0.05),
            high_volatility_surcharge_bps: 300,
            medium_volatility: dec!(0.02),
            medium_volatility_surcharge_bps: 100,
            emergency_spread: dec!(0.02),
            emergency_spread_surcharge_bps: 200,
            wide_spread: dec!(0.005),
            wide_spread_surcharge_bps: 100,
            low_liquidity_threshold: defaults::estimator::LOW_LIQUIDITY_THRESHOLD,
            low_liquidity_surcharge_bps: 50,
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            min_confidence: dec!(0.7),
            max_fee_step_bps: 300,
            emergency_spread: dec!(0.02),
            low_volatility: dec!(0.01),
            min_fee_bps: MIN_FEE,
            max_fee_bps: MAX_FEE,
            initial_fee_bps: DEFAULT_FEE,
            instruction_ttl_secs: 300,
            require_attestation: true,
        }
    }
}

impl Default for AttestationSettings {
    fn default() -> Self {
        let guard = ReplayGuardConfig::default();
        Self {
            freshness_window_secs: guard.freshness_window_secs,
            replay_capacity: guard.capacity,
            replay_eviction: guard.eviction,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: defaults::schedule::TICK_INTERVAL_SECS,
            analysis_interval_secs: defaults::schedule::ANALYSIS_INTERVAL_SECS,
            shutdown_grace_secs: defaults::schedule::SHUTDOWN_GRACE_SECS,
            queue_capacity: defaults::schedule::QUEUE_CAPACITY,
        }
    }
}

impl PolicyConfig {
    /// Hard bounds. Only meaningful after `validate`.
    pub fn bounds(&self) -> FeeBounds {
        FeeBounds {
            min: self.min_fee_bps,
            max: self.max_fee_bps,
        }
    }
}

impl AttestationSettings {
    pub fn replay_guard(&self) -> ReplayGuardConfig {
        ReplayGuardConfig {
            capacity: self.replay_capacity,
            eviction: self.replay_eviction,
            freshness_window_secs: self.freshness_window_secs,
        }
    }
}

impl NetworkConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn rpc_retry_delay(&self) -> Duration {
        Duration::from_millis(self.rpc_retry_delay_ms)
    }
}

impl ScheduleConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn analysis_interval(&self) -> Duration {
        Duration::from_secs(self.analysis_interval_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl ControllerConfig {
    /// Load defaults, then the optional file, then `VIGIL_*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = Config::try_from(&ControllerConfig::default())
            .context("Failed to serialize default configuration")?;
        let mut builder = Config::builder().add_source(defaults);

        if let Some(path) = path {
            info!("Loading controller config: {:?}", path);
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(defaults::env::PREFIX)
                .prefix_separator("_")
                .separator(defaults::env::SEPARATOR)
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;
        let mut config: ControllerConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.expand_env_vars()?;

        debug!("Controller configuration: {:?}", config);
        Ok(config)
    }

    /// Expand `${VAR}` references in endpoint strings
    pub fn expand_env_vars(&mut self) -> Result<()> {
        let expanded = shellexpand::env(&self.network.rpc_url).context("Failed to expand RPC URL")?;
        self.network.rpc_url = expanded.to_string();

        let expanded = shellexpand::env(&self.network.price_feed_url)
            .context("Failed to expand price feed URL")?;
        self.network.price_feed_url = expanded.to_string();

        Ok(())
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        let network = &self.network;
        if network.rpc_url.is_empty() {
            bail!("network.rpc_url must be set");
        }
        if network.price_feed_url.is_empty() {
            bail!("network.price_feed_url must be set");
        }
        for (name, value) in [
            ("state_view_address", &network.state_view_address),
            ("hook_address", &network.hook_address),
            ("registry_address", &network.registry_address),
        ] {
            if value.parse::<Address>().is_err() {
                bail!("Invalid network.{} address format: {}", name, value);
            }
        }
        if network.request_timeout_secs == 0 {
            bail!("network.request_timeout_secs must be positive");
        }
        if network.rpc_retry_attempts == 0 {
            bail!("network.rpc_retry_attempts must be at least 1");
        }

        let estimator = &self.estimator;
        if estimator.buffer_capacity < 2 {
            bail!("estimator.buffer_capacity must be at least 2");
        }
        if estimator.medium_volatility < dec!(0) || estimator.medium_volatility > estimator.high_volatility {
            bail!("estimator volatility thresholds must satisfy 0 <= medium <= high");
        }
        if estimator.wide_spread < dec!(0) || estimator.wide_spread > estimator.emergency_spread {
            bail!("estimator spread thresholds must satisfy 0 <= wide <= emergency");
        }

        let policy = &self.policy;
        if policy.min_confidence < dec!(0) || policy.min_confidence > dec!(1) {
            bail!("policy.min_confidence must be between 0 and 1");
        }
        if policy.min_fee_bps > policy.max_fee_bps {
            bail!(
                "policy.min_fee_bps ({}) must be <= policy.max_fee_bps ({})",
                policy.min_fee_bps,
                policy.max_fee_bps
            );
        }
        // Fees travel as uint24 and must stay below 100%
        if policy.max_fee_bps > 1_000_000 {
            bail!("policy.max_fee_bps must be <= 1000000");
        }
        if !policy.bounds().contains(policy.initial_fee_bps) {
            bail!("policy.initial_fee_bps must lie within the fee bounds");
        }
        if policy.max_fee_step_bps == 0 {
            bail!("policy.max_fee_step_bps must be positive");
        }
        if policy.emergency_spread < dec!(0) || policy.low_volatility < dec!(0) {
            bail!("policy thresholds must be non-negative");
        }
        if policy.instruction_ttl_secs == 0 {
            bail!("policy.instruction_ttl_secs must be positive");
        }

        let attestation = &self.attestation;
        if attestation.freshness_window_secs == 0 {
            bail!("attestation.freshness_window_secs must be positive");
        }
        if attestation.replay_capacity == 0
            || attestation.replay_eviction == 0
            || attestation.replay_eviction > attestation.replay_capacity
        {
            bail!("attestation replay eviction must be in 1..=replay_capacity");
        }

        let schedule = &self.schedule;
        if schedule.tick_interval_secs == 0 || schedule.analysis_interval_secs == 0 {
            bail!("schedule intervals must be positive");
        }
        if schedule.queue_capacity == 0 {
            bail!("schedule.queue_capacity must be positive");
        }

        Ok(())
    }
}

/// Config path from the CLI, else from `VIGIL_CONFIG_PATH`
pub fn resolve_config_path(cli_path: Option<PathBuf>) -> Option<PathBuf> {
    cli_path.or_else(|| std::env::var(defaults::env::CONFIG_PATH_VAR).ok().map(PathBuf::from))
}

/// Convenience function to load configuration
pub fn load_config(path: Option<&Path>) -> Result<ControllerConfig> {
    ControllerConfig::load(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_validation() {
        let config = ControllerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.policy.bounds(), FeeBounds::default());
        assert_eq!(config.attestation.replay_guard(), ReplayGuardConfig::default());
    }

    #[test]
    fn test_load_file_and_env_override() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("controller.toml");

        let config_content = r#"
[network]
rpc_url = "http://localhost:9545"
pool_id = "0x0101010101010101010101010101010101010101010101010101010101010101"

[policy]
max_fee_step_bps = 250
min_confidence = "0.8"

[schedule]
analysis_interval_secs = 60
"#;
        fs::write(&config_path, config_content).unwrap();

        std::env::set_var("VIGIL_SCHEDULE__TICK_INTERVAL_SECS", "2");
        let config = ControllerConfig::load(Some(&config_path)).unwrap();
        std::env::remove_var("VIGIL_SCHEDULE__TICK_INTERVAL_SECS");

        assert_eq!(config.network.rpc_url, "http://localhost:9545");
        assert_eq!(config.network.pool_id, PoolId([1; 32]));
        assert_eq!(config.policy.max_fee_step_bps, 250);
        assert_eq!(config.policy.min_confidence, dec!(0.8));
        assert_eq!(config.schedule.analysis_interval_secs, 60);
        assert_eq!(config.schedule.tick_interval_secs, 2);
        // Untouched sections keep defaults
        assert_eq!(config.estimator.base_fee_bps, 300);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(ControllerConfig::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        let mut config = ControllerConfig::default();
        config.policy.min_fee_bps = 9_000;
        config.policy.max_fee_bps = 8_000;
        assert!(config.validate().is_err());

        let mut config = ControllerConfig::default();
        config.policy.initial_fee_bps = 20_000;
        assert!(config.validate().is_err());

        let mut config = ControllerConfig::default();
        config.network.hook_address = "0xnothex".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_signer_key_from_environment() {
        let key = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
        std::env::set_var(defaults::env::SIGNER_KEY_VAR, key);
        let config = ControllerConfig::load(None).unwrap();
        std::env::remove_var(defaults::env::SIGNER_KEY_VAR);

        assert_eq!(config.signer.private_key, key);
    }

    #[test]
    fn test_private_key_is_redacted() {
        let signer = SignerConfig {
            private_key: "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80".to_string(),
        };
        let printed = format!("{:?}", signer);
        assert!(printed.contains("<redacted>"));
        assert!(!printed.contains("ac0974"));
    }
}
