//! # Vigil Configuration
//!
//! Startup configuration for the fee controller. Read once; there is no hot reload.
//!
//! ## Sources (later wins)
//!
//! 1. Built-in defaults ([`ControllerConfig::default`])
//! 2. Optional TOML file (`--config <path>` or `VIGIL_CONFIG_PATH`)
//! 3. Environment variables: prefix `VIGIL_`, section separator `__`
//!
//! ```text
//! VIGIL_NETWORK__RPC_URL=https://rpc.example
//! VIGIL_POLICY__MAX_FEE_STEP_BPS=200
//! VIGIL_SIGNER__PRIVATE_KEY=0x...
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use vigil_config::{load_config, resolve_config_path};
//!
//! let path = resolve_config_path(None);
//! let config = load_config(path.as_deref())?;
//! config.validate()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod controller_config;
pub mod defaults;

pub use controller_config::{
    load_config, resolve_config_path, AttestationSettings, ControllerConfig, EstimatorConfig,
    NetworkConfig, PolicyConfig, ScheduleConfig, SignerConfig,
};
