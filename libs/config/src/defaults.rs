//! Default values shared by configuration and the services that consume it

/// Network defaults
pub mod network {
    /// Zero address placeholder for unset contracts
    pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

    /// External price fetch timeout (seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 5;

    /// Attempts for transient RPC failures
    pub const RPC_RETRY_ATTEMPTS: u32 = 3;

    /// Fixed delay between RPC attempts (milliseconds)
    pub const RPC_RETRY_DELAY_MS: u64 = 500;
}

/// Estimator defaults
pub mod estimator {
    /// Observations kept per price source
    pub const BUFFER_CAPACITY: usize = 100;

    pub const BASE_FEE_BPS: u32 = 300;

    /// Liquidity below this (and above zero) counts as thin
    pub const LOW_LIQUIDITY_THRESHOLD: u64 = 100_000;
}

/// Scheduler defaults
pub mod schedule {
    pub const TICK_INTERVAL_SECS: u64 = 5;
    pub const ANALYSIS_INTERVAL_SECS: u64 = 30;

    /// Bounded wait for in-flight work on shutdown
    pub const SHUTDOWN_GRACE_SECS: u64 = 10;

    /// Recommendations buffered between estimator and policy engine
    pub const QUEUE_CAPACITY: usize = 8;
}

/// Environment variable naming
pub mod env {
    pub const PREFIX: &str = "VIGIL";
    pub const SEPARATOR: &str = "__";
    pub const CONFIG_PATH_VAR: &str = "VIGIL_CONFIG_PATH";
    /// `signer.private_key` under `PREFIX` + `_` + section + `SEPARATOR` + key
    pub const SIGNER_KEY_VAR: &str = "VIGIL_SIGNER__PRIVATE_KEY";
}
