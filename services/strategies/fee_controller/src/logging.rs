//! Standardized logging for the fee controller
//!
//! Emoji prefixes keep operator logs scannable; structured fields carry the data.

use anyhow::{anyhow, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset
const DEFAULT_FILTER: &str = "fee_controller=info,gate=info,vigil_config=info,warn";

/// Standard emoji set for fee controller logging
pub struct LogEmoji;

impl LogEmoji {
    // Status indicators
    pub const SUCCESS: &'static str = "✅";
    pub const ERROR: &'static str = "❌";

    // Module-specific
    pub const CHART: &'static str = "📊"; // Estimates/metrics
    pub const EXECUTE: &'static str = "⚡"; // Instruction emitted
    pub const SHIELD: &'static str = "🛡️"; // Policy and attestation
    pub const NETWORK: &'static str = "🌐"; // Feed and RPC
    pub const CLOCK: &'static str = "⏱️"; // Scheduling/shutdown
}

#[macro_export]
macro_rules! log_success {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::SUCCESS, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        tracing::error!("{} {}", $crate::logging::LogEmoji::ERROR, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_metrics {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::CHART, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_execution {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::EXECUTE, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_policy {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::SHIELD, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_network_warning {
    ($($arg:tt)*) => {
        tracing::warn!("{} {}", $crate::logging::LogEmoji::NETWORK, format!($($arg)*))
    };
}

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_logging(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    let (plain, structured) = if json {
        (None, Some(tracing_subscriber::fmt::layer().json()))
    } else {
        (Some(tracing_subscriber::fmt::layer()), None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(plain)
        .with(structured)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}
