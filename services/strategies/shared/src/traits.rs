//! Agent traits and interfaces

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Long-running pipeline component
#[async_trait]
pub trait Agent: Send + Sync {
    /// Agent name for identification
    fn name(&self) -> &'static str;

    /// Spawn the agent's tasks and return
    async fn start(&mut self) -> Result<()>;

    /// Signal shutdown and wait for in-flight work, bounded by a grace period
    async fn stop(&mut self) -> Result<()>;

    /// Current counters
    fn metrics(&self) -> AgentMetrics;
}

/// Pipeline counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentMetrics {
    pub ticks: u64,
    pub feed_failures: u64,
    pub recommendations_produced: u64,
    pub recommendations_dropped: u64,
    pub approved: u64,
    pub rejected: u64,
    pub instructions_emitted: u64,
    pub errors: u64,
}
