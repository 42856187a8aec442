//! Destinations for signed instructions
//!
//! Relaying to the chain happens outside this process; the default sink logs each
//! instruction for an operator or relay to pick up.

use async_trait::async_trait;
use tokio::sync::mpsc;
use types::SignedInstruction;

use crate::error::{ControllerError, Result};

#[async_trait]
pub trait InstructionSink: Send + Sync {
    async fn submit(&self, instruction: SignedInstruction) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct LoggingSink;

#[async_trait]
impl InstructionSink for LoggingSink {
    async fn submit(&self, instruction: SignedInstruction) -> Result<()> {
        crate::log_execution!(
            "Instruction #{} fee={} bps pool={} deadline={}",
            instruction.nonce,
            instruction.fee,
            instruction.pool_id,
            instruction.deadline
        );
        tracing::debug!(
            signer = ?instruction.signer,
            digest = ?instruction.digest(),
            signature = %hex::encode(&instruction.signature),
            "Instruction payload"
        );
        Ok(())
    }
}

/// Forwards instructions into a channel, for embedding and tests
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<SignedInstruction>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<SignedInstruction>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl InstructionSink for ChannelSink {
    async fn submit(&self, instruction: SignedInstruction) -> Result<()> {
        self.tx
            .send(instruction)
            .await
            .map_err(|_| ControllerError::SinkClosed)
    }
}
