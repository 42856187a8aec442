//! Per-pool gate state
//!
//! The price history is a fixed arena of [`PRICE_HISTORY_LEN`] slots with a write index
//! and a saturating fill count. Writes wrap and overwrite; nothing is shifted.

use types::{Address, U256};

pub const PRICE_HISTORY_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceHistory {
    slots: [U256; PRICE_HISTORY_LEN],
    /// Next slot to write, always `< PRICE_HISTORY_LEN`
    index: usize,
    count: usize,
}

impl Default for PriceHistory {
    fn default() -> Self {
        Self {
            slots: [U256::zero(); PRICE_HISTORY_LEN],
            index: 0,
            count: 0,
        }
    }
}

impl PriceHistory {
    pub fn push(&mut self, price: U256) {
        self.slots[self.index] = price;
        self.index = (self.index + 1) % PRICE_HISTORY_LEN;
        self.count = (self.count + 1).min(PRICE_HISTORY_LEN);
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count == PRICE_HISTORY_LEN
    }

    /// Populated slots in storage order. Until the first wrap these are `slots[..count]`.
    pub fn samples(&self) -> &[U256] {
        &self.slots[..self.count]
    }

    /// Populated slots oldest first
    pub fn chronological(&self) -> Vec<U256> {
        if !self.is_full() {
            return self.samples().to_vec();
        }
        let mut ordered = Vec::with_capacity(PRICE_HISTORY_LEN);
        ordered.extend_from_slice(&self.slots[self.index..]);
        ordered.extend_from_slice(&self.slots[..self.index]);
        ordered
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolFeeState {
    pub price_history: PriceHistory,
    /// Block of the most recent swap seen for this pool
    pub last_processed_block: u64,
    /// Wei accumulated toward the next MEV capture event
    pub captured_mev: U256,
    /// Fee from an accepted signed instruction, applied to the next unsigned swap
    pub pending_instruction: Option<PendingInstruction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingInstruction {
    pub agent: Address,
    /// Already clamped to the gate's bounds
    pub fee: u32,
    pub nonce: u64,
}

impl PoolFeeState {
    /// Marks `block` as processed. True for the first swap of a new block.
    pub fn mark_block(&mut self, block: u64) -> bool {
        if block > self.last_processed_block {
            self.last_processed_block = block;
            true
        } else {
            false
        }
    }
}
