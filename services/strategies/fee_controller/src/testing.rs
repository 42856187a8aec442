//! Test doubles for the pipeline's external collaborators

use amm::PoolSlot;
use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};

use crate::error::FeedError;
use crate::pool_reader::PoolStateReader;
use crate::price_feed::{PriceFeed, PriceQuote};
use types::PoolId;

/// Replays scripted responses, then repeats the last successful price
#[derive(Debug, Default)]
pub struct ScriptedPriceFeed {
    script: Mutex<VecDeque<Result<Decimal, FeedError>>>,
    last: Mutex<Option<Decimal>>,
}

impl ScriptedPriceFeed {
    pub fn new(prices: impl IntoIterator<Item = Decimal>) -> Self {
        Self {
            script: Mutex::new(prices.into_iter().map(Ok).collect()),
            last: Mutex::new(None),
        }
    }

    pub fn push_price(&self, price: Decimal) {
        self.script.lock().push_back(Ok(price));
    }

    pub fn push_failure(&self, error: FeedError) {
        self.script.lock().push_back(Err(error));
    }
}

#[async_trait]
impl PriceFeed for ScriptedPriceFeed {
    async fn fetch(&self) -> Result<PriceQuote, FeedError> {
        let next = self.script.lock().pop_front();
        let price = match next {
            Some(Ok(price)) => {
                *self.last.lock() = Some(price);
                price
            }
            Some(Err(e)) => return Err(e),
            None => {
                let last = *self.last.lock();
                last.ok_or_else(|| FeedError::Transport("no scripted price".to_string()))?
            }
        };
        Ok(PriceQuote {
            price,
            timestamp: None,
        })
    }
}

/// Pool state held in memory
#[derive(Debug, Default)]
pub struct InMemoryPoolReader {
    slots: Mutex<HashMap<PoolId, PoolSlot>>,
}

impl InMemoryPoolReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_slot(&self, pool_id: PoolId, slot: PoolSlot) {
        self.slots.lock().insert(pool_id, slot);
    }
}

#[async_trait]
impl PoolStateReader for InMemoryPoolReader {
    async fn read_slot(&self, pool_id: &PoolId) -> Result<PoolSlot, FeedError> {
        self.slots
            .lock()
            .get(pool_id)
            .copied()
            .ok_or_else(|| FeedError::Rpc(format!("unknown pool {}", pool_id)))
    }
}
