//! On-chain pool state reader
//!
//! Reads `getSlot0(bytes32)` and `getLiquidity(bytes32)` from a StateView-style contract
//! over JSON-RPC. Each call is retried on transient failures.

use amm::PoolSlot;
use async_trait::async_trait;
use ethers::abi::{decode, encode, ParamType, Token};
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::TransactionRequest;
use ethers::utils::keccak256;
use std::time::Duration;
use tracing::debug;
use types::{Address, Bytes, PoolId, U256};
use url::Url;

use crate::error::FeedError;
use crate::retry::{retry_with_backoff, RetryPolicy};

const GET_SLOT0: &str = "getSlot0(bytes32)";
const GET_LIQUIDITY: &str = "getLiquidity(bytes32)";

#[async_trait]
pub trait PoolStateReader: Send + Sync {
    async fn read_slot(&self, pool_id: &PoolId) -> Result<PoolSlot, FeedError>;
}

pub struct RpcPoolStateReader {
    provider: Provider<Http>,
    state_view: Address,
    retry: RetryPolicy,
}

impl RpcPoolStateReader {
    pub fn new(
        rpc_url: &str,
        state_view: Address,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(300))
            .pool_max_idle_per_host(5)
            .timeout(timeout)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| FeedError::Configuration(e.to_string()))?;

        let url: Url = rpc_url
            .parse()
            .map_err(|e| FeedError::Configuration(format!("Invalid RPC URL: {}", e)))?;
        let provider = Provider::new(Http::new_with_client(url, client));

        Ok(Self {
            provider,
            state_view,
            retry,
        })
    }

    async fn call(&self, data: Bytes) -> Result<Bytes, FeedError> {
        let tx: TypedTransaction = TransactionRequest::new()
            .to(self.state_view)
            .data(data)
            .into();
        self.provider
            .call(&tx, None)
            .await
            .map_err(|e| FeedError::Rpc(e.to_string()))
    }

    async fn call_with_retry(&self, name: &str, data: Bytes) -> Result<Bytes, FeedError> {
        retry_with_backoff(self.retry, name, || self.call(data.clone())).await
    }
}

#[async_trait]
impl PoolStateReader for RpcPoolStateReader {
    async fn read_slot(&self, pool_id: &PoolId) -> Result<PoolSlot, FeedError> {
        let slot0 = self
            .call_with_retry(GET_SLOT0, calldata(GET_SLOT0, pool_id))
            .await?;
        let liquidity = self
            .call_with_retry(GET_LIQUIDITY, calldata(GET_LIQUIDITY, pool_id))
            .await?;

        let mut slot = decode_slot0(&slot0)?;
        slot.liquidity = decode_liquidity(&liquidity)?;
        debug!(pool = %pool_id, tick = slot.tick, liquidity = slot.liquidity, "Read pool state");
        Ok(slot)
    }
}

fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

pub fn calldata(signature: &str, pool_id: &PoolId) -> Bytes {
    let mut data = selector(signature).to_vec();
    data.extend(encode(&[Token::FixedBytes(pool_id.as_bytes().to_vec())]));
    Bytes::from(data)
}

/// `(uint160 sqrtPriceX96, int24 tick, uint24 protocolFee, uint24 lpFee)`
pub fn decode_slot0(data: &[u8]) -> Result<PoolSlot, FeedError> {
    let tokens = decode(
        &[
            ParamType::Uint(160),
            ParamType::Int(24),
            ParamType::Uint(24),
            ParamType::Uint(24),
        ],
        data,
    )
    .map_err(|e| FeedError::Parse(format!("getSlot0: {}", e)))?;

    match tokens.as_slice() {
        [Token::Uint(sqrt_price_x96), Token::Int(tick), Token::Uint(protocol_fee), Token::Uint(lp_fee)] => {
            Ok(PoolSlot {
                sqrt_price_x96: *sqrt_price_x96,
                // Sign-extended word; the low 32 bits are the two's complement tick
                tick: tick.low_u32() as i32,
                protocol_fee: protocol_fee.low_u32(),
                lp_fee: lp_fee.low_u32(),
                liquidity: 0,
            })
        }
        _ => Err(FeedError::Parse("getSlot0: unexpected tokens".to_string())),
    }
}

pub fn decode_liquidity(data: &[u8]) -> Result<u128, FeedError> {
    let tokens = decode(&[ParamType::Uint(128)], data)
        .map_err(|e| FeedError::Parse(format!("getLiquidity: {}", e)))?;
    match tokens.as_slice() {
        [Token::Uint(liquidity)] if *liquidity <= U256::from(u128::MAX) => Ok(liquidity.as_u128()),
        _ => Err(FeedError::Parse("getLiquidity: unexpected tokens".to_string())),
    }
}
