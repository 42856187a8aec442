//! Gate events and their EVM log encoding
//!
//! ```text
//! event MarketHealth(bytes32 indexed poolId, uint256 volatilityIndex, uint256 liquidityDepth, uint256 imbalanceRatio, uint256 timestamp)
//! event MEVCaptured(bytes32 indexed poolId, uint256 amount, address indexed capturer)
//! event AgentInstruction(address indexed agent, bytes32 instructionHash, uint24 fee, uint256 timestamp)
//! ```

use ethers::abi::{encode, Event, EventParam, ParamType, RawLog, Token};
use types::{Address, PoolId, H256, U256};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookEvent {
    MarketHealth {
        pool_id: PoolId,
        volatility_index: U256,
        liquidity_depth: u128,
        /// Always zero until an imbalance metric exists
        imbalance_ratio: U256,
        timestamp: u64,
    },
    MevCaptured {
        pool_id: PoolId,
        amount: U256,
        capturer: Address,
    },
    AgentInstruction {
        agent: Address,
        instruction_hash: H256,
        fee: u32,
        timestamp: u64,
    },
}

fn param(name: &str, kind: ParamType, indexed: bool) -> EventParam {
    EventParam {
        name: name.to_string(),
        kind,
        indexed,
    }
}

pub fn market_health_event() -> Event {
    Event {
        name: "MarketHealth".to_string(),
        inputs: vec![
            param("poolId", ParamType::FixedBytes(32), true),
            param("volatilityIndex", ParamType::Uint(256), false),
            param("liquidityDepth", ParamType::Uint(256), false),
            param("imbalanceRatio", ParamType::Uint(256), false),
            param("timestamp", ParamType::Uint(256), false),
        ],
        anonymous: false,
    }
}

pub fn mev_captured_event() -> Event {
    Event {
        name: "MEVCaptured".to_string(),
        inputs: vec![
            param("poolId", ParamType::FixedBytes(32), true),
            param("amount", ParamType::Uint(256), false),
            param("capturer", ParamType::Address, true),
        ],
        anonymous: false,
    }
}

pub fn agent_instruction_event() -> Event {
    Event {
        name: "AgentInstruction".to_string(),
        inputs: vec![
            param("agent", ParamType::Address, true),
            param("instructionHash", ParamType::FixedBytes(32), false),
            param("fee", ParamType::Uint(24), false),
            param("timestamp", ParamType::Uint(256), false),
        ],
        anonymous: false,
    }
}

fn address_topic(address: Address) -> H256 {
    H256::from(address)
}

impl HookEvent {
    pub fn abi(&self) -> Event {
        match self {
            HookEvent::MarketHealth { .. } => market_health_event(),
            HookEvent::MevCaptured { .. } => mev_captured_event(),
            HookEvent::AgentInstruction { .. } => agent_instruction_event(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HookEvent::MarketHealth { .. } => "MarketHealth",
            HookEvent::MevCaptured { .. } => "MEVCaptured",
            HookEvent::AgentInstruction { .. } => "AgentInstruction",
        }
    }

    /// Topic 0 is the event signature, followed by indexed params in declaration order
    pub fn to_log(&self) -> RawLog {
        let signature = self.abi().signature();
        match self {
            HookEvent::MarketHealth {
                pool_id,
                volatility_index,
                liquidity_depth,
                imbalance_ratio,
                timestamp,
            } => RawLog {
                topics: vec![signature, pool_id.to_h256()],
                data: encode(&[
                    Token::Uint(*volatility_index),
                    Token::Uint(U256::from(*liquidity_depth)),
                    Token::Uint(*imbalance_ratio),
                    Token::Uint(U256::from(*timestamp)),
                ]),
            },
            HookEvent::MevCaptured {
                pool_id,
                amount,
                capturer,
            } => RawLog {
                topics: vec![signature, pool_id.to_h256(), address_topic(*capturer)],
                data: encode(&[Token::Uint(*amount)]),
            },
            HookEvent::AgentInstruction {
                agent,
                instruction_hash,
                fee,
                timestamp,
            } => RawLog {
                topics: vec![signature, address_topic(*agent)],
                data: encode(&[
                    Token::FixedBytes(instruction_hash.as_bytes().to_vec()),
                    Token::Uint(U256::from(*fee)),
                    Token::Uint(U256::from(*timestamp)),
                ]),
            },
        }
    }
}
