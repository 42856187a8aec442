//! # Fee Controller - Closed-Loop Dynamic Fee Agent
//!
//! ## Purpose
//!
//! Off-chain half of the dynamic fee system. Observes an external reference price and the
//! pool's own state, estimates volatility, spread and liquidity, recommends a fee, attests
//! the recommendation and passes it through a conservative policy engine that signs fee
//! instructions for the on-chain gate.
//!
//! ## Integration Points
//!
//! - **Input Sources**: HTTP reference price feed, StateView `getSlot0`/`getLiquidity` over JSON-RPC
//! - **Output Destinations**: [`InstructionSink`] (logging by default, channel for embedding)
//! - **Verification**: identity and correctness attestations, replay-guarded
//! - **Configuration**: `vigil-config` TOML file with `VIGIL_<SECTION>__<KEY>` environment overrides
//!
//! ## Architecture Role
//!
//! ```mermaid
//! graph LR
//!     Feed[Price Feed] --> Estimator[Market Estimator]
//!     Pool[Pool Reader] --> Estimator
//!     Estimator --> Attestor[Attestation]
//!     Attestor --> Queue[Drop-oldest Queue]
//!     Queue --> Policy[Policy Engine]
//!     Policy --> Sink[Instruction Sink]
//! ```
//!
//! ## Safety Properties
//!
//! - Approved fees always sit inside the configured bounds
//! - Every approved instruction carries a strictly increasing nonce
//! - Rejected recommendations leave fee and nonce untouched
//! - Feed and RPC failures degrade the estimate, never stop the loop

pub mod attestation;
pub mod error;
pub mod estimator;
pub mod logging;
pub mod pipeline;
pub mod policy;
pub mod pool_reader;
pub mod price_feed;
pub mod retry;
pub mod ring_buffer;
pub mod sink;
pub mod testing;

pub use attestation::{
    AttestationPair, AttestationProvider, AttestedRecommendation, Attestor, Computation,
    CorrectnessProof, IdentityAttestation,
};
pub use error::{AttestationError, ControllerError, FeedError, Result};
pub use estimator::MarketEstimator;
pub use logging::init_logging;
pub use pipeline::{EstimatorStage, FeeController, PipelineDeps, PolicyStage};
pub use policy::{PolicyEngine, PolicyOutcome};
pub use pool_reader::{PoolStateReader, RpcPoolStateReader};
pub use price_feed::{HttpPriceFeed, PriceFeed, PriceQuote};
pub use retry::{retry_with_backoff, RetryPolicy};
pub use ring_buffer::RingBuffer;
pub use sink::{ChannelSink, InstructionSink, LoggingSink};
