//! Shared Agent Framework
//!
//! Lifecycle trait, counters and the bounded hand-off queue used between pipeline stages.

pub mod metrics;
pub mod queue;
pub mod traits;

pub use metrics::*;
pub use queue::*;
pub use traits::*;
