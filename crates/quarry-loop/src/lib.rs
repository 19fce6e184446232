//! # quarry-loop
//!
//! The query → publish → poll → update cycle that keeps a pool-based active
//! learner and a human annotation UI in step, plus the `quarry` binary.

pub mod labels;
pub mod publish;
pub mod session;
pub mod tracing_setup;

pub use session::{ActiveLearningLoop, LoopSettings, RunOutcome, StopReason};
