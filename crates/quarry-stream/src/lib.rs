//! # quarry-stream
//!
//! Bridges the asynchronous annotation store with the synchronous learning
//! loop: a polling [`QueryStream`] over a moving time window with
//! at-most-once delivery, backoff tiers ([`Priority`]), and fixed-size
//! chunking ([`RecordBatcher`]).

pub mod batcher;
pub mod priority;
pub mod stream;
pub mod template;

pub use batcher::{BatchExt, RecordBatcher};
pub use priority::Priority;
pub use stream::{QueryStream, QueryStreamBuilder};
pub use template::QueryTemplate;
