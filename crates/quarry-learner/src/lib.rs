//! # quarry-learner
//!
//! The pool-based active learner driven by the loop, and the collaborators
//! it is built from.
//!
//! | Piece | Role |
//! |-------|------|
//! | [`Classifier`] | probabilistic model refit after every batch |
//! | [`QueryStrategy`] | ranks pool rows by informativeness |
//! | [`stratified_sampling`] | picks the class-balanced seed set |
//! | [`PoolBasedActiveLearner`] | owns the pool, labeled set, and outstanding query |
//! | [`snapshot`] | versioned, checksummed learner snapshots |
//! | [`HashingVectorizer`] / [`load_jsonl`] | turn a text file into a [`Dataset`](quarry_core::Dataset) |

pub mod classifier;
pub mod dataset_io;
pub mod learner;
pub mod sampling;
pub mod snapshot;
pub mod strategy;
pub mod vectorize;

pub use classifier::{Classifier, NearestCentroid};
pub use dataset_io::{load_jsonl, DatasetRow};
pub use learner::PoolBasedActiveLearner;
pub use sampling::stratified_sampling;
pub use strategy::{BreakingTies, QueryStrategy, RandomSampling, Strategy};
pub use vectorize::HashingVectorizer;
