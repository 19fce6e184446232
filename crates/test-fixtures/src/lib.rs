//! Shared test doubles for the Quarry workspace: a manual clock, a scripted
//! store wrapper that plays the annotator, a recording learner, and small
//! deterministic datasets.
//!
//! Helpers here panic on setup failure; they are only ever used from tests.

pub mod clock;
pub mod dataset;
pub mod learner;
pub mod store;

pub use clock::ManualClock;
pub use dataset::{question_dataset, synthetic_dataset, QUESTION_LABELS};
pub use learner::{Call, RecordingLearner};
pub use store::ScriptedStore;
