mod cancellation;
mod clock;
mod learner;
mod store;

pub use cancellation::{Cancellable, CancellationToken};
pub use clock::{Clock, SystemClock};
pub use learner::ActiveLearner;
pub use store::AnnotationStore;
