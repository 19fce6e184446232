mod dataset;
mod record;

pub use dataset::Dataset;
pub use record::{AnnotationRecord, RecordId, RecordStatus};
