pub mod annotation_store;
pub mod csv_parser;
pub mod executor;
pub mod job_tracker;

pub use annotation_store::AnnotationStore;
pub use executor::{BatchImportExecutor, ExecutorSettings};
pub use job_tracker::JobTracker;
