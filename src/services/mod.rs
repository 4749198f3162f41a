pub mod form_adapter;
pub mod job_store;
pub mod number_source;
pub mod progress_reporter;

pub use form_adapter::{FormAdapter, PcarePage};
pub use job_store::{FileJobStore, JobStore, MemoryJobStore};
pub use number_source::{ApiNumberSource, ConfiguredNumberSource, ListNumberSource, NumberSource};
pub use progress_reporter::{
    FanoutReporter, LogFileReporter, ProgressEvent, ProgressReporter, TracingReporter,
};
