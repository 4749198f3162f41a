pub mod job;
pub mod loaders;
pub mod run_state;

pub use job::{display_date, parse_date, JobEntry, JobQueue};
pub use loaders::{load_numbers_from_file, load_numbers_from_url, load_queue_file, LoadedQueue};
pub use run_state::{ProgressState, RunState, RunStatus, DEFAULT_DELAY_MS};
