pub mod number_list;
pub mod toml_loader;

pub use number_list::{load_numbers_from_file, load_numbers_from_url, parse_number_lines};
pub use toml_loader::{load_queue_file, parse_queue_toml, LoadedQueue};
