pub mod constants;
pub mod filename;
pub mod progress;

pub use constants::*;
pub use filename::{default_output_path, is_qc_output, output_path_in_dir, OutputFormat};
pub use progress::ProgressReporter;
