//! CLI module - argument parsing and subcommand runners

mod analyze;
mod args;
mod chart;
mod clean;
mod rake;

pub use analyze::{run_freq, run_stats};
pub use args::*;
pub use chart::run_chart;
pub use clean::run_clean;
pub use rake::run_rake;
