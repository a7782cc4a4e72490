//! svykit: Survey Data Toolkit CLI
//!
//! Cleans survey records, rakes weights to population margins and reports
//! weighted statistics, frequency tables and charts.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use svykit::cli::{run_chart, run_clean, run_freq, run_rake, run_stats, Cli, Commands};
use svykit::utils::print_banner;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    print_banner(env!("CARGO_PKG_VERSION"));

    let isl = cli.infer_schema_length;
    match &cli.command {
        Commands::Rake(args) => run_rake(args, isl),
        Commands::Stats(args) => run_stats(args, isl),
        Commands::Freq(args) => run_freq(args, isl),
        Commands::Clean(args) => run_clean(args, isl),
        Commands::Chart(args) => run_chart(args, isl),
    }
}

/// Diagnostics go to stderr so they never mix with tables on stdout.
fn init_logging(verbose: bool) {
    let default = if verbose { "svykit=debug" } else { "svykit=warn" };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
