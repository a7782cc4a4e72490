//! Command-line argument definitions using clap

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::pipeline::{derive_output_path, ImputeStrategy, DEFAULT_MAX_ITERATIONS};

/// svykit - clean survey data, rake weights and compute weighted statistics
#[derive(Parser, Debug)]
#[command(name = "svykit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Number of rows to use for schema inference (CSV only).
    /// Use 0 for full table scan (very slow for large files).
    #[arg(long, global = true, default_value = "10000")]
    pub infer_schema_length: usize,

    /// Enable debug logging (per-iteration raking diagnostics).
    /// RUST_LOG overrides this flag.
    #[arg(short, long, global = true, default_value = "false")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rake a weight column to population margins
    Rake(RakeArgs),
    /// Weighted mean and total of numeric columns
    Stats(StatsArgs),
    /// Frequency table, or cross tabulation with --by
    Freq(FreqArgs),
    /// Remove duplicates, impute missing values and standardize categories
    Clean(CleanArgs),
    /// Render a bar chart or histogram as SVG
    Chart(ChartArgs),
}

#[derive(Args, Debug)]
pub struct RakeArgs {
    /// Input file path (CSV or Parquet)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Weight column to rake
    #[arg(short, long)]
    pub weight: String,

    /// JSON file with the population margins, in raking order
    #[arg(long)]
    pub targets: PathBuf,

    /// Output file path (CSV or Parquet, determined by extension).
    /// Defaults to the input directory with a '_raked' suffix.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Maximum number of raking iterations
    #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS, value_parser = validate_max_iterations)]
    pub max_iterations: usize,

    /// Convergence tolerance on the maximum relative weight change
    #[arg(long, default_value = "1e-6", value_parser = validate_tolerance)]
    pub tolerance: f64,

    /// Write raking diagnostics to this JSON file
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl RakeArgs {
    /// Output path, derived from the input when not given
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| derive_output_path(&self.input, "raked"))
    }
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Input file path (CSV or Parquet)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Numeric columns to summarize (comma-separated)
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub columns: Vec<String>,

    /// Weight column
    #[arg(short, long)]
    pub weight: String,
}

#[derive(Args, Debug)]
pub struct FreqArgs {
    /// Input file path (CSV or Parquet)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Categorical column to tabulate
    #[arg(short, long)]
    pub column: String,

    /// Second column for a cross tabulation
    #[arg(long)]
    pub by: Option<String>,

    /// Weight column; cells hold sums of weights instead of counts
    #[arg(short, long)]
    pub weight: Option<String>,
}

#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Input file path (CSV or Parquet)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output file path. Defaults to the input directory with a '_clean' suffix.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Remove duplicate rows, keeping the first occurrence
    #[arg(long, default_value = "false")]
    pub dedupe: bool,

    /// Columns forming the duplicate key (comma-separated, default: all columns)
    #[arg(long, value_delimiter = ',', requires = "dedupe")]
    pub dedupe_on: Vec<String>,

    /// Impute a column: COLUMN=mean|median|mode (repeatable)
    #[arg(long, value_parser = parse_impute_spec)]
    pub impute: Vec<ImputeSpec>,

    /// JSON file with category mappings
    #[arg(long)]
    pub mapping: Option<PathBuf>,

    /// Weight column to normalize after cleaning
    #[arg(long)]
    pub normalize_weight: Option<String>,

    /// Total the normalized weights sum to (default: number of rows)
    #[arg(long, requires = "normalize_weight")]
    pub normalize_total: Option<f64>,
}

impl CleanArgs {
    /// Output path, derived from the input when not given
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| derive_output_path(&self.input, "clean"))
    }
}

#[derive(Args, Debug)]
pub struct ChartArgs {
    /// Input file path (CSV or Parquet)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Column to plot
    #[arg(short, long)]
    pub column: String,

    /// Chart type
    #[arg(long, value_enum, default_value = "bar")]
    pub kind: ChartKind,

    /// Weight column
    #[arg(short, long)]
    pub weight: Option<String>,

    /// Number of histogram bins
    #[arg(long, default_value = "20", value_parser = validate_bins)]
    pub bins: usize,

    /// Output SVG path
    #[arg(short, long)]
    pub output: PathBuf,
}

/// Chart types
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChartKind {
    /// Bar chart of a categorical column's frequency table
    Bar,
    /// Histogram of a numeric column
    Histogram,
}

/// `COLUMN=STRATEGY` pair for imputation
#[derive(Debug, Clone, PartialEq)]
pub struct ImputeSpec {
    pub column: String,
    pub strategy: ImputeStrategy,
}

/// Parser for `--impute COLUMN=STRATEGY`
fn parse_impute_spec(s: &str) -> Result<ImputeSpec, String> {
    let (column, strategy) = s
        .split_once('=')
        .ok_or_else(|| format!("'{}' must have the form COLUMN=mean|median|mode", s))?;

    let column = column.trim();
    if column.is_empty() {
        return Err(format!("'{}' has an empty column name", s));
    }

    let strategy = ImputeStrategy::from_str(strategy.trim(), true)
        .map_err(|_| format!("unknown imputation strategy '{}'", strategy.trim()))?;

    Ok(ImputeSpec {
        column: column.to_string(),
        strategy,
    })
}

/// Validator for max_iterations parameter
fn validate_max_iterations(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid iteration count", s))?;

    if value == 0 {
        Err("max_iterations must be at least 1".to_string())
    } else {
        Ok(value)
    }
}

/// Validator for tolerance parameter
fn validate_tolerance(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if !value.is_finite() || value <= 0.0 {
        Err(format!("tolerance must be a positive number, got {}", value))
    } else {
        Ok(value)
    }
}

/// Validator for bins parameter
fn validate_bins(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid bin count", s))?;

    if value == 0 {
        Err("bins must be at least 1".to_string())
    } else {
        Ok(value)
    }
}

impl Commands {
    /// Input path shared by every subcommand
    pub fn input(&self) -> &Path {
        match self {
            Commands::Rake(args) => &args.input,
            Commands::Stats(args) => &args.input,
            Commands::Freq(args) => &args.input,
            Commands::Clean(args) => &args.input,
            Commands::Chart(args) => &args.input,
        }
    }
}
