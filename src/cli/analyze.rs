//! `svykit stats` and `svykit freq` - weighted statistics on the terminal

use anyhow::{Context, Result};

use crate::cli::{FreqArgs, StatsArgs};
use crate::pipeline::{cross_tab, frequency_table, load_records, summarize_numeric};
use crate::report::{display_cross_tab, display_frequency_table, display_weighted_summaries};
use crate::utils::{print_io, print_step_header};

pub fn run_stats(args: &StatsArgs, infer_schema_length: usize) -> Result<()> {
    print_io(&args.input, Some(&args.weight), None);
    let df = load_records(&args.input, infer_schema_length)?;

    print_step_header(1, "Weighted Summary");
    let summaries = summarize_numeric(&df, &args.columns, &args.weight)
        .context("Failed to compute weighted statistics")?;
    display_weighted_summaries(&summaries, &args.weight);
    Ok(())
}

pub fn run_freq(args: &FreqArgs, infer_schema_length: usize) -> Result<()> {
    print_io(&args.input, args.weight.as_deref(), None);
    let df = load_records(&args.input, infer_schema_length)?;

    match &args.by {
        None => {
            print_step_header(1, "Frequency Table");
            let table = frequency_table(&df, &args.column, args.weight.as_deref())
                .with_context(|| format!("Failed to tabulate '{}'", args.column))?;
            display_frequency_table(&table);
        }
        Some(by) => {
            print_step_header(1, "Cross Tabulation");
            let crosstab = cross_tab(&df, &args.column, by, args.weight.as_deref())
                .with_context(|| format!("Failed to cross tabulate '{}' by '{}'", args.column, by))?;
            display_cross_tab(&crosstab);
        }
    }
    Ok(())
}
