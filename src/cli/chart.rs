//! `svykit chart` - SVG bar charts and histograms

use anyhow::Result;

use crate::cli::{ChartArgs, ChartKind};
use crate::pipeline::{frequency_table, load_records};
use crate::report::{render_bar_chart, render_histogram};
use crate::utils::{print_completion, print_io};

pub fn run_chart(args: &ChartArgs, infer_schema_length: usize) -> Result<()> {
    print_io(&args.input, args.weight.as_deref(), Some(&args.output));
    let df = load_records(&args.input, infer_schema_length)?;

    match args.kind {
        ChartKind::Bar => {
            let table = frequency_table(&df, &args.column, args.weight.as_deref())?;
            let title = match &args.weight {
                Some(w) => format!("{} (weighted by {})", args.column, w),
                None => args.column.clone(),
            };
            render_bar_chart(&table, &args.output, &title)?;
        }
        ChartKind::Histogram => {
            render_histogram(
                &df,
                &args.column,
                args.weight.as_deref(),
                args.bins,
                &args.output,
            )?;
        }
    }

    print_completion(&format!("Chart written to {}", args.output.display()));
    Ok(())
}
