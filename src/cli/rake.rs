//! `svykit rake` - calibrate a weight column to population margins

use std::time::Instant;

use anyhow::{Context, Result};
use console::style;

use crate::cli::RakeArgs;
use crate::pipeline::{load_records, load_targets, rake, save_records, RakingConfig};
use crate::report::{export_raking_report, RakingExport, RakingSummary};
use crate::utils::{
    create_spinner, finish_with_success, finish_with_warning, print_completion, print_io,
    print_step_header, print_step_time, print_success, print_warning,
};

pub fn run_rake(args: &RakeArgs, infer_schema_length: usize) -> Result<()> {
    let output_path = args.output_path();
    print_io(&args.input, Some(&args.weight), Some(&output_path));

    // Step 1: Load records and targets
    print_step_header(1, "Load Data");
    let step_start = Instant::now();
    let spinner = create_spinner("Loading records...");
    let df = load_records(&args.input, infer_schema_length)?;
    finish_with_success(
        &spinner,
        &format!("Loaded {} rows × {} columns", df.height(), df.width()),
    );

    let margins = load_targets(&args.targets)?;
    for margin in &margins {
        println!(
            "      {} {} ({} levels, total {:.2})",
            style("•").dim(),
            style(&margin.variable).cyan(),
            margin.targets.len(),
            margin.total()
        );
    }
    print_step_time(step_start.elapsed());

    // Step 2: Rake
    print_step_header(2, "Raking");
    let step_start = Instant::now();
    let config = RakingConfig {
        max_iterations: args.max_iterations,
        tolerance: args.tolerance,
    };

    let spinner = create_spinner("Raking weights...");
    let outcome = rake(&df, &args.weight, &margins, &config)
        .with_context(|| format!("Failed to rake '{}'", args.weight))?;

    match &outcome.warning {
        None => finish_with_success(
            &spinner,
            &format!("Converged after {} iteration(s)", outcome.iterations),
        ),
        Some(warning) => {
            finish_with_warning(&spinner, "Raking did not converge");
            print_warning(&warning.to_string());
        }
    }
    print_step_time(step_start.elapsed());

    let summary = RakingSummary::from_outcome(&df, &outcome, &args.weight, &margins)?;
    summary.display();

    // Step 3: Save
    print_step_header(3, "Save Results");
    let step_start = Instant::now();
    let mut raked = outcome.data.clone();
    save_records(&mut raked, &output_path)?;
    print_success(&format!("Saved to {}", output_path.display()));

    if let Some(report_path) = &args.report {
        let report = RakingExport::new(
            &args.input.display().to_string(),
            &args.weight,
            &margins,
            config,
            &summary,
            outcome.warning.as_ref(),
        );
        export_raking_report(report_path, &report)?;
        print_success(&format!("Report written to {}", report_path.display()));
    }
    print_step_time(step_start.elapsed());

    print_completion("Raking complete!");
    Ok(())
}
