//! `svykit clean` - duplicates, imputation, category mappings and weight normalization

use std::time::Instant;

use anyhow::{Context, Result};
use console::style;

use crate::cli::CleanArgs;
use crate::pipeline::{
    get_weights, impute_missing, load_category_mappings, load_records, normalize_weights,
    profile_missing_values, remove_duplicates, save_records, standardize_categories,
};
use crate::utils::{
    print_completion, print_info, print_io, print_step_header, print_step_time, print_success,
};

pub fn run_clean(args: &CleanArgs, infer_schema_length: usize) -> Result<()> {
    let output_path = args.output_path();
    print_io(&args.input, args.normalize_weight.as_deref(), Some(&output_path));

    let mut df = load_records(&args.input, infer_schema_length)?;

    // Step 1: Missing value profile
    print_step_header(1, "Missing Values");
    let step_start = Instant::now();
    let weights = get_weights(&df, args.normalize_weight.as_deref())?;
    let profiles = profile_missing_values(&df, &weights, args.normalize_weight.as_deref())?;
    let incomplete: Vec<_> = profiles.iter().filter(|p| p.missing > 0).collect();
    if incomplete.is_empty() {
        print_info("No missing values");
    } else {
        for profile in incomplete {
            println!(
                "      {} {}: {} missing ({:.1}%)",
                style("•").dim(),
                profile.column,
                style(profile.missing).yellow(),
                profile.weighted_ratio * 100.0
            );
        }
    }
    print_step_time(step_start.elapsed());

    // Step 2: Transformations
    print_step_header(2, "Clean");
    let step_start = Instant::now();

    if args.dedupe {
        let subset = (!args.dedupe_on.is_empty()).then_some(args.dedupe_on.as_slice());
        let (deduped, removed) = remove_duplicates(&df, subset)?;
        df = deduped;
        print_success(&format!("Removed {} duplicate row(s)", removed));
    }

    for spec in &args.impute {
        df = impute_missing(&df, &spec.column, spec.strategy)
            .with_context(|| format!("Failed to impute '{}'", spec.column))?;
        print_success(&format!("Imputed '{}' with {}", spec.column, spec.strategy));
    }

    if let Some(mapping_path) = &args.mapping {
        for mapping in load_category_mappings(mapping_path)? {
            df = standardize_categories(&df, &mapping)?;
            print_success(&format!(
                "Standardized '{}' ({} mapping(s))",
                mapping.column,
                mapping.mapping.len()
            ));
        }
    }

    if let Some(weight) = &args.normalize_weight {
        df = normalize_weights(&df, weight, args.normalize_total)?;
        print_success(&format!("Normalized weight column '{}'", weight));
    }
    print_step_time(step_start.elapsed());

    // Step 3: Save
    print_step_header(3, "Save Results");
    save_records(&mut df, &output_path)?;
    print_success(&format!("Saved to {}", output_path.display()));

    print_completion("Cleaning complete!");
    Ok(())
}
