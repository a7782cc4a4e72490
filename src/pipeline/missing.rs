//! Missing-value profile of a record set

use polars::prelude::*;

use super::error::{Result, SurveyError};
use super::weights::total_weight;

/// Missing cells of one column
#[derive(Debug, Clone, PartialEq)]
pub struct MissingProfile {
    pub column: String,
    /// Number of null cells
    pub missing: usize,
    /// Share of the total weight carried by rows with a null cell
    pub weighted_ratio: f64,
}

/// Profile missing values of every column except the weight column.
///
/// With equal weights `weighted_ratio` is the plain null share. Results are
/// sorted by ratio, highest first.
pub fn profile_missing_values(
    df: &DataFrame,
    weights: &[f64],
    weight_column: Option<&str>,
) -> Result<Vec<MissingProfile>> {
    if df.height() == 0 {
        return Ok(Vec::new());
    }
    if weights.len() != df.height() {
        return Err(SurveyError::invalid(format!(
            "Expected {} weights, got {}",
            df.height(),
            weights.len()
        )));
    }

    let total = total_weight(weights);
    if total == 0.0 {
        return Err(SurveyError::invalid(
            "Total weight is zero - cannot compute missing ratios",
        ));
    }

    let mut profiles: Vec<MissingProfile> = df
        .get_columns()
        .iter()
        .filter(|col| Some(col.name().as_str()) != weight_column)
        .map(|col| {
            let nulls = col.as_materialized_series().is_null();
            let weighted_missing: f64 = nulls
                .into_iter()
                .zip(weights.iter())
                .filter_map(|(is_null, &w)| (is_null == Some(true)).then_some(w))
                .sum();

            MissingProfile {
                column: col.name().to_string(),
                missing: col.null_count(),
                weighted_ratio: weighted_missing / total,
            }
        })
        .collect();

    profiles.sort_by(|a, b| {
        b.weighted_ratio
            .partial_cmp(&a.weighted_ratio)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(profiles)
}
