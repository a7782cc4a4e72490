//! Weighted descriptive statistics
//!
//! All functions use pairwise-complete rows: a row counts only when both the
//! analysis value and its weight are present.

use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;

use super::columns::numeric_values;
use super::error::{Result, SurveyError};

/// Weighted summary of one numeric column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightedSummary {
    pub column: String,
    /// Rows with both value and weight present
    pub complete_cases: usize,
    /// Sum of weights over complete rows
    pub weight_sum: f64,
    /// `sum(x * w) / sum(w)`
    pub mean: f64,
    /// `sum(x * w)`
    pub total: f64,
}

/// Collect (value, weight) pairs where both are present.
fn complete_pairs(df: &DataFrame, column: &str, weight_column: &str) -> Result<Vec<(f64, f64)>> {
    let values = numeric_values(df, column, "Analysis")?;
    let weights = numeric_values(df, weight_column, "Weight")?;

    let pairs: Vec<(f64, f64)> = values
        .into_iter()
        .zip(weights)
        .filter_map(|(x, w)| match (x, w) {
            (Some(x), Some(w)) if !x.is_nan() && !w.is_nan() => Some((x, w)),
            _ => None,
        })
        .collect();

    if pairs.is_empty() {
        return Err(SurveyError::invalid(format!(
            "No complete cases for '{}' weighted by '{}'",
            column, weight_column
        )));
    }
    Ok(pairs)
}

/// Weighted arithmetic mean `sum(x * w) / sum(w)`.
///
/// # Errors
/// `InvalidInput` when either column is missing or non-numeric, no complete
/// case remains, or the complete cases carry zero total weight.
pub fn weighted_mean(df: &DataFrame, column: &str, weight_column: &str) -> Result<f64> {
    let summary = summarize_column(df, column, weight_column)?;
    if summary.weight_sum == 0.0 {
        return Err(SurveyError::invalid(format!(
            "Total weight of complete cases for '{}' is zero",
            column
        )));
    }
    Ok(summary.mean)
}

/// Weighted total `sum(x * w)`.
pub fn weighted_total(df: &DataFrame, column: &str, weight_column: &str) -> Result<f64> {
    let pairs = complete_pairs(df, column, weight_column)?;
    Ok(pairs.iter().map(|(x, w)| x * w).sum())
}

/// Weighted summary of a single column.
///
/// `mean` is NaN when the complete cases carry zero weight.
pub fn summarize_column(df: &DataFrame, column: &str, weight_column: &str) -> Result<WeightedSummary> {
    let pairs = complete_pairs(df, column, weight_column)?;

    let weight_sum: f64 = pairs.iter().map(|(_, w)| w).sum();
    let total: f64 = pairs.iter().map(|(x, w)| x * w).sum();
    let mean = if weight_sum == 0.0 {
        f64::NAN
    } else {
        total / weight_sum
    };

    Ok(WeightedSummary {
        column: column.to_string(),
        complete_cases: pairs.len(),
        weight_sum,
        mean,
        total,
    })
}

/// Summaries of several columns, computed in parallel and returned in input order.
pub fn summarize_numeric(
    df: &DataFrame,
    columns: &[String],
    weight_column: &str,
) -> Result<Vec<WeightedSummary>> {
    columns
        .par_iter()
        .map(|column| summarize_column(df, column, weight_column))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_pairs_drops_incomplete_rows() {
        let df = df! {
            "x" => [Some(1.0f64), None, Some(3.0), Some(4.0)],
            "w" => [Some(1.0f64), Some(1.0), None, Some(2.0)],
        }
        .unwrap();

        let pairs = complete_pairs(&df, "x", "w").unwrap();
        assert_eq!(pairs, vec![(1.0, 1.0), (4.0, 2.0)]);
    }

    #[test]
    fn test_summarize_column() {
        let df = df! {
            "x" => [2.0f64, 4.0],
            "w" => [1.0f64, 3.0],
        }
        .unwrap();

        let summary = summarize_column(&df, "x", "w").unwrap();
        assert_eq!(summary.complete_cases, 2);
        assert_eq!(summary.weight_sum, 4.0);
        assert_eq!(summary.total, 14.0);
        assert_eq!(summary.mean, 3.5);
    }

    #[test]
    fn test_zero_weight_mean_errors() {
        let df = df! {
            "x" => [2.0f64, 4.0],
            "w" => [0.0f64, 0.0],
        }
        .unwrap();

        assert!(weighted_mean(&df, "x", "w").is_err());
        assert_eq!(weighted_total(&df, "x", "w").unwrap(), 0.0);
    }
}
