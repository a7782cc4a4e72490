//! Weight extraction, validation and normalization

use polars::prelude::*;
use tracing::warn;

use super::columns::require_column;
use super::error::{Result, SurveyError};

/// Extract weights from a DataFrame column, or return default weights of 1.0.
///
/// # Arguments
/// * `df` - The DataFrame to extract weights from
/// * `weight_column` - Optional name of the weight column
///
/// # Returns
/// * `Ok(Vec<f64>)` - Vector of weights (one per row)
/// * `Err(InvalidInput)` - If weight column doesn't exist, is non-numeric, or contains
///   NaN, infinite or negative values
///
/// # Behavior
/// - If `weight_column` is None, returns a vector of 1.0s (equal weights)
/// - If weight column contains null values, they default to 1.0 with a warning
/// - Zero weights are kept as-is
pub fn get_weights(df: &DataFrame, weight_column: Option<&str>) -> Result<Vec<f64>> {
    let Some(col_name) = weight_column else {
        return Ok(vec![1.0; df.height()]);
    };

    let column = require_column(df, col_name, "Weight")?;
    if !column.dtype().is_primitive_numeric() {
        return Err(SurveyError::invalid(format!(
            "Weight column '{}' must be numeric, found {}",
            col_name,
            column.dtype()
        )));
    }

    let float_col = column.cast(&DataType::Float64)?;
    let ca = float_col.f64()?;

    let mut weights = Vec::with_capacity(df.height());
    let mut null_count = 0usize;

    for opt_val in ca.into_iter() {
        match opt_val {
            Some(w) if w.is_nan() => {
                return Err(SurveyError::invalid(format!(
                    "Weight column '{}' contains NaN value. All weights must be valid numbers.",
                    col_name
                )));
            }
            Some(w) if w.is_infinite() => {
                return Err(SurveyError::invalid(format!(
                    "Weight column '{}' contains infinite value. All weights must be finite.",
                    col_name
                )));
            }
            Some(w) if w < 0.0 => {
                return Err(SurveyError::invalid(format!(
                    "Weight column '{}' contains negative value: {}. All weights must be non-negative.",
                    col_name, w
                )));
            }
            Some(w) => weights.push(w),
            None => {
                null_count += 1;
                weights.push(1.0);
            }
        }
    }

    if null_count > 0 {
        warn!(
            column = col_name,
            null_count, "weight column contains null values, defaulting to weight 1.0"
        );
    }

    Ok(weights)
}

/// Calculate the total weight (sum of all weights).
#[inline]
pub fn total_weight(weights: &[f64]) -> f64 {
    weights.iter().sum()
}

/// Return a copy of `df` with `weight_column` replaced by `weights` as Float64.
///
/// The column keeps its position; a new column is appended if it did not exist.
pub fn with_weights(df: &DataFrame, weight_column: &str, weights: Vec<f64>) -> Result<DataFrame> {
    if weights.len() != df.height() {
        return Err(SurveyError::invalid(format!(
            "Expected {} weights, got {}",
            df.height(),
            weights.len()
        )));
    }

    let mut out = df.clone();
    out.with_column(Series::new(weight_column.into(), weights))?;
    Ok(out)
}

/// Rescale the weight column so that it sums to `total`.
///
/// When `total` is `None` the weights are normalized to the row count, which
/// gives a mean weight of 1.0.
pub fn normalize_weights(
    df: &DataFrame,
    weight_column: &str,
    total: Option<f64>,
) -> Result<DataFrame> {
    let target = total.unwrap_or(df.height() as f64);
    if !target.is_finite() || target < 0.0 {
        return Err(SurveyError::invalid(format!(
            "Normalization total must be a non-negative number, got {}",
            target
        )));
    }

    let weights = get_weights(df, Some(weight_column))?;
    let current = total_weight(&weights);

    let factor = if current > 0.0 {
        target / current
    } else if target > 0.0 {
        return Err(SurveyError::invalid(format!(
            "Cannot normalize: weights in '{}' sum to 0 but target is {}",
            weight_column, target
        )));
    } else {
        1.0
    };

    let normalized = weights.into_iter().map(|w| w * factor).collect();
    with_weights(df, weight_column, normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_df() -> DataFrame {
        df! {
            "feature" => [1.0, 2.0, 3.0, 4.0, 5.0],
            "weight" => [1.0, 2.0, 0.5, 1.5, 1.0],
            "int_weight" => [1i64, 2, 1, 1, 1],
            "label" => ["a", "b", "c", "d", "e"],
        }
        .unwrap()
    }

    #[test]
    fn test_no_weight_column_returns_ones() {
        let df = create_test_df();
        let weights = get_weights(&df, None).unwrap();
        assert_eq!(weights.len(), 5);
        assert!(weights.iter().all(|&w| w == 1.0));
    }

    #[test]
    fn test_valid_weight_column() {
        let df = create_test_df();
        let weights = get_weights(&df, Some("weight")).unwrap();
        assert_eq!(weights, vec![1.0, 2.0, 0.5, 1.5, 1.0]);
    }

    #[test]
    fn test_integer_weight_column_casts_to_float() {
        let df = create_test_df();
        let weights = get_weights(&df, Some("int_weight")).unwrap();
        assert_eq!(weights, vec![1.0, 2.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_missing_weight_column_errors() {
        let df = create_test_df();
        let err = get_weights(&df, Some("nonexistent")).unwrap_err();
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_string_weight_column_errors() {
        let df = create_test_df();
        let err = get_weights(&df, Some("label")).unwrap_err();
        assert!(err.to_string().contains("must be numeric"));
    }

    #[test]
    fn test_negative_weight_errors() {
        let df = df! {
            "weight" => [1.0, -0.5],
        }
        .unwrap();
        let err = get_weights(&df, Some("weight")).unwrap_err();
        assert!(err.to_string().contains("negative value"));
    }

    #[test]
    fn test_null_weights_default_to_one() {
        let df = df! {
            "weight" => [Some(1.0), None, Some(2.0)],
        }
        .unwrap();

        let weights = get_weights(&df, Some("weight")).unwrap();
        assert_eq!(weights, vec![1.0, 1.0, 2.0]);
    }

    #[test]
    fn test_nan_and_infinite_weights_error() {
        let df = df! {
            "nan" => [1.0, f64::NAN],
            "inf" => [1.0, f64::INFINITY],
        }
        .unwrap();
        assert!(get_weights(&df, Some("nan"))
            .unwrap_err()
            .to_string()
            .contains("NaN"));
        assert!(get_weights(&df, Some("inf"))
            .unwrap_err()
            .to_string()
            .contains("infinite"));
    }

    #[test]
    fn test_total_weight() {
        let weights = vec![1.0, 2.0, 0.5, 1.5];
        assert!((total_weight(&weights) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_normalize_to_row_count() {
        let df = create_test_df();
        let normalized = normalize_weights(&df, "weight", None).unwrap();
        let weights = get_weights(&normalized, Some("weight")).unwrap();
        assert!((total_weight(&weights) - 5.0).abs() < 1e-10);
        // Relative sizes are kept
        assert!((weights[1] / weights[0] - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_normalize_to_explicit_total() {
        let df = create_test_df();
        let normalized = normalize_weights(&df, "int_weight", Some(1000.0)).unwrap();
        let weights = get_weights(&normalized, Some("int_weight")).unwrap();
        assert!((total_weight(&weights) - 1000.0).abs() < 1e-9);
        assert_eq!(normalized.column("int_weight").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn test_normalize_zero_weights_errors() {
        let df = df! {
            "weight" => [0.0, 0.0],
        }
        .unwrap();
        let err = normalize_weights(&df, "weight", Some(10.0)).unwrap_err();
        assert!(err.to_string().contains("sum to 0"));
    }

    #[test]
    fn test_with_weights_keeps_column_position() {
        let df = create_test_df();
        let out = with_weights(&df, "weight", vec![9.0; 5]).unwrap();
        assert_eq!(out.get_column_names(), df.get_column_names());
        assert_eq!(get_weights(&out, Some("weight")).unwrap(), vec![9.0; 5]);
    }
}
