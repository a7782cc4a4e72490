//! Record cleaning: duplicate removal, missing-value imputation and
//! category standardization.
//!
//! All functions take the record set by reference and return a new one.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::Context;
use clap::ValueEnum;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::columns::{category_values, column_to_strings, numeric_values, require_column};
use super::error::{Result, SurveyError};

/// How missing cells of a column are filled
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImputeStrategy {
    /// Arithmetic mean of the observed values (numeric columns only)
    Mean,
    /// Median of the observed values (numeric columns only)
    Median,
    /// Most frequent observed value; ties go to the smallest value
    Mode,
}

impl std::fmt::Display for ImputeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImputeStrategy::Mean => write!(f, "mean"),
            ImputeStrategy::Median => write!(f, "median"),
            ImputeStrategy::Mode => write!(f, "mode"),
        }
    }
}

/// Lookup table rewriting raw category labels of one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMapping {
    pub column: String,
    /// Raw label -> standardized label
    pub mapping: BTreeMap<String, String>,
}

impl CategoryMapping {
    pub fn new<I, K, V>(column: impl Into<String>, mapping: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            column: column.into(),
            mapping: mapping
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Remove duplicate rows, keeping the first occurrence.
///
/// With `subset` only those columns form the duplicate key. Returns the
/// de-duplicated frame and the number of removed rows.
pub fn remove_duplicates(df: &DataFrame, subset: Option<&[String]>) -> Result<(DataFrame, usize)> {
    let key_columns: Vec<String> = match subset {
        Some(cols) if !cols.is_empty() => cols.to_vec(),
        Some(_) => return Err(SurveyError::invalid("Duplicate key subset is empty")),
        None => df.get_column_names().iter().map(|s| s.to_string()).collect(),
    };

    let key_values = key_columns
        .iter()
        .map(|name| column_to_strings(require_column(df, name, "Duplicate key")?))
        .collect::<Result<Vec<_>>>()?;

    let mut seen: HashSet<Vec<Option<String>>> = HashSet::with_capacity(df.height());
    let keep: Vec<bool> = (0..df.height())
        .map(|row| {
            let key: Vec<Option<String>> = key_values.iter().map(|col| col[row].clone()).collect();
            seen.insert(key)
        })
        .collect();

    let removed = keep.iter().filter(|k| !**k).count();
    let mask = BooleanChunked::new("keep".into(), keep.as_slice());
    let deduped = df.filter(&mask)?;

    debug!(removed, "duplicate rows removed");
    Ok((deduped, removed))
}

/// Fill missing cells of `column` using `strategy`.
///
/// Mean and median produce a Float64 column. Mode keeps the column's dtype
/// for numeric columns and produces a String column otherwise.
pub fn impute_missing(df: &DataFrame, column: &str, strategy: ImputeStrategy) -> Result<DataFrame> {
    let col = require_column(df, column, "Imputation")?;
    let is_numeric = col.dtype().is_primitive_numeric();
    let original_dtype = col.dtype().clone();

    let filled = match strategy {
        ImputeStrategy::Mean | ImputeStrategy::Median => {
            let values = numeric_values(df, column, "Imputation")?;
            let observed = observed_numbers(&values, column)?;
            let fill = if strategy == ImputeStrategy::Mean {
                observed.iter().sum::<f64>() / observed.len() as f64
            } else {
                median(observed)
            };
            let out: Vec<f64> = values.into_iter().map(|v| v.unwrap_or(fill)).collect();
            Series::new(column.into(), out)
        }
        ImputeStrategy::Mode if is_numeric => {
            let values = numeric_values(df, column, "Imputation")?;
            let fill = numeric_mode(observed_numbers(&values, column)?);
            let out: Vec<f64> = values.into_iter().map(|v| v.unwrap_or(fill)).collect();
            Series::new(column.into(), out).cast(&original_dtype)?
        }
        ImputeStrategy::Mode => {
            let values = category_values(df, column, "Imputation")?;
            let fill = label_mode(&values).ok_or_else(|| {
                SurveyError::invalid(format!("Column '{}' has no observed values to impute from", column))
            })?;
            let out: Vec<String> = values
                .into_iter()
                .map(|v| v.unwrap_or_else(|| fill.clone()))
                .collect();
            Series::new(column.into(), out)
        }
    };

    let mut out = df.clone();
    out.with_column(filled)?;
    Ok(out)
}

/// Rewrite the labels of `mapping.column`.
///
/// Labels are trimmed before lookup; unmapped labels are kept (trimmed).
/// The result is a String column.
pub fn standardize_categories(df: &DataFrame, mapping: &CategoryMapping) -> Result<DataFrame> {
    let values = category_values(df, &mapping.column, "Category")?;

    let standardized: Vec<Option<String>> = values
        .into_iter()
        .map(|v| {
            v.map(|raw| {
                let trimmed = raw.trim();
                mapping
                    .mapping
                    .get(trimmed)
                    .cloned()
                    .unwrap_or_else(|| trimmed.to_string())
            })
        })
        .collect();

    let mut out = df.clone();
    out.with_column(Series::new(mapping.column.as_str().into(), standardized))?;
    Ok(out)
}

/// Load category mappings from a JSON file holding a list of mappings.
pub fn load_category_mappings(path: &Path) -> anyhow::Result<Vec<CategoryMapping>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read mapping file: {}", path.display()))?;
    let mappings: Vec<CategoryMapping> = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse mapping file: {}", path.display()))?;
    Ok(mappings)
}

fn observed_numbers(values: &[Option<f64>], column: &str) -> Result<Vec<f64>> {
    let observed: Vec<f64> = values.iter().flatten().copied().filter(|v| !v.is_nan()).collect();
    if observed.is_empty() {
        return Err(SurveyError::invalid(format!(
            "Column '{}' has no observed values to impute from",
            column
        )));
    }
    Ok(observed)
}

fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

fn numeric_mode(mut values: Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));

    let mut best = values[0];
    let mut best_run = 0usize;
    let mut run_start = 0usize;
    for i in 1..=values.len() {
        if i == values.len() || values[i] != values[run_start] {
            if i - run_start > best_run {
                best_run = i - run_start;
                best = values[run_start];
            }
            run_start = i;
        }
    }
    best
}

fn label_mode(values: &[Option<String>]) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for v in values.iter().flatten() {
        *counts.entry(v.as_str()).or_insert(0) += 1;
    }

    // BTreeMap iterates in label order, so the first maximum wins ties
    let mut best: Option<(&str, usize)> = None;
    for (label, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((label, count));
        }
    }
    best.map(|(label, _)| label.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(vec![3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(vec![4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn test_numeric_mode_prefers_smallest_on_tie() {
        assert_eq!(numeric_mode(vec![5.0, 2.0, 5.0, 2.0, 9.0]), 2.0);
        assert_eq!(numeric_mode(vec![7.0, 7.0, 1.0]), 7.0);
        assert_eq!(numeric_mode(vec![4.0]), 4.0);
    }

    #[test]
    fn test_label_mode() {
        let values = vec![
            Some("b".to_string()),
            None,
            Some("a".to_string()),
            Some("b".to_string()),
        ];
        assert_eq!(label_mode(&values), Some("b".to_string()));
        assert_eq!(label_mode(&[None, None]), None);
    }

    #[test]
    fn test_strategy_display() {
        assert_eq!(ImputeStrategy::Median.to_string(), "median");
    }
}
