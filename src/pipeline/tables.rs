//! Frequency tables and cross tabulations
//!
//! Tables are unweighted counts by default. With a weight column every cell
//! holds the sum of weights instead. A Pearson chi-square test of
//! independence is attached to unweighted cross tabulations only; a correct
//! weighted test needs design information this crate does not model.

use std::collections::BTreeMap;

use polars::prelude::*;
use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF};
use tracing::{debug, warn};

use super::columns::{category_values, numeric_values};
use super::error::{Result, SurveyError};

/// One level of a frequency table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyRow {
    pub level: String,
    /// Row count, or sum of weights for weighted tables
    pub value: f64,
    /// `value / total`
    pub proportion: f64,
}

/// Distribution of a categorical column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyTable {
    pub column: String,
    pub weighted: bool,
    /// Levels sorted by label
    pub rows: Vec<FrequencyRow>,
    pub total: f64,
}

impl FrequencyTable {
    /// Value of a level, if present
    pub fn value(&self, level: &str) -> Option<f64> {
        self.rows.iter().find(|r| r.level == level).map(|r| r.value)
    }
}

/// Pearson chi-square test of independence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChiSquareTest {
    pub statistic: f64,
    pub degrees_of_freedom: usize,
    pub p_value: f64,
}

/// Two-way table of counts or weighted sums
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossTab {
    pub row_variable: String,
    pub column_variable: String,
    pub weighted: bool,
    pub row_levels: Vec<String>,
    pub column_levels: Vec<String>,
    /// `cells[i][j]` for row level `i` and column level `j`
    pub cells: Vec<Vec<f64>>,
    pub row_totals: Vec<f64>,
    pub column_totals: Vec<f64>,
    pub grand_total: f64,
    /// `None` for weighted tables and for tables with a single row or column level
    pub chi_square: Option<ChiSquareTest>,
}

impl CrossTab {
    /// Cell value by level names
    pub fn cell(&self, row_level: &str, column_level: &str) -> Option<f64> {
        let i = self.row_levels.iter().position(|l| l == row_level)?;
        let j = self.column_levels.iter().position(|l| l == column_level)?;
        Some(self.cells[i][j])
    }
}

/// Per-row weights, `None` where the weight is missing. Without a weight
/// column every row has weight 1.
fn row_weights(df: &DataFrame, weight_column: Option<&str>) -> Result<Vec<Option<f64>>> {
    match weight_column {
        Some(name) => Ok(numeric_values(df, name, "Weight")?
            .into_iter()
            .map(|w| w.filter(|w| !w.is_nan()))
            .collect()),
        None => Ok(vec![Some(1.0); df.height()]),
    }
}

/// Frequency table of `column`, optionally weighted.
///
/// # Errors
/// `InvalidInput` when a column is missing, the weight column is not numeric,
/// or no row has both a level and a weight.
pub fn frequency_table(
    df: &DataFrame,
    column: &str,
    weight_column: Option<&str>,
) -> Result<FrequencyTable> {
    let levels = category_values(df, column, "Frequency")?;
    let weights = row_weights(df, weight_column)?;

    let mut sums: BTreeMap<String, f64> = BTreeMap::new();
    let mut complete = 0usize;
    for (level, w) in levels.into_iter().zip(weights) {
        if let (Some(level), Some(w)) = (level, w) {
            *sums.entry(level).or_insert(0.0) += w;
            complete += 1;
        }
    }

    if complete == 0 {
        return Err(SurveyError::invalid(format!(
            "No complete cases for frequency table of '{}'",
            column
        )));
    }

    let total: f64 = sums.values().sum();
    let rows = sums
        .into_iter()
        .map(|(level, value)| FrequencyRow {
            level,
            value,
            proportion: if total == 0.0 { 0.0 } else { value / total },
        })
        .collect();

    Ok(FrequencyTable {
        column: column.to_string(),
        weighted: weight_column.is_some(),
        rows,
        total,
    })
}

/// Cross tabulation of `row` by `col`, optionally weighted.
///
/// Unweighted tables carry a chi-square test of independence. For weighted
/// tables the test is skipped and a warning is logged.
pub fn cross_tab(
    df: &DataFrame,
    row: &str,
    col: &str,
    weight_column: Option<&str>,
) -> Result<CrossTab> {
    let row_values = category_values(df, row, "Row")?;
    let col_values = category_values(df, col, "Column")?;
    let weights = row_weights(df, weight_column)?;

    let mut sums: BTreeMap<(String, String), f64> = BTreeMap::new();
    let mut row_set: BTreeMap<String, usize> = BTreeMap::new();
    let mut col_set: BTreeMap<String, usize> = BTreeMap::new();

    for ((r, c), w) in row_values.into_iter().zip(col_values).zip(weights) {
        if let (Some(r), Some(c), Some(w)) = (r, c, w) {
            row_set.insert(r.clone(), 0);
            col_set.insert(c.clone(), 0);
            *sums.entry((r, c)).or_insert(0.0) += w;
        }
    }

    if sums.is_empty() {
        return Err(SurveyError::invalid(format!(
            "No complete cases for cross tabulation of '{}' by '{}'",
            row, col
        )));
    }

    for (i, v) in row_set.values_mut().enumerate() {
        *v = i;
    }
    for (j, v) in col_set.values_mut().enumerate() {
        *v = j;
    }

    let mut cells = vec![vec![0.0; col_set.len()]; row_set.len()];
    for ((r, c), value) in &sums {
        cells[row_set[r]][col_set[c]] = *value;
    }

    let row_totals: Vec<f64> = cells.iter().map(|r| r.iter().sum()).collect();
    let column_totals: Vec<f64> = (0..col_set.len())
        .map(|j| cells.iter().map(|r| r[j]).sum())
        .collect();
    let grand_total: f64 = row_totals.iter().sum();

    let weighted = weight_column.is_some();
    let chi_square = if weighted {
        warn!(
            row,
            col, "chi-square test is not computed for weighted cross tabulations"
        );
        None
    } else {
        chi_square_test(&cells, &row_totals, &column_totals, grand_total)
    };

    Ok(CrossTab {
        row_variable: row.to_string(),
        column_variable: col.to_string(),
        weighted,
        row_levels: row_set.into_keys().collect(),
        column_levels: col_set.into_keys().collect(),
        cells,
        row_totals,
        column_totals,
        grand_total,
        chi_square,
    })
}

/// Pearson chi-square statistic against the independence model.
///
/// Returns `None` when the table has fewer than two rows or columns.
pub fn chi_square_test(
    cells: &[Vec<f64>],
    row_totals: &[f64],
    column_totals: &[f64],
    grand_total: f64,
) -> Option<ChiSquareTest> {
    if row_totals.len() < 2 || column_totals.len() < 2 || grand_total <= 0.0 {
        debug!("chi-square test skipped: degenerate table");
        return None;
    }

    let mut statistic = 0.0;
    for (i, row) in cells.iter().enumerate() {
        for (j, &observed) in row.iter().enumerate() {
            let expected = row_totals[i] * column_totals[j] / grand_total;
            if expected > 0.0 {
                statistic += (observed - expected).powi(2) / expected;
            }
        }
    }

    let degrees_of_freedom = (row_totals.len() - 1) * (column_totals.len() - 1);
    let distribution = ChiSquared::new(degrees_of_freedom as f64).ok()?;
    let p_value = (1.0 - distribution.cdf(statistic)).clamp(0.0, 1.0);

    Some(ChiSquareTest {
        statistic,
        degrees_of_freedom,
        p_value,
    })
}
