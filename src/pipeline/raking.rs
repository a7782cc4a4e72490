//! Raking (iterative proportional fitting) of survey weights
//!
//! Weights are rescaled margin by margin so that, for every raking variable,
//! the weighted total of each level matches its population target. A full
//! pass over all margins is one iteration; iterations repeat until the
//! largest relative weight change drops below the tolerance and every margin
//! is within tolerance of its targets, or until the iteration cap is reached.
//! Margins whose totals disagree can never all be met, so they always run to
//! the cap.
//!
//! Margin order matters: within an iteration margins are fitted in the order
//! given, and different orders can reach slightly different fixed points.

use std::collections::{BTreeMap, HashMap, HashSet};

use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::columns::{category_values, require_column};
use super::error::{ConvergenceWarning, Result, SurveyError};
use super::targets::RakingMargin;
use super::weights::{get_weights, with_weights};

/// Default iteration cap
pub const DEFAULT_MAX_ITERATIONS: usize = 50;

/// Default convergence tolerance on the maximum relative weight change
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Stopping rules for a raking run
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RakingConfig {
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for RakingConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl RakingConfig {
    fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(SurveyError::invalid("max_iterations must be at least 1"));
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(SurveyError::invalid(format!(
                "tolerance must be a positive number, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Result of a raking run
#[derive(Debug, Clone)]
pub struct RakingOutcome {
    /// Copy of the input with the weight column replaced by raked weights
    pub data: DataFrame,
    /// Whether weights settled and every margin matched before the iteration cap
    pub converged: bool,
    /// Number of iterations performed
    pub iterations: usize,
    /// Largest relative weight change in the last iteration
    pub max_relative_change: Option<f64>,
    /// Set when the iteration cap was reached without convergence
    pub warning: Option<ConvergenceWarning>,
}

/// Row -> level assignment for one margin, with the target of each level.
struct MarginIndex {
    /// Level index per row, `None` for rows with a missing value
    row_levels: Vec<Option<usize>>,
    /// Target per level index, `None` for levels without a target
    level_targets: Vec<Option<f64>>,
}

impl MarginIndex {
    fn build(df: &DataFrame, margin: &RakingMargin) -> Result<Self> {
        let values = category_values(df, &margin.variable, "Raking variable")?;

        let mut level_ids: HashMap<String, usize> = HashMap::new();
        let mut level_targets: Vec<Option<f64>> = Vec::new();

        let row_levels: Vec<Option<usize>> = values
            .into_iter()
            .map(|value| {
                value.map(|level| {
                    let next_id = level_ids.len();
                    *level_ids.entry(level).or_insert_with_key(|key| {
                        level_targets.push(margin.targets.get(key).copied());
                        next_id
                    })
                })
            })
            .collect();

        Ok(Self {
            row_levels,
            level_targets,
        })
    }

    /// Rescale `weights` so that each targeted level sums to its target.
    ///
    /// Levels with zero weighted mass, a non-finite ratio, or no target keep
    /// an adjustment factor of 1.0.
    fn apply(&self, weights: &mut [f64]) {
        let sums = self.level_sums(weights);

        let factors: Vec<f64> = self
            .level_targets
            .iter()
            .zip(sums.iter())
            .map(|(target, &sum)| match target {
                Some(t) if sum > 0.0 => {
                    let factor = t / sum;
                    if factor.is_finite() {
                        factor
                    } else {
                        1.0
                    }
                }
                _ => 1.0,
            })
            .collect();

        for (level, w) in self.row_levels.iter().zip(weights.iter_mut()) {
            if let Some(g) = level {
                *w *= factors[*g];
            }
        }
    }

    /// Largest `|sum - target| / max(target, 1)` over targeted levels with
    /// positive weighted mass. Zero-mass levels cannot be fitted and are
    /// skipped.
    fn max_target_gap(&self, weights: &[f64]) -> f64 {
        self.level_targets
            .iter()
            .zip(self.level_sums(weights))
            .filter_map(|(target, sum)| match target {
                Some(t) if sum > 0.0 => Some((sum - t).abs() / t.max(1.0)),
                _ => None,
            })
            .fold(0.0, f64::max)
    }

    /// Sum of positive weights per level
    fn level_sums(&self, weights: &[f64]) -> Vec<f64> {
        let mut sums = vec![0.0; self.level_targets.len()];
        for (level, &w) in self.row_levels.iter().zip(weights.iter()) {
            if let Some(g) = level {
                if w > 0.0 {
                    sums[*g] += w;
                }
            }
        }
        sums
    }
}

/// Rake a weight column against exactly two margins.
///
/// This is the two-variable contract: the first margin is fitted before the
/// second within every iteration. See [`rake_margins`] for any number of
/// margins.
///
/// # Errors
/// `InvalidInput` when the frame is empty, the weight column is missing or
/// not numeric, `margins` does not hold exactly two entries, or a margin
/// variable is missing from the frame.
pub fn rake(
    df: &DataFrame,
    weight_column: &str,
    margins: &[RakingMargin],
    config: &RakingConfig,
) -> Result<RakingOutcome> {
    if margins.len() != 2 {
        return Err(SurveyError::invalid(format!(
            "Raking requires exactly two target variables, got {}",
            margins.len()
        )));
    }
    rake_margins(df, weight_column, margins, config)
}

/// Rake a weight column against an ordered sequence of margins.
///
/// The input frame is never modified; the returned frame is a copy whose
/// weight column holds the raked weights as Float64. Reaching the iteration
/// cap is not an error: the best-effort weights are returned together with a
/// [`ConvergenceWarning`].
pub fn rake_margins(
    df: &DataFrame,
    weight_column: &str,
    margins: &[RakingMargin],
    config: &RakingConfig,
) -> Result<RakingOutcome> {
    config.validate()?;

    if df.height() == 0 {
        return Err(SurveyError::invalid("Record set is empty"));
    }
    if margins.is_empty() {
        return Err(SurveyError::invalid("At least one raking margin is required"));
    }

    require_column(df, weight_column, "Weight")?;

    let mut seen = HashSet::new();
    for margin in margins {
        if !seen.insert(margin.variable.as_str()) {
            return Err(SurveyError::invalid(format!(
                "Raking variable '{}' is listed more than once",
                margin.variable
            )));
        }
        require_column(df, &margin.variable, "Raking variable")?;
        if let Some((level, target)) = margin
            .targets
            .iter()
            .find(|(_, t)| !t.is_finite() || **t < 0.0)
        {
            return Err(SurveyError::invalid(format!(
                "Target for '{}' = '{}' must be a non-negative number, got {}",
                margin.variable, level, target
            )));
        }
    }

    let mut weights = get_weights(df, Some(weight_column))?;
    let indices = margins
        .iter()
        .map(|margin| MarginIndex::build(df, margin))
        .collect::<Result<Vec<_>>>()?;

    let mut converged = false;
    let mut iterations = 0;
    let mut max_change = None;
    let mut target_gap = 0.0;

    while iterations < config.max_iterations {
        iterations += 1;
        let previous = weights.clone();

        for index in &indices {
            index.apply(&mut weights);
        }

        max_change = max_relative_change(&weights, &previous);
        // Settled weights only count when every margin is met, not just the last one
        target_gap = indices
            .iter()
            .map(|index| index.max_target_gap(&weights))
            .fold(0.0, f64::max);
        debug!(
            iteration = iterations,
            max_relative_change = ?max_change,
            max_target_gap = target_gap,
            "raking iteration"
        );

        if matches!(max_change, Some(change) if change < config.tolerance)
            && target_gap <= config.tolerance
        {
            converged = true;
            break;
        }
    }

    let warning = if converged {
        info!(iterations, "raking converged");
        None
    } else {
        let warning = ConvergenceWarning {
            iterations,
            max_relative_change: max_change,
            max_target_gap: target_gap,
            tolerance: config.tolerance,
        };
        warn!("{}", warning);
        Some(warning)
    };

    Ok(RakingOutcome {
        data: with_weights(df, weight_column, weights)?,
        converged,
        iterations,
        max_relative_change: max_change,
        warning,
    })
}

/// Largest `|new - old| / old` over rows whose old weight is non-zero.
///
/// Returns `None` when every old weight is zero.
pub fn max_relative_change(current: &[f64], previous: &[f64]) -> Option<f64> {
    current
        .iter()
        .zip(previous.iter())
        .filter(|&(_, &prev)| prev != 0.0)
        .map(|(&curr, &prev)| (curr - prev).abs() / prev.abs())
        .fold(None, |acc: Option<f64>, change| {
            Some(acc.map_or(change, |m| m.max(change)))
        })
}

/// Weighted total of every level of `variable`.
///
/// Null levels are skipped; null weights count as 1.0 like in raking.
pub fn weighted_margin_totals(
    df: &DataFrame,
    weight_column: &str,
    variable: &str,
) -> Result<BTreeMap<String, f64>> {
    let weights = get_weights(df, Some(weight_column))?;
    let levels = category_values(df, variable, "Raking variable")?;

    let mut totals = BTreeMap::new();
    for (level, w) in levels.into_iter().zip(weights) {
        if let Some(level) = level {
            *totals.entry(level).or_insert(0.0) += w;
        }
    }
    Ok(totals)
}
