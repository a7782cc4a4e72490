//! Error and warning types shared by the survey pipeline.
//!
//! `SurveyError` is the only fatal class: it is returned synchronously,
//! before any computation, when arguments are malformed. Non-convergence of
//! raking is *not* an error and is reported through [`ConvergenceWarning`].

use std::fmt;

use polars::prelude::PolarsError;
use serde::Serialize;
use thiserror::Error;

/// Errors returned by the pipeline functions.
#[derive(Error, Debug)]
pub enum SurveyError {
    /// Malformed arguments: wrong shape, wrong type, wrong cardinality of
    /// targets, or missing columns.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Failure inside polars while reading or building a frame.
    #[error(transparent)]
    Polars(#[from] PolarsError),
}

impl SurveyError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        SurveyError::InvalidInput(message.into())
    }

    /// True for validation failures.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, SurveyError::InvalidInput(_))
    }
}

pub type Result<T> = std::result::Result<T, SurveyError>;

/// Raised when raking reaches its iteration cap without meeting tolerance.
///
/// The raking call still returns its best-effort weights alongside this value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvergenceWarning {
    /// Number of iterations performed (always the configured maximum)
    pub iterations: usize,
    /// Largest relative weight change in the final iteration, if any row had
    /// a non-zero previous weight
    pub max_relative_change: Option<f64>,
    /// Largest `|achieved - target| / max(target, 1)` over targeted levels
    /// that still carry weight
    pub max_target_gap: f64,
    /// Tolerance that was not met
    pub tolerance: f64,
}

impl fmt::Display for ConvergenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max_relative_change {
            Some(change) => write!(
                f,
                "raking did not converge after {} iterations (max relative change {:.3e}, max target gap {:.3e}, tolerance {:.1e})",
                self.iterations, change, self.max_target_gap, self.tolerance
            ),
            None => write!(
                f,
                "raking did not converge after {} iterations (no row with non-zero weight)",
                self.iterations
            ),
        }
    }
}
