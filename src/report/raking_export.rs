//! JSON export of raking diagnostics

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::pipeline::{ConvergenceWarning, RakingConfig, RakingMargin};

use super::summary::{MarginCheck, RakingSummary};

/// Metadata about the raking run
#[derive(Serialize)]
pub struct RakingMetadata {
    /// Timestamp of the run (RFC 3339)
    pub timestamp: String,
    /// svykit version
    pub svykit_version: String,
    /// Input file path
    pub input_file: String,
    /// Weight column that was raked
    pub weight_column: String,
    /// Raking variables in fitting order
    pub variables: Vec<String>,
    /// Stopping rules
    pub config: RakingConfig,
}

/// Convergence diagnostics
#[derive(Serialize)]
pub struct RakingDiagnostics {
    pub converged: bool,
    pub iterations: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_relative_change: Option<f64>,
    pub max_abs_deviation: f64,
    pub initial_weight_total: f64,
    pub final_weight_total: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Complete raking report
#[derive(Serialize)]
pub struct RakingExport {
    pub metadata: RakingMetadata,
    pub diagnostics: RakingDiagnostics,
    pub margins: Vec<MarginCheck>,
}

impl RakingExport {
    pub fn new(
        input_file: &str,
        weight_column: &str,
        margins: &[RakingMargin],
        config: RakingConfig,
        summary: &RakingSummary,
        warning: Option<&ConvergenceWarning>,
    ) -> Self {
        Self {
            metadata: RakingMetadata {
                timestamp: Utc::now().to_rfc3339(),
                svykit_version: env!("CARGO_PKG_VERSION").to_string(),
                input_file: input_file.to_string(),
                weight_column: weight_column.to_string(),
                variables: margins.iter().map(|m| m.variable.clone()).collect(),
                config,
            },
            diagnostics: RakingDiagnostics {
                converged: summary.converged,
                iterations: summary.iterations,
                max_relative_change: summary.max_relative_change,
                max_abs_deviation: summary.max_abs_deviation(),
                initial_weight_total: summary.initial_weight_total,
                final_weight_total: summary.final_weight_total,
                warning: warning.map(|w| w.to_string()),
            },
            margins: summary.margins.clone(),
        }
    }
}

/// Write the raking report as pretty-printed JSON
pub fn export_raking_report(path: &Path, report: &RakingExport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize raking report")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write raking report: {}", path.display()))?;
    Ok(())
}
