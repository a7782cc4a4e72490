//! Population targets for raking
//!
//! A raking run is driven by an ordered list of margins. Each margin names a
//! categorical column and maps its levels to population totals. The order of
//! the list is the order in which margins are fitted within an iteration.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One raking variable and its level -> target total mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RakingMargin {
    /// Categorical column in the record set
    pub variable: String,
    /// Level name -> non-negative population total
    pub targets: BTreeMap<String, f64>,
}

impl RakingMargin {
    /// Create a margin from any iterable of (level, target) pairs
    pub fn new<I, K>(variable: impl Into<String>, targets: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            variable: variable.into(),
            targets: targets.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Sum of all level targets
    pub fn total(&self) -> f64 {
        self.targets.values().sum()
    }
}

/// On-disk layout of a targets file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetsFile {
    pub margins: Vec<RakingMargin>,
}

/// Load raking margins from a JSON targets file.
///
/// ```json
/// {"margins": [{"variable": "gender", "targets": {"Male": 3, "Female": 2}}]}
/// ```
pub fn load_targets(path: &Path) -> Result<Vec<RakingMargin>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read targets file: {}", path.display()))?;
    parse_targets(&text)
        .with_context(|| format!("Failed to parse targets file: {}", path.display()))
}

/// Parse raking margins from JSON text
pub fn parse_targets(text: &str) -> Result<Vec<RakingMargin>> {
    let file: TargetsFile = serde_json::from_str(text)?;
    if file.margins.is_empty() {
        anyhow::bail!("Targets file defines no margins");
    }
    Ok(file.margins)
}
