//! Comparison and matching configuration

use crate::error::{Result, TabmatchError};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Equality policy for the table comparator.
///
/// The default is the strictest policy: positional columns and rows,
/// exact float equality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompareConfig {
    /// Column positions must match, not just names and types
    pub strict_column_order: bool,
    /// Rows are compared positionally instead of after canonical sorting
    pub strict_row_order: bool,
    /// Inclusive absolute tolerance for float cells
    pub float_epsilon: f64,
    /// Treat a change in column nullability as a schema difference
    pub check_nullability: bool,
    /// Columns dropped from both sides before comparing
    pub ignore_columns: Vec<String>,
    /// Keep scanning after the first divergent cell and count them all
    pub full_diff: bool,
    /// Align rows by these columns instead of by position or full-row sort.
    /// Each key must be unique on both sides.
    pub key_columns: Vec<String>,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            strict_column_order: true,
            strict_row_order: true,
            float_epsilon: 0.0,
            check_nullability: false,
            ignore_columns: Vec::new(),
            full_diff: false,
            key_columns: Vec::new(),
        }
    }
}

impl CompareConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.float_epsilon.is_finite() || self.float_epsilon < 0.0 {
            return Err(TabmatchError::config(format!(
                "Float epsilon must be a finite, non-negative number: {}",
                self.float_epsilon
            )));
        }
        if let Some(ignored) = self
            .key_columns
            .iter()
            .find(|k| self.ignore_columns.contains(k))
        {
            return Err(TabmatchError::config(format!(
                "Key column '{}' is also ignored",
                ignored
            )));
        }
        for (i, key) in self.key_columns.iter().enumerate() {
            if self.key_columns[..i].contains(key) {
                return Err(TabmatchError::config(format!("Key column '{}' listed twice", key)));
            }
        }
        Ok(())
    }

    pub fn is_keyed(&self) -> bool {
        !self.key_columns.is_empty()
    }
}

/// How files are discovered and paired across the two trees
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatchConfig {
    /// File extensions to compare; empty means every extension a loader handles
    pub extensions: Vec<String>,
    /// Worker threads; 0 means one per available core
    pub workers: usize,
    /// Pair files whose relative paths differ only in letter case
    pub case_insensitive: bool,
    /// Also report files that exist only under the right root
    pub report_right_only: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            extensions: Vec::new(),
            workers: 0,
            case_insensitive: false,
            report_right_only: false,
        }
    }
}

impl MatchConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(bad) = self
            .extensions
            .iter()
            .find(|e| normalize_extension(e).is_empty())
        {
            return Err(TabmatchError::config(format!("Invalid file extension: '{}'", bad)));
        }
        Ok(())
    }

    /// Lowercased extensions without leading dots
    pub fn normalized_extensions(&self) -> Vec<String> {
        let mut extensions: Vec<String> = self
            .extensions
            .iter()
            .map(|e| normalize_extension(e))
            .collect();
        extensions.sort();
        extensions.dedup();
        extensions
    }

    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_ascii_lowercase()
}

/// Complete run settings, optionally read from a JSON file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub compare: CompareConfig,
    pub matching: MatchConfig,
}

impl Settings {
    /// Load settings from a JSON file; absent fields keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&content).map_err(|e| {
            TabmatchError::config(format!("Invalid config file {}: {}", path.display(), e))
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.compare.validate()?;
        self.matching.validate()
    }
}
