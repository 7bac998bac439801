//! Command-line interface for tabmatch

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tabmatch")]
#[command(about = "Compare two directory trees of columnar data files")]
#[command(version)]
pub struct Cli {
    /// Left root directory; every data file under it gets one report line
    pub left: PathBuf,

    /// Right root directory
    pub right: PathBuf,

    /// JSON settings file; flags below are applied on top of it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Match columns by name instead of by position
    #[arg(long)]
    pub ignore_column_order: bool,

    /// Compare rows after sorting both sides instead of positionally
    #[arg(long)]
    pub ignore_row_order: bool,

    /// Absolute tolerance for floating-point cells (inclusive)
    #[arg(long, value_parser = validate_epsilon)]
    pub epsilon: Option<f64>,

    /// Report a change in column nullability as a schema difference
    #[arg(long)]
    pub check_nullability: bool,

    /// Column to leave out of the comparison (repeatable)
    #[arg(long = "ignore-column", value_name = "NAME")]
    pub ignore_columns: Vec<String>,

    /// Count every differing cell instead of stopping at the first
    #[arg(long)]
    pub full_diff: bool,

    /// Align rows by this column's value (repeatable for a composite key)
    #[arg(long = "key-column", value_name = "NAME")]
    pub key_columns: Vec<String>,

    /// Worker threads (0 = one per core)
    #[arg(long)]
    pub workers: Option<usize>,

    /// File extension to compare (repeatable; defaults to every supported format)
    #[arg(long = "ext", value_name = "EXT")]
    pub extensions: Vec<String>,

    /// Pair files whose relative paths differ only in letter case
    #[arg(long)]
    pub case_insensitive: bool,

    /// Also report files that exist only under the right root
    #[arg(long)]
    pub report_right_only: bool,

    /// Output format: "text", "json"
    #[arg(long, default_value = "text")]
    pub format: String,

    /// Omit mismatch details from report lines
    #[arg(long)]
    pub brief: bool,

    /// Append per-status counts to the report
    #[arg(long)]
    pub summary: bool,

    /// Write the report to a file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Parse output format string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {}. Use 'text' or 'json'", s)),
        }
    }
}

/// Validate that epsilon is a finite, non-negative number
fn validate_epsilon(s: &str) -> Result<f64, String> {
    let epsilon: f64 = s
        .parse()
        .map_err(|_| format!("Invalid epsilon: '{}'. Must be a number.", s))?;

    if !epsilon.is_finite() || epsilon < 0.0 {
        return Err("Epsilon must be a finite, non-negative number".to_string());
    }

    Ok(epsilon)
}
