//! # tabmatch
//!
//! Compares two directory trees of columnar data files (Parquet, CSV, TSV)
//! and reports, per file under the left root, whether the right root holds
//! a file with the same logical content.

pub mod cli;
pub mod error;
pub mod config;
pub mod table;
pub mod loader;
pub mod parquet_loader;
pub mod csv_loader;
pub mod compare;
pub mod matcher;
pub mod output;
pub mod progress;
pub mod commands;

pub use compare::{compare, ColumnMismatch, Comparison, MismatchReason};
pub use config::{CompareConfig, MatchConfig, Settings};
pub use error::{DecodeError, Result, TabmatchError};
pub use matcher::{FileOutcome, MatchRun, Outcome, RelativePath, Side, TreeMatcher};
pub use table::{Column, ColumnInfo, DataType, Table, Value};
