//! Unit tests for CLI argument parsing and validation

use clap::Parser;
use std::path::PathBuf;
use tabmatch::cli::{Cli, OutputFormat};

#[test]
fn test_cli_defaults() {
    let cli = Cli::try_parse_from(["tabmatch", "old", "new"]).unwrap();

    assert_eq!(cli.left, PathBuf::from("old"));
    assert_eq!(cli.right, PathBuf::from("new"));
    assert!(cli.config.is_none());
    assert!(!cli.ignore_column_order);
    assert!(!cli.ignore_row_order);
    assert!(cli.epsilon.is_none());
    assert!(cli.ignore_columns.is_empty());
    assert!(cli.key_columns.is_empty());
    assert!(cli.workers.is_none());
    assert!(cli.extensions.is_empty());
    assert_eq!(cli.format, "text");
    assert!(!cli.brief);
    assert!(!cli.summary);
    assert!(cli.output.is_none());
    assert!(!cli.verbose);
}

#[test]
fn test_cli_requires_both_roots() {
    assert!(Cli::try_parse_from(["tabmatch"]).is_err());
    assert!(Cli::try_parse_from(["tabmatch", "only-left"]).is_err());
}

#[test]
fn test_cli_comparison_flags() {
    let cli = Cli::try_parse_from([
        "tabmatch",
        "l",
        "r",
        "--ignore-column-order",
        "--ignore-row-order",
        "--epsilon",
        "1e-6",
        "--check-nullability",
        "--full-diff",
    ])
    .unwrap();

    assert!(cli.ignore_column_order);
    assert!(cli.ignore_row_order);
    assert_eq!(cli.epsilon, Some(1e-6));
    assert!(cli.check_nullability);
    assert!(cli.full_diff);
}

#[test]
fn test_cli_repeatable_flags() {
    let cli = Cli::try_parse_from([
        "tabmatch",
        "l",
        "r",
        "--ignore-column",
        "loaded_at",
        "--ignore-column",
        "batch_id",
        "--ext",
        "parquet",
        "--ext",
        ".csv",
    ])
    .unwrap();

    assert_eq!(cli.ignore_columns, vec!["loaded_at", "batch_id"]);
    assert_eq!(cli.extensions, vec!["parquet", ".csv"]);
}

#[test]
fn test_cli_negative_epsilon_rejected() {
    let result = Cli::try_parse_from(["tabmatch", "l", "r", "--epsilon", "-0.5"]);
    assert!(result.is_err());

    let result = Cli::try_parse_from(["tabmatch", "l", "r", "--epsilon", "NaN"]);
    assert!(result.is_err());

    let result = Cli::try_parse_from(["tabmatch", "l", "r", "--epsilon", "tiny"]);
    assert!(result.is_err());
}

#[test]
fn test_cli_workers_must_be_number() {
    let cli = Cli::try_parse_from(["tabmatch", "l", "r", "--workers", "4"]).unwrap();
    assert_eq!(cli.workers, Some(4));

    assert!(Cli::try_parse_from(["tabmatch", "l", "r", "--workers", "many"]).is_err());
}

#[test]
fn test_cli_output_options() {
    let cli = Cli::try_parse_from([
        "tabmatch",
        "l",
        "r",
        "--format",
        "json",
        "--brief",
        "--summary",
        "--output",
        "report.json",
        "-v",
    ])
    .unwrap();

    assert_eq!(OutputFormat::parse(&cli.format), Ok(OutputFormat::Json));
    assert!(cli.brief);
    assert!(cli.summary);
    assert_eq!(cli.output, Some(PathBuf::from("report.json")));
    assert!(cli.verbose);
}

#[test]
fn test_cli_matching_flags() {
    let cli = Cli::try_parse_from([
        "tabmatch",
        "l",
        "r",
        "--case-insensitive",
        "--report-right-only",
        "--no-progress",
    ])
    .unwrap();

    assert!(cli.case_insensitive);
    assert!(cli.report_right_only);
    assert!(cli.no_progress);
}

#[test]
fn test_cli_unknown_flag_rejected() {
    assert!(Cli::try_parse_from(["tabmatch", "l", "r", "--sample", "10%"]).is_err());
}
