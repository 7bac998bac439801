//! Edge case tests for cell values and table shapes

use crate::common::assertions::{assert_status, detail_of};
use crate::common::{doubles, ints, strings, CliTestRunner, ParquetColumn};
use tabmatch::Side;

fn compare_pair(left: &[ParquetColumn], right: &[ParquetColumn], args: &[&str]) -> crate::common::CommandOutput {
    let runner = CliTestRunner::new().unwrap();
    runner.fixture().write_parquet(Side::Left, "t.parquet", left).unwrap();
    runner.fixture().write_parquet(Side::Right, "t.parquet", right).unwrap();
    runner.expect_success(args)
}

#[test]
fn test_zero_row_tables_match() {
    let output = compare_pair(&[ints("x", &[])], &[ints("x", &[])], &[]);
    assert_eq!(output.report, "t.parquet: Match\n");
}

#[test]
fn test_zero_row_tables_with_different_schema() {
    let output = compare_pair(&[ints("x", &[])], &[strings("x", &[])], &[]);
    assert_status(&output, "t.parquet", "Not match");
    assert!(detail_of(&output, "t.parquet").unwrap().starts_with("schema differs"));
}

#[test]
fn test_null_equals_null_only() {
    let both_null = compare_pair(
        &[ParquetColumn::Int64("x", vec![None, Some(1)])],
        &[ParquetColumn::Int64("x", vec![None, Some(1)])],
        &[],
    );
    assert_eq!(both_null.report, "t.parquet: Match\n");

    let null_vs_zero = compare_pair(
        &[ParquetColumn::Int64("x", vec![None])],
        &[ParquetColumn::Int64("x", vec![Some(0)])],
        &[],
    );
    let detail = detail_of(&null_vs_zero, "t.parquet").unwrap();
    assert_eq!(detail, "value differs at row 0, column x: null vs 0");
}

#[test]
fn test_empty_string_is_not_null() {
    let output = compare_pair(
        &[ParquetColumn::Utf8("s", vec![Some("")])],
        &[ParquetColumn::Utf8("s", vec![None])],
        &[],
    );
    assert_status(&output, "t.parquet", "Not match");
}

#[test]
fn test_epsilon_boundary() {
    let left = [doubles("v", &[1.0])];
    let right = [doubles("v", &[1.5])];

    let exact = compare_pair(&left, &right, &[]);
    assert_status(&exact, "t.parquet", "Not match");

    let at_boundary = compare_pair(&left, &right, &["--epsilon", "0.5"]);
    assert_eq!(at_boundary.report, "t.parquet: Match\n");

    let below_boundary = compare_pair(&left, &right, &["--epsilon", "0.49"]);
    assert_status(&below_boundary, "t.parquet", "Not match");
}

#[test]
fn test_nan_cells_match() {
    let output = compare_pair(&[doubles("v", &[f64::NAN])], &[doubles("v", &[f64::NAN])], &[]);
    assert_eq!(output.report, "t.parquet: Match\n");
}

#[test]
fn test_infinities_ignore_epsilon() {
    let output = compare_pair(
        &[doubles("v", &[f64::INFINITY])],
        &[doubles("v", &[f64::NEG_INFINITY])],
        &["--epsilon", "1000000"],
    );
    assert_status(&output, "t.parquet", "Not match");
}

#[test]
fn test_unicode_strings() {
    let values = ["Café", "北京", "🚀", "Naïve"];
    let output = compare_pair(&[strings("s", &values)], &[strings("s", &values)], &[]);
    assert_eq!(output.report, "t.parquet: Match\n");

    let changed = compare_pair(
        &[strings("s", &["Café"])],
        &[strings("s", &["Cafe"])],
        &[],
    );
    assert_status(&changed, "t.parquet", "Not match");
}

#[test]
fn test_duplicate_rows_are_not_collapsed() {
    let output = compare_pair(
        &[ints("x", &[1, 1, 2])],
        &[ints("x", &[1, 2, 2])],
        &["--ignore-row-order"],
    );
    assert_status(&output, "t.parquet", "Not match");
}

#[test]
fn test_unordered_rows_with_nulls() {
    let output = compare_pair(
        &[ParquetColumn::Int64("x", vec![Some(2), None, Some(1), None])],
        &[ParquetColumn::Int64("x", vec![None, Some(1), None, Some(2)])],
        &["--ignore-row-order"],
    );
    assert_eq!(output.report, "t.parquet: Match\n");
}

#[test]
fn test_column_order_policy() {
    let left = [ints("a", &[1]), ints("b", &[2])];
    let right = [ints("b", &[2]), ints("a", &[1])];

    let strict = compare_pair(&left, &right, &[]);
    let detail = detail_of(&strict, "t.parquet").unwrap();
    assert!(detail.contains("column order differs"), "{}", detail);

    let relaxed = compare_pair(&left, &right, &["--ignore-column-order"]);
    assert_eq!(relaxed.report, "t.parquet: Match\n");
}

#[test]
fn test_ignored_column() {
    let left = [ints("id", &[1, 2]), strings("loaded_at", &["mon", "mon"])];
    let right = [ints("id", &[1, 2]), strings("loaded_at", &["tue", "tue"])];

    let output = compare_pair(&left, &right, &["--ignore-column", "loaded_at"]);
    assert_eq!(output.report, "t.parquet: Match\n");
}

#[test]
fn test_full_diff_counts_every_cell() {
    let output = compare_pair(
        &[ints("x", &[1, 2, 3]), ints("y", &[1, 2, 3])],
        &[ints("x", &[1, 0, 0]), ints("y", &[1, 2, 0])],
        &["--full-diff"],
    );
    let detail = detail_of(&output, "t.parquet").unwrap();
    assert_eq!(
        detail,
        "value differs at row 1, column x: 2 vs 0 (3 differing cells; x: 2 (66.67%), y: 1 (33.33%))"
    );
}

#[test]
fn test_key_column_alignment() {
    let left = [ints("id", &[1, 2, 3]), strings("name", &["a", "b", "c"])];
    let shuffled = [ints("id", &[2, 3, 1]), strings("name", &["b", "c", "a"])];

    let positional = compare_pair(&left, &shuffled, &[]);
    assert_status(&positional, "t.parquet", "Not match");

    let keyed = compare_pair(&left, &shuffled, &["--key-column", "id"]);
    assert_eq!(keyed.report, "t.parquet: Match\n");
}

#[test]
fn test_duplicate_and_unmatched_keys() {
    let duplicated = compare_pair(
        &[ints("id", &[1, 1, 2])],
        &[ints("id", &[1, 2, 3])],
        &["--key-column", "id"],
    );
    assert_eq!(
        detail_of(&duplicated, "t.parquet").unwrap(),
        "duplicate keys: 2 rows in left, 0 rows in right (e.g. 1)"
    );

    let unmatched = compare_pair(
        &[ints("id", &[1, 2]), strings("s", &["x", "y"])],
        &[ints("id", &[2, 3, 4]), strings("s", &["y", "z", "w"])],
        &["--key-column", "id"],
    );
    assert_eq!(
        detail_of(&unmatched, "t.parquet").unwrap(),
        "keys differ: 1 only in left, 2 only in right (e.g. 1)"
    );
}

#[test]
fn test_csv_header_only_files() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    fixture.create_raw(Side::Left, "h.csv", b"a,b\n").unwrap();
    fixture.create_raw(Side::Right, "h.csv", b"a,b\n").unwrap();

    let output = runner.expect_success(&[]);
    assert_eq!(output.report, "h.csv: Match\n");
}

#[test]
fn test_tsv_files_are_compared() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    fixture.create_raw(Side::Left, "t.tsv", b"id\tname\n1\tx y\n").unwrap();
    fixture.create_raw(Side::Right, "t.tsv", b"id\tname\n1\tx z\n").unwrap();

    let output = runner.expect_success(&[]);
    let detail = detail_of(&output, "t.tsv").unwrap();
    assert_eq!(detail, "value differs at row 0, column name: \"x y\" vs \"x z\"");
}
