//! Unit tests for the table comparator on decoded files

use crate::common::{doubles, ints, strings, write_parquet_file, ParquetColumn};
use std::fs;
use tabmatch::loader::LoaderRegistry;
use tabmatch::{compare, CompareConfig, Comparison, MismatchReason, Table};
use tempfile::TempDir;

fn load_parquet(dir: &TempDir, name: &str, columns: &[ParquetColumn]) -> Table {
    let path = dir.path().join(name);
    write_parquet_file(&path, columns).unwrap();
    LoaderRegistry::default().load(&path).unwrap()
}

fn load_csv(dir: &TempDir, name: &str, content: &str) -> Table {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    LoaderRegistry::default().load(&path).unwrap()
}

#[test]
fn test_comparator_is_reflexive() {
    let dir = TempDir::new().unwrap();
    let table = load_parquet(
        &dir,
        "t.parquet",
        &[
            ParquetColumn::Int64("id", vec![Some(1), None, Some(3)]),
            ParquetColumn::Double("v", vec![Some(f64::NAN), Some(0.5), None]),
            ParquetColumn::Utf8("s", vec![None, Some("x"), Some("")]),
            ParquetColumn::Bool("b", vec![Some(true), None, Some(false)]),
        ],
    );

    for config in [
        CompareConfig::default(),
        CompareConfig {
            strict_row_order: false,
            ..Default::default()
        },
    ] {
        assert_eq!(compare(&table, &table, &config), Comparison::Match);
    }
}

#[test]
fn test_csv_and_parquet_with_same_content_match() {
    let dir = TempDir::new().unwrap();
    let from_parquet = load_parquet(
        &dir,
        "t.parquet",
        &[
            ints("id", &[1, 2]),
            strings("name", &["Apple", "Banana"]),
            doubles("price", &[1.5, 0.75]),
        ],
    );
    let from_csv = load_csv(&dir, "t.csv", "id,name,price\n1,Apple,1.50\n2,Banana,0.75\n");

    assert_eq!(
        compare(&from_parquet, &from_csv, &CompareConfig::default()),
        Comparison::Match
    );
}

#[test]
fn test_type_change_between_formats() {
    let dir = TempDir::new().unwrap();
    let from_parquet = load_parquet(&dir, "t.parquet", &[strings("id", &["1", "2"])]);
    let from_csv = load_csv(&dir, "t.csv", "id\n1\n2\n");

    match compare(&from_parquet, &from_csv, &CompareConfig::default()) {
        Comparison::Mismatch(MismatchReason::SchemaDiffers { detail }) => {
            assert!(detail.contains("type of id changed: string -> int64"), "{}", detail);
        }
        other => panic!("Expected schema mismatch, got {:?}", other),
    }
}

#[test]
fn test_schema_short_circuits_row_count() {
    let dir = TempDir::new().unwrap();
    let left = load_parquet(&dir, "l.parquet", &[ints("x", &[1, 2, 3])]);
    let right = load_parquet(&dir, "r.parquet", &[ints("y", &[1])]);

    let result = compare(&left, &right, &CompareConfig::default());
    assert!(matches!(
        result,
        Comparison::Mismatch(MismatchReason::SchemaDiffers { .. })
    ));
}

#[test]
fn test_row_count_short_circuits_values() {
    let dir = TempDir::new().unwrap();
    let left = load_parquet(&dir, "l.parquet", &[ints("x", &[1, 2, 3])]);
    let right = load_parquet(&dir, "r.parquet", &[ints("x", &[9, 9])]);

    assert_eq!(
        compare(&left, &right, &CompareConfig::default()),
        Comparison::Mismatch(MismatchReason::RowCountDiffers { left: 3, right: 2 })
    );
}

#[test]
fn test_comparator_is_symmetric_for_floats() {
    let dir = TempDir::new().unwrap();
    let left = load_parquet(&dir, "l.parquet", &[doubles("v", &[1.0, 2.0])]);
    let right = load_parquet(&dir, "r.parquet", &[doubles("v", &[1.0, 2.25])]);

    for epsilon in [0.0, 0.25, 0.3] {
        let config = CompareConfig {
            float_epsilon: epsilon,
            ..Default::default()
        };
        assert_eq!(
            compare(&left, &right, &config).is_match(),
            compare(&right, &left, &config).is_match(),
            "asymmetric at epsilon {}",
            epsilon
        );
    }

    let inclusive = CompareConfig {
        float_epsilon: 0.25,
        ..Default::default()
    };
    assert!(compare(&left, &right, &inclusive).is_match());
}

#[test]
fn test_mismatch_reason_serialization() {
    let reason = MismatchReason::ValueDiffers {
        first_row: 0,
        first_column: "x".to_string(),
        left: "5".to_string(),
        right: "6".to_string(),
        differing_cells: None,
        column_counts: None,
    };

    let json = serde_json::to_value(&reason).unwrap();
    assert_eq!(json["kind"], "value_differs");
    assert_eq!(json["first_column"], "x");

    assert!(json.get("column_counts").is_none());

    let back: MismatchReason = serde_json::from_value(json).unwrap();
    assert_eq!(back, reason);
}

#[test]
fn test_keyed_csv_and_parquet_with_shuffled_rows_match() {
    let dir = TempDir::new().unwrap();
    let from_parquet = load_parquet(
        &dir,
        "t.parquet",
        &[ints("id", &[1, 2, 3]), strings("name", &["a", "b", "c"])],
    );
    let from_csv = load_csv(&dir, "t.csv", "id,name\n3,c\n1,a\n2,b\n");
    let config = CompareConfig {
        key_columns: vec!["id".to_string()],
        ..Default::default()
    };

    assert_eq!(compare(&from_parquet, &from_csv, &config), Comparison::Match);
}

#[test]
fn test_keyed_row_count_difference_names_missing_keys() {
    let dir = TempDir::new().unwrap();
    let left = load_parquet(&dir, "l.parquet", &[ints("id", &[1, 2, 3])]);
    let right = load_parquet(&dir, "r.parquet", &[ints("id", &[1, 3])]);
    let config = CompareConfig {
        key_columns: vec!["id".to_string()],
        ..Default::default()
    };

    assert_eq!(
        compare(&left, &right, &config),
        Comparison::Mismatch(MismatchReason::KeysDiffer {
            left_only: 1,
            right_only: 0,
            example: "2".to_string(),
        })
    );
}

#[test]
fn test_wide_csv_identifiers_are_distinguished() {
    let dir = TempDir::new().unwrap();
    let left = load_csv(&dir, "l.csv", "id\n12345678901234567890\n");
    let right = load_csv(&dir, "r.csv", "id\n12345678901234567891\n");

    match compare(&left, &right, &CompareConfig::default()) {
        Comparison::Mismatch(MismatchReason::ValueDiffers { left, right, .. }) => {
            assert_eq!(left, "12345678901234567890");
            assert_eq!(right, "12345678901234567891");
        }
        other => panic!("Expected value mismatch, got {:?}", other),
    }

    let beyond_u64 = load_csv(&dir, "a.csv", "id\n-99999999999999999999\n");
    let neighbour = load_csv(&dir, "b.csv", "id\n-99999999999999999998\n");
    assert!(!compare(&beyond_u64, &neighbour, &CompareConfig::default()).is_match());
}

#[test]
fn test_high_precision_csv_decimals_are_distinguished() {
    let dir = TempDir::new().unwrap();
    let left = load_csv(&dir, "l.csv", "v\n0.12345678901234567\n");
    let right = load_csv(&dir, "r.csv", "v\n0.12345678901234568\n");
    assert!(!compare(&left, &right, &CompareConfig::default()).is_match());
}
