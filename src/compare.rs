//! Content comparison of two decoded tables
//!
//! Evaluation always runs in the same order: schema, then row alignment,
//! then the cell-by-cell pass. A schema difference is reported even when
//! both tables are empty, and a row count difference is never reported as
//! a value difference.
//!
//! Rows align positionally, by a canonical sort of every column, or by
//! key columns. With keys, duplicate keys and keys present on one side
//! only are reported before any cell is compared.

use crate::config::CompareConfig;
use crate::table::{Column, ColumnInfo, Schema, Table, Value};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Result of comparing two tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Comparison {
    Match,
    Mismatch(MismatchReason),
}

impl Comparison {
    pub fn is_match(&self) -> bool {
        matches!(self, Comparison::Match)
    }
}

/// Why two tables are not equal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MismatchReason {
    SchemaDiffers {
        detail: String,
    },
    RowCountDiffers {
        left: usize,
        right: usize,
    },
    /// A key value occurs on more than one row of a side
    DuplicateKeys {
        /// Rows whose key is shared with another row
        left: usize,
        right: usize,
        example: String,
    },
    /// Some key values exist on one side only
    KeysDiffer {
        left_only: usize,
        right_only: usize,
        example: String,
    },
    ValueDiffers {
        /// Physical row index in the left table
        first_row: usize,
        first_column: String,
        left: String,
        right: String,
        /// Total divergent cells, counted only in full-diff mode
        differing_cells: Option<usize>,
        /// Divergent cells per column, counted only in full-diff mode
        #[serde(default, skip_serializing_if = "Option::is_none")]
        column_counts: Option<Vec<ColumnMismatch>>,
    },
}

/// Divergent cells in one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMismatch {
    pub column: String,
    pub count: usize,
    /// Share of compared rows, in percent
    pub percent: f64,
}

impl fmt::Display for MismatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MismatchReason::SchemaDiffers { detail } => write!(f, "schema differs: {}", detail),
            MismatchReason::RowCountDiffers { left, right } => {
                write!(f, "row count differs: {} vs {}", left, right)
            }
            MismatchReason::DuplicateKeys { left, right, example } => write!(
                f,
                "duplicate keys: {} rows in left, {} rows in right (e.g. {})",
                left, right, example
            ),
            MismatchReason::KeysDiffer {
                left_only,
                right_only,
                example,
            } => write!(
                f,
                "keys differ: {} only in left, {} only in right (e.g. {})",
                left_only, right_only, example
            ),
            MismatchReason::ValueDiffers {
                first_row,
                first_column,
                left,
                right,
                differing_cells,
                column_counts,
            } => {
                write!(
                    f,
                    "value differs at row {}, column {}: {} vs {}",
                    first_row, first_column, left, right
                )?;
                if let Some(count) = differing_cells {
                    write!(f, " ({} differing cells", count)?;
                    for (i, column) in column_counts.iter().flatten().enumerate() {
                        let separator = if i == 0 { "; " } else { ", " };
                        write!(
                            f,
                            "{}{}: {} ({:.2}%)",
                            separator, column.column, column.count, column.percent
                        )?;
                    }
                    write!(f, ")")?;
                }
                Ok(())
            }
        }
    }
}

/// A column whose type differs between the two sides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeChange {
    pub column: String,
    pub left: String,
    pub right: String,
}

/// Schema-level differences between two tables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDiff {
    pub left_only: Vec<String>,
    pub right_only: Vec<String>,
    pub type_changes: Vec<TypeChange>,
    pub nullability_changes: Vec<String>,
    /// Same columns in a different order (strict column order only)
    pub order_changed: Option<(Vec<String>, Vec<String>)>,
}

impl SchemaDiff {
    pub fn between(left: &Schema, right: &Schema, config: &CompareConfig) -> Self {
        let mut diff = SchemaDiff::default();

        for column in &left.columns {
            match right.get(&column.name) {
                None => diff.left_only.push(column.name.clone()),
                Some(other) => {
                    if column.data_type != other.data_type {
                        diff.type_changes.push(TypeChange {
                            column: column.name.clone(),
                            left: column.data_type.to_string(),
                            right: other.data_type.to_string(),
                        });
                    }
                    if config.check_nullability && column.nullable != other.nullable {
                        diff.nullability_changes.push(column.name.clone());
                    }
                }
            }
        }

        diff.right_only = right
            .columns
            .iter()
            .filter(|c| left.get(&c.name).is_none())
            .map(|c| c.name.clone())
            .collect();

        let left_names = left.column_names();
        let right_names = right.column_names();
        if config.strict_column_order
            && diff.left_only.is_empty()
            && diff.right_only.is_empty()
            && left_names != right_names
        {
            diff.order_changed = Some((
                left_names.iter().map(|s| s.to_string()).collect(),
                right_names.iter().map(|s| s.to_string()).collect(),
            ));
        }

        diff
    }

    pub fn is_empty(&self) -> bool {
        self.left_only.is_empty()
            && self.right_only.is_empty()
            && self.type_changes.is_empty()
            && self.nullability_changes.is_empty()
            && self.order_changed.is_none()
    }
}

impl fmt::Display for SchemaDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.left_only.is_empty() {
            parts.push(format!("columns only in left: [{}]", self.left_only.join(", ")));
        }
        if !self.right_only.is_empty() {
            parts.push(format!("columns only in right: [{}]", self.right_only.join(", ")));
        }
        for change in &self.type_changes {
            parts.push(format!("type of {} changed: {} -> {}", change.column, change.left, change.right));
        }
        if !self.nullability_changes.is_empty() {
            parts.push(format!(
                "nullability changed: [{}]",
                self.nullability_changes.join(", ")
            ));
        }
        if let Some((before, after)) = &self.order_changed {
            parts.push(format!(
                "column order differs: [{}] vs [{}]",
                before.join(", "),
                after.join(", ")
            ));
        }
        write!(f, "{}", parts.join("; "))
    }
}

/// Decide whether two tables hold the same data under `config`
pub fn compare(left: &Table, right: &Table, config: &CompareConfig) -> Comparison {
    let is_ignored = |c: &&Column| config.ignore_columns.iter().any(|n| n == c.name());
    let left_columns: Vec<&Column> = left.columns().filter(|c| !is_ignored(c)).collect();
    let right_columns: Vec<&Column> = right.columns().filter(|c| !is_ignored(c)).collect();

    // 1. Schema
    let schema_diff = SchemaDiff::between(
        &schema_of(&left_columns),
        &schema_of(&right_columns),
        config,
    );
    if !schema_diff.is_empty() {
        return Comparison::Mismatch(MismatchReason::SchemaDiffers {
            detail: schema_diff.to_string(),
        });
    }

    // Columns paired by name in the left table's order
    let pairs: Vec<(&Column, &Column)> = left_columns
        .iter()
        .filter_map(|l| {
            right_columns
                .iter()
                .find(|r| r.name() == l.name())
                .map(|r| (*l, *r))
        })
        .collect();

    // 2. Row alignment
    let aligned = if config.is_keyed() {
        match align_by_keys(&pairs, left.row_count(), right.row_count(), &config.key_columns) {
            Ok(aligned) => aligned,
            Err(reason) => return Comparison::Mismatch(reason),
        }
    } else {
        if left.row_count() != right.row_count() {
            return Comparison::Mismatch(MismatchReason::RowCountDiffers {
                left: left.row_count(),
                right: right.row_count(),
            });
        }

        let rows = left.row_count();
        let (left_order, right_order): (Vec<usize>, Vec<usize>) = if config.strict_row_order {
            ((0..rows).collect(), (0..rows).collect())
        } else {
            let left_keys: Vec<&Column> = pairs.iter().map(|(l, _)| *l).collect();
            let right_keys: Vec<&Column> = pairs.iter().map(|(_, r)| *r).collect();
            rayon::join(
                || canonical_row_order(&left_keys, rows),
                || canonical_row_order(&right_keys, rows),
            )
        };
        left_order.into_iter().zip(right_order).collect()
    };

    // 3. Cells
    cell_pass(&pairs, &aligned, config)
}

fn schema_of(columns: &[&Column]) -> Schema {
    Schema {
        columns: columns.iter().map(|c| c.info.clone()).collect::<Vec<ColumnInfo>>(),
    }
}

fn cmp_rows(keys: &[&Column], a: usize, b: usize) -> Ordering {
    keys.iter()
        .map(|c| c.values[a].canonical_cmp(&c.values[b]))
        .find(|ord| *ord != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

fn cmp_across(left: &[&Column], l: usize, right: &[&Column], r: usize) -> Ordering {
    left.iter()
        .zip(right)
        .map(|(a, b)| a.values[l].canonical_cmp(&b.values[r]))
        .find(|ord| *ord != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

/// Row indices sorted by all key columns, nulls first; stable for equal rows
fn canonical_row_order(keys: &[&Column], rows: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..rows).collect();
    order.par_sort_by(|&a, &b| cmp_rows(keys, a, b));
    order
}

/// Key values of one row, as shown in reports
fn format_key(keys: &[&Column], row: usize) -> String {
    let values: Vec<String> = keys.iter().map(|c| c.values[row].to_string()).collect();
    match values.as_slice() {
        [single] => single.clone(),
        _ => format!("({})", values.join(", ")),
    }
}

/// Rows in sorted `order` whose key equals a neighbour's, with the first such key
fn duplicate_keys(keys: &[&Column], order: &[usize]) -> (usize, Option<String>) {
    let mut count = 0;
    let mut example = None;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && cmp_rows(keys, order[start], order[end]) == Ordering::Equal {
            end += 1;
        }
        if end - start > 1 {
            count += end - start;
            example.get_or_insert_with(|| format_key(keys, order[start]));
        }
        start = end;
    }
    (count, example)
}

/// Pair left and right rows by equal key values.
///
/// Keys are compared exactly, without the float epsilon.
fn align_by_keys(
    pairs: &[(&Column, &Column)],
    left_rows: usize,
    right_rows: usize,
    key_columns: &[String],
) -> Result<Vec<(usize, usize)>, MismatchReason> {
    let missing: Vec<&str> = key_columns
        .iter()
        .filter(|k| !pairs.iter().any(|(l, _)| l.name() == k.as_str()))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        return Err(MismatchReason::SchemaDiffers {
            detail: format!("key columns not found: [{}]", missing.join(", ")),
        });
    }

    let (left_keys, right_keys): (Vec<&Column>, Vec<&Column>) = key_columns
        .iter()
        .filter_map(|k| pairs.iter().find(|(l, _)| l.name() == k.as_str()).copied())
        .unzip();

    let (left_order, right_order) = rayon::join(
        || canonical_row_order(&left_keys, left_rows),
        || canonical_row_order(&right_keys, right_rows),
    );

    let (left_dups, left_example) = duplicate_keys(&left_keys, &left_order);
    let (right_dups, right_example) = duplicate_keys(&right_keys, &right_order);
    if let Some(example) = left_example.or(right_example) {
        return Err(MismatchReason::DuplicateKeys {
            left: left_dups,
            right: right_dups,
            example,
        });
    }

    let mut aligned = Vec::with_capacity(left_rows.min(right_rows));
    let mut left_only = 0;
    let mut right_only = 0;
    let mut example = None;
    let (mut i, mut j) = (0, 0);
    while i < left_order.len() || j < right_order.len() {
        let ord = match (left_order.get(i), right_order.get(j)) {
            (Some(&l), Some(&r)) => cmp_across(&left_keys, l, &right_keys, r),
            (Some(_), None) => Ordering::Less,
            _ => Ordering::Greater,
        };
        match ord {
            Ordering::Equal => {
                aligned.push((left_order[i], right_order[j]));
                i += 1;
                j += 1;
            }
            Ordering::Less => {
                left_only += 1;
                example.get_or_insert_with(|| format_key(&left_keys, left_order[i]));
                i += 1;
            }
            Ordering::Greater => {
                right_only += 1;
                example.get_or_insert_with(|| format_key(&right_keys, right_order[j]));
                j += 1;
            }
        }
    }

    match example {
        Some(example) => Err(MismatchReason::KeysDiffer {
            left_only,
            right_only,
            example,
        }),
        None => Ok(aligned),
    }
}

fn cell_pass(pairs: &[(&Column, &Column)], aligned: &[(usize, usize)], config: &CompareConfig) -> Comparison {
    let mut first: Option<MismatchReason> = None;
    let mut per_column = vec![0usize; pairs.len()];

    'rows: for &(l, r) in aligned {
        for (index, (left_column, right_column)) in pairs.iter().enumerate() {
            let a = &left_column.values[l];
            let b = &right_column.values[r];
            if values_equal(a, b, config.float_epsilon) {
                continue;
            }

            per_column[index] += 1;
            if first.is_none() {
                first = Some(MismatchReason::ValueDiffers {
                    first_row: l,
                    first_column: left_column.name().to_string(),
                    left: a.to_string(),
                    right: b.to_string(),
                    differing_cells: None,
                    column_counts: None,
                });
            }
            if !config.full_diff {
                break 'rows;
            }
        }
    }

    match first {
        None => Comparison::Match,
        Some(MismatchReason::ValueDiffers {
            first_row,
            first_column,
            left,
            right,
            ..
        }) => {
            let (differing_cells, column_counts) = if config.full_diff {
                let counts = pairs
                    .iter()
                    .zip(&per_column)
                    .filter(|(_, count)| **count > 0)
                    .map(|((column, _), count)| ColumnMismatch {
                        column: column.name().to_string(),
                        count: *count,
                        percent: *count as f64 * 100.0 / aligned.len() as f64,
                    })
                    .collect();
                (Some(per_column.iter().sum()), Some(counts))
            } else {
                (None, None)
            };
            Comparison::Mismatch(MismatchReason::ValueDiffers {
                first_row,
                first_column,
                left,
                right,
                differing_cells,
                column_counts,
            })
        }
        Some(other) => Comparison::Mismatch(other),
    }
}

/// Cell equality: null only equals null, floats within `epsilon` (inclusive)
/// are equal, nested values are compared element by element.
pub fn values_equal(a: &Value, b: &Value, epsilon: f64) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Float(x), Value::Float(y)) => floats_equal(*x, *y, epsilon),
        (Value::List(x), Value::List(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(p, q)| values_equal(p, q, epsilon))
        }
        (Value::Struct(x), Value::Struct(y)) => {
            x.len() == y.len()
                && x.iter()
                    .zip(y)
                    .all(|((np, p), (nq, q))| np == nq && values_equal(p, q, epsilon))
        }
        (Value::Map(x), Value::Map(y)) => {
            x.len() == y.len()
                && x.iter().zip(y).all(|((kp, p), (kq, q))| {
                    values_equal(kp, kq, epsilon) && values_equal(p, q, epsilon)
                })
        }
        _ => a == b,
    }
}

fn floats_equal(a: f64, b: f64, epsilon: f64) -> bool {
    if a == b || (a.is_nan() && b.is_nan()) {
        return true;
    }
    (a - b).abs() <= epsilon
}
