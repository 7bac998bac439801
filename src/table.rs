//! In-memory tabular representation shared by the loaders and the comparator

use crate::error::DecodeError;
use indexmap::IndexMap;
use num_bigint::{BigInt, Sign};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Declared logical type of a column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Null,
    Boolean,
    Int { bits: u8, signed: bool },
    Float { bits: u8 },
    Decimal { precision: i32, scale: i32 },
    String,
    Binary,
    Date,
    Timestamp,
    List(Box<DataType>),
    Struct(Vec<(String, DataType)>),
    Map(Box<DataType>, Box<DataType>),
}

impl DataType {
    pub const INT64: DataType = DataType::Int { bits: 64, signed: true };
    pub const UINT64: DataType = DataType::Int { bits: 64, signed: false };
    pub const DOUBLE: DataType = DataType::Float { bits: 64 };
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Null => write!(f, "null"),
            DataType::Boolean => write!(f, "boolean"),
            DataType::Int { bits, signed: true } => write!(f, "int{}", bits),
            DataType::Int { bits, signed: false } => write!(f, "uint{}", bits),
            DataType::Float { bits: 32 } => write!(f, "float"),
            DataType::Float { .. } => write!(f, "double"),
            DataType::Decimal { precision, scale } => write!(f, "decimal({},{})", precision, scale),
            DataType::String => write!(f, "string"),
            DataType::Binary => write!(f, "binary"),
            DataType::Date => write!(f, "date"),
            DataType::Timestamp => write!(f, "timestamp"),
            DataType::List(item) => write!(f, "list<{}>", item),
            DataType::Struct(fields) => {
                write!(f, "struct<")?;
                for (i, (name, data_type)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, data_type)?;
                }
                write!(f, ">")
            }
            DataType::Map(key, value) => write!(f, "map<{}, {}>", key, value),
        }
    }
}

/// A single cell value.
///
/// Null is an explicit variant and never compares equal to anything but
/// another null. Timestamps are normalized to microseconds since the epoch,
/// dates to days since the epoch.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Decimal { unscaled: BigInt, scale: i32 },
    String(String),
    Binary(Vec<u8>),
    Date(i32),
    Timestamp(i64),
    List(Vec<Value>),
    Struct(Vec<(String, Value)>),
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Position of the variant in the canonical ordering across variants
    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Int(_) => 2,
            Value::UInt(_) => 3,
            Value::Float(_) => 4,
            Value::Decimal { .. } => 5,
            Value::String(_) => 6,
            Value::Binary(_) => 7,
            Value::Date(_) => 8,
            Value::Timestamp(_) => 9,
            Value::List(_) => 10,
            Value::Struct(_) => 11,
            Value::Map(_) => 12,
        }
    }

    /// Total order used to canonicalize row order.
    ///
    /// Null sorts first and nested values compare lexicographically. Floats
    /// follow IEEE total ordering after folding `-0.0` into `0.0` and every
    /// NaN into one NaN, so values that compare equal also sort together.
    pub fn canonical_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::UInt(a), Value::UInt(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => canonical_float(*a).total_cmp(&canonical_float(*b)),
            (
                Value::Decimal { unscaled: a, scale: sa },
                Value::Decimal { unscaled: b, scale: sb },
            ) => sa.cmp(sb).then_with(|| a.cmp(b)),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Binary(a), Value::Binary(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => cmp_sequences(a, b, |x, y| x.canonical_cmp(y)),
            (Value::Struct(a), Value::Struct(b)) => cmp_sequences(a, b, |(na, va), (nb, vb)| {
                na.cmp(nb).then_with(|| va.canonical_cmp(vb))
            }),
            (Value::Map(a), Value::Map(b)) => cmp_sequences(a, b, |(ka, va), (kb, vb)| {
                ka.canonical_cmp(kb).then_with(|| va.canonical_cmp(vb))
            }),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

fn canonical_float(x: f64) -> f64 {
    if x.is_nan() {
        f64::NAN
    } else if x == 0.0 {
        0.0
    } else {
        x
    }
}

fn cmp_sequences<T>(a: &[T], b: &[T], cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        let ord = cmp(x, y);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::UInt(u) => write!(f, "{}", u),
            Value::Float(x) => write!(f, "{}", x),
            Value::Decimal { unscaled, scale } => write!(f, "{}", format_decimal(unscaled, *scale)),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Binary(bytes) => {
                write!(f, "0x")?;
                for byte in bytes {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            Value::Date(days) => match days
                .checked_add(UNIX_EPOCH_DAYS_FROM_CE)
                .and_then(chrono::NaiveDate::from_num_days_from_ce_opt)
            {
                Some(date) => write!(f, "{}", date),
                None => write!(f, "date({})", days),
            },
            Value::Timestamp(micros) => match chrono::DateTime::from_timestamp_micros(*micros) {
                Some(ts) => write!(f, "{}", ts.format("%Y-%m-%dT%H:%M:%S%.6f")),
                None => write!(f, "timestamp({})", micros),
            },
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Struct(fields) => {
                write!(f, "{{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, value)?;
                }
                write!(f, "}}")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} => {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Days between 0001-01-01 and 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn format_decimal(unscaled: &BigInt, scale: i32) -> String {
    if scale <= 0 {
        let mut digits = unscaled.to_string();
        digits.extend(std::iter::repeat('0').take(scale.unsigned_abs() as usize));
        return digits;
    }

    let scale = scale as usize;
    let mut digits = unscaled.magnitude().to_string();
    if digits.len() <= scale {
        let padding = "0".repeat(scale + 1 - digits.len());
        digits.insert_str(0, &padding);
    }
    digits.insert(digits.len() - scale, '.');
    if unscaled.sign() == Sign::Minus {
        digits.insert(0, '-');
    }
    digits
}

/// Column information for schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl ColumnInfo {
    /// Nullable column of the given type
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
        }
    }

    pub fn required(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: false,
        }
    }
}

/// Ordered (name, type) signature of a table
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schema {
    pub columns: Vec<ColumnInfo>,
}

impl Schema {
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// A named, typed column of values
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub info: ColumnInfo,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(info: ColumnInfo, values: Vec<Value>) -> Self {
        Self { info, values }
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Decoded contents of one data file.
///
/// Column names are unique and every column holds exactly `row_count`
/// values. Both invariants are checked on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: IndexMap<String, Column>,
    row_count: usize,
}

impl Table {
    /// Build a table, taking the row count from the first column
    pub fn new(columns: Vec<Column>) -> Result<Self, DecodeError> {
        let row_count = columns.first().map(Column::len).unwrap_or(0);
        Self::with_row_count(columns, row_count)
    }

    /// Build a table with an explicit row count (tables without columns can still have rows)
    pub fn with_row_count(columns: Vec<Column>, row_count: usize) -> Result<Self, DecodeError> {
        let mut by_name = IndexMap::with_capacity(columns.len());

        for column in columns {
            if column.len() != row_count {
                return Err(DecodeError::new(format!(
                    "Column '{}' has {} values, expected {}",
                    column.name(),
                    column.len(),
                    row_count
                )));
            }
            let name = column.name().to_string();
            if by_name.insert(name.clone(), column).is_some() {
                return Err(DecodeError::new(format!("Duplicate column name '{}'", name)));
            }
        }

        Ok(Self {
            columns: by_name,
            row_count,
        })
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn schema(&self) -> Schema {
        Schema {
            columns: self.columns.values().map(|c| c.info.clone()).collect(),
        }
    }
}
