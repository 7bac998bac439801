//! Delimited text decoding with per-column type inference

use crate::error::DecodeError;
use crate::loader::TableLoader;
use crate::table::{Column, ColumnInfo, DataType, Table, Value};
use csv::ReaderBuilder;
use std::path::Path;

/// Loader for comma or tab separated files with a header line.
///
/// Empty fields are null. Every column gets the narrowest type that all
/// of its non-empty fields parse as: signed integer, unsigned integer,
/// float, then boolean, falling back to string. A column is only read as
/// float when every field fits in a double without losing digits, so
/// distinct text never decodes to equal values.
#[derive(Debug, Clone, Copy)]
pub struct CsvLoader {
    delimiter: u8,
    extensions: &'static [&'static str],
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self {
            delimiter: b',',
            extensions: &["csv"],
        }
    }
}

impl CsvLoader {
    /// Tab separated variant
    pub fn tsv() -> Self {
        Self {
            delimiter: b'\t',
            extensions: &["tsv"],
        }
    }
}

impl TableLoader for CsvLoader {
    fn extensions(&self) -> &[&'static str] {
        self.extensions
    }

    fn load(&self, path: &Path) -> Result<Table, DecodeError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .from_path(path)?;

        let headers = reader.headers()?.clone();
        let mut fields: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
        let mut row_count = 0;

        for result in reader.records() {
            let record = result?;
            for (index, field) in record.iter().enumerate() {
                let value = if field.is_empty() {
                    None
                } else {
                    Some(field.to_string())
                };
                fields[index].push(value);
            }
            row_count += 1;
        }

        let columns = headers
            .iter()
            .zip(fields)
            .map(|(name, raw)| {
                let data_type = infer_column_type(&raw);
                let values = raw
                    .into_iter()
                    .map(|field| convert_field(field, &data_type))
                    .collect();
                Column::new(ColumnInfo::new(name, data_type), values)
            })
            .collect();

        Table::with_row_count(columns, row_count)
    }
}

/// Infer column type from values
fn infer_column_type(values: &[Option<String>]) -> DataType {
    let mut present = values.iter().flatten().peekable();
    if present.peek().is_none() {
        return DataType::Null;
    }

    let present: Vec<&str> = present.map(String::as_str).collect();
    if present.iter().all(|v| v.parse::<i64>().is_ok()) {
        DataType::INT64
    } else if present.iter().all(|v| v.parse::<u64>().is_ok()) {
        DataType::UINT64
    } else if present
        .iter()
        .all(|v| v.parse::<f64>().is_ok() && significant_digits(v) <= f64::DIGITS as usize)
    {
        DataType::DOUBLE
    } else if present
        .iter()
        .all(|v| v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("false"))
    {
        DataType::Boolean
    } else {
        DataType::String
    }
}

/// Count the significant decimal digits of a numeric literal
fn significant_digits(literal: &str) -> usize {
    let mantissa = literal
        .split(|c| c == 'e' || c == 'E')
        .next()
        .unwrap_or(literal);
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    digits.trim_start_matches('0').trim_end_matches('0').len()
}

fn convert_field(field: Option<String>, data_type: &DataType) -> Value {
    let Some(field) = field else {
        return Value::Null;
    };

    // Inference guarantees the parses below succeed
    match data_type {
        DataType::Int { signed: false, .. } => {
            field.parse().map(Value::UInt).unwrap_or(Value::String(field))
        }
        DataType::Int { .. } => field.parse().map(Value::Int).unwrap_or(Value::String(field)),
        DataType::Float { .. } => field.parse().map(Value::Float).unwrap_or(Value::String(field)),
        DataType::Boolean => Value::Boolean(field.eq_ignore_ascii_case("true")),
        _ => Value::String(field),
    }
}
