//! Parquet decoding through the `parquet` crate's record API

use crate::error::DecodeError;
use crate::loader::TableLoader;
use crate::table::{Column, ColumnInfo, DataType, Table, Value};
use num_bigint::BigInt;
use parquet::basic::{ConvertedType, LogicalType, Repetition, Type as PhysicalType};
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::Field;
use parquet::schema::types::Type;
use std::fs::File;
use std::path::Path;

/// Loader for `.parquet` files
#[derive(Debug, Clone, Copy, Default)]
pub struct ParquetLoader;

impl TableLoader for ParquetLoader {
    fn extensions(&self) -> &[&'static str] {
        &["parquet"]
    }

    fn load(&self, path: &Path) -> Result<Table, DecodeError> {
        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;

        let file_metadata = reader.metadata().file_metadata();
        let infos: Vec<ColumnInfo> = file_metadata
            .schema()
            .get_fields()
            .iter()
            .map(|field| column_info(field))
            .collect();
        let declared_rows = file_metadata.num_rows();
        let capacity = initial_capacity(declared_rows);

        let mut values: Vec<Vec<Value>> = infos
            .iter()
            .map(|_| Vec::with_capacity(capacity))
            .collect();
        let mut row_count = 0;

        for row in reader.get_row_iter(None)? {
            let row = row?;
            for (index, (name, field)) in row.get_column_iter().enumerate() {
                let column = values.get_mut(index).ok_or_else(|| {
                    DecodeError::new(format!("Row {} has unexpected column '{}'", row_count, name))
                })?;
                column.push(convert_field(field));
            }
            row_count += 1;
        }

        if i64::try_from(row_count).ok() != Some(declared_rows) {
            return Err(DecodeError::new(format!(
                "file metadata declares {} rows but {} were read",
                declared_rows, row_count
            )));
        }

        let columns = infos
            .into_iter()
            .zip(values)
            .map(|(info, values)| Column::new(info, values))
            .collect();
        Table::with_row_count(columns, row_count)
    }
}

/// Rows to reserve up front. The footer count is untrusted, so it only
/// sizes the first allocation up to a fixed bound.
fn initial_capacity(declared_rows: i64) -> usize {
    const MAX_RESERVED_ROWS: usize = 1 << 16;
    usize::try_from(declared_rows)
        .unwrap_or(0)
        .min(MAX_RESERVED_ROWS)
}

/// Column information for a top-level schema field
fn column_info(field: &Type) -> ColumnInfo {
    let info = field.get_basic_info();
    ColumnInfo {
        name: info.name().to_string(),
        data_type: data_type_of(field),
        nullable: info.has_repetition() && info.repetition() == Repetition::OPTIONAL,
    }
}

/// Logical type of a schema field.
///
/// A repeated field that is not wrapped in a LIST or MAP annotation is a
/// bare list of its element type.
fn data_type_of(field: &Type) -> DataType {
    let info = field.get_basic_info();
    let base = element_type(field);
    if info.has_repetition() && info.repetition() == Repetition::REPEATED {
        DataType::List(Box::new(base))
    } else {
        base
    }
}

/// Logical type of a field ignoring its own repetition
fn element_type(field: &Type) -> DataType {
    if field.is_group() {
        group_type(field)
    } else {
        primitive_type(field)
    }
}

fn group_type(field: &Type) -> DataType {
    let info = field.get_basic_info();
    let is_list = matches!(info.logical_type(), Some(LogicalType::List))
        || info.converted_type() == ConvertedType::LIST;
    let is_map = matches!(info.logical_type(), Some(LogicalType::Map))
        || matches!(
            info.converted_type(),
            ConvertedType::MAP | ConvertedType::MAP_KEY_VALUE
        );

    if is_list {
        return DataType::List(Box::new(list_item_type(field)));
    }

    if is_map {
        let (key, value) = match field.get_fields().first() {
            Some(key_value) if key_value.is_group() => {
                let entries = key_value.get_fields();
                (
                    entries.first().map(|f| element_type(f)).unwrap_or(DataType::Null),
                    entries.get(1).map(|f| element_type(f)).unwrap_or(DataType::Null),
                )
            }
            _ => (DataType::Null, DataType::Null),
        };
        return DataType::Map(Box::new(key), Box::new(value));
    }

    DataType::Struct(
        field
            .get_fields()
            .iter()
            .map(|f| (f.name().to_string(), data_type_of(f)))
            .collect(),
    )
}

/// Element type of a LIST-annotated group, covering the legacy two-level layout
fn list_item_type(list: &Type) -> DataType {
    let Some(repeated) = list.get_fields().first() else {
        return DataType::Null;
    };

    if repeated.is_group() && repeated.get_fields().len() == 1 {
        let legacy_wrapper =
            repeated.name() == "array" || repeated.name() == format!("{}_tuple", list.name());
        if !legacy_wrapper {
            return element_type(&repeated.get_fields()[0]);
        }
    }
    element_type(repeated)
}

fn primitive_type(field: &Type) -> DataType {
    let info = field.get_basic_info();

    match info.logical_type() {
        Some(LogicalType::String) | Some(LogicalType::Enum) | Some(LogicalType::Json) => {
            return DataType::String
        }
        Some(LogicalType::Decimal { scale, precision }) => {
            return DataType::Decimal { precision, scale }
        }
        Some(LogicalType::Date) => return DataType::Date,
        Some(LogicalType::Timestamp { .. }) => return DataType::Timestamp,
        Some(LogicalType::Integer { bit_width, is_signed }) => {
            return DataType::Int {
                bits: bit_width as u8,
                signed: is_signed,
            }
        }
        Some(LogicalType::Unknown) => return DataType::Null,
        _ => {}
    }

    match info.converted_type() {
        ConvertedType::UTF8 | ConvertedType::ENUM | ConvertedType::JSON => DataType::String,
        ConvertedType::DECIMAL => DataType::Decimal {
            precision: field.get_precision(),
            scale: field.get_scale(),
        },
        ConvertedType::DATE => DataType::Date,
        ConvertedType::TIMESTAMP_MILLIS | ConvertedType::TIMESTAMP_MICROS => DataType::Timestamp,
        ConvertedType::INT_8 => DataType::Int { bits: 8, signed: true },
        ConvertedType::INT_16 => DataType::Int { bits: 16, signed: true },
        ConvertedType::INT_32 => DataType::Int { bits: 32, signed: true },
        ConvertedType::INT_64 => DataType::Int { bits: 64, signed: true },
        ConvertedType::UINT_8 => DataType::Int { bits: 8, signed: false },
        ConvertedType::UINT_16 => DataType::Int { bits: 16, signed: false },
        ConvertedType::UINT_32 => DataType::Int { bits: 32, signed: false },
        ConvertedType::UINT_64 => DataType::Int { bits: 64, signed: false },
        _ => match field.get_physical_type() {
            PhysicalType::BOOLEAN => DataType::Boolean,
            PhysicalType::INT32 => DataType::Int { bits: 32, signed: true },
            PhysicalType::INT64 => DataType::Int { bits: 64, signed: true },
            PhysicalType::INT96 => DataType::Timestamp,
            PhysicalType::FLOAT => DataType::Float { bits: 32 },
            PhysicalType::DOUBLE => DataType::Float { bits: 64 },
            _ => DataType::Binary,
        },
    }
}

/// Convert a decoded record field into a cell value
fn convert_field(field: &Field) -> Value {
    match field {
        Field::Null => Value::Null,
        Field::Bool(b) => Value::Boolean(*b),
        Field::Byte(v) => Value::Int(i64::from(*v)),
        Field::Short(v) => Value::Int(i64::from(*v)),
        Field::Int(v) => Value::Int(i64::from(*v)),
        Field::Long(v) => Value::Int(*v),
        Field::UByte(v) => Value::UInt(u64::from(*v)),
        Field::UShort(v) => Value::UInt(u64::from(*v)),
        Field::UInt(v) => Value::UInt(u64::from(*v)),
        Field::ULong(v) => Value::UInt(*v),
        Field::Float(v) => Value::Float(f64::from(*v)),
        Field::Double(v) => Value::Float(*v),
        Field::Decimal(d) => Value::Decimal {
            unscaled: BigInt::from_signed_bytes_be(d.data()),
            scale: d.scale(),
        },
        Field::Str(s) => Value::String(s.clone()),
        Field::Bytes(b) => Value::Binary(b.data().to_vec()),
        Field::Date(days) => Value::Date(*days),
        Field::TimestampMillis(ms) => Value::Timestamp(ms.saturating_mul(1000)),
        Field::TimestampMicros(us) => Value::Timestamp(*us),
        Field::Group(row) => Value::Struct(
            row.get_column_iter()
                .map(|(name, f)| (name.clone(), convert_field(f)))
                .collect(),
        ),
        Field::ListInternal(list) => Value::List(list.elements().iter().map(convert_field).collect()),
        Field::MapInternal(map) => Value::Map(
            map.entries()
                .iter()
                .map(|(k, v)| (convert_field(k), convert_field(v)))
                .collect(),
        ),
        // Time-of-day and half-precision floats keep their display form
        other => Value::String(other.to_string()),
    }
}
