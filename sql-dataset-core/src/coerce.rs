use crate::{DatasetRow, Field, FieldType, Number, RecordValue, Schema, Value};
use thiserror::Error;
use time::{
    OffsetDateTime, PrimitiveDateTime,
    format_description::{BorrowedFormatItem, parse_borrowed, well_known::Rfc3339},
    macros::format_description,
};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const TIME_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[hour]:[minute]:[second]");

/// Failure to turn a raw column value into its wire value.
#[derive(Debug, Error)]
pub enum CoercionError {
    #[error("The query returned {columns} columns but the dataset declares {fields} fields")]
    ColumnCount { columns: usize, fields: usize },
    #[error("Cannot coerce column {index} into the {field_type} field `{key}`")]
    Column {
        index: usize,
        key: String,
        field_type: FieldType,
        #[source]
        source: Box<CoercionError>,
    },
    #[error("Cannot convert a value of type {0} to a number")]
    UnsupportedNumber(&'static str),
    #[error("Cannot parse `{0}` as a number")]
    InvalidNumber(String),
    #[error("The number {0} does not fit in 64 bits")]
    OutOfRange(String),
    #[error("Cannot send the non finite number {0}")]
    NonFinite(f64),
    #[error("Cannot convert a value of type {0} to a string")]
    UnsupportedString(&'static str),
    #[error("The column contains invalid UTF-8 text")]
    InvalidUtf8,
    #[error("Cannot convert a value of type {0} to a date")]
    UnsupportedTemporal(&'static str),
    #[error("Cannot parse `{0}` as a date or a timestamp")]
    InvalidTemporal(String),
    #[error(transparent)]
    Format(#[from] time::error::Format),
    #[error(transparent)]
    Range(#[from] time::error::ComponentRange),
}

/// Converts one result row, positionally aligned with the schema fields.
pub fn coerce_row(schema: &Schema, values: &[Value]) -> Result<DatasetRow, CoercionError> {
    let fields = schema.fields();
    if values.len() != fields.len() {
        return Err(CoercionError::ColumnCount {
            columns: values.len(),
            fields: fields.len(),
        });
    }
    let values = fields
        .iter()
        .zip(values)
        .enumerate()
        .map(|(index, (field, value))| {
            coerce_value(&field.field, value).map_err(|e| CoercionError::Column {
                index,
                key: field.key.clone(),
                field_type: field.field.field_type,
                source: e.into(),
            })
        })
        .collect::<Result<_, _>>()?;
    Ok(DatasetRow::new(schema.keys().clone(), values))
}

/// Converts a single value according to the field type.
pub fn coerce_value(field: &Field, value: &Value) -> Result<RecordValue, CoercionError> {
    Ok(match field.field_type {
        FieldType::Number | FieldType::Money | FieldType::Percentage => {
            match Number::from_value(value)? {
                Some(number) => number.into_record(field.precision)?,
                None if field.optional => RecordValue::Null,
                None => RecordValue::Integer(0),
            }
        }
        FieldType::String => RecordValue::Text(coerce_text(value)?.unwrap_or_default()),
        FieldType::Date => match coerce_timestamp(value)? {
            Some(v) => RecordValue::Text(v.date().format(DATE_FORMAT)?),
            None => RecordValue::Null,
        },
        FieldType::Datetime => match coerce_timestamp(value)? {
            Some(v) => RecordValue::Text(format_datetime(v)?),
            None => RecordValue::Null,
        },
    })
}

fn format_datetime(value: OffsetDateTime) -> Result<String, CoercionError> {
    Ok(value.replace_nanosecond(0)?.format(&Rfc3339)?)
}

fn coerce_text(value: &Value) -> Result<Option<String>, CoercionError> {
    let text = match value {
        v if v.is_null() => return Ok(None),
        Value::Varchar(Some(v)) | Value::Unknown(Some(v)) => v.clone(),
        Value::Blob(Some(v)) => String::from_utf8(v.to_vec()).map_err(|_| CoercionError::InvalidUtf8)?,
        Value::Boolean(Some(v)) => v.to_string(),
        Value::Int8(Some(v)) => v.to_string(),
        Value::Int16(Some(v)) => v.to_string(),
        Value::Int32(Some(v)) => v.to_string(),
        Value::Int64(Some(v)) => v.to_string(),
        Value::Int128(Some(v)) => v.to_string(),
        Value::UInt8(Some(v)) => v.to_string(),
        Value::UInt16(Some(v)) => v.to_string(),
        Value::UInt32(Some(v)) => v.to_string(),
        Value::UInt64(Some(v)) => v.to_string(),
        Value::UInt128(Some(v)) => v.to_string(),
        Value::Float32(Some(v)) => v.to_string(),
        Value::Float64(Some(v)) => v.to_string(),
        Value::Decimal(Some(v)) => v.to_string(),
        Value::Date(Some(v)) => v.format(DATE_FORMAT)?,
        Value::Time(Some(v)) => v.format(TIME_FORMAT)?,
        Value::Timestamp(Some(v)) => format_datetime(v.assume_utc())?,
        Value::TimestampWithTimezone(Some(v)) => format_datetime(*v)?,
        Value::Uuid(Some(v)) => v.hyphenated().to_string(),
        _ => return Err(CoercionError::UnsupportedString(value.type_name())),
    };
    Ok(Some(text))
}

fn coerce_timestamp(value: &Value) -> Result<Option<OffsetDateTime>, CoercionError> {
    let timestamp = match value {
        v if v.is_null() => return Ok(None),
        Value::Date(Some(v)) => v.midnight().assume_utc(),
        Value::Timestamp(Some(v)) => v.assume_utc(),
        Value::TimestampWithTimezone(Some(v)) => *v,
        Value::Varchar(Some(v)) | Value::Unknown(Some(v)) => return parse_timestamp(v),
        Value::Blob(Some(v)) => {
            let text = std::str::from_utf8(v).map_err(|_| CoercionError::InvalidUtf8)?;
            return parse_timestamp(text);
        }
        _ => return Err(CoercionError::UnsupportedTemporal(value.type_name())),
    };
    Ok(Some(timestamp))
}

macro_rules! parse_time {
    ($value:ident as $ty:ty, $($formats:literal),+ $(,)?) => {
        'value: {
            for format in [$($formats,)+] {
                let Ok(format) = parse_borrowed::<2>(format) else {
                    continue;
                };
                let mut parsed = time::parsing::Parsed::new();
                if !matches!(parsed.parse_items($value.as_bytes(), &format), Ok(rest) if rest.is_empty()) {
                    continue;
                }
                if let Ok(result) = <$ty>::try_from(parsed) {
                    break 'value Some(result);
                }
            }
            None
        }
    };
}

/// Parses the textual temporal forms databases commonly return, `None` for empty text.
fn parse_timestamp(text: &str) -> Result<Option<OffsetDateTime>, CoercionError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    if let Ok(result) = OffsetDateTime::parse(text, &Rfc3339) {
        return Ok(Some(result));
    }
    let result = parse_time!(
        text as OffsetDateTime,
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond][offset_hour sign:mandatory]:[offset_minute]",
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond][offset_hour sign:mandatory]",
        "[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]",
        "[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory]",
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond][offset_hour sign:mandatory]:[offset_minute]",
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond][offset_hour sign:mandatory]",
        "[year]-[month]-[day] [hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]",
        "[year]-[month]-[day] [hour]:[minute]:[second][offset_hour sign:mandatory]",
    )
    .or_else(|| {
        parse_time!(
            text as PrimitiveDateTime,
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]",
            "[year]-[month]-[day]T[hour]:[minute]:[second]",
            "[year]-[month]-[day]T[hour]:[minute]",
            "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]",
            "[year]-[month]-[day] [hour]:[minute]:[second]",
            "[year]-[month]-[day] [hour]:[minute]",
        )
        .map(PrimitiveDateTime::assume_utc)
    })
    .or_else(|| {
        parse_time!(text as time::Date, "[year]-[month]-[day]").map(|v| v.midnight().assume_utc())
    });
    result
        .map(Some)
        .ok_or_else(|| CoercionError::InvalidTemporal(text.to_string()))
}
