use crate::{CoercionError, Precision, RecordValue, Value};

/// Largest magnitude below which every whole `f64` is an exact integer.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A numeric cell, holding exactly one of the accepted representations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    UInt(u64),
    Float32(f32),
    Float64(f64),
}

impl Number {
    /// Decodes a raw column value, `None` meaning `NULL`.
    pub fn from_value(value: &Value) -> Result<Option<Self>, CoercionError> {
        let number = match value {
            v if v.is_null() => return Ok(None),
            Value::Int8(Some(v)) => Number::Int(*v as i64),
            Value::Int16(Some(v)) => Number::Int(*v as i64),
            Value::Int32(Some(v)) => Number::Int(*v as i64),
            Value::Int64(Some(v)) => Number::Int(*v),
            Value::Int128(Some(v)) => i64::try_from(*v)
                .map(Number::Int)
                .or_else(|_| u64::try_from(*v).map(Number::UInt))
                .map_err(|_| CoercionError::OutOfRange(v.to_string()))?,
            Value::UInt8(Some(v)) => Number::UInt(*v as u64),
            Value::UInt16(Some(v)) => Number::UInt(*v as u64),
            Value::UInt32(Some(v)) => Number::UInt(*v as u64),
            Value::UInt64(Some(v)) => Number::UInt(*v),
            Value::UInt128(Some(v)) => u64::try_from(*v)
                .map(Number::UInt)
                .map_err(|_| CoercionError::OutOfRange(v.to_string()))?,
            Value::Float32(Some(v)) => Number::Float32(*v),
            Value::Float64(Some(v)) => Number::Float64(*v),
            Value::Decimal(Some(v)) => Self::parse(&v.to_string())?,
            Value::Varchar(Some(v)) | Value::Unknown(Some(v)) => return Self::parse_text(v),
            Value::Blob(Some(v)) => {
                let text = std::str::from_utf8(v).map_err(|_| {
                    CoercionError::InvalidNumber(String::from_utf8_lossy(v).into_owned())
                })?;
                return Self::parse_text(text);
            }
            _ => return Err(CoercionError::UnsupportedNumber(value.type_name())),
        };
        Ok(Some(number))
    }

    fn parse_text(text: &str) -> Result<Option<Self>, CoercionError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        Self::parse(text).map(Some)
    }

    /// Parses a decimal literal, as a float when it contains a decimal point and as an
    /// integer otherwise.
    pub fn parse(text: &str) -> Result<Self, CoercionError> {
        let invalid = || CoercionError::InvalidNumber(text.to_string());
        if text.contains('.') {
            return text.parse().map(Number::Float64).map_err(|_| invalid());
        }
        if let Ok(v) = text.parse() {
            return Ok(Number::Int(v));
        }
        if let Ok(v) = text.parse() {
            return Ok(Number::UInt(v));
        }
        // Exponent notation
        text.parse().map(Number::Float64).map_err(|_| invalid())
    }

    /// Wire form: whole numbers become bare integers, fractional ones keep their width
    /// unless `precision` narrows them.
    pub fn into_record(self, precision: Option<Precision>) -> Result<RecordValue, CoercionError> {
        let narrow = precision == Some(Precision::Float32);
        match self {
            Number::Int(v) => Ok(RecordValue::Integer(v)),
            Number::UInt(v) => Ok(match i64::try_from(v) {
                Ok(v) => RecordValue::Integer(v),
                Err(..) => RecordValue::UInteger(v),
            }),
            Number::Float32(v) => emit_float(v as f64, true),
            Number::Float64(v) => emit_float(v, narrow),
        }
    }
}

fn emit_float(value: f64, single: bool) -> Result<RecordValue, CoercionError> {
    if !value.is_finite() {
        return Err(CoercionError::NonFinite(value));
    }
    if value.fract() == 0.0 && value.abs() < MAX_SAFE_INTEGER {
        return Ok(RecordValue::Integer(value as i64));
    }
    Ok(if single {
        RecordValue::Float32(value as f32)
    } else {
        RecordValue::Float64(value)
    })
}
