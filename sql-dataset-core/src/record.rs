use crate::RowNames;
use serde::{Serialize, Serializer, ser::SerializeMap};

/// Wire value of a single dataset cell.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    Null,
    Integer(i64),
    UInteger(u64),
    Float32(f32),
    Float64(f64),
    /// Plain text, or a formatted date or datetime.
    Text(String),
}

impl RecordValue {
    pub fn is_null(&self) -> bool {
        matches!(self, RecordValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RecordValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            RecordValue::Integer(v) => Some(v as f64),
            RecordValue::UInteger(v) => Some(v as f64),
            RecordValue::Float32(v) => Some(v as f64),
            RecordValue::Float64(v) => Some(v),
            _ => None,
        }
    }
}

impl Serialize for RecordValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RecordValue::Null => serializer.serialize_none(),
            RecordValue::Integer(v) => serializer.serialize_i64(*v),
            RecordValue::UInteger(v) => serializer.serialize_u64(*v),
            RecordValue::Float32(v) => serializer.serialize_f32(*v),
            RecordValue::Float64(v) => serializer.serialize_f64(*v),
            RecordValue::Text(v) => serializer.serialize_str(v),
        }
    }
}

impl From<i64> for RecordValue {
    fn from(value: i64) -> Self {
        RecordValue::Integer(value)
    }
}

impl From<f64> for RecordValue {
    fn from(value: f64) -> Self {
        RecordValue::Float64(value)
    }
}

impl From<String> for RecordValue {
    fn from(value: String) -> Self {
        RecordValue::Text(value)
    }
}

impl From<&str> for RecordValue {
    fn from(value: &str) -> Self {
        RecordValue::Text(value.into())
    }
}

/// One coerced row, keyed by the schema keys.
///
/// Serializes as a JSON object whose entries follow the field declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRow {
    keys: RowNames,
    values: Box<[RecordValue]>,
}

impl DatasetRow {
    pub fn new(keys: RowNames, values: Box<[RecordValue]>) -> Self {
        debug_assert_eq!(keys.len(), values.len());
        Self { keys, values }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn values(&self) -> &[RecordValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&RecordValue> {
        self.keys
            .iter()
            .position(|k| k == key)
            .map(|i| &self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RecordValue)> {
        self.keys.iter().map(String::as_str).zip(self.values.iter())
    }
}

impl Serialize for DatasetRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
