use rust_decimal::Decimal;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Dynamically typed value decoded from a result set column.
///
/// Backends produce the variant closest to the native column type. A `None`
/// payload is a typed `NULL`, while `Value::Null` is used when the backend does not
/// know the type of a `NULL` column. `Unknown` carries the textual form of values
/// the backend could not classify.
#[derive(Default, Debug, Clone, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    Int8(Option<i8>),
    Int16(Option<i16>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    Int128(Option<i128>),
    UInt8(Option<u8>),
    UInt16(Option<u16>),
    UInt32(Option<u32>),
    UInt64(Option<u64>),
    UInt128(Option<u128>),
    Float32(Option<f32>),
    Float64(Option<f64>),
    Decimal(Option<Decimal>),
    Varchar(Option<String>),
    Blob(Option<Box<[u8]>>),
    Date(Option<Date>),
    Time(Option<Time>),
    Timestamp(Option<PrimitiveDateTime>),
    TimestampWithTimezone(Option<OffsetDateTime>),
    Uuid(Option<Uuid>),
    Unknown(Option<String>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(
            self,
            Value::Null
                | Value::Boolean(None)
                | Value::Int8(None)
                | Value::Int16(None)
                | Value::Int32(None)
                | Value::Int64(None)
                | Value::Int128(None)
                | Value::UInt8(None)
                | Value::UInt16(None)
                | Value::UInt32(None)
                | Value::UInt64(None)
                | Value::UInt128(None)
                | Value::Float32(None)
                | Value::Float64(None)
                | Value::Decimal(None)
                | Value::Varchar(None)
                | Value::Blob(None)
                | Value::Date(None)
                | Value::Time(None)
                | Value::Timestamp(None)
                | Value::TimestampWithTimezone(None)
                | Value::Uuid(None)
                | Value::Unknown(None)
        )
    }

    /// Name of the native representation, used in conversion errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(..) => "bool",
            Value::Int8(..) => "i8",
            Value::Int16(..) => "i16",
            Value::Int32(..) => "i32",
            Value::Int64(..) => "i64",
            Value::Int128(..) => "i128",
            Value::UInt8(..) => "u8",
            Value::UInt16(..) => "u16",
            Value::UInt32(..) => "u32",
            Value::UInt64(..) => "u64",
            Value::UInt128(..) => "u128",
            Value::Float32(..) => "f32",
            Value::Float64(..) => "f64",
            Value::Decimal(..) => "decimal",
            Value::Varchar(..) => "string",
            Value::Blob(..) => "bytes",
            Value::Date(..) => "date",
            Value::Time(..) => "time",
            Value::Timestamp(..) => "timestamp",
            Value::TimestampWithTimezone(..) => "timestamp with time zone",
            Value::Uuid(..) => "uuid",
            Value::Unknown(..) => "unknown",
        }
    }
}

macro_rules! impl_from {
    ($source:ty, $destination:path) => {
        impl From<$source> for Value {
            fn from(value: $source) -> Self {
                $destination(Some(value.into()))
            }
        }
        impl From<Option<$source>> for Value {
            fn from(value: Option<$source>) -> Self {
                $destination(value.map(Into::into))
            }
        }
    };
}

impl_from!(bool, Value::Boolean);
impl_from!(i8, Value::Int8);
impl_from!(i16, Value::Int16);
impl_from!(i32, Value::Int32);
impl_from!(i64, Value::Int64);
impl_from!(i128, Value::Int128);
impl_from!(u8, Value::UInt8);
impl_from!(u16, Value::UInt16);
impl_from!(u32, Value::UInt32);
impl_from!(u64, Value::UInt64);
impl_from!(u128, Value::UInt128);
impl_from!(f32, Value::Float32);
impl_from!(f64, Value::Float64);
impl_from!(Decimal, Value::Decimal);
impl_from!(String, Value::Varchar);
impl_from!(Box<[u8]>, Value::Blob);
impl_from!(Vec<u8>, Value::Blob);
impl_from!(Date, Value::Date);
impl_from!(Time, Value::Time);
impl_from!(PrimitiveDateTime, Value::Timestamp);
impl_from!(OffsetDateTime, Value::TimestampWithTimezone);
impl_from!(Uuid, Value::Uuid);

impl From<&'static str> for Value {
    fn from(value: &'static str) -> Self {
        Value::Varchar(Some(value.into()))
    }
}
