use sql_dataset_core::Value;
use time::{Date, Month, PrimitiveDateTime, Time};

/// Column value as received from the text protocol.
///
/// Text queries deliver every non null column as bytes, the binary variants only show up for
/// values the server already typed.
pub(crate) struct ValueWrap(pub(crate) Value);

impl From<Value> for ValueWrap {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
impl From<ValueWrap> for Value {
    fn from(value: ValueWrap) -> Self {
        value.0
    }
}

impl mysql_async::prelude::FromValue for ValueWrap {
    type Intermediate = ValueWrap;
}

impl TryFrom<mysql_async::Value> for ValueWrap {
    type Error = mysql_async::FromValueError;
    fn try_from(value: mysql_async::Value) -> Result<Self, Self::Error> {
        let invalid = || mysql_async::FromValueError(value.clone());
        Ok(match value {
            mysql_async::Value::NULL => Value::Null,
            mysql_async::Value::Bytes(ref v) => Value::Blob(Some(v.clone().into())),
            mysql_async::Value::Int(v) => Value::Int64(v.into()),
            mysql_async::Value::UInt(v) => Value::UInt64(v.into()),
            mysql_async::Value::Float(v) => Value::Float32(v.into()),
            mysql_async::Value::Double(v) => Value::Float64(v.into()),
            mysql_async::Value::Date(year, month, day, hour, minute, second, microsecond) => {
                let month = Month::try_from(month).map_err(|_| invalid())?;
                let date = Date::from_calendar_date(year as _, month, day).map_err(|_| invalid())?;
                let time = Time::from_hms_micro(hour, minute, second, microsecond)
                    .map_err(|_| invalid())?;
                Value::Timestamp(Some(PrimitiveDateTime::new(date, time)))
            }
            mysql_async::Value::Time(false, 0, hours, minutes, seconds, micro) => Value::Time(Some(
                Time::from_hms_micro(hours, minutes, seconds, micro).map_err(|_| invalid())?,
            )),
            mysql_async::Value::Time(negative, days, hours, minutes, seconds, micro) => {
                Value::Unknown(Some(format!(
                    "{}{}:{:02}:{:02}.{:06}",
                    if negative { "-" } else { "" },
                    days * 24 + hours as u32,
                    minutes,
                    seconds,
                    micro
                )))
            }
        }
        .into())
    }
}
