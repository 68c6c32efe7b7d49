//! Value types for SQL parameters and decoded row values

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::types::DataType;
use crate::{Error, Result};

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// A SQL value that can be used as a parameter or read back from a row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 16-bit integer
    I16(i16),
    /// 32-bit integer
    I32(i32),
    /// 64-bit integer
    I64(i64),
    /// 32-bit float
    F32(f32),
    /// 64-bit float
    F64(f64),
    /// String value
    String(String),
    /// Bytes value
    Bytes(Vec<u8>),
    /// JSON value
    Json(serde_json::Value),
    /// Calendar date
    Date(NaiveDate),
    /// Date and time without zone
    Timestamp(NaiveDateTime),
    #[cfg(feature = "uuid-support")]
    Uuid(uuid::Uuid),
    #[cfg(feature = "decimal-support")]
    Decimal(rust_decimal::Decimal),
}

/// The kind of a value, used to key type adapters and parameter casts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Null,
    Bool,
    I16,
    I32,
    I64,
    F32,
    F64,
    String,
    Bytes,
    Json,
    Date,
    Timestamp,
    Uuid,
    Decimal,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::I16(_) => ValueKind::I16,
            Value::I32(_) => ValueKind::I32,
            Value::I64(_) => ValueKind::I64,
            Value::F32(_) => ValueKind::F32,
            Value::F64(_) => ValueKind::F64,
            Value::String(_) => ValueKind::String,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::Json(_) => ValueKind::Json,
            Value::Date(_) => ValueKind::Date,
            Value::Timestamp(_) => ValueKind::Timestamp,
            #[cfg(feature = "uuid-support")]
            Value::Uuid(_) => ValueKind::Uuid,
            #[cfg(feature = "decimal-support")]
            Value::Decimal(_) => ValueKind::Decimal,
        }
    }

    /// Convert to the JSON shape serde expects for the matching Rust type
    pub fn to_json(&self) -> Result<serde_json::Value> {
        let json = match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::I16(i) => serde_json::Value::from(*i),
            Value::I32(i) => serde_json::Value::from(*i),
            Value::I64(i) => serde_json::Value::from(*i),
            Value::F32(f) => serde_json::Number::from_f64(*f as f64)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::F64(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(b) => serde_json::to_value(b)?,
            Value::Json(j) => j.clone(),
            Value::Date(d) => serde_json::to_value(d)?,
            Value::Timestamp(t) => serde_json::to_value(t)?,
            #[cfg(feature = "uuid-support")]
            Value::Uuid(u) => serde_json::to_value(u)?,
            #[cfg(feature = "decimal-support")]
            Value::Decimal(d) => serde_json::to_value(d)?,
        };
        Ok(json)
    }

    /// Convert a JSON field into the value a column of `data_type` binds
    pub fn from_json(json: &serde_json::Value, data_type: &DataType) -> Result<Value> {
        if json.is_null() {
            return Ok(Value::Null);
        }
        let mismatch = || {
            Error::invalid_query(format!("cannot bind JSON value {} as {:?}", json, data_type))
        };
        let value = match data_type {
            DataType::Boolean => Value::Bool(json.as_bool().ok_or_else(mismatch)?),
            DataType::TinyInt | DataType::SmallInt => {
                let i = json.as_i64().ok_or_else(mismatch)?;
                Value::I16(i16::try_from(i).map_err(|_| mismatch())?)
            }
            DataType::Integer => {
                let i = json.as_i64().ok_or_else(mismatch)?;
                Value::I32(i32::try_from(i).map_err(|_| mismatch())?)
            }
            DataType::BigInt => Value::I64(json.as_i64().ok_or_else(mismatch)?),
            DataType::Real => Value::F32(json.as_f64().ok_or_else(mismatch)? as f32),
            DataType::Double => Value::F64(json.as_f64().ok_or_else(mismatch)?),
            DataType::Decimal { .. } => decimal_from_json(json).ok_or_else(mismatch)?,
            DataType::Varchar(_) | DataType::Char(_) => {
                Value::String(json.as_str().ok_or_else(mismatch)?.to_string())
            }
            DataType::Uuid => uuid_from_json(json).ok_or_else(mismatch)?,
            DataType::Binary => Value::Bytes(serde_json::from_value(json.clone())?),
            DataType::Json => Value::Json(json.clone()),
            DataType::Date => {
                let s = json.as_str().ok_or_else(mismatch)?;
                Value::Date(s.parse::<NaiveDate>().map_err(|_| mismatch())?)
            }
            DataType::Timestamp(_) => {
                let s = json.as_str().ok_or_else(mismatch)?;
                Value::Timestamp(parse_timestamp(s).ok_or_else(mismatch)?)
            }
        };
        Ok(value)
    }
}

#[cfg(feature = "decimal-support")]
fn decimal_from_json(json: &serde_json::Value) -> Option<Value> {
    serde_json::from_value(json.clone()).ok().map(Value::Decimal)
}

#[cfg(not(feature = "decimal-support"))]
fn decimal_from_json(json: &serde_json::Value) -> Option<Value> {
    json.as_f64().map(Value::F64)
}

#[cfg(feature = "uuid-support")]
fn uuid_from_json(json: &serde_json::Value) -> Option<Value> {
    json.as_str()?.parse().ok().map(Value::Uuid)
}

#[cfg(not(feature = "uuid-support"))]
fn uuid_from_json(json: &serde_json::Value) -> Option<Value> {
    json.as_str().map(|s| Value::String(s.to_string()))
}

pub(crate) fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
}

// Implement From for common types
impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(val: bool) -> Self {
        Value::Bool(val)
    }
}

impl From<i16> for Value {
    fn from(val: i16) -> Self {
        Value::I16(val)
    }
}

impl From<i32> for Value {
    fn from(val: i32) -> Self {
        Value::I32(val)
    }
}

impl From<i64> for Value {
    fn from(val: i64) -> Self {
        Value::I64(val)
    }
}

impl From<f32> for Value {
    fn from(val: f32) -> Self {
        Value::F32(val)
    }
}

impl From<f64> for Value {
    fn from(val: f64) -> Self {
        Value::F64(val)
    }
}

impl From<String> for Value {
    fn from(val: String) -> Self {
        Value::String(val)
    }
}

impl From<&str> for Value {
    fn from(val: &str) -> Self {
        Value::String(val.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(val: Vec<u8>) -> Self {
        Value::Bytes(val)
    }
}

impl From<serde_json::Value> for Value {
    fn from(val: serde_json::Value) -> Self {
        Value::Json(val)
    }
}

impl From<NaiveDate> for Value {
    fn from(val: NaiveDate) -> Self {
        Value::Date(val)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(val: NaiveDateTime) -> Self {
        Value::Timestamp(val)
    }
}

#[cfg(feature = "uuid-support")]
impl From<uuid::Uuid> for Value {
    fn from(val: uuid::Uuid) -> Self {
        Value::Uuid(val)
    }
}

#[cfg(feature = "decimal-support")]
impl From<rust_decimal::Decimal> for Value {
    fn from(val: rust_decimal::Decimal) -> Self {
        Value::Decimal(val)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

/// A Rust type that can be stored in a column or produced by an expression.
///
/// The declared [`DataType`] drives DDL and row decoding; `from_value`
/// reports failures as a plain message so callers can attach the label.
pub trait SqlType: Sized + Send + Sync + 'static {
    fn data_type() -> DataType;

    fn nullable() -> bool {
        false
    }

    fn kind() -> ValueKind {
        Self::data_type().kind()
    }

    fn into_value(self) -> Value;

    fn from_value(value: Value) -> std::result::Result<Self, String>;
}

fn unexpected(expected: &str, value: &Value) -> String {
    match value {
        Value::Null => format!("unexpected null for non-nullable {}", expected),
        other => format!("expected {} but found {:?}", expected, other.kind()),
    }
}

impl SqlType for bool {
    fn data_type() -> DataType {
        DataType::Boolean
    }

    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::Bool(b) => Ok(b),
            Value::I16(i) => Ok(i != 0),
            Value::I32(i) => Ok(i != 0),
            Value::I64(i) => Ok(i != 0),
            other => Err(unexpected("bool", &other)),
        }
    }
}

macro_rules! integer_sql_type {
    ($ty:ty, $data_type:expr, $variant:ident) => {
        impl SqlType for $ty {
            fn data_type() -> DataType {
                $data_type
            }

            fn into_value(self) -> Value {
                Value::$variant(self)
            }

            fn from_value(value: Value) -> std::result::Result<Self, String> {
                let wide = match value {
                    Value::I16(i) => i64::from(i),
                    Value::I32(i) => i64::from(i),
                    Value::I64(i) => i,
                    other => return Err(unexpected(stringify!($ty), &other)),
                };
                <$ty>::try_from(wide)
                    .map_err(|_| format!("{} is out of range for {}", wide, stringify!($ty)))
            }
        }
    };
}

integer_sql_type!(i16, DataType::SmallInt, I16);
integer_sql_type!(i32, DataType::Integer, I32);
integer_sql_type!(i64, DataType::BigInt, I64);

impl SqlType for f32 {
    fn data_type() -> DataType {
        DataType::Real
    }

    fn into_value(self) -> Value {
        Value::F32(self)
    }

    fn from_value(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::F32(f) => Ok(f),
            Value::F64(f) => Ok(f as f32),
            other => Err(unexpected("f32", &other)),
        }
    }
}

impl SqlType for f64 {
    fn data_type() -> DataType {
        DataType::Double
    }

    fn into_value(self) -> Value {
        Value::F64(self)
    }

    fn from_value(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::F32(f) => Ok(f64::from(f)),
            Value::F64(f) => Ok(f),
            Value::I16(i) => Ok(f64::from(i)),
            Value::I32(i) => Ok(f64::from(i)),
            Value::I64(i) => Ok(i as f64),
            other => Err(unexpected("f64", &other)),
        }
    }
}

impl SqlType for String {
    fn data_type() -> DataType {
        DataType::Varchar(255)
    }

    fn into_value(self) -> Value {
        Value::String(self)
    }

    fn from_value(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(unexpected("string", &other)),
        }
    }
}

impl SqlType for Vec<u8> {
    fn data_type() -> DataType {
        DataType::Binary
    }

    fn into_value(self) -> Value {
        Value::Bytes(self)
    }

    fn from_value(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::Bytes(b) => Ok(b),
            other => Err(unexpected("bytes", &other)),
        }
    }
}

impl SqlType for serde_json::Value {
    fn data_type() -> DataType {
        DataType::Json
    }

    fn into_value(self) -> Value {
        Value::Json(self)
    }

    fn from_value(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::Json(j) => Ok(j),
            Value::String(s) => serde_json::from_str(&s).map_err(|e| e.to_string()),
            other => Err(unexpected("json", &other)),
        }
    }
}

impl SqlType for NaiveDate {
    fn data_type() -> DataType {
        DataType::Date
    }

    fn into_value(self) -> Value {
        Value::Date(self)
    }

    fn from_value(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::Date(d) => Ok(d),
            Value::Timestamp(t) => Ok(t.date()),
            Value::String(s) => s.parse().map_err(|e: chrono::ParseError| e.to_string()),
            other => Err(unexpected("date", &other)),
        }
    }
}

impl SqlType for NaiveDateTime {
    fn data_type() -> DataType {
        DataType::Timestamp(None)
    }

    fn into_value(self) -> Value {
        Value::Timestamp(self)
    }

    fn from_value(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::Timestamp(t) => Ok(t),
            Value::String(s) => {
                parse_timestamp(&s).ok_or_else(|| format!("'{}' is not a timestamp", s))
            }
            other => Err(unexpected("timestamp", &other)),
        }
    }
}

#[cfg(feature = "uuid-support")]
impl SqlType for uuid::Uuid {
    fn data_type() -> DataType {
        DataType::Uuid
    }

    fn into_value(self) -> Value {
        Value::Uuid(self)
    }

    fn from_value(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::Uuid(u) => Ok(u),
            Value::String(s) => s.parse().map_err(|e: uuid::Error| e.to_string()),
            other => Err(unexpected("uuid", &other)),
        }
    }
}

#[cfg(feature = "decimal-support")]
impl SqlType for rust_decimal::Decimal {
    fn data_type() -> DataType {
        DataType::Decimal {
            precision: 19,
            scale: 4,
        }
    }

    fn into_value(self) -> Value {
        Value::Decimal(self)
    }

    fn from_value(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::Decimal(d) => Ok(d),
            Value::String(s) => s.parse().map_err(|e: rust_decimal::Error| e.to_string()),
            other => Err(unexpected("decimal", &other)),
        }
    }
}

impl<T: SqlType> SqlType for Option<T> {
    fn data_type() -> DataType {
        T::data_type()
    }

    fn nullable() -> bool {
        true
    }

    fn kind() -> ValueKind {
        T::kind()
    }

    fn into_value(self) -> Value {
        match self {
            Some(val) => val.into_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_creation() {
        assert_eq!(Value::from(42i32), Value::I32(42));
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from("hello"), Value::String("hello".to_string()));
        assert_eq!(Value::from(()), Value::Null);
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(Some(42i32)), Value::I32(42));
        assert_eq!(Value::from(None::<i32>), Value::Null);
    }

    #[test]
    fn test_kinds() {
        assert_eq!(Value::I64(1).kind(), ValueKind::I64);
        assert_eq!(Value::Null.kind(), ValueKind::Null);
        let date = NaiveDate::from_ymd_opt(2017, 3, 4).unwrap();
        assert_eq!(Value::Date(date).kind(), ValueKind::Date);
    }

    #[test]
    fn test_integer_widening_and_narrowing() {
        assert_eq!(i64::from_value(Value::I32(7)), Ok(7));
        assert_eq!(i32::from_value(Value::I64(7)), Ok(7));
        assert!(i16::from_value(Value::I64(70_000)).is_err());
    }

    #[test]
    fn test_null_needs_option() {
        assert!(String::from_value(Value::Null).is_err());
        assert_eq!(Option::<String>::from_value(Value::Null), Ok(None));
        assert_eq!(
            Option::<String>::from_value(Value::from("x")),
            Ok(Some("x".to_string()))
        );
        assert!(Option::<String>::nullable());
        assert!(!String::nullable());
    }

    #[test]
    fn test_json_round_trip_through_data_type() {
        let json = serde_json::json!("2020-02-29");
        let value = Value::from_json(&json, &DataType::Date).unwrap();
        assert_eq!(value, Value::Date(NaiveDate::from_ymd_opt(2020, 2, 29).unwrap()));
        assert_eq!(value.to_json().unwrap(), json);
    }

    #[test]
    fn test_json_mismatch_is_rejected() {
        let json = serde_json::json!("not a number");
        let err = Value::from_json(&json, &DataType::BigInt).unwrap_err();
        assert!(matches!(err, Error::InvalidQuery { .. }));
    }

    #[test]
    fn test_timestamp_parsing_accepts_both_separators() {
        let expected = NaiveDate::from_ymd_opt(2021, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        assert_eq!(parse_timestamp("2021-01-02 03:04:05"), Some(expected));
        assert_eq!(parse_timestamp("2021-01-02T03:04:05"), Some(expected));
    }
}
