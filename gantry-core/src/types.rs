//! Column data types and per-dialect value adapters

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;
use crate::value::{Value, ValueKind};
use crate::Result;

/// Declared SQL type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    Decimal { precision: u8, scale: u8 },
    Varchar(u32),
    Char(u32),
    Binary,
    Json,
    Date,
    /// Timestamp with optional fractional-second precision
    Timestamp(Option<u8>),
    Uuid,
}

impl DataType {
    /// The value kind rows of this type decode into
    pub fn kind(&self) -> ValueKind {
        match self {
            DataType::Boolean => ValueKind::Bool,
            DataType::TinyInt | DataType::SmallInt => ValueKind::I16,
            DataType::Integer => ValueKind::I32,
            DataType::BigInt => ValueKind::I64,
            DataType::Real => ValueKind::F32,
            DataType::Double => ValueKind::F64,
            DataType::Decimal { .. } => decimal_kind(),
            DataType::Varchar(_) | DataType::Char(_) => ValueKind::String,
            DataType::Binary => ValueKind::Bytes,
            DataType::Json => ValueKind::Json,
            DataType::Date => ValueKind::Date,
            DataType::Timestamp(_) => ValueKind::Timestamp,
            DataType::Uuid => uuid_kind(),
        }
    }
}

#[cfg(feature = "decimal-support")]
fn decimal_kind() -> ValueKind {
    ValueKind::Decimal
}

#[cfg(not(feature = "decimal-support"))]
fn decimal_kind() -> ValueKind {
    ValueKind::F64
}

#[cfg(feature = "uuid-support")]
fn uuid_kind() -> ValueKind {
    ValueKind::Uuid
}

#[cfg(not(feature = "uuid-support"))]
fn uuid_kind() -> ValueKind {
    ValueKind::String
}

/// Converts values of one kind between their Rust and database shapes.
///
/// Registered per [`ValueKind`] on a dialect; bound parameters pass through
/// `to_database`, decoded row values through `from_database`, and inline
/// literals through `literal`.
pub trait TypeAdapter: Send + Sync + fmt::Debug {
    fn to_database(&self, value: Value) -> Value {
        value
    }

    fn from_database(&self, value: Value) -> Value {
        value
    }

    fn literal(&self, dialect: &dyn Dialect, value: &Value) -> Result<String> {
        dialect.literal(value)
    }
}

/// Stores booleans as 0/1 numbers for databases without a boolean type
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanAsNumber;

impl TypeAdapter for BooleanAsNumber {
    fn to_database(&self, value: Value) -> Value {
        match value {
            Value::Bool(b) => Value::I16(i16::from(b)),
            other => other,
        }
    }

    fn from_database(&self, value: Value) -> Value {
        match value {
            Value::I16(n) => Value::Bool(n != 0),
            Value::I32(n) => Value::Bool(n != 0),
            Value::I64(n) => Value::Bool(n != 0),
            other => other,
        }
    }

    fn literal(&self, dialect: &dyn Dialect, value: &Value) -> Result<String> {
        match value {
            Value::Bool(true) => Ok("1".to_string()),
            Value::Bool(false) => Ok("0".to_string()),
            other => dialect.literal(other),
        }
    }
}
