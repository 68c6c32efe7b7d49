//! Result rows and the mappers that decode them

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use sqlx::any::AnyRow;

use crate::catalog::TableInfo;
use crate::dialect::Dialect;
use crate::value::{parse_timestamp, SqlType, Value, ValueKind};
use crate::{Error, Result};

/// A result row addressed by column label
pub trait Row {
    /// The value under `label`, decoded as `kind` where the source is typed
    fn value(&self, label: &str, kind: ValueKind) -> Result<Value>;
}

impl Row for HashMap<String, Value> {
    fn value(&self, label: &str, _kind: ValueKind) -> Result<Value> {
        self.get(label)
            .cloned()
            .ok_or_else(|| Error::decode(label, "no such column in row"))
    }
}

fn parsed<T, E: fmt::Display>(
    label: &str,
    raw: Option<String>,
    parse: impl FnOnce(&str) -> std::result::Result<T, E>,
) -> Result<Option<T>> {
    raw.map(|s| parse(&s).map_err(|e| Error::decode(label, e.to_string())))
        .transpose()
}

impl Row for AnyRow {
    fn value(&self, label: &str, kind: ValueKind) -> Result<Value> {
        use sqlx::Row as _;

        let value = match kind {
            ValueKind::Null => None,
            ValueKind::Bool => match self.try_get::<Option<bool>, _>(label) {
                Ok(b) => b.map(Value::Bool),
                Err(_) => self.try_get::<Option<i64>, _>(label)?.map(Value::I64),
            },
            ValueKind::I16 => self.try_get::<Option<i16>, _>(label)?.map(Value::I16),
            ValueKind::I32 => self.try_get::<Option<i32>, _>(label)?.map(Value::I32),
            ValueKind::I64 => self.try_get::<Option<i64>, _>(label)?.map(Value::I64),
            ValueKind::F32 => self.try_get::<Option<f32>, _>(label)?.map(Value::F32),
            ValueKind::F64 => self.try_get::<Option<f64>, _>(label)?.map(Value::F64),
            ValueKind::String => self.try_get::<Option<String>, _>(label)?.map(Value::String),
            ValueKind::Bytes => self.try_get::<Option<Vec<u8>>, _>(label)?.map(Value::Bytes),
            ValueKind::Json => {
                let raw = self.try_get::<Option<String>, _>(label)?;
                parsed(label, raw, |s| serde_json::from_str::<serde_json::Value>(s))?
                    .map(Value::Json)
            }
            ValueKind::Date => {
                let raw = self.try_get::<Option<String>, _>(label)?;
                parsed(label, raw, str::parse::<NaiveDate>)?.map(Value::Date)
            }
            ValueKind::Timestamp => {
                let raw = self.try_get::<Option<String>, _>(label)?;
                parsed(label, raw, |s| {
                    parse_timestamp(s).ok_or_else(|| format!("'{}' is not a timestamp", s))
                })?
                .map(Value::Timestamp)
            }
            ValueKind::Uuid => {
                let raw = self.try_get::<Option<String>, _>(label)?;
                uuid_value(label, raw)?
            }
            ValueKind::Decimal => {
                let raw = self.try_get::<Option<String>, _>(label)?;
                decimal_value(label, raw)?
            }
        };
        Ok(value.unwrap_or(Value::Null))
    }
}

#[cfg(feature = "uuid-support")]
fn uuid_value(label: &str, raw: Option<String>) -> Result<Option<Value>> {
    Ok(parsed(label, raw, str::parse::<uuid::Uuid>)?.map(Value::Uuid))
}

#[cfg(not(feature = "uuid-support"))]
fn uuid_value(_label: &str, raw: Option<String>) -> Result<Option<Value>> {
    Ok(raw.map(Value::String))
}

#[cfg(feature = "decimal-support")]
fn decimal_value(label: &str, raw: Option<String>) -> Result<Option<Value>> {
    Ok(parsed(label, raw, str::parse::<rust_decimal::Decimal>)?.map(Value::Decimal))
}

#[cfg(not(feature = "decimal-support"))]
fn decimal_value(label: &str, raw: Option<String>) -> Result<Option<Value>> {
    Ok(parsed(label, raw, str::parse::<f64>)?.map(Value::F64))
}

/// View of a row where every label is read as `{prefix}_{label}`
struct PrefixedRow<'a> {
    row: &'a dyn Row,
    prefix: &'a str,
}

impl Row for PrefixedRow<'_> {
    fn value(&self, label: &str, kind: ValueKind) -> Result<Value> {
        self.row.value(&format!("{}_{}", self.prefix, label), kind)
    }
}

fn read(row: &dyn Row, label: &str, kind: ValueKind, dialect: &dyn Dialect) -> Result<Value> {
    let value = row.value(label, kind)?;
    Ok(match dialect.type_adapter(kind) {
        Some(adapter) => adapter.from_database(value),
        None => value,
    })
}

/// A field of an object decoded from a row
#[derive(Debug, Clone)]
pub struct ObjectField {
    pub label: String,
    pub field: String,
    pub kind: ValueKind,
}

type Decoder<T> = dyn Fn(&dyn Row) -> Result<T> + Send + Sync;

/// Decodes one row into a `T`, consuming `width` projected columns
pub struct RowMapper<T> {
    width: usize,
    decode: Arc<Decoder<T>>,
}

impl<T> Clone for RowMapper<T> {
    fn clone(&self) -> Self {
        Self {
            width: self.width,
            decode: Arc::clone(&self.decode),
        }
    }
}

impl<T> fmt::Debug for RowMapper<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowMapper").field("width", &self.width).finish()
    }
}

impl RowMapper<()> {
    /// Zero-width mapper that every tuple mapper grows from
    pub fn identity() -> Self {
        Self::new(0, |_| Ok(()))
    }
}

impl<T> RowMapper<T> {
    /// Number of projected columns this mapper reads
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn map_row(&self, row: &dyn Row) -> Result<T> {
        (self.decode)(row)
    }
}

impl<T: 'static> RowMapper<T> {
    pub fn new<F>(width: usize, decode: F) -> Self
    where
        F: Fn(&dyn Row) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            width,
            decode: Arc::new(decode),
        }
    }

    pub fn map<U, F>(self, f: F) -> RowMapper<U>
    where
        U: 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let decode = self.decode;
        RowMapper::new(self.width, move |row| decode(row).map(&f))
    }

    /// Read every label through `{prefix}_`
    pub fn prefixed(self, prefix: &str) -> RowMapper<T> {
        let decode = self.decode;
        let prefix = prefix.to_string();
        RowMapper::new(self.width, move |row| {
            decode(&PrefixedRow {
                row,
                prefix: &prefix,
            })
        })
    }

    /// Decode `self` then `other` from the same row into a wider tuple
    pub fn append<U: 'static>(self, other: RowMapper<U>) -> RowMapper<T::Output>
    where
        T: TupleAppend<U>,
        T::Output: 'static,
    {
        let (left, right) = (self.decode, other.decode);
        RowMapper::new(self.width + other.width, move |row| {
            Ok(left(row)?.append(right(row)?))
        })
    }
}

impl<T: SqlType> RowMapper<T> {
    /// A single labeled column
    pub fn column(label: impl Into<String>, dialect: Arc<dyn Dialect>) -> Self {
        let label = label.into();
        RowMapper::new(1, move |row| {
            let value = read(row, &label, T::kind(), dialect.as_ref())?;
            T::from_value(value).map_err(|message| Error::decode(label.as_str(), message))
        })
    }
}

impl<T: 'static> RowMapper<(T,)> {
    /// Unwrap a one-element tuple
    pub fn scalar(self) -> RowMapper<T> {
        self.map(|(value,)| value)
    }
}

impl<R: DeserializeOwned + 'static> RowMapper<R> {
    /// Every column of `table`, labeled by column name, into the fields of `R`
    pub fn table(table: Arc<TableInfo>, dialect: Arc<dyn Dialect>) -> Self {
        let fields = table
            .columns()
            .iter()
            .map(|c| ObjectField {
                label: c.name().to_string(),
                field: c.field().to_string(),
                kind: c.data_type().kind(),
            })
            .collect();
        Self::object(table.name(), fields, dialect)
    }

    /// The given labeled fields, deserialized into `R` through serde
    pub fn object(name: &str, fields: Vec<ObjectField>, dialect: Arc<dyn Dialect>) -> Self {
        let name = name.to_string();
        RowMapper::new(fields.len(), move |row| {
            let mut object = serde_json::Map::with_capacity(fields.len());
            for field in &fields {
                let value = read(row, &field.label, field.kind, dialect.as_ref())?;
                object.insert(field.field.clone(), value.to_json()?);
            }
            serde_json::from_value(serde_json::Value::Object(object))
                .map_err(|e| Error::decode(name.as_str(), e.to_string()))
        })
    }
}

/// Tuples that can grow by one element
pub trait TupleAppend<U> {
    type Output;

    fn append(self, value: U) -> Self::Output;
}

impl<U> TupleAppend<U> for () {
    type Output = (U,);

    fn append(self, value: U) -> (U,) {
        (value,)
    }
}

macro_rules! tuple_append {
    ($($name:ident),+) => {
        impl<$($name,)+ U> TupleAppend<U> for ($($name,)+) {
            type Output = ($($name,)+ U,);

            #[allow(non_snake_case)]
            fn append(self, value: U) -> Self::Output {
                let ($($name,)+) = self;
                ($($name,)+ value,)
            }
        }
    };
}

tuple_append!(A);
tuple_append!(A, B);
tuple_append!(A, B, C);
tuple_append!(A, B, C, D);
tuple_append!(A, B, C, D, E);
tuple_append!(A, B, C, D, E, F);
tuple_append!(A, B, C, D, E, F, G);
tuple_append!(A, B, C, D, E, F, G, H);
tuple_append!(A, B, C, D, E, F, G, H, I);
tuple_append!(A, B, C, D, E, F, G, H, I, J);
tuple_append!(A, B, C, D, E, F, G, H, I, J, K);
