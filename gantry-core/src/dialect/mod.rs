//! SQL dialects
//!
//! A [`Dialect`] owns every piece of vendor-specific text a statement can
//! contain: literals, parameter placeholders, type names, pagination,
//! isolation suffixes and the function registry. The trait defaults target
//! a baseline ANSI database; vendor dialects override what differs.

mod ansi;
mod db2;
mod oracle;
mod postgres;

pub use ansi::AnsiDialect;
pub use db2::Db2Dialect;
pub use oracle::OracleDialect;
pub use postgres::PostgresDialect;

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::{DataType, TypeAdapter};
use crate::value::{Value, ValueKind};
use crate::{Error, Result};

/// Name under which a function is registered with a dialect
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionName(Cow<'static, str>);

impl FunctionName {
    pub const YEAR: Self = FunctionName(Cow::Borrowed("year"));
    pub const MONTH: Self = FunctionName(Cow::Borrowed("month"));
    pub const DAY: Self = FunctionName(Cow::Borrowed("day"));
    pub const HOUR: Self = FunctionName(Cow::Borrowed("hour"));
    pub const MINUTE: Self = FunctionName(Cow::Borrowed("minute"));
    pub const SECOND: Self = FunctionName(Cow::Borrowed("second"));
    pub const CURRENT_DATE: Self = FunctionName(Cow::Borrowed("current_date"));
    pub const CURRENT_TIMESTAMP: Self = FunctionName(Cow::Borrowed("current_timestamp"));
    pub const UPPER: Self = FunctionName(Cow::Borrowed("upper"));
    pub const LOWER: Self = FunctionName(Cow::Borrowed("lower"));
    pub const COALESCE: Self = FunctionName(Cow::Borrowed("coalesce"));
    pub const MAX: Self = FunctionName(Cow::Borrowed("max"));
    pub const MIN: Self = FunctionName(Cow::Borrowed("min"));
    pub const SUM: Self = FunctionName(Cow::Borrowed("sum"));
    pub const AVG: Self = FunctionName(Cow::Borrowed("avg"));
    pub const COUNT: Self = FunctionName(Cow::Borrowed("count"));
    pub const COUNT_DISTINCT: Self = FunctionName(Cow::Borrowed("count_distinct"));

    pub fn new(name: impl Into<String>) -> Self {
        FunctionName(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

type FunctionRenderer = dyn Fn(&[String]) -> String + Send + Sync;

/// How a registered function renders around its already-rendered arguments.
///
/// Renderers must emit the arguments in the order given, since bound
/// parameters inside them are collected in that order.
#[derive(Clone)]
pub struct FunctionSpec {
    render: Arc<FunctionRenderer>,
}

impl FunctionSpec {
    pub fn new<F>(render: F) -> Self
    where
        F: Fn(&[String]) -> String + Send + Sync + 'static,
    {
        Self {
            render: Arc::new(render),
        }
    }

    /// `name(arg, arg, ...)`
    pub fn call(name: &'static str) -> Self {
        Self::new(move |args| format!("{}({})", name, args.join(", ")))
    }

    /// A bare keyword such as `current_date`
    pub fn keyword(sql: &'static str) -> Self {
        Self::new(move |_| sql.to_string())
    }

    /// `extract(field from arg)`
    pub fn extract(field: &'static str) -> Self {
        Self::new(move |args| format!("extract({} from {})", field, args.join(", ")))
    }

    pub fn sql(&self, args: &[String]) -> String {
        (self.render)(args)
    }
}

impl fmt::Debug for FunctionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FunctionSpec")
    }
}

/// Functions and type adapters known to a dialect
#[derive(Clone, Default)]
pub struct DialectRegistry {
    functions: HashMap<FunctionName, FunctionSpec>,
    types: HashMap<ValueKind, Arc<dyn TypeAdapter>>,
}

impl DialectRegistry {
    /// Registry holding the functions every dialect starts with
    pub fn ansi() -> Self {
        let mut registry = Self::default();
        for (name, sql) in [
            (FunctionName::YEAR, "year"),
            (FunctionName::MONTH, "month"),
            (FunctionName::DAY, "day"),
            (FunctionName::HOUR, "hour"),
            (FunctionName::MINUTE, "minute"),
            (FunctionName::SECOND, "second"),
            (FunctionName::UPPER, "upper"),
            (FunctionName::LOWER, "lower"),
            (FunctionName::COALESCE, "coalesce"),
            (FunctionName::MAX, "max"),
            (FunctionName::MIN, "min"),
            (FunctionName::SUM, "sum"),
            (FunctionName::AVG, "avg"),
            (FunctionName::COUNT, "count"),
        ] {
            registry.register_function(name, FunctionSpec::call(sql));
        }
        registry.register_function(FunctionName::CURRENT_DATE, FunctionSpec::keyword("current_date"));
        registry.register_function(
            FunctionName::CURRENT_TIMESTAMP,
            FunctionSpec::keyword("current_timestamp"),
        );
        registry.register_function(
            FunctionName::COUNT_DISTINCT,
            FunctionSpec::new(|args| format!("count(distinct {})", args.join(", "))),
        );
        registry
    }

    pub fn register_function(&mut self, name: FunctionName, spec: FunctionSpec) {
        self.functions.insert(name, spec);
    }

    pub fn register_type(&mut self, kind: ValueKind, adapter: Arc<dyn TypeAdapter>) {
        self.types.insert(kind, adapter);
    }

    pub fn function(&self, name: &FunctionName) -> Option<&FunctionSpec> {
        self.functions.get(name)
    }

    pub fn type_adapter(&self, kind: ValueKind) -> Option<&dyn TypeAdapter> {
        self.types.get(&kind).map(|a| a.as_ref())
    }
}

impl fmt::Debug for DialectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut functions: Vec<_> = self.functions.keys().map(|n| n.as_str()).collect();
        functions.sort_unstable();
        f.debug_struct("DialectRegistry")
            .field("functions", &functions)
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Transaction isolation level for a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    pub fn sql(&self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "read uncommitted",
            IsolationLevel::ReadCommitted => "read committed",
            IsolationLevel::RepeatableRead => "repeatable read",
            IsolationLevel::Serializable => "serializable",
        }
    }
}

/// Lock retained on rows read under an isolation level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockLevel {
    Share,
    Update,
    Exclusive,
}

impl LockLevel {
    pub fn sql(&self) -> &'static str {
        match self {
            LockLevel::Share => "share",
            LockLevel::Update => "update",
            LockLevel::Exclusive => "exclusive",
        }
    }
}

/// Built-in dialects selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    #[default]
    Ansi,
    Db2,
    Postgres,
    Oracle,
}

impl DialectKind {
    pub fn create(&self) -> Box<dyn Dialect> {
        match self {
            DialectKind::Ansi => Box::new(AnsiDialect::new()),
            DialectKind::Db2 => Box::new(Db2Dialect::new()),
            DialectKind::Postgres => Box::new(PostgresDialect::new()),
            DialectKind::Oracle => Box::new(OracleDialect::new()),
        }
    }
}

pub(crate) fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

/// Type names shared by most dialects
pub(crate) fn ansi_type_name(data_type: &DataType) -> String {
    match data_type {
        DataType::Boolean => "boolean".to_string(),
        DataType::TinyInt | DataType::SmallInt => "smallint".to_string(),
        DataType::Integer => "integer".to_string(),
        DataType::BigInt => "bigint".to_string(),
        DataType::Real => "real".to_string(),
        DataType::Double => "double precision".to_string(),
        DataType::Decimal { precision, scale } => format!("decimal({},{})", precision, scale),
        DataType::Varchar(n) => format!("varchar({})", n),
        DataType::Char(n) => format!("char({})", n),
        DataType::Binary => "blob".to_string(),
        DataType::Json => "clob".to_string(),
        DataType::Date => "date".to_string(),
        DataType::Timestamp(Some(p)) => format!("timestamp({})", p),
        DataType::Timestamp(None) => "timestamp".to_string(),
        DataType::Uuid => "char(36)".to_string(),
    }
}

/// Vendor-specific SQL generation
pub trait Dialect: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn registry(&self) -> &DialectRegistry;

    fn registry_mut(&mut self) -> &mut DialectRegistry;

    fn register_function(&mut self, name: FunctionName, spec: FunctionSpec) {
        self.registry_mut().register_function(name, spec);
    }

    fn register_type(&mut self, kind: ValueKind, adapter: Arc<dyn TypeAdapter>) {
        self.registry_mut().register_type(kind, adapter);
    }

    fn function(&self, name: &FunctionName) -> Result<&FunctionSpec> {
        self.registry()
            .function(name)
            .ok_or_else(|| Error::dialect_unsupported(self.name(), format!("function '{}'", name)))
    }

    fn type_adapter(&self, kind: ValueKind) -> Option<&dyn TypeAdapter> {
        self.registry().type_adapter(kind)
    }

    /// Inline literal for a value
    fn literal(&self, value: &Value) -> Result<String> {
        let sql = match value {
            Value::Null => "null".to_string(),
            Value::Bool(b) => self.boolean_literal(*b),
            Value::I16(i) => i.to_string(),
            Value::I32(i) => i.to_string(),
            Value::I64(i) => i.to_string(),
            Value::F32(f) => f.to_string(),
            Value::F64(f) => f.to_string(),
            Value::String(s) => self.string_literal(s),
            Value::Bytes(b) => self.binary_literal(b),
            Value::Json(j) => self.string_literal(&j.to_string()),
            Value::Date(d) => self.date_literal(d),
            Value::Timestamp(t) => self.timestamp_literal(t),
            #[cfg(feature = "uuid-support")]
            Value::Uuid(u) => self.string_literal(&u.to_string()),
            #[cfg(feature = "decimal-support")]
            Value::Decimal(d) => d.to_string(),
        };
        Ok(sql)
    }

    fn string_literal(&self, s: &str) -> String {
        format!("'{}'", s.replace('\'', "''"))
    }

    fn binary_literal(&self, bytes: &[u8]) -> String {
        format!("X'{}'", hex(bytes))
    }

    fn date_literal(&self, date: &chrono::NaiveDate) -> String {
        format!("DATE '{}'", date.format("%Y-%m-%d"))
    }

    fn timestamp_literal(&self, timestamp: &chrono::NaiveDateTime) -> String {
        format!("TIMESTAMP '{}'", timestamp.format("%Y-%m-%d %H:%M:%S%.6f"))
    }

    fn boolean_literal(&self, b: bool) -> String {
        let sql = if b { "true" } else { "false" };
        sql.to_string()
    }

    /// Type a bound parameter of `kind` is cast to, if any
    fn parameter_cast(&self, kind: ValueKind) -> Option<&'static str> {
        match kind {
            ValueKind::Date => Some("date"),
            ValueKind::Timestamp => Some("timestamp"),
            _ => None,
        }
    }

    /// Marker for the `index`-th bound parameter of a statement, counted from 1
    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    /// Placeholder text for a bound parameter; always holds exactly one marker
    fn parameter(&self, kind: ValueKind, index: usize) -> String {
        let marker = self.placeholder(index);
        match self.parameter_cast(kind) {
            Some(type_name) => format!("cast({} as {})", marker, type_name),
            None => marker,
        }
    }

    fn type_name(&self, data_type: &DataType) -> String {
        ansi_type_name(data_type)
    }

    /// Suffix carrying a selectivity hint, empty when unsupported
    fn selectivity(&self, _selectivity: f64) -> String {
        String::new()
    }

    fn requires_from_dual(&self) -> bool {
        false
    }

    fn dual(&self) -> &'static str {
        "DUAL"
    }

    fn qualified_name(&self, catalog: Option<&str>, schema: Option<&str>, name: &str) -> String {
        catalog
            .into_iter()
            .chain(schema)
            .chain(std::iter::once(name))
            .collect::<Vec<_>>()
            .join(".")
    }

    fn concat(&self, parts: &[String]) -> String {
        parts.join(" || ")
    }

    fn supports_multi_insert(&self) -> bool {
        false
    }

    /// Limit `sql` to its first `rows` rows
    fn fetch_first(&self, sql: &str, rows: u64) -> String {
        format!(
            "select * from (select *, row_number() over() as x_row_number from ({})) where x_row_number <= {}",
            sql, rows
        )
    }

    fn supports_isolation_level_in_query(&self) -> bool {
        false
    }

    /// Append an isolation clause to `sql`
    fn isolation_level_sql(
        &self,
        _sql: &str,
        _level: IsolationLevel,
        _keep_locks: Option<LockLevel>,
    ) -> Result<String> {
        Err(Error::dialect_unsupported(self.name(), "isolation level in query"))
    }

    /// Statement to run before a query when isolation cannot be inlined
    fn session_isolation_sql(&self, level: IsolationLevel) -> Result<String> {
        Ok(format!("set transaction isolation level {}", level.sql()))
    }

    fn next_from_sequence(&self, qualified_sequence: &str) -> String {
        format!("next value for {}", qualified_sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_function_spec_rendering() {
        let call = FunctionSpec::call("upper");
        assert_eq!(call.sql(&["w.NAME".to_string()]), "upper(w.NAME)");

        let keyword = FunctionSpec::keyword("current_date");
        assert_eq!(keyword.sql(&[]), "current_date");

        let extract = FunctionSpec::extract("year");
        assert_eq!(extract.sql(&["x".to_string()]), "extract(year from x)");
    }

    #[test]
    fn test_registry_lookup_and_override() {
        let mut registry = DialectRegistry::ansi();
        assert!(registry.function(&FunctionName::YEAR).is_some());
        assert!(registry.function(&FunctionName::new("soundex")).is_none());

        registry.register_function(FunctionName::YEAR, FunctionSpec::extract("year"));
        let spec = registry.function(&FunctionName::YEAR).unwrap();
        assert_eq!(spec.sql(&["d".to_string()]), "extract(year from d)");
    }

    #[test]
    fn test_default_literals() {
        let dialect = AnsiDialect::new();
        assert_eq!(dialect.literal(&Value::from("O'Neil")).unwrap(), "'O''Neil'");
        assert_eq!(dialect.literal(&Value::Bytes(vec![0x0a, 0xff])).unwrap(), "X'0AFF'");
        assert_eq!(dialect.literal(&Value::Null).unwrap(), "null");
        let date = NaiveDate::from_ymd_opt(2017, 3, 4).unwrap();
        assert_eq!(dialect.literal(&Value::Date(date)).unwrap(), "DATE '2017-03-04'");
        let ts = date.and_hms_opt(10, 11, 12).unwrap();
        assert_eq!(
            dialect.literal(&Value::Timestamp(ts)).unwrap(),
            "TIMESTAMP '2017-03-04 10:11:12.000000'"
        );
    }

    #[test]
    fn test_parameter_casts() {
        let dialect = AnsiDialect::new();
        assert_eq!(dialect.parameter(ValueKind::String, 1), "?");
        assert_eq!(dialect.parameter(ValueKind::Date, 2), "cast(? as date)");
        assert_eq!(dialect.parameter(ValueKind::Timestamp, 3), "cast(? as timestamp)");
    }

    #[test]
    fn test_qualified_name() {
        let dialect = AnsiDialect::new();
        assert_eq!(dialect.qualified_name(None, None, "WIDGET"), "WIDGET");
        assert_eq!(dialect.qualified_name(None, Some("TEST"), "WIDGET"), "TEST.WIDGET");
        assert_eq!(
            dialect.qualified_name(Some("CAT"), Some("TEST"), "WIDGET"),
            "CAT.TEST.WIDGET"
        );
    }

    #[test]
    fn test_dialect_kind_from_config_string() {
        let kind: DialectKind = serde_json::from_str("\"db2\"").unwrap();
        assert_eq!(kind, DialectKind::Db2);
        assert_eq!(kind.create().name(), "db2");
    }
}
