use std::sync::Arc;

use super::{hex, Dialect, DialectRegistry, FunctionName, FunctionSpec, IsolationLevel};
use crate::types::{BooleanAsNumber, DataType};
use crate::value::ValueKind;
use crate::{Error, Result};

/// Oracle Database
///
/// Booleans are stored as `number(1)` through [`BooleanAsNumber`].
#[derive(Debug, Clone)]
pub struct OracleDialect {
    registry: DialectRegistry,
}

impl OracleDialect {
    pub fn new() -> Self {
        let mut registry = DialectRegistry::ansi();
        for (name, field) in [
            (FunctionName::YEAR, "year"),
            (FunctionName::MONTH, "month"),
            (FunctionName::DAY, "day"),
            (FunctionName::HOUR, "hour"),
            (FunctionName::MINUTE, "minute"),
            (FunctionName::SECOND, "second"),
        ] {
            registry.register_function(name, FunctionSpec::extract(field));
        }
        registry.register_type(ValueKind::Bool, Arc::new(BooleanAsNumber));
        Self { registry }
    }
}

impl Default for OracleDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialect for OracleDialect {
    fn name(&self) -> &'static str {
        "oracle"
    }

    fn registry(&self) -> &DialectRegistry {
        &self.registry
    }

    fn registry_mut(&mut self) -> &mut DialectRegistry {
        &mut self.registry
    }

    fn binary_literal(&self, bytes: &[u8]) -> String {
        format!("HEXTORAW('{}')", hex(bytes))
    }

    fn type_name(&self, data_type: &DataType) -> String {
        match data_type {
            DataType::Boolean => "number(1)".to_string(),
            DataType::TinyInt => "number(3)".to_string(),
            DataType::SmallInt => "number(5)".to_string(),
            DataType::Integer => "number(10)".to_string(),
            DataType::BigInt => "number(19)".to_string(),
            DataType::Real => "binary_float".to_string(),
            DataType::Double => "binary_double".to_string(),
            DataType::Decimal { precision, scale } => format!("number({},{})", precision, scale),
            DataType::Varchar(n) => format!("varchar2({})", n),
            DataType::Char(n) => format!("char({})", n),
            DataType::Binary => "blob".to_string(),
            DataType::Json => "clob".to_string(),
            DataType::Date => "date".to_string(),
            DataType::Timestamp(Some(p)) => format!("timestamp({})", p),
            DataType::Timestamp(None) => "timestamp".to_string(),
            DataType::Uuid => "char(36)".to_string(),
        }
    }

    fn requires_from_dual(&self) -> bool {
        true
    }

    fn fetch_first(&self, sql: &str, rows: u64) -> String {
        format!("select * from ({}) where rownum <= {}", sql, rows)
    }

    fn session_isolation_sql(&self, level: IsolationLevel) -> Result<String> {
        match level {
            IsolationLevel::ReadCommitted | IsolationLevel::Serializable => {
                Ok(format!("set transaction isolation level {}", level.sql()))
            }
            other => Err(Error::dialect_unsupported(
                self.name(),
                format!("isolation level {}", other.sql()),
            )),
        }
    }

    fn next_from_sequence(&self, qualified_sequence: &str) -> String {
        format!("{}.nextval", qualified_sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_rownum_pagination() {
        let dialect = OracleDialect::new();
        assert_eq!(
            dialect.fetch_first("select 1 as x from DUAL", 1),
            "select * from (select 1 as x from DUAL) where rownum <= 1"
        );
        assert!(dialect.requires_from_dual());
    }

    #[test]
    fn test_booleans_are_numbers() {
        let dialect = OracleDialect::new();
        let adapter = dialect.type_adapter(ValueKind::Bool).unwrap();
        assert_eq!(adapter.to_database(Value::Bool(true)), Value::I16(1));
        assert_eq!(dialect.type_name(&DataType::Boolean), "number(1)");
    }

    #[test]
    fn test_only_two_isolation_levels() {
        let dialect = OracleDialect::new();
        assert!(dialect.session_isolation_sql(IsolationLevel::Serializable).is_ok());
        let err = dialect
            .session_isolation_sql(IsolationLevel::ReadUncommitted)
            .unwrap_err();
        assert!(matches!(err, Error::DialectUnsupported { .. }));
    }

    #[test]
    fn test_sequences() {
        let dialect = OracleDialect::new();
        assert_eq!(dialect.next_from_sequence("TEST.SEQ"), "TEST.SEQ.nextval");
    }
}
