use super::{ansi_type_name, hex, Dialect, DialectRegistry, FunctionName, FunctionSpec};
use crate::types::DataType;
use crate::value::ValueKind;

/// PostgreSQL
#[derive(Debug, Clone)]
pub struct PostgresDialect {
    registry: DialectRegistry,
}

impl PostgresDialect {
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
        Self { registry }
    }
}

impl Default for PostgresDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn registry(&self) -> &DialectRegistry {
        &self.registry
    }

    fn registry_mut(&mut self) -> &mut DialectRegistry {
        &mut self.registry
    }

    fn binary_literal(&self, bytes: &[u8]) -> String {
        format!("decode('{}', 'hex')", hex(bytes))
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn parameter_cast(&self, _kind: ValueKind) -> Option<&'static str> {
        None
    }

    fn type_name(&self, data_type: &DataType) -> String {
        match data_type {
            DataType::Binary => "bytea".to_string(),
            DataType::Json => "jsonb".to_string(),
            DataType::Uuid => "uuid".to_string(),
            other => ansi_type_name(other),
        }
    }

    fn supports_multi_insert(&self) -> bool {
        true
    }

    fn fetch_first(&self, sql: &str, rows: u64) -> String {
        format!("{} limit {}", sql, rows)
    }
}
