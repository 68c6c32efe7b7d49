use super::{ansi_type_name, hex, Dialect, DialectRegistry, IsolationLevel, LockLevel};
use crate::types::DataType;
use crate::{Error, Result};

/// IBM Db2
///
/// Supports inline isolation (`with ur|cs|rs|rr`), optimizer selectivity
/// hints and multi-row inserts.
#[derive(Debug, Clone)]
pub struct Db2Dialect {
    registry: DialectRegistry,
}

impl Db2Dialect {
    pub fn new() -> Self {
        Self {
            registry: DialectRegistry::ansi(),
        }
    }
}

impl Default for Db2Dialect {
    fn default() -> Self {
        Self::new()
    }
}

fn isolation_code(level: IsolationLevel) -> &'static str {
    match level {
        IsolationLevel::ReadUncommitted => "ur",
        IsolationLevel::ReadCommitted => "cs",
        IsolationLevel::RepeatableRead => "rs",
        IsolationLevel::Serializable => "rr",
    }
}

impl Dialect for Db2Dialect {
    fn name(&self) -> &'static str {
        "db2"
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
            DataType::Double => "double".to_string(),
            DataType::Json => "clob(1M)".to_string(),
            other => ansi_type_name(other),
        }
    }

    fn selectivity(&self, selectivity: f64) -> String {
        format!(" selectivity {:.6}", selectivity)
    }

    fn requires_from_dual(&self) -> bool {
        true
    }

    fn dual(&self) -> &'static str {
        "SYSIBM.SYSDUMMY1"
    }

    fn supports_multi_insert(&self) -> bool {
        true
    }

    fn fetch_first(&self, sql: &str, rows: u64) -> String {
        format!("{} fetch first {} rows only", sql, rows)
    }

    fn supports_isolation_level_in_query(&self) -> bool {
        true
    }

    fn isolation_level_sql(
        &self,
        sql: &str,
        level: IsolationLevel,
        keep_locks: Option<LockLevel>,
    ) -> Result<String> {
        let code = isolation_code(level);
        match keep_locks {
            None => Ok(format!("{} with {}", sql, code)),
            Some(lock) => match level {
                IsolationLevel::RepeatableRead | IsolationLevel::Serializable => Ok(format!(
                    "{} with {} use and keep {} locks",
                    sql,
                    code,
                    lock.sql()
                )),
                _ => Err(Error::dialect_unsupported(
                    self.name(),
                    format!("keeping {} locks under {}", lock.sql(), level.sql()),
                )),
            },
        }
    }
}
