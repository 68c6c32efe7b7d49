use super::{Dialect, DialectRegistry};

/// Baseline dialect for databases following the SQL standard
#[derive(Debug, Clone)]
pub struct AnsiDialect {
    registry: DialectRegistry,
}

impl AnsiDialect {
    pub fn new() -> Self {
        Self {
            registry: DialectRegistry::ansi(),
        }
    }
}

impl Default for AnsiDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialect for AnsiDialect {
    fn name(&self) -> &'static str {
        "ansi"
    }

    fn registry(&self) -> &DialectRegistry {
        &self.registry
    }

    fn registry_mut(&mut self) -> &mut DialectRegistry {
        &mut self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::IsolationLevel;
    use crate::types::DataType;

    #[test]
    fn test_row_number_pagination() {
        let dialect = AnsiDialect::new();
        assert_eq!(
            dialect.fetch_first("select w.NAME as n from WIDGET as w", 5),
            "select * from (select *, row_number() over() as x_row_number from (select w.NAME as n from WIDGET as w)) where x_row_number <= 5"
        );
    }

    #[test]
    fn test_isolation_falls_back_to_session() {
        let dialect = AnsiDialect::new();
        assert!(!dialect.supports_isolation_level_in_query());
        assert!(dialect
            .isolation_level_sql("select 1", IsolationLevel::Serializable, None)
            .is_err());
        assert_eq!(
            dialect.session_isolation_sql(IsolationLevel::ReadCommitted).unwrap(),
            "set transaction isolation level read committed"
        );
    }

    #[test]
    fn test_type_names() {
        let dialect = AnsiDialect::new();
        assert_eq!(dialect.type_name(&DataType::Double), "double precision");
        assert_eq!(
            dialect.type_name(&DataType::Decimal {
                precision: 10,
                scale: 2
            }),
            "decimal(10,2)"
        );
        assert_eq!(dialect.type_name(&DataType::Timestamp(Some(3))), "timestamp(3)");
        assert_eq!(dialect.type_name(&DataType::Char(1)), "char(1)");
    }

    #[test]
    fn test_no_dual_and_no_selectivity() {
        let dialect = AnsiDialect::new();
        assert!(!dialect.requires_from_dual());
        assert_eq!(dialect.selectivity(0.1), "");
        assert_eq!(dialect.concat(&["a".to_string(), "b".to_string()]), "a || b");
    }
}
