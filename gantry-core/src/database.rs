//! Database configuration root and statement entry points

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::builder::{DeleteInitial, Insert, Select, SelectFrom, Update};
use crate::catalog::{Table, TableInfo};
use crate::dialect::{AnsiDialect, Dialect, DialectKind, FunctionName, FunctionSpec};
use crate::expr::TypedExpr;
use crate::scope::Alias;
use crate::types::TypeAdapter;
use crate::value::{SqlType, ValueKind};
use crate::Result;

/// Declarative database settings
///
/// ```
/// use gantry_core::{DatabaseConfig, DialectKind};
///
/// let config = DatabaseConfig::from_json(r#"{"dialect": "db2", "default_schema": "TEST"}"#).unwrap();
/// assert_eq!(config.dialect, DialectKind::Db2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub dialect: DialectKind,
    pub default_schema: Option<String>,
    pub default_catalog: Option<String>,
}

impl DatabaseConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

struct DatabaseInner {
    dialect: Arc<dyn Dialect>,
    default_catalog: Option<String>,
    default_schema: Option<String>,
}

/// Dialect plus naming defaults shared by every statement built from it.
///
/// Cheap to clone; the dialect and its registries are read-only once built.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("dialect", &self.inner.dialect.name())
            .field("default_catalog", &self.inner.default_catalog)
            .field("default_schema", &self.inner.default_schema)
            .finish()
    }
}

impl Database {
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    pub fn from_config(config: &DatabaseConfig) -> Database {
        let mut builder = DatabaseBuilder::new();
        builder.dialect = config.dialect.create();
        builder.default_schema = config.default_schema.clone();
        builder.default_catalog = config.default_catalog.clone();
        builder.build()
    }

    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.inner.dialect
    }

    pub fn default_schema(&self) -> Option<&str> {
        self.inner.default_schema.as_deref()
    }

    pub fn default_catalog(&self) -> Option<&str> {
        self.inner.default_catalog.as_deref()
    }

    /// Table name qualified with its own or the default catalog and schema
    pub fn qualified_table_name(&self, table: &TableInfo) -> String {
        self.qualified_name(table.catalog(), table.schema(), table.name())
    }

    pub(crate) fn qualified_name(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        name: &str,
    ) -> String {
        self.inner.dialect.qualified_name(
            catalog.or(self.default_catalog()),
            schema.or(self.default_schema()),
            name,
        )
    }

    /// Start a SELECT whose FROM clause begins with `alias`
    pub fn from<R: 'static>(&self, alias: &Alias<R>) -> SelectFrom<(R,)> {
        SelectFrom::new(self.clone(), alias)
    }

    /// A SELECT without FROM, using the dialect's dual table when it needs one
    pub fn select<U: SqlType>(
        &self,
        expr: impl Into<TypedExpr<U>>,
        label: &str,
    ) -> Result<Select<(U,)>> {
        Select::without_from(self.clone(), expr.into(), label)
    }

    pub fn update<R>(&self, table: &Table<R>) -> Update<R> {
        Update::new(self.clone(), table)
    }

    pub fn delete<R>(&self, table: &Table<R>) -> DeleteInitial<R> {
        DeleteInitial::new(self.clone(), table)
    }

    pub fn insert<R>(&self, table: &Table<R>) -> Insert<R> {
        Insert::new(self.clone(), table)
    }
}

/// Builds a [`Database`]
///
/// Function and type registrations are applied to the chosen dialect when
/// [`DatabaseBuilder::build`] runs, so they survive a later `dialect` call.
pub struct DatabaseBuilder {
    dialect: Box<dyn Dialect>,
    default_catalog: Option<String>,
    default_schema: Option<String>,
    functions: Vec<(FunctionName, FunctionSpec)>,
    types: Vec<(ValueKind, Arc<dyn TypeAdapter>)>,
}

impl DatabaseBuilder {
    pub fn new() -> Self {
        Self {
            dialect: Box::new(AnsiDialect::new()),
            default_catalog: None,
            default_schema: None,
            functions: Vec::new(),
            types: Vec::new(),
        }
    }

    pub fn dialect(mut self, dialect: impl Dialect + 'static) -> Self {
        self.dialect = Box::new(dialect);
        self
    }

    pub fn default_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_schema = Some(schema.into());
        self
    }

    pub fn default_catalog(mut self, catalog: impl Into<String>) -> Self {
        self.default_catalog = Some(catalog.into());
        self
    }

    pub fn register_function(mut self, name: FunctionName, spec: FunctionSpec) -> Self {
        self.functions.push((name, spec));
        self
    }

    pub fn register_type(mut self, kind: ValueKind, adapter: impl TypeAdapter + 'static) -> Self {
        self.types.push((kind, Arc::new(adapter)));
        self
    }

    pub fn build(self) -> Database {
        let mut dialect = self.dialect;
        for (name, spec) in self.functions {
            dialect.register_function(name, spec);
        }
        for (kind, adapter) in self.types {
            dialect.register_type(kind, adapter);
        }
        debug!(
            dialect = dialect.name(),
            default_schema = ?self.default_schema,
            "database configured"
        );
        Database {
            inner: Arc::new(DatabaseInner {
                dialect: Arc::from(dialect),
                default_catalog: self.default_catalog,
                default_schema: self.default_schema,
            }),
        }
    }
}

impl Default for DatabaseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Db2Dialect;
    use crate::types::BooleanAsNumber;
    use crate::Error;

    #[test]
    fn test_config_selects_dialect() {
        let config = DatabaseConfig::from_json(
            r#"{"dialect": "postgres", "default_schema": "TEST", "default_catalog": null}"#,
        )
        .unwrap();
        let database = Database::from_config(&config);
        assert_eq!(database.dialect().name(), "postgres");
        assert_eq!(database.default_schema(), Some("TEST"));
    }

    #[test]
    fn test_config_defaults_to_ansi() {
        let config = DatabaseConfig::from_json("{}").unwrap();
        assert_eq!(config.dialect, DialectKind::Ansi);
        assert_eq!(Database::from_config(&config).dialect().name(), "ansi");
    }

    #[test]
    fn test_unknown_dialect_rejected() {
        let err = DatabaseConfig::from_json(r#"{"dialect": "sybase"}"#).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_registrations_survive_dialect_change() {
        let database = Database::builder()
            .register_function(FunctionName::new("soundex"), FunctionSpec::call("soundex"))
            .register_type(ValueKind::Bool, BooleanAsNumber)
            .dialect(Db2Dialect::new())
            .build();

        assert_eq!(database.dialect().name(), "db2");
        assert!(database.dialect().function(&FunctionName::new("soundex")).is_ok());
        assert!(database.dialect().type_adapter(ValueKind::Bool).is_some());
    }

    #[test]
    fn test_default_schema_qualifies_names() {
        let database = Database::builder().default_schema("TEST").build();
        assert_eq!(database.qualified_name(None, None, "WIDGET"), "TEST.WIDGET");
        assert_eq!(database.qualified_name(None, Some("OTHER"), "WIDGET"), "OTHER.WIDGET");
    }
}
