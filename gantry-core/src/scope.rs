//! Aliases and the lexical scopes that resolve column references

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::trace;

use crate::builder::SelectCore;
use crate::catalog::{Col, TableInfo};
use crate::database::Database;
use crate::dialect::Dialect;
use crate::expr::{AliasRef, ColumnRef, ColumnTarget, Expr, TypedExpr};
use crate::row::RowMapper;
use crate::value::SqlType;
use crate::{Error, Result};

/// What an alias names: a table or a derived table (sub-select)
#[derive(Debug)]
pub enum AliasSource {
    Table(Arc<TableInfo>),
    Derived {
        select: Arc<SelectCore>,
        labels: Vec<String>,
    },
}

/// Untyped alias metadata carried by expressions and scopes
#[derive(Debug)]
pub struct AliasInfo {
    name: String,
    source: AliasSource,
}

impl AliasInfo {
    pub(crate) fn table(table: Arc<TableInfo>, name: impl Into<String>) -> Arc<AliasInfo> {
        Arc::new(AliasInfo {
            name: name.into(),
            source: AliasSource::Table(table),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &AliasSource {
        &self.source
    }

    /// Column names visible through this alias, in projection order
    pub fn column_names(&self) -> Vec<String> {
        match &self.source {
            AliasSource::Table(table) => {
                table.columns().iter().map(|c| c.name().to_string()).collect()
            }
            AliasSource::Derived { labels, .. } => labels.clone(),
        }
    }

    fn source_name(&self) -> &str {
        match &self.source {
            AliasSource::Table(table) => table.name(),
            AliasSource::Derived { .. } => "derived table",
        }
    }

    /// The column name this alias exposes for `target`, if it owns it
    fn owns(&self, target: &ColumnTarget) -> Option<String> {
        match (&self.source, target) {
            (AliasSource::Table(table), ColumnTarget::Token { id, .. }) => {
                table.column(*id).map(|c| c.name().to_string())
            }
            (AliasSource::Table(table), ColumnTarget::Name(name)) => {
                table.column_named(name).map(|c| c.name().to_string())
            }
            (AliasSource::Derived { .. }, ColumnTarget::Token { .. }) => None,
            (AliasSource::Derived { labels, .. }, ColumnTarget::Name(name)) => {
                labels.iter().find(|l| *l == name).cloned()
            }
        }
    }
}

type MapperFactory<R> = dyn Fn(&Database) -> RowMapper<R> + Send + Sync;

/// A typed alias: names a table or derived table and knows how to decode
/// its default projection into `R`
pub struct Alias<R> {
    info: Arc<AliasInfo>,
    mapper: Arc<MapperFactory<R>>,
}

impl<R> Clone for Alias<R> {
    fn clone(&self) -> Self {
        Self {
            info: Arc::clone(&self.info),
            mapper: Arc::clone(&self.mapper),
        }
    }
}

impl<R> fmt::Debug for Alias<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Alias").field("info", &self.info).finish()
    }
}

impl<R: 'static> Alias<R> {
    pub(crate) fn for_table(table: Arc<TableInfo>, name: String) -> Self
    where
        R: DeserializeOwned,
    {
        let info = AliasInfo::table(Arc::clone(&table), name.clone());
        let mapper = move |database: &Database| {
            RowMapper::<R>::table(Arc::clone(&table), Arc::clone(database.dialect()))
                .prefixed(&name)
        };
        Self {
            info,
            mapper: Arc::new(mapper),
        }
    }

    pub(crate) fn derived(
        select: Arc<SelectCore>,
        name: String,
        inner: RowMapper<R>,
    ) -> Self {
        let labels = select.labels();
        let info = Arc::new(AliasInfo {
            name: name.clone(),
            source: AliasSource::Derived { select, labels },
        });
        let mapped = inner.prefixed(&name);
        Self {
            info,
            mapper: Arc::new(move |_: &Database| mapped.clone()),
        }
    }

    pub(crate) fn row_mapper(&self, database: &Database) -> RowMapper<R> {
        (self.mapper)(database)
    }
}

impl<R> Alias<R> {
    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn info(&self) -> &Arc<AliasInfo> {
        &self.info
    }

    /// Column of this alias's table, bound to this alias
    pub fn col<T: SqlType>(&self, col: &Col<T>) -> TypedExpr<T> {
        TypedExpr::new(Expr::Column(ColumnRef {
            alias: AliasRef::Bound(Arc::clone(&self.info)),
            target: ColumnTarget::Token {
                id: col.id(),
                name: col.shared_name(),
            },
        }))
    }

    /// Column by name, bound to this alias; the way to reach derived columns
    pub fn named<T: SqlType>(&self, name: &str) -> TypedExpr<T> {
        TypedExpr::new(Expr::Column(ColumnRef {
            alias: AliasRef::Bound(Arc::clone(&self.info)),
            target: ColumnTarget::Name(name.to_string()),
        }))
    }
}

/// A column reference bound to the alias that owns it
#[derive(Debug, Clone)]
pub struct ResolvedColumn {
    pub alias: Arc<AliasInfo>,
    pub column: String,
}

impl ResolvedColumn {
    pub fn sql(&self) -> String {
        format!("{}.{}", self.alias.name, self.column)
    }
}

/// The aliases visible at one nesting level, chained to the enclosing level.
///
/// Resolution searches local aliases first and only then the parent, so an
/// inner alias shadows an outer one.
#[derive(Debug, Clone)]
pub struct Scope {
    database: Database,
    aliases: Vec<Arc<AliasInfo>>,
    parent: Option<Arc<Scope>>,
}

impl Scope {
    pub fn new(database: Database) -> Self {
        Self {
            database,
            aliases: Vec::new(),
            parent: None,
        }
    }

    /// Scope holding just `alias`
    pub fn of(database: Database, alias: Arc<AliasInfo>) -> Self {
        Self {
            database,
            aliases: vec![alias],
            parent: None,
        }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.database.dialect().as_ref()
    }

    pub fn aliases(&self) -> &[Arc<AliasInfo>] {
        &self.aliases
    }

    pub fn parent(&self) -> Option<&Scope> {
        self.parent.as_deref()
    }

    /// This scope with `alias` added
    pub fn with_alias(&self, alias: Arc<AliasInfo>) -> Result<Scope> {
        if self.aliases.iter().any(|a| a.name == alias.name) {
            return Err(Error::duplicate_alias(alias.name.clone()));
        }
        let mut scope = self.clone();
        scope.aliases.push(alias);
        Ok(scope)
    }

    /// This scope's aliases nested inside `outer`
    pub fn nested_in(&self, outer: &Scope) -> Scope {
        Scope {
            database: outer.database.clone(),
            aliases: self.aliases.clone(),
            parent: Some(Arc::new(outer.clone())),
        }
    }

    /// Only the first `len` local aliases; the parent chain is kept
    pub fn prefix(&self, len: usize) -> Scope {
        Scope {
            database: self.database.clone(),
            aliases: self.aliases.iter().take(len).cloned().collect(),
            parent: self.parent.clone(),
        }
    }

    pub fn find_alias(&self, name: &str) -> Option<&Arc<AliasInfo>> {
        self.aliases
            .iter()
            .find(|a| a.name == name)
            .or_else(|| self.parent.as_ref().and_then(|p| p.find_alias(name)))
    }

    /// Whether this exact alias is visible here or in an enclosing scope
    pub fn declares(&self, alias: &Arc<AliasInfo>) -> bool {
        self.aliases.iter().any(|a| Arc::ptr_eq(a, alias))
            || self.parent.as_ref().is_some_and(|p| p.declares(alias))
    }

    /// Alias names in search order
    pub fn visible_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.aliases.iter().map(|a| a.name.clone()).collect();
        if let Some(parent) = &self.parent {
            names.extend(parent.visible_names());
        }
        names
    }

    pub fn resolve(&self, column: &ColumnRef) -> Result<ResolvedColumn> {
        let name = column.target.name();
        let resolved = match &column.alias {
            AliasRef::Bound(alias) => {
                if !self.declares(alias) {
                    return Err(Error::unknown_alias(alias.name.clone(), self.visible_names()));
                }
                bind(alias, &column.target)?
            }
            AliasRef::Named(alias_name) => {
                let alias = self
                    .find_alias(alias_name)
                    .ok_or_else(|| Error::unknown_alias(alias_name.clone(), self.visible_names()))?;
                bind(alias, &column.target)?
            }
            AliasRef::Any => self.search(&column.target)?,
        };
        trace!(column = name, alias = %resolved.alias.name, "resolved column");
        Ok(resolved)
    }

    fn search(&self, target: &ColumnTarget) -> Result<ResolvedColumn> {
        let mut level = Some(self);
        while let Some(scope) = level {
            let mut owners = scope
                .aliases
                .iter()
                .filter_map(|a| a.owns(target).map(|column| (a, column)));
            match (owners.next(), owners.next()) {
                (None, _) => level = scope.parent.as_deref(),
                (Some((alias, column)), None) => {
                    return Ok(ResolvedColumn {
                        alias: Arc::clone(alias),
                        column,
                    })
                }
                (Some(_), Some(_)) => {
                    let candidates = scope
                        .aliases
                        .iter()
                        .filter(|a| a.owns(target).is_some())
                        .map(|a| a.name.clone())
                        .collect();
                    return Err(Error::ambiguous_column(target.name(), candidates));
                }
            }
        }
        Err(Error::unresolved_column(target.name(), self.visible_names()))
    }
}

fn bind(alias: &Arc<AliasInfo>, target: &ColumnTarget) -> Result<ResolvedColumn> {
    let column = alias
        .owns(target)
        .ok_or_else(|| Error::no_such_column(alias.name.clone(), alias.source_name(), target.name()))?;
    Ok(ResolvedColumn {
        alias: Arc::clone(alias),
        column,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Table;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Widget {
        widget_id: i64,
        name: String,
    }

    struct Fixture {
        widgets: Table<Widget>,
        widget_id: Col<i64>,
        name: Col<String>,
    }

    fn fixture() -> Fixture {
        let mut builder = Table::<Widget>::builder("WIDGET");
        let widget_id = builder.column::<i64>("WIDGET_ID");
        let name = builder.column::<String>("NAME");
        Fixture {
            widgets: builder.build(),
            widget_id,
            name,
        }
    }

    fn token<T>(col: &Col<T>) -> ColumnRef {
        ColumnRef {
            alias: AliasRef::Any,
            target: ColumnTarget::Token {
                id: col.id(),
                name: col.shared_name(),
            },
        }
    }

    #[test]
    fn test_single_owner_resolves() {
        let f = fixture();
        let w = f.widgets.alias("w");
        let scope = Scope::new(Database::builder().build())
            .with_alias(Arc::clone(w.info()))
            .unwrap();

        let resolved = scope.resolve(&token(&f.name)).unwrap();
        assert_eq!(resolved.sql(), "w.NAME");
    }

    #[test]
    fn test_two_owners_are_ambiguous() {
        let f = fixture();
        let a = f.widgets.alias("a");
        let b = f.widgets.alias("b");
        let scope = Scope::new(Database::builder().build())
            .with_alias(Arc::clone(a.info()))
            .unwrap()
            .with_alias(Arc::clone(b.info()))
            .unwrap();

        let err = scope.resolve(&token(&f.widget_id)).unwrap_err();
        match err {
            Error::AmbiguousColumn { column, candidates } => {
                assert_eq!(column, "WIDGET_ID");
                assert_eq!(candidates, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_inner_scope_shadows_outer() {
        let f = fixture();
        let outer_alias = f.widgets.alias("o");
        let inner_alias = f.widgets.alias("i");
        let database = Database::builder().build();
        let outer = Scope::new(database.clone())
            .with_alias(Arc::clone(outer_alias.info()))
            .unwrap();
        let inner = Scope::new(database)
            .with_alias(Arc::clone(inner_alias.info()))
            .unwrap()
            .nested_in(&outer);

        assert_eq!(inner.resolve(&token(&f.name)).unwrap().sql(), "i.NAME");
        assert_eq!(inner.visible_names(), vec!["i".to_string(), "o".to_string()]);
    }

    #[test]
    fn test_unknown_alias_and_missing_column() {
        let f = fixture();
        let w = f.widgets.alias("w");
        let scope = Scope::new(Database::builder().build())
            .with_alias(Arc::clone(w.info()))
            .unwrap();

        let by_unknown = ColumnRef {
            alias: AliasRef::Named("x".to_string()),
            target: ColumnTarget::Name("NAME".to_string()),
        };
        assert!(matches!(
            scope.resolve(&by_unknown),
            Err(Error::UnknownAlias { .. })
        ));

        let missing = ColumnRef {
            alias: AliasRef::Named("w".to_string()),
            target: ColumnTarget::Name("COLOUR".to_string()),
        };
        assert!(matches!(
            scope.resolve(&missing),
            Err(Error::NoSuchColumn { .. })
        ));
    }

    #[test]
    fn test_unresolved_lists_searched_aliases() {
        let f = fixture();
        let mut other = Table::<Widget>::builder("GADGET");
        let gadget_id = other.column::<i64>("GADGET_ID");
        let _gadgets = other.build();
        let w = f.widgets.alias("w");
        let scope = Scope::new(Database::builder().build())
            .with_alias(Arc::clone(w.info()))
            .unwrap();

        match scope.resolve(&token(&gadget_id)).unwrap_err() {
            Error::UnresolvedColumn { column, searched } => {
                assert_eq!(column, "GADGET_ID");
                assert_eq!(searched, vec!["w".to_string()]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_alias_rejected() {
        let f = fixture();
        let w = f.widgets.alias("w");
        let scope = Scope::new(Database::builder().build())
            .with_alias(Arc::clone(w.info()))
            .unwrap();
        assert!(matches!(
            scope.with_alias(Arc::clone(w.info())),
            Err(Error::DuplicateAlias { .. })
        ));
    }

    #[test]
    fn test_prefix_hides_later_aliases() {
        let f = fixture();
        let w = f.widgets.alias("w");
        let v = f.widgets.alias("v");
        let scope = Scope::new(Database::builder().build())
            .with_alias(Arc::clone(w.info()))
            .unwrap()
            .with_alias(Arc::clone(v.info()))
            .unwrap();
        assert_eq!(scope.prefix(1).resolve(&token(&f.name)).unwrap().sql(), "w.NAME");

        let later = bound(v.col(&f.name));
        assert!(matches!(
            scope.prefix(1).resolve(&later),
            Err(Error::UnknownAlias { .. })
        ));
    }

    fn bound<T>(expr: TypedExpr<T>) -> ColumnRef {
        match expr.into_expr() {
            Expr::Column(column) => column,
            other => panic!("expected a column, got {other:?}"),
        }
    }

    #[test]
    fn test_bound_alias_must_be_declared() {
        let f = fixture();
        let w = f.widgets.alias("w");
        let stray = f.widgets.alias("zz");
        let twin = f.widgets.alias("w");
        let scope = Scope::new(Database::builder().build())
            .with_alias(Arc::clone(w.info()))
            .unwrap();

        assert_eq!(scope.resolve(&bound(w.col(&f.name))).unwrap().sql(), "w.NAME");
        match scope.resolve(&bound(stray.col(&f.name))).unwrap_err() {
            Error::UnknownAlias { alias, visible } => {
                assert_eq!(alias, "zz");
                assert_eq!(visible, vec!["w".to_string()]);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(matches!(
            scope.resolve(&bound(twin.col(&f.widget_id))),
            Err(Error::UnknownAlias { .. })
        ));

        let inner = Scope::of(Database::builder().build(), Arc::clone(stray.info())).nested_in(&scope);
        assert_eq!(inner.resolve(&bound(w.col(&f.name))).unwrap().sql(), "w.NAME");
    }
}
