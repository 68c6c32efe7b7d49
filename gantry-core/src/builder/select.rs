//! SELECT statements
//!
//! A select starts from one alias ([`SelectFrom`]), grows its FROM graph one
//! join at a time and then fixes its projection. Every step that adds an
//! output column adds the matching decoder to the row mapper in the same
//! call, so the projection and the mapper cannot drift apart.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::database::Database;
use crate::dialect::{IsolationLevel, LockLevel};
use crate::expr::{BooleanExpr, Expr, TypedExpr};
use crate::projection::Projection;
use crate::render::{Render, RenderContext, RenderedSql};
use crate::row::{ObjectField, RowMapper, TupleAppend};
use crate::scope::{Alias, AliasInfo, AliasSource, Scope};
use crate::value::SqlType;
use crate::{Error, Result};

use super::common::{and_condition, or_condition, render_list, JoinType, Order, Ordering, QueryBuilder};

#[derive(Debug, Clone)]
struct Join {
    join_type: JoinType,
    alias: Arc<AliasInfo>,
    on: BooleanExpr,
}

#[derive(Debug, Clone)]
struct FromClause {
    root: Arc<AliasInfo>,
    joins: Vec<Join>,
}

/// The untyped part of a SELECT, shared by sub-queries and derived tables
#[derive(Debug, Clone)]
pub struct SelectCore {
    scope: Scope,
    from: Option<FromClause>,
    projection: Projection,
    distinct: bool,
    where_: Option<BooleanExpr>,
    group_by: Vec<Expr>,
    having: Option<BooleanExpr>,
    order_by: Vec<Ordering>,
    fetch_first: Option<u64>,
}

impl SelectCore {
    fn new(scope: Scope, from: Option<FromClause>, projection: Projection) -> Self {
        Self {
            scope,
            from,
            projection,
            distinct: false,
            where_: None,
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            fetch_first: None,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Output column labels in projection order
    pub fn labels(&self) -> Vec<String> {
        self.projection.labels()
    }

    /// Render as a parenthesized sub-query nested in the scope of `ctx`
    pub(crate) fn render_subquery(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        let scope = self.scope.nested_in(ctx.scope());
        ctx.write("(");
        ctx.render_in(&scope, self)?;
        ctx.write(")");
        Ok(())
    }

    fn render_source(ctx: &mut RenderContext<'_>, alias: &AliasInfo) -> Result<()> {
        match alias.source() {
            AliasSource::Table(table) => {
                let name = ctx.scope().database().qualified_table_name(table);
                ctx.write(&name);
            }
            AliasSource::Derived { select, .. } => {
                ctx.write("(");
                ctx.render_in(&select.scope, select.as_ref())?;
                ctx.write(")");
            }
        }
        ctx.write(" as ");
        ctx.write(alias.name());
        Ok(())
    }

    fn render_body(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        ctx.write(if self.distinct { "select distinct " } else { "select " });
        self.projection.render(ctx)?;

        match &self.from {
            Some(from) => {
                ctx.write(" from ");
                Self::render_source(ctx, &from.root)?;
                for (k, join) in from.joins.iter().enumerate() {
                    ctx.write(" ");
                    ctx.write(join.join_type.sql());
                    ctx.write(" ");
                    Self::render_source(ctx, &join.alias)?;
                    ctx.write(" on ");
                    // ON sees the root and the joins up to this one
                    let visible = ctx.scope().prefix(k + 2);
                    ctx.render_in(&visible, &join.on)?;
                }
            }
            None => {
                let dialect = ctx.dialect();
                if dialect.requires_from_dual() {
                    ctx.write(" from ");
                    ctx.write(dialect.dual());
                }
            }
        }

        if let Some(where_) = &self.where_ {
            ctx.write(" where ");
            where_.render(ctx)?;
        }
        if !self.group_by.is_empty() {
            ctx.write(" group by ");
            render_list(ctx, &self.group_by)?;
        }
        if let Some(having) = &self.having {
            ctx.write(" having ");
            having.render(ctx)?;
        }
        if !self.order_by.is_empty() {
            ctx.write(" order by ");
            render_list(ctx, &self.order_by)?;
        }
        Ok(())
    }
}

impl Render for SelectCore {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        match self.fetch_first {
            None => self.render_body(ctx),
            Some(rows) => {
                let mut body = ctx.child();
                self.render_body(&mut body)?;
                let (sql, args) = body.into_parts();
                let limited = ctx.dialect().fetch_first(&sql, rows);
                ctx.write_with_args(&limited, args);
                Ok(())
            }
        }
    }
}

fn column_mapper<U: SqlType>(database: &Database, label: &str) -> RowMapper<U> {
    RowMapper::column(label, Arc::clone(database.dialect()))
}

/// A SELECT whose FROM graph is still growing; projects every column of
/// every alias until [`SelectFrom::select`] chooses otherwise
pub struct SelectFrom<T> {
    core: SelectCore,
    mapper: RowMapper<T>,
}

impl<T> fmt::Debug for SelectFrom<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectFrom").field("core", &self.core).finish()
    }
}

impl<R: 'static> SelectFrom<(R,)> {
    pub(crate) fn new(database: Database, alias: &Alias<R>) -> Self {
        let info = Arc::clone(alias.info());
        let mapper = RowMapper::identity().append(alias.row_mapper(&database));
        let from = FromClause {
            root: Arc::clone(&info),
            joins: Vec::new(),
        };
        let projection = Projection::of_alias(&info);
        Self {
            core: SelectCore::new(Scope::of(database, info), Some(from), projection),
            mapper,
        }
    }
}

impl<T: 'static> SelectFrom<T> {
    fn database(&self) -> &Database {
        self.core.scope.database()
    }

    fn joining<R>(self, join_type: JoinType, alias: &Alias<R>) -> JoinOn<T, R> {
        JoinOn {
            select: self,
            join_type,
            alias: alias.clone(),
        }
    }

    pub fn join<R>(self, alias: &Alias<R>) -> JoinOn<T, R> {
        self.joining(JoinType::Inner, alias)
    }

    pub fn left_join<R>(self, alias: &Alias<R>) -> JoinOn<T, R> {
        self.joining(JoinType::LeftOuter, alias)
    }

    pub fn right_join<R>(self, alias: &Alias<R>) -> JoinOn<T, R> {
        self.joining(JoinType::RightOuter, alias)
    }

    pub fn full_outer_join<R>(self, alias: &Alias<R>) -> JoinOn<T, R> {
        self.joining(JoinType::FullOuter, alias)
    }

    fn last_join(&mut self) -> Result<&mut Join> {
        self.core
            .from
            .as_mut()
            .and_then(|from| from.joins.last_mut())
            .ok_or_else(|| Error::invalid_query("no join to extend with another ON condition"))
    }

    /// AND another condition onto the most recent join's ON clause
    pub fn and_on(mut self, condition: BooleanExpr) -> Result<Self> {
        let join = self.last_join()?;
        join.on = join.on.clone().and(condition);
        Ok(self)
    }

    pub fn or_on(mut self, condition: BooleanExpr) -> Result<Self> {
        let join = self.last_join()?;
        join.on = join.on.clone().or(condition);
        Ok(self)
    }

    /// Replace the default projection with a single labeled expression
    pub fn select<U: SqlType>(
        self,
        expr: impl Into<TypedExpr<U>>,
        label: &str,
    ) -> Result<Select<(U,)>> {
        let mut projection = Projection::new();
        projection.push(expr.into().into_expr(), label)?;
        let mapper = RowMapper::identity().append(column_mapper::<U>(self.database(), label));
        let mut core = self.core;
        core.projection = projection;
        Ok(Select::from_parts(core, mapper))
    }

    /// Project into the fields of a `V`, each output labeled `{prefix}_{FIELD}`
    pub fn select_into<V>(self, prefix: &str) -> SelectInto<V> {
        let mut core = self.core;
        core.projection = Projection::new();
        SelectInto {
            core,
            prefix: prefix.to_string(),
            fields: Vec::new(),
            _row: PhantomData,
        }
    }

    pub fn where_(self, condition: BooleanExpr) -> Select<T> {
        self.into_select().where_(condition)
    }

    /// Keep the default projection
    pub fn into_select(self) -> Select<T> {
        Select::from_parts(self.core, self.mapper)
    }
}

/// A pending join waiting for its ON condition
pub struct JoinOn<T, R> {
    select: SelectFrom<T>,
    join_type: JoinType,
    alias: Alias<R>,
}

impl<T, R> JoinOn<T, R>
where
    T: TupleAppend<R> + 'static,
    T::Output: 'static,
    R: 'static,
{
    /// Attach the join; the output tuple grows by the joined alias's row
    pub fn on(self, condition: BooleanExpr) -> Result<SelectFrom<T::Output>> {
        let SelectFrom { mut core, mapper } = self.select;
        let info = Arc::clone(self.alias.info());
        core.scope = core.scope.with_alias(Arc::clone(&info))?;
        core.projection.extend(Projection::of_alias(&info))?;
        if let Some(from) = core.from.as_mut() {
            from.joins.push(Join {
                join_type: self.join_type,
                alias: info,
                on: condition,
            });
        }
        let mapper = mapper.append(self.alias.row_mapper(core.scope.database()));
        Ok(SelectFrom { core, mapper })
    }
}

/// A SELECT with a fixed FROM graph decoding rows into `T`
pub struct Select<T> {
    core: SelectCore,
    mapper: RowMapper<T>,
    isolation: Option<(IsolationLevel, Option<LockLevel>)>,
}

impl<T> Clone for Select<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
            mapper: self.mapper.clone(),
            isolation: self.isolation,
        }
    }
}

impl<T> fmt::Debug for Select<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Select")
            .field("core", &self.core)
            .field("isolation", &self.isolation)
            .finish()
    }
}

impl<U: SqlType> Select<(U,)> {
    pub(crate) fn without_from(database: Database, expr: TypedExpr<U>, label: &str) -> Result<Self> {
        let mut projection = Projection::new();
        projection.push(expr.into_expr(), label)?;
        let mapper = RowMapper::identity().append(column_mapper::<U>(&database, label));
        let core = SelectCore::new(Scope::new(database), None, projection);
        Ok(Select::from_parts(core, mapper))
    }
}

impl<T> Select<T> {
    fn from_parts(core: SelectCore, mapper: RowMapper<T>) -> Self {
        Self {
            core,
            mapper,
            isolation: None,
        }
    }

    pub fn core(&self) -> &SelectCore {
        &self.core
    }

    pub fn row_mapper(&self) -> &RowMapper<T> {
        &self.mapper
    }

    /// AND `condition` onto the WHERE clause
    pub fn where_(mut self, condition: BooleanExpr) -> Self {
        self.core.where_ = Some(and_condition(self.core.where_.take(), condition));
        self
    }

    pub fn and_where(self, condition: BooleanExpr) -> Self {
        self.where_(condition)
    }

    pub fn or_where(mut self, condition: BooleanExpr) -> Self {
        self.core.where_ = Some(or_condition(self.core.where_.take(), condition));
        self
    }

    pub fn group_by<U>(mut self, expr: impl Into<TypedExpr<U>>) -> Self {
        self.core.group_by.push(expr.into().into_expr());
        self
    }

    pub fn having(mut self, condition: BooleanExpr) -> Self {
        self.core.having = Some(and_condition(self.core.having.take(), condition));
        self
    }

    pub fn order_by<U>(mut self, expr: impl Into<TypedExpr<U>>, order: Order) -> Self {
        self.core.order_by.push(Ordering::new(expr, order));
        self
    }

    /// Secondary ordering after the previous `order_by`
    pub fn then<U>(self, expr: impl Into<TypedExpr<U>>, order: Order) -> Self {
        self.order_by(expr, order)
    }

    pub fn distinct(mut self) -> Self {
        self.core.distinct = true;
        self
    }

    /// Limit the result to its first `rows` rows, in the dialect's syntax
    pub fn fetch_first(mut self, rows: u64) -> Self {
        self.core.fetch_first = Some(rows);
        self
    }

    /// Run under `level`, optionally keeping locks on the rows read.
    ///
    /// Dialects that cannot inline the level get a session statement to run
    /// first instead, see [`RenderedSql::preamble`]. Keeping locks has no
    /// such fallback.
    pub fn isolation(mut self, level: IsolationLevel, keep_locks: Option<LockLevel>) -> Self {
        self.isolation = Some((level, keep_locks));
        self
    }

    fn apply_isolation(&self, rendered: &mut RenderedSql) -> Result<()> {
        let Some((level, keep_locks)) = self.isolation else {
            return Ok(());
        };
        let dialect = self.core.scope.dialect();
        if dialect.supports_isolation_level_in_query() {
            rendered.sql = dialect.isolation_level_sql(&rendered.sql, level, keep_locks)?;
            return Ok(());
        }
        if let Some(lock) = keep_locks {
            return Err(Error::dialect_unsupported(
                dialect.name(),
                format!("keeping {} locks in a query", lock.sql()),
            ));
        }
        warn!(
            dialect = dialect.name(),
            level = level.sql(),
            "isolation level cannot be inlined, falling back to a session statement"
        );
        rendered.preamble = Some(dialect.session_isolation_sql(level)?);
        Ok(())
    }
}

impl<T: 'static> Select<T> {
    /// Add one labeled output column; the row type grows by `U`
    pub fn comma<U: SqlType>(
        self,
        expr: impl Into<TypedExpr<U>>,
        label: &str,
    ) -> Result<Select<T::Output>>
    where
        T: TupleAppend<U>,
        T::Output: 'static,
    {
        let Select {
            mut core,
            mapper,
            isolation,
        } = self;
        core.projection.push(expr.into().into_expr(), label)?;
        let mapper = mapper.append(column_mapper::<U>(core.scope.database(), label));
        Ok(Select {
            core,
            mapper,
            isolation,
        })
    }

    /// Use this select as a derived table named `name`
    pub fn alias(&self, name: &str) -> Alias<T> {
        Alias::derived(
            Arc::new(self.core.clone()),
            name.to_string(),
            self.mapper.clone(),
        )
    }
}

impl<T> QueryBuilder for Select<T> {
    fn render(&self) -> Result<RenderedSql> {
        let labels = self.core.projection.len();
        let components = self.mapper.width();
        if labels != components {
            return Err(Error::InternalShapeMismatch { labels, components });
        }
        let mut rendered = self.core.render_with(&self.core.scope)?;
        self.apply_isolation(&mut rendered)?;
        debug!(
            statement = "select",
            args = rendered.args.len(),
            sql = %rendered.sql,
            "rendered statement"
        );
        Ok(rendered)
    }
}

/// A SELECT projecting into the fields of a `V`
pub struct SelectInto<V> {
    core: SelectCore,
    prefix: String,
    fields: Vec<ObjectField>,
    _row: PhantomData<fn() -> V>,
}

impl<V> fmt::Debug for SelectInto<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectInto")
            .field("core", &self.core)
            .field("prefix", &self.prefix)
            .field("fields", &self.fields)
            .finish()
    }
}

impl<V: DeserializeOwned + 'static> SelectInto<V> {
    /// Fill `field` from `expr`
    pub fn with<U: SqlType>(mut self, expr: impl Into<TypedExpr<U>>, field: &str) -> Result<Self> {
        let label = format!("{}_{}", self.prefix, field.to_uppercase());
        self.core.projection.push(expr.into().into_expr(), label.clone())?;
        self.fields.push(ObjectField {
            label,
            field: field.to_string(),
            kind: U::kind(),
        });
        Ok(self)
    }

    pub fn where_(self, condition: BooleanExpr) -> Result<Select<(V,)>> {
        Ok(self.into_select()?.where_(condition))
    }

    pub fn into_select(self) -> Result<Select<(V,)>> {
        if self.fields.is_empty() {
            return Err(Error::invalid_query(format!(
                "no fields selected into '{}'",
                self.prefix
            )));
        }
        let dialect = Arc::clone(self.core.scope.database().dialect());
        let object = RowMapper::<V>::object(&self.prefix, self.fields, dialect);
        Ok(Select::from_parts(self.core, RowMapper::identity().append(object)))
    }
}

impl<T> From<Select<(T,)>> for TypedExpr<T> {
    fn from(select: Select<(T,)>) -> Self {
        TypedExpr::new(Expr::Subquery(Arc::new(select.core)))
    }
}

impl<T> From<&Select<(T,)>> for TypedExpr<T> {
    fn from(select: &Select<(T,)>) -> Self {
        TypedExpr::new(Expr::Subquery(Arc::new(select.core.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Col, Table};
    use crate::dialect::{Db2Dialect, OracleDialect, PostgresDialect};
    use crate::expr::{count, max};
    use crate::value::Value;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Widget {
        widget_id: i64,
        name: String,
    }

    struct Widgets {
        table: Table<Widget>,
        widget_id: Col<i64>,
        name: Col<String>,
    }

    fn widgets() -> Widgets {
        let mut builder = Table::<Widget>::builder("WIDGET");
        let widget_id = builder.column::<i64>("WIDGET_ID");
        let name = builder.column::<String>("NAME");
        Widgets {
            table: builder.build(),
            widget_id,
            name,
        }
    }

    #[test]
    fn test_default_projection_lists_alias_columns() {
        let t = widgets();
        let w = t.table.alias("w");
        let db = Database::builder().build();

        let rendered = db.from(&w).into_select().render().unwrap();
        assert_eq!(
            rendered.sql,
            "select w.WIDGET_ID as w_WIDGET_ID, w.NAME as w_NAME from WIDGET as w"
        );
        assert!(rendered.args.is_empty());
    }

    #[test]
    fn test_clauses_render_in_order() {
        let t = widgets();
        let w = t.table.alias("w");
        let db = Database::builder().build();

        let select = db
            .from(&w)
            .select(&t.name, "n")
            .unwrap()
            .comma(count(), "c")
            .unwrap()
            .where_(TypedExpr::from(&t.widget_id).gt(10i64))
            .group_by(&t.name)
            .having(count().gt(1i64))
            .order_by(&t.name, Order::Asc)
            .then(max(&t.widget_id), Order::Desc)
            .distinct();
        let rendered = select.render().unwrap();
        assert_eq!(
            rendered.sql,
            "select distinct w.NAME as n, count(*) as c from WIDGET as w \
             where w.WIDGET_ID > ? group by w.NAME having count(*) > ? \
             order by w.NAME asc, max(w.WIDGET_ID) desc"
        );
        assert_eq!(rendered.args, vec![Value::I64(10), Value::I64(1)]);
    }

    #[test]
    fn test_or_where_wraps_previous_predicate() {
        let t = widgets();
        let w = t.table.alias("w");
        let db = Database::builder().build();

        let sql = db
            .from(&w)
            .where_(TypedExpr::from(&t.widget_id).eq(1i64))
            .and_where(TypedExpr::from(&t.name).eq("a"))
            .or_where(TypedExpr::from(&t.name).eq("b"))
            .sql()
            .unwrap();
        assert!(sql.ends_with("where (w.WIDGET_ID = ? and w.NAME = ?) or w.NAME = ?"));
    }

    #[test]
    fn test_fetch_first_per_dialect() {
        let t = widgets();
        let w = t.table.alias("w");
        let base = "select w.NAME as n from WIDGET as w";

        let ansi = Database::builder().build();
        let sql = ansi.from(&w).select(&t.name, "n").unwrap().fetch_first(5).sql().unwrap();
        assert_eq!(
            sql,
            format!(
                "select * from (select *, row_number() over() as x_row_number from ({})) where x_row_number <= 5",
                base
            )
        );

        let db2 = Database::builder().dialect(Db2Dialect::new()).build();
        let sql = db2.from(&w).select(&t.name, "n").unwrap().fetch_first(5).sql().unwrap();
        assert_eq!(sql, format!("{} fetch first 5 rows only", base));

        let postgres = Database::builder().dialect(PostgresDialect::new()).build();
        let sql = postgres.from(&w).select(&t.name, "n").unwrap().fetch_first(5).sql().unwrap();
        assert_eq!(sql, format!("{} limit 5", base));
    }

    #[test]
    fn test_isolation_inline_or_preamble() {
        let t = widgets();
        let w = t.table.alias("w");

        let db2 = Database::builder().dialect(Db2Dialect::new()).build();
        let rendered = db2
            .from(&w)
            .select(&t.name, "n")
            .unwrap()
            .isolation(IsolationLevel::ReadUncommitted, None)
            .render()
            .unwrap();
        assert_eq!(rendered.sql, "select w.NAME as n from WIDGET as w with ur");
        assert_eq!(rendered.preamble, None);

        let postgres = Database::builder().dialect(PostgresDialect::new()).build();
        let rendered = postgres
            .from(&w)
            .select(&t.name, "n")
            .unwrap()
            .isolation(IsolationLevel::Serializable, None)
            .render()
            .unwrap();
        assert_eq!(rendered.sql, "select w.NAME as n from WIDGET as w");
        assert_eq!(
            rendered.preamble.as_deref(),
            Some("set transaction isolation level serializable")
        );

        let err = postgres
            .from(&w)
            .select(&t.name, "n")
            .unwrap()
            .isolation(IsolationLevel::Serializable, Some(LockLevel::Exclusive))
            .render()
            .unwrap_err();
        assert!(matches!(err, Error::DialectUnsupported { .. }));
    }

    #[test]
    fn test_select_without_from_uses_dual() {
        let ansi = Database::builder().build();
        let select = ansi.select(TypedExpr::<i32>::value(1), "one").unwrap();
        assert_eq!(select.sql().unwrap(), "select ? as one");

        let oracle = Database::builder().dialect(OracleDialect::new()).build();
        let select = oracle.select(TypedExpr::<i32>::value(1), "one").unwrap();
        assert_eq!(select.sql().unwrap(), "select ? as one from DUAL");

        let db2 = Database::builder().dialect(Db2Dialect::new()).build();
        let select = db2.select(TypedExpr::<i32>::value(1), "one").unwrap();
        assert_eq!(select.sql().unwrap(), "select ? as one from SYSIBM.SYSDUMMY1");
    }

    #[test]
    fn test_label_collision_on_comma() {
        let t = widgets();
        let w = t.table.alias("w");
        let db = Database::builder().build();
        let err = db
            .from(&w)
            .select(&t.name, "n")
            .unwrap()
            .comma(&t.widget_id, "n")
            .unwrap_err();
        assert!(matches!(err, Error::LabelCollision { .. }));
    }

    #[test]
    fn test_self_join_needs_distinct_aliases() {
        let t = widgets();
        let a = t.table.alias("a");
        let again = t.table.alias("a");
        let db = Database::builder().build();
        let err = db
            .from(&a)
            .join(&again)
            .on(a.col(&t.widget_id).eq_expr(again.col(&t.widget_id)))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateAlias { .. }));
    }

    #[test]
    fn test_and_on_without_join_is_invalid() {
        let t = widgets();
        let w = t.table.alias("w");
        let db = Database::builder().build();
        let err = db
            .from(&w)
            .and_on(TypedExpr::from(&t.name).is_null())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidQuery { .. }));
    }

    #[test]
    fn test_derived_table_round_trip() {
        let t = widgets();
        let w = t.table.alias("w");
        let db = Database::builder().build();

        let inner = db
            .from(&w)
            .select(&t.name, "n")
            .unwrap()
            .where_(TypedExpr::from(&t.widget_id).lt(100i64));
        let d = inner.alias("d");
        let outer = db
            .from(&d)
            .where_(d.named::<String>("n").like("B%"));
        let rendered = outer.render().unwrap();
        assert_eq!(
            rendered.sql,
            "select d.n as d_n from (select w.NAME as n from WIDGET as w where w.WIDGET_ID < ?) as d \
             where d.n like ?"
        );
        assert_eq!(rendered.args, vec![Value::I64(100), Value::from("B%")]);

        let row: std::collections::HashMap<String, Value> =
            [("d_n".to_string(), Value::from("Bob"))].into_iter().collect();
        let ((name,),) = outer.row_mapper().map_row(&row).unwrap();
        assert_eq!(name, "Bob");
    }

    #[test]
    fn test_scalar_subquery_in_projection() {
        let t = widgets();
        let w = t.table.alias("w");
        let inner = t.table.alias("i");
        let db = Database::builder().build();

        let highest = db.from(&inner).select(max(inner.col(&t.widget_id)), "m").unwrap();
        let sql = db
            .from(&w)
            .select(&t.name, "n")
            .unwrap()
            .comma(&highest, "top")
            .unwrap()
            .sql()
            .unwrap();
        assert_eq!(
            sql,
            "select w.NAME as n, (select max(i.WIDGET_ID) as m from WIDGET as i) as top from WIDGET as w"
        );
    }

    #[test]
    fn test_select_into_object() {
        let t = widgets();
        let w = t.table.alias("w");
        let db = Database::builder().build();

        let select = db
            .from(&w)
            .select_into::<Widget>("x")
            .with(&t.widget_id, "widget_id")
            .unwrap()
            .with(TypedExpr::from(&t.name).concat(TypedExpr::<String>::literal("!")), "name")
            .unwrap()
            .into_select()
            .unwrap();
        assert_eq!(
            select.sql().unwrap(),
            "select w.WIDGET_ID as x_WIDGET_ID, w.NAME || '!' as x_NAME from WIDGET as w"
        );

        let row: std::collections::HashMap<String, Value> = [
            ("x_WIDGET_ID".to_string(), Value::I64(7)),
            ("x_NAME".to_string(), Value::from("Bob!")),
        ]
        .into_iter()
        .collect();
        let (widget,) = select.row_mapper().map_row(&row).unwrap();
        assert_eq!(
            widget,
            Widget {
                widget_id: 7,
                name: "Bob!".to_string()
            }
        );

        let empty = db.from(&w).select_into::<Widget>("x").into_select();
        assert!(matches!(empty, Err(Error::InvalidQuery { .. })));
    }
}
