//! UPDATE statements

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use crate::catalog::{Col, Table, TableInfo};
use crate::database::Database;
use crate::expr::{BooleanExpr, Expr, TypedExpr};
use crate::render::{Render, RenderContext, RenderedSql};
use crate::scope::{AliasInfo, Scope};
use crate::value::{SqlType, Value};
use crate::{Error, Result};

use super::common::{and_condition, or_condition, QueryBuilder};

/// Table aliased by its own name, the scope every DML statement renders in
pub(crate) fn table_scope(database: &Database, table: &Arc<TableInfo>) -> Scope {
    Scope::of(
        database.clone(),
        AliasInfo::table(Arc::clone(table), table.name()),
    )
}

/// Name of `col` if it belongs to `table`
pub(crate) fn owned_column<T>(table: &TableInfo, col: &Col<T>) -> Result<String> {
    table
        .column(col.id())
        .map(|c| c.name().to_string())
        .ok_or_else(|| Error::no_such_column(table.name(), table.name(), col.name()))
}

#[derive(Debug, Clone)]
struct Assignment {
    column: String,
    value: Expr,
}

/// `update T as T set C = ?, ... [where ...]`
pub struct Update<R> {
    database: Database,
    table: Arc<TableInfo>,
    assignments: Vec<Assignment>,
    where_: Option<BooleanExpr>,
    _row: PhantomData<fn() -> R>,
}

impl<R> fmt::Debug for Update<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Update")
            .field("table", &self.table.name())
            .field("assignments", &self.assignments)
            .field("where_", &self.where_)
            .finish()
    }
}

impl<R> Update<R> {
    pub(crate) fn new(database: Database, table: &Table<R>) -> Self {
        Self {
            database,
            table: Arc::clone(table.info()),
            assignments: Vec::new(),
            where_: None,
            _row: PhantomData,
        }
    }

    fn assign<T>(mut self, col: &Col<T>, value: Expr) -> Result<Self> {
        let column = owned_column(&self.table, col)?;
        self.assignments.push(Assignment { column, value });
        Ok(self)
    }

    /// Set a column to a bound value
    pub fn set<T: SqlType>(self, col: &Col<T>, value: impl Into<T>) -> Result<Self> {
        self.assign(col, Expr::Value(value.into().into_value()))
    }

    /// Set a column to an expression over the updated row
    pub fn set_expr<T: SqlType>(self, col: &Col<T>, expr: impl Into<TypedExpr<T>>) -> Result<Self> {
        self.assign(col, expr.into().into_expr())
    }

    /// Only nullable columns can be set to null
    pub fn set_null<T: SqlType>(self, col: &Col<Option<T>>) -> Result<Self> {
        self.assign(col, Expr::Literal(Value::Null))
    }

    pub fn where_(mut self, condition: BooleanExpr) -> Self {
        self.where_ = Some(and_condition(self.where_.take(), condition));
        self
    }

    pub fn and_where(self, condition: BooleanExpr) -> Self {
        self.where_(condition)
    }

    pub fn or_where(mut self, condition: BooleanExpr) -> Self {
        self.where_ = Some(or_condition(self.where_.take(), condition));
        self
    }

    fn render_into(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        ctx.write("update ");
        ctx.write(&self.database.qualified_table_name(&self.table));
        ctx.write(" as ");
        ctx.write(self.table.name());
        ctx.write(" set ");
        for (i, assignment) in self.assignments.iter().enumerate() {
            if i > 0 {
                ctx.write(", ");
            }
            ctx.write(&assignment.column);
            ctx.write(" = ");
            assignment.value.render(ctx)?;
        }
        if let Some(where_) = &self.where_ {
            ctx.write(" where ");
            where_.render(ctx)?;
        }
        Ok(())
    }
}

impl<R> QueryBuilder for Update<R> {
    fn render(&self) -> Result<RenderedSql> {
        if self.assignments.is_empty() {
            return Err(Error::invalid_query("UPDATE requires at least one SET column"));
        }
        let scope = table_scope(&self.database, &self.table);
        let mut ctx = RenderContext::new(&scope);
        self.render_into(&mut ctx)?;
        let rendered = ctx.finish();
        debug!(
            statement = "update",
            table = self.table.name(),
            args = rendered.args.len(),
            "rendered statement"
        );
        Ok(rendered)
    }
}
