//! DELETE statements

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use crate::catalog::{Table, TableInfo};
use crate::database::Database;
use crate::expr::BooleanExpr;
use crate::render::{Render, RenderContext, RenderedSql};
use crate::{Error, Result};

use super::common::{and_condition, or_condition, QueryBuilder};
use super::update::table_scope;

/// DELETE before its WHERE clause; renders only as an error
pub struct DeleteInitial<R> {
    database: Database,
    table: Arc<TableInfo>,
    _row: PhantomData<fn() -> R>,
}

/// DELETE with a WHERE clause
pub struct Delete<R> {
    database: Database,
    table: Arc<TableInfo>,
    where_: BooleanExpr,
    _row: PhantomData<fn() -> R>,
}

impl<R> fmt::Debug for DeleteInitial<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeleteInitial")
            .field("table", &self.table.name())
            .finish()
    }
}

impl<R> fmt::Debug for Delete<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delete")
            .field("table", &self.table.name())
            .field("where_", &self.where_)
            .finish()
    }
}

impl<R> DeleteInitial<R> {
    pub(crate) fn new(database: Database, table: &Table<R>) -> Self {
        Self {
            database,
            table: Arc::clone(table.info()),
            _row: PhantomData,
        }
    }

    pub fn where_(self, condition: BooleanExpr) -> Delete<R> {
        Delete {
            database: self.database,
            table: self.table,
            where_: condition,
            _row: PhantomData,
        }
    }
}

impl<R> Delete<R> {
    pub fn where_(mut self, condition: BooleanExpr) -> Self {
        self.where_ = and_condition(Some(self.where_), condition);
        self
    }

    pub fn and_where(self, condition: BooleanExpr) -> Self {
        self.where_(condition)
    }

    pub fn or_where(mut self, condition: BooleanExpr) -> Self {
        self.where_ = or_condition(Some(self.where_), condition);
        self
    }
}

impl<R> QueryBuilder for DeleteInitial<R> {
    fn render(&self) -> Result<RenderedSql> {
        Err(Error::invalid_query("DELETE requires WHERE condition"))
    }
}

impl<R> QueryBuilder for Delete<R> {
    fn render(&self) -> Result<RenderedSql> {
        let scope = table_scope(&self.database, &self.table);
        let mut ctx = RenderContext::new(&scope);
        ctx.write("delete from ");
        ctx.write(&self.database.qualified_table_name(&self.table));
        ctx.write(" as ");
        ctx.write(self.table.name());
        ctx.write(" where ");
        self.where_.render(&mut ctx)?;
        let rendered = ctx.finish();
        debug!(
            statement = "delete",
            table = self.table.name(),
            args = rendered.args.len(),
            "rendered statement"
        );
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Col;
    use crate::expr::TypedExpr;
    use crate::value::Value;

    #[derive(serde::Deserialize)]
    #[allow(dead_code)]
    struct Widget {
        widget_id: i64,
        name: String,
    }

    fn widgets() -> (Table<Widget>, Col<i64>, Col<String>) {
        let mut builder = Table::<Widget>::builder("WIDGET");
        let widget_id = builder.column::<i64>("WIDGET_ID");
        let name = builder.column::<String>("NAME");
        (builder.build(), widget_id, name)
    }

    #[test]
    fn test_delete_with_conditions() {
        let (table, widget_id, name) = widgets();
        let db = Database::builder().default_schema("TEST").build();
        let rendered = db
            .delete(&table)
            .where_(TypedExpr::from(&widget_id).lt(18i64))
            .or_where(TypedExpr::from(&name).eq("inactive"))
            .render()
            .unwrap();
        assert_eq!(
            rendered.sql,
            "delete from TEST.WIDGET as WIDGET where WIDGET.WIDGET_ID < ? or WIDGET.NAME = ?"
        );
        assert_eq!(rendered.args, vec![Value::I64(18), Value::from("inactive")]);
    }

    #[test]
    fn test_delete_without_where_fails() {
        let (table, _, _) = widgets();
        let db = Database::builder().build();
        let err = db.delete(&table).render().unwrap_err();
        assert!(err.to_string().contains("DELETE requires WHERE condition"));
    }
}
