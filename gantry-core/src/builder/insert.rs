//! INSERT statements

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::catalog::{Col, ColumnId, Table, TableInfo};
use crate::database::Database;
use crate::expr::{Expr, TypedExpr};
use crate::render::{Render, RenderContext, RenderedSql};
use crate::scope::Scope;
use crate::value::{SqlType, Value};
use crate::{Error, Result};

#[derive(Debug, Clone)]
struct ColumnValue {
    id: ColumnId,
    name: Arc<str>,
    expr: Expr,
}

/// Column values for one inserted row
#[derive(Debug, Clone, Default)]
pub struct InsertRow {
    values: Vec<ColumnValue>,
}

impl InsertRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `value` into `col`
    pub fn value<T: SqlType>(self, col: &Col<T>, value: impl Into<T>) -> Self {
        self.expr(col, TypedExpr::<T>::value(value))
    }

    /// Compute `col` from an expression, such as a sequence's next value
    pub fn expr<T: SqlType>(mut self, col: &Col<T>, expr: impl Into<TypedExpr<T>>) -> Self {
        self.values.push(ColumnValue {
            id: col.id(),
            name: col.shared_name(),
            expr: expr.into().into_expr(),
        });
        self
    }
}

/// Resolved row: column positions in table order with their expressions
type Resolved = Vec<(usize, Expr)>;

/// `insert into T (C, ...) values (?, ...)`
pub struct Insert<R> {
    database: Database,
    table: Arc<TableInfo>,
    rows: Vec<Resolved>,
    _row: PhantomData<fn() -> R>,
}

impl<R> fmt::Debug for Insert<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Insert")
            .field("table", &self.table.name())
            .field("rows", &self.rows.len())
            .finish()
    }
}

impl<R> Insert<R> {
    pub(crate) fn new(database: Database, table: &Table<R>) -> Self {
        Self {
            database,
            table: Arc::clone(table.info()),
            rows: Vec::new(),
            _row: PhantomData,
        }
    }

    fn push(mut self, mut resolved: Resolved) -> Result<Self> {
        if resolved.is_empty() {
            return Err(Error::invalid_query(format!(
                "a row inserted into {} sets no columns",
                self.table.name()
            )));
        }
        resolved.sort_by_key(|(index, _)| *index);
        if resolved.windows(2).any(|pair| pair[0].0 == pair[1].0) {
            return Err(Error::invalid_query(format!(
                "INSERT into {} sets a column twice",
                self.table.name()
            )));
        }
        if let Some(first) = self.rows.first() {
            let same = first.len() == resolved.len()
                && first.iter().zip(&resolved).all(|(a, b)| a.0 == b.0);
            if !same {
                return Err(Error::invalid_query(format!(
                    "every row inserted into {} must set the same columns",
                    self.table.name()
                )));
            }
        }
        self.rows.push(resolved);
        Ok(self)
    }

    /// Add a row given column by column
    pub fn row(self, row: InsertRow) -> Result<Self> {
        let mut resolved = Vec::with_capacity(row.values.len());
        for value in row.values {
            if self.table.column(value.id).is_none() {
                return Err(Error::no_such_column(
                    self.table.name(),
                    self.table.name(),
                    value.name.as_ref(),
                ));
            }
            resolved.push((value.id.index, value.expr));
        }
        self.push(resolved)
    }

    /// Add a row taken from the fields of a serializable value
    pub fn object(self, object: &R) -> Result<Self>
    where
        R: Serialize,
    {
        let json = serde_json::to_value(object)?;
        let fields = json.as_object().ok_or_else(|| {
            Error::invalid_query(format!(
                "a row of {} must serialize to an object",
                self.table.name()
            ))
        })?;
        let mut resolved = Vec::with_capacity(self.table.columns().len());
        for (index, column) in self.table.columns().iter().enumerate() {
            let value = match fields.get(column.field()) {
                Some(json) => Value::from_json(json, column.data_type())?,
                None => Value::Null,
            };
            if value.is_null() && !column.is_nullable() {
                return Err(Error::invalid_query(format!(
                    "field '{}' is required for column {}",
                    column.field(),
                    column.name()
                )));
            }
            resolved.push((index, Expr::Value(value)));
        }
        self.push(resolved)
    }

    fn render_values(ctx: &mut RenderContext<'_>, row: &Resolved) -> Result<()> {
        ctx.write("(");
        for (i, (_, expr)) in row.iter().enumerate() {
            if i > 0 {
                ctx.write(", ");
            }
            expr.render(ctx)?;
        }
        ctx.write(")");
        Ok(())
    }

    fn header(&self, columns: &[(usize, Expr)]) -> String {
        let names = columns
            .iter()
            .filter_map(|(index, _)| self.table.columns().get(*index))
            .map(|c| c.name())
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "insert into {} ({}) values ",
            self.database.qualified_table_name(&self.table),
            names
        )
    }

    /// One multi-row statement where the dialect allows it, else one per row
    pub fn render(&self) -> Result<Vec<RenderedSql>> {
        let first = self
            .rows
            .first()
            .ok_or_else(|| Error::invalid_query("INSERT requires at least one row"))?;
        let header = self.header(first);
        let scope = Scope::new(self.database.clone());

        let statements = if self.database.dialect().supports_multi_insert() {
            let mut ctx = RenderContext::new(&scope);
            ctx.write(&header);
            for (i, row) in self.rows.iter().enumerate() {
                if i > 0 {
                    ctx.write(", ");
                }
                Self::render_values(&mut ctx, row)?;
            }
            vec![ctx.finish()]
        } else {
            self.rows
                .iter()
                .map(|row| {
                    let mut ctx = RenderContext::new(&scope);
                    ctx.write(&header);
                    Self::render_values(&mut ctx, row)?;
                    Ok(ctx.finish())
                })
                .collect::<Result<Vec<_>>>()?
        };
        debug!(
            statement = "insert",
            table = self.table.name(),
            rows = self.rows.len(),
            statements = statements.len(),
            "rendered statement"
        );
        Ok(statements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Db2Dialect;
    use crate::expr::next_value;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Widget {
        widget_id: i64,
        name: String,
        description: Option<String>,
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
        builder.column::<Option<String>>("DESCRIPTION");
        Widgets {
            table: builder.build(),
            widget_id,
            name,
        }
    }

    #[test]
    fn test_single_row_in_table_order() {
        let t = widgets();
        let db = Database::builder().build();
        let statements = db
            .insert(&t.table)
            .row(InsertRow::new().value(&t.name, "a").value(&t.widget_id, 1i64))
            .unwrap()
            .render()
            .unwrap();
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].sql, "insert into WIDGET (WIDGET_ID, NAME) values (?, ?)");
        assert_eq!(statements[0].args, vec![Value::I64(1), Value::from("a")]);
    }

    #[test]
    fn test_multi_row_when_supported() {
        let t = widgets();
        let rows = |db: &Database| {
            db.insert(&t.table)
                .row(InsertRow::new().value(&t.widget_id, 1i64).value(&t.name, "a"))
                .unwrap()
                .row(InsertRow::new().value(&t.widget_id, 2i64).value(&t.name, "b"))
                .unwrap()
                .render()
                .unwrap()
        };

        let db2 = Database::builder().dialect(Db2Dialect::new()).build();
        let statements = rows(&db2);
        assert_eq!(statements.len(), 1);
        assert_eq!(
            statements[0].sql,
            "insert into WIDGET (WIDGET_ID, NAME) values (?, ?), (?, ?)"
        );
        assert_eq!(statements[0].args.len(), 4);

        let ansi = Database::builder().build();
        let statements = rows(&ansi);
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[1].args, vec![Value::I64(2), Value::from("b")]);
    }

    #[test]
    fn test_object_rows() {
        let t = widgets();
        let db = Database::builder().build();
        let widget = Widget {
            widget_id: 9,
            name: "gear".to_string(),
            description: None,
        };
        let statements = db.insert(&t.table).object(&widget).unwrap().render().unwrap();
        assert_eq!(
            statements[0].sql,
            "insert into WIDGET (WIDGET_ID, NAME, DESCRIPTION) values (?, ?, ?)"
        );
        assert_eq!(
            statements[0].args,
            vec![Value::I64(9), Value::from("gear"), Value::Null]
        );
    }

    #[test]
    fn test_sequence_expression() {
        let t = widgets();
        let db = Database::builder().dialect(Db2Dialect::new()).build();
        let statements = db
            .insert(&t.table)
            .row(
                InsertRow::new()
                    .expr(&t.widget_id, next_value::<i64>(Some("TEST"), "WIDGET_SEQ"))
                    .value(&t.name, "a"),
            )
            .unwrap()
            .render()
            .unwrap();
        assert_eq!(
            statements[0].sql,
            "insert into WIDGET (WIDGET_ID, NAME) values (next value for TEST.WIDGET_SEQ, ?)"
        );
    }

    #[test]
    fn test_empty_row_is_rejected() {
        let t = widgets();
        let db = Database::builder().build();
        let err = db.insert(&t.table).row(InsertRow::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidQuery { .. }));
    }

    #[test]
    fn test_invalid_rows() {
        let t = widgets();
        let db = Database::builder().build();
        assert!(matches!(
            db.insert(&t.table).render(),
            Err(Error::InvalidQuery { .. })
        ));

        let mismatched = db
            .insert(&t.table)
            .row(InsertRow::new().value(&t.widget_id, 1i64))
            .unwrap()
            .row(InsertRow::new().value(&t.name, "b"));
        assert!(matches!(mismatched, Err(Error::InvalidQuery { .. })));

        let twice = db
            .insert(&t.table)
            .row(InsertRow::new().value(&t.widget_id, 1i64).value(&t.widget_id, 2i64));
        assert!(matches!(twice, Err(Error::InvalidQuery { .. })));
    }
}
