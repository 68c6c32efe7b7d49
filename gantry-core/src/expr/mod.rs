//! Expression and condition trees
//!
//! Trees are immutable. Column references stay unresolved until render
//! time, when they are bound against the [`Scope`](crate::scope::Scope) of
//! the statement being rendered.

mod condition;
mod functions;
mod typed;

pub use condition::{BooleanExpr, Condition};
pub use functions::{
    avg, case, coalesce, count, count_distinct, count_of, current_date, current_timestamp, day,
    function, hour, lower, max, min, minute, month, next_value, second, sum, upper, year, Case,
    Coalesce, Temporal,
};
pub use typed::{Textual, TypedExpr};

use std::sync::Arc;

use crate::builder::SelectCore;
use crate::catalog::{Col, ColumnId};
use crate::dialect::FunctionName;
use crate::render::{Render, RenderContext};
use crate::scope::AliasInfo;
use crate::value::{SqlType, Value};
use crate::Result;

/// How a column reference names its alias
#[derive(Debug, Clone)]
pub enum AliasRef {
    /// Whichever visible alias owns the column
    Any,
    /// The visible alias with this name
    Named(String),
    /// A specific alias, no lookup needed
    Bound(Arc<AliasInfo>),
}

/// What a column reference points at
#[derive(Debug, Clone)]
pub enum ColumnTarget {
    Token { id: ColumnId, name: Arc<str> },
    Name(String),
}

impl ColumnTarget {
    pub fn name(&self) -> &str {
        match self {
            ColumnTarget::Token { name, .. } => name,
            ColumnTarget::Name(name) => name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ColumnRef {
    pub alias: AliasRef,
    pub target: ColumnTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ArithmeticOp {
    pub fn sql(&self) -> &'static str {
        match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Subtract => "-",
            ArithmeticOp::Multiply => "*",
            ArithmeticOp::Divide => "/",
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            ArithmeticOp::Add | ArithmeticOp::Subtract => 1,
            ArithmeticOp::Multiply | ArithmeticOp::Divide => 2,
        }
    }
}

/// Untyped value expression
#[derive(Debug, Clone)]
pub enum Expr {
    Column(ColumnRef),
    /// Bound as a `?` parameter
    Value(Value),
    /// Written inline
    Literal(Value),
    Function {
        name: FunctionName,
        args: Vec<Expr>,
    },
    Concat(Vec<Expr>),
    Arithmetic {
        left: Box<Expr>,
        op: ArithmeticOp,
        right: Box<Expr>,
    },
    Case {
        branches: Vec<(BooleanExpr, Expr)>,
        otherwise: Option<Box<Expr>>,
    },
    CountAll,
    /// Scalar sub-select
    Subquery(Arc<SelectCore>),
    NextValue {
        catalog: Option<String>,
        schema: Option<String>,
        name: String,
    },
}

impl Expr {
    fn precedence(&self) -> u8 {
        match self {
            Expr::Arithmetic { op, .. } => op.precedence(),
            _ => u8::MAX,
        }
    }

    fn render_operand(&self, ctx: &mut RenderContext<'_>, parenthesize: bool) -> Result<()> {
        if parenthesize {
            ctx.write("(");
            self.render(ctx)?;
            ctx.write(")");
            Ok(())
        } else {
            self.render(ctx)
        }
    }
}

/// Render each expression separately, returning the texts and their arguments in order
fn render_parts(ctx: &RenderContext<'_>, exprs: &[Expr]) -> Result<(Vec<String>, Vec<Value>)> {
    let mut parts = Vec::with_capacity(exprs.len());
    let mut args = Vec::new();
    for expr in exprs {
        let mut part = ctx.child_after(args.len());
        expr.render(&mut part)?;
        let (sql, part_args) = part.into_parts();
        parts.push(sql);
        args.extend(part_args);
    }
    Ok((parts, args))
}

impl Render for Expr {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        match self {
            Expr::Column(column) => {
                let resolved = ctx.scope().resolve(column)?;
                ctx.write(&resolved.sql());
            }
            Expr::Value(value) => ctx.bind(value.clone()),
            Expr::Literal(value) => ctx.literal(value)?,
            Expr::Function { name, args } => {
                let spec = ctx.dialect().function(name)?;
                let (parts, args) = render_parts(ctx, args)?;
                ctx.write_with_args(&spec.sql(&parts), args);
            }
            Expr::Concat(exprs) => {
                let (parts, args) = render_parts(ctx, exprs)?;
                let sql = ctx.dialect().concat(&parts);
                ctx.write_with_args(&sql, args);
            }
            Expr::Arithmetic { left, op, right } => {
                let strict = matches!(op, ArithmeticOp::Subtract | ArithmeticOp::Divide);
                left.render_operand(ctx, left.precedence() < op.precedence())?;
                ctx.write(" ");
                ctx.write(op.sql());
                ctx.write(" ");
                let right_parens = if strict {
                    right.precedence() <= op.precedence()
                } else {
                    right.precedence() < op.precedence()
                };
                right.render_operand(ctx, right_parens)?;
            }
            Expr::Case {
                branches,
                otherwise,
            } => {
                ctx.write("case");
                for (condition, result) in branches {
                    ctx.write(" when ");
                    condition.render(ctx)?;
                    ctx.write(" then ");
                    result.render(ctx)?;
                }
                if let Some(otherwise) = otherwise {
                    ctx.write(" else ");
                    otherwise.render(ctx)?;
                }
                ctx.write(" end");
            }
            Expr::CountAll => ctx.write("count(*)"),
            Expr::Subquery(select) => select.render_subquery(ctx)?,
            Expr::NextValue {
                catalog,
                schema,
                name,
            } => {
                let database = ctx.scope().database();
                let sequence = database.qualified_name(catalog.as_deref(), schema.as_deref(), name);
                ctx.write(&database.dialect().next_from_sequence(&sequence));
            }
        }
        Ok(())
    }
}

/// Column looked up by name in whichever visible alias has it
pub fn column<T: SqlType>(name: &str) -> TypedExpr<T> {
    TypedExpr::new(Expr::Column(ColumnRef {
        alias: AliasRef::Any,
        target: ColumnTarget::Name(name.to_string()),
    }))
}

/// Column looked up by name in the visible alias called `alias`
pub fn column_in<T: SqlType>(alias: &str, name: &str) -> TypedExpr<T> {
    TypedExpr::new(Expr::Column(ColumnRef {
        alias: AliasRef::Named(alias.to_string()),
        target: ColumnTarget::Name(name.to_string()),
    }))
}

/// Column token looked up in the visible alias called `alias`
pub fn col_in<T: SqlType>(alias: &str, col: &Col<T>) -> TypedExpr<T> {
    TypedExpr::new(Expr::Column(ColumnRef {
        alias: AliasRef::Named(alias.to_string()),
        target: ColumnTarget::Token {
            id: col.id(),
            name: col.shared_name(),
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::dialect::{Db2Dialect, PostgresDialect};
    use crate::scope::Scope;
    use crate::Error;

    fn render(expr: &Expr, database: Database) -> (String, Vec<Value>) {
        let scope = Scope::new(database);
        let rendered = expr.render_with(&scope).unwrap();
        (rendered.sql, rendered.args)
    }

    fn value(i: i32) -> Box<Expr> {
        Box::new(Expr::Value(Value::I32(i)))
    }

    #[test]
    fn test_arithmetic_parenthesizes_by_precedence() {
        let sum = Expr::Arithmetic {
            left: value(1),
            op: ArithmeticOp::Add,
            right: value(2),
        };
        let product = Expr::Arithmetic {
            left: Box::new(sum.clone()),
            op: ArithmeticOp::Multiply,
            right: value(3),
        };
        let (sql, args) = render(&product, Database::builder().build());
        assert_eq!(sql, "(? + ?) * ?");
        assert_eq!(args, vec![Value::I32(1), Value::I32(2), Value::I32(3)]);

        let difference = Expr::Arithmetic {
            left: value(5),
            op: ArithmeticOp::Subtract,
            right: Box::new(sum),
        };
        assert_eq!(render(&difference, Database::builder().build()).0, "? - (? + ?)");
    }

    #[test]
    fn test_function_uses_dialect_registry() {
        let year = Expr::Function {
            name: FunctionName::YEAR,
            args: vec![Expr::Literal(Value::from("2020-01-01"))],
        };
        assert_eq!(
            render(&year, Database::builder().build()).0,
            "year('2020-01-01')"
        );
        assert_eq!(
            render(&year, Database::builder().dialect(PostgresDialect::new()).build()).0,
            "extract(year from '2020-01-01')"
        );
    }

    #[test]
    fn test_unknown_function_is_unsupported() {
        let soundex = Expr::Function {
            name: FunctionName::new("soundex"),
            args: vec![],
        };
        let scope = Scope::new(Database::builder().build());
        assert!(matches!(
            soundex.render_with(&scope),
            Err(Error::DialectUnsupported { .. })
        ));
    }

    #[test]
    fn test_concat_and_sequence() {
        let concat = Expr::Concat(vec![
            Expr::Value(Value::from("a")),
            Expr::Literal(Value::from("b")),
        ]);
        let (sql, args) = render(&concat, Database::builder().build());
        assert_eq!(sql, "? || 'b'");
        assert_eq!(args.len(), 1);

        let next = Expr::NextValue {
            catalog: None,
            schema: None,
            name: "WIDGET_SEQ".to_string(),
        };
        let database = Database::builder()
            .dialect(Db2Dialect::new())
            .default_schema("TEST")
            .build();
        assert_eq!(render(&next, database).0, "next value for TEST.WIDGET_SEQ");
    }

    #[test]
    fn test_unresolved_name_without_aliases() {
        let scope = Scope::new(Database::builder().build());
        let err = column::<String>("NAME").expr().render_with(&scope).unwrap_err();
        assert!(matches!(err, Error::UnresolvedColumn { .. }));
    }
}
