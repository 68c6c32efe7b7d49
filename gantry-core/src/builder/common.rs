//! Pieces shared by the statement builders

use crate::expr::{BooleanExpr, Expr, TypedExpr};
use crate::render::{Render, RenderContext, RenderedSql};
use crate::value::Value;
use crate::Result;

/// Common interface of every renderable statement
pub trait QueryBuilder {
    /// Render to SQL text and ordered arguments
    fn render(&self) -> Result<RenderedSql>;

    fn sql(&self) -> Result<String> {
        Ok(self.render()?.sql)
    }

    fn args(&self) -> Result<Vec<Value>> {
        Ok(self.render()?.args)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    LeftOuter,
    RightOuter,
    FullOuter,
}

impl JoinType {
    pub fn sql(&self) -> &'static str {
        match self {
            JoinType::Inner => "join",
            JoinType::LeftOuter => "left join",
            JoinType::RightOuter => "right join",
            JoinType::FullOuter => "full outer join",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    pub fn sql(&self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Ordering {
    pub expr: Expr,
    pub order: Order,
}

impl Ordering {
    pub fn new<T>(expr: impl Into<TypedExpr<T>>, order: Order) -> Self {
        Self {
            expr: expr.into().into_expr(),
            order,
        }
    }
}

impl Render for Ordering {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        self.expr.render(ctx)?;
        ctx.write(" ");
        ctx.write(self.order.sql());
        Ok(())
    }
}

/// Combine an accumulated predicate with a new one
pub(crate) fn and_condition(existing: Option<BooleanExpr>, condition: BooleanExpr) -> BooleanExpr {
    match existing {
        Some(existing) => existing.and(condition),
        None => condition,
    }
}

pub(crate) fn or_condition(existing: Option<BooleanExpr>, condition: BooleanExpr) -> BooleanExpr {
    match existing {
        Some(existing) => existing.or(condition),
        None => condition,
    }
}

/// Write `items` separated by `", "`
pub(crate) fn render_list<N: Render>(ctx: &mut RenderContext<'_>, items: &[N]) -> Result<()> {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            ctx.write(", ");
        }
        item.render(ctx)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::scope::Scope;

    #[test]
    fn test_join_and_order_keywords() {
        assert_eq!(JoinType::Inner.sql(), "join");
        assert_eq!(JoinType::FullOuter.sql(), "full outer join");
        assert_eq!(Order::default(), Order::Asc);
        assert_eq!(Order::Desc.sql(), "desc");
    }

    #[test]
    fn test_ordering_renders_direction() {
        let scope = Scope::new(Database::builder().build());
        let ordering = Ordering::new(TypedExpr::<i32>::literal(1), Order::Desc);
        assert_eq!(ordering.render_with(&scope).unwrap().sql, "1 desc");
    }
}
