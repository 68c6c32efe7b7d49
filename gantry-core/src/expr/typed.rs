use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::builder::Select;
use crate::catalog::Col;
use crate::operator::{IntoOperator, Operator};
use crate::value::SqlType;
use crate::{Error, Result};

use super::{AliasRef, ArithmeticOp, BooleanExpr, ColumnRef, ColumnTarget, Condition, Expr};

/// An expression producing values of type `T`
pub struct TypedExpr<T> {
    expr: Expr,
    selectivity: Option<f64>,
    _type: PhantomData<fn() -> T>,
}

impl<T> Clone for TypedExpr<T> {
    fn clone(&self) -> Self {
        Self {
            expr: self.expr.clone(),
            selectivity: self.selectivity,
            _type: PhantomData,
        }
    }
}

impl<T> fmt::Debug for TypedExpr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedExpr")
            .field("expr", &self.expr)
            .field("selectivity", &self.selectivity)
            .finish()
    }
}

impl<T> TypedExpr<T> {
    pub fn new(expr: Expr) -> Self {
        Self {
            expr,
            selectivity: None,
            _type: PhantomData,
        }
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn into_expr(self) -> Expr {
        self.expr
    }

    /// Optimizer hint attached to predicates built from this expression
    pub fn selectivity(mut self, selectivity: f64) -> Self {
        self.selectivity = Some(selectivity);
        self
    }

    fn predicate(self, condition: Condition) -> BooleanExpr {
        BooleanExpr::Predicate {
            lhs: self.expr,
            condition,
            selectivity: self.selectivity,
        }
    }

    fn target_name(&self) -> String {
        match &self.expr {
            Expr::Column(column) => column.target.name().to_string(),
            _ => "expression".to_string(),
        }
    }
}

impl<T: SqlType> TypedExpr<T> {
    /// A bound parameter
    pub fn value(value: impl Into<T>) -> Self {
        Self::new(Expr::Value(value.into().into_value()))
    }

    /// A value written inline
    pub fn literal(value: impl Into<T>) -> Self {
        Self::new(Expr::Literal(value.into().into_value()))
    }

    /// Compare against a bound value.
    ///
    /// Pass an [`Operator`] constant, or [`Operator::custom`] for anything
    /// else. The `&str` forms are a shorthand that panics on text other than
    /// the six standard comparisons.
    pub fn compare(self, op: impl IntoOperator, value: impl Into<T>) -> BooleanExpr {
        let rhs = Expr::Value(value.into().into_value());
        self.predicate(Condition::Compare {
            op: op.into_operator(),
            rhs,
        })
    }

    /// Compare against another expression; operators as in [`TypedExpr::compare`]
    pub fn compare_expr(self, op: impl IntoOperator, other: impl Into<TypedExpr<T>>) -> BooleanExpr {
        let rhs = other.into().expr;
        self.predicate(Condition::Compare {
            op: op.into_operator(),
            rhs,
        })
    }

    pub fn eq(self, value: impl Into<T>) -> BooleanExpr {
        self.compare(Operator::EQ, value)
    }

    pub fn ne(self, value: impl Into<T>) -> BooleanExpr {
        self.compare(Operator::NE, value)
    }

    pub fn lt(self, value: impl Into<T>) -> BooleanExpr {
        self.compare(Operator::LT, value)
    }

    pub fn le(self, value: impl Into<T>) -> BooleanExpr {
        self.compare(Operator::LE, value)
    }

    pub fn gt(self, value: impl Into<T>) -> BooleanExpr {
        self.compare(Operator::GT, value)
    }

    pub fn ge(self, value: impl Into<T>) -> BooleanExpr {
        self.compare(Operator::GE, value)
    }

    pub fn eq_expr(self, other: impl Into<TypedExpr<T>>) -> BooleanExpr {
        self.compare_expr(Operator::EQ, other)
    }

    pub fn ne_expr(self, other: impl Into<TypedExpr<T>>) -> BooleanExpr {
        self.compare_expr(Operator::NE, other)
    }

    pub fn lt_expr(self, other: impl Into<TypedExpr<T>>) -> BooleanExpr {
        self.compare_expr(Operator::LT, other)
    }

    pub fn le_expr(self, other: impl Into<TypedExpr<T>>) -> BooleanExpr {
        self.compare_expr(Operator::LE, other)
    }

    pub fn gt_expr(self, other: impl Into<TypedExpr<T>>) -> BooleanExpr {
        self.compare_expr(Operator::GT, other)
    }

    pub fn ge_expr(self, other: impl Into<TypedExpr<T>>) -> BooleanExpr {
        self.compare_expr(Operator::GE, other)
    }

    /// `x in (?, ...)`; an empty list is rejected
    pub fn is_in<I, V>(self, values: I) -> Result<BooleanExpr>
    where
        I: IntoIterator<Item = V>,
        V: Into<T>,
    {
        self.in_list(false, values)
    }

    pub fn not_in<I, V>(self, values: I) -> Result<BooleanExpr>
    where
        I: IntoIterator<Item = V>,
        V: Into<T>,
    {
        self.in_list(true, values)
    }

    fn in_list<I, V>(self, negated: bool, values: I) -> Result<BooleanExpr>
    where
        I: IntoIterator<Item = V>,
        V: Into<T>,
    {
        let values: Vec<_> = values
            .into_iter()
            .map(|v| v.into().into_value())
            .collect();
        if values.is_empty() {
            let operator = if negated { "not in" } else { "in" };
            return Err(Error::empty_in_list(operator, self.target_name()));
        }
        Ok(self.predicate(Condition::In { negated, values }))
    }

    /// `x in (select ...)` over a single-column select of the same type
    pub fn in_select(self, select: &Select<(T,)>) -> BooleanExpr {
        self.predicate(Condition::InSelect {
            negated: false,
            select: Arc::new(select.core().clone()),
        })
    }

    pub fn not_in_select(self, select: &Select<(T,)>) -> BooleanExpr {
        self.predicate(Condition::InSelect {
            negated: true,
            select: Arc::new(select.core().clone()),
        })
    }

    pub fn is_null(self) -> BooleanExpr {
        self.predicate(Condition::IsNull { negated: false })
    }

    pub fn is_not_null(self) -> BooleanExpr {
        self.predicate(Condition::IsNull { negated: true })
    }

    pub fn between(self, low: impl Into<T>, high: impl Into<T>) -> BooleanExpr {
        self.predicate(Condition::Between {
            low: Expr::Value(low.into().into_value()),
            high: Expr::Value(high.into().into_value()),
        })
    }

    fn arithmetic(self, op: ArithmeticOp, other: impl Into<TypedExpr<T>>) -> TypedExpr<T> {
        TypedExpr::new(Expr::Arithmetic {
            left: Box::new(self.expr),
            op,
            right: Box::new(other.into().expr),
        })
    }

    pub fn plus(self, other: impl Into<TypedExpr<T>>) -> TypedExpr<T> {
        self.arithmetic(ArithmeticOp::Add, other)
    }

    pub fn minus(self, other: impl Into<TypedExpr<T>>) -> TypedExpr<T> {
        self.arithmetic(ArithmeticOp::Subtract, other)
    }

    pub fn times(self, other: impl Into<TypedExpr<T>>) -> TypedExpr<T> {
        self.arithmetic(ArithmeticOp::Multiply, other)
    }

    pub fn divided_by(self, other: impl Into<TypedExpr<T>>) -> TypedExpr<T> {
        self.arithmetic(ArithmeticOp::Divide, other)
    }
}

/// Character types accepted by `like` and concatenation
pub trait Textual: SqlType {}

impl Textual for String {}
impl Textual for Option<String> {}

impl<T: Textual> TypedExpr<T> {
    pub fn like(self, pattern: impl Into<String>) -> BooleanExpr {
        self.like_pattern(false, pattern.into(), None)
    }

    pub fn not_like(self, pattern: impl Into<String>) -> BooleanExpr {
        self.like_pattern(true, pattern.into(), None)
    }

    /// `like` where `escape` marks literal `%` and `_` in the pattern
    pub fn like_escape(self, pattern: impl Into<String>, escape: char) -> BooleanExpr {
        self.like_pattern(false, pattern.into(), Some(escape))
    }

    fn like_pattern(self, negated: bool, pattern: String, escape: Option<char>) -> BooleanExpr {
        self.predicate(Condition::Like {
            negated,
            pattern: Expr::Value(pattern.into_value()),
            escape,
        })
    }

    /// String concatenation in the dialect's syntax
    pub fn concat(self, other: impl Into<TypedExpr<T>>) -> TypedExpr<T> {
        let mut parts = match self.expr {
            Expr::Concat(parts) => parts,
            single => vec![single],
        };
        parts.push(other.into().expr);
        TypedExpr::new(Expr::Concat(parts))
    }
}

impl<T> From<Col<T>> for TypedExpr<T> {
    fn from(col: Col<T>) -> Self {
        TypedExpr::from(&col)
    }
}

impl<T> From<&Col<T>> for TypedExpr<T> {
    fn from(col: &Col<T>) -> Self {
        TypedExpr::new(Expr::Column(ColumnRef {
            alias: AliasRef::Any,
            target: ColumnTarget::Token {
                id: col.id(),
                name: col.shared_name(),
            },
        }))
    }
}

impl<T> From<&TypedExpr<T>> for TypedExpr<T> {
    fn from(expr: &TypedExpr<T>) -> Self {
        expr.clone()
    }
}
