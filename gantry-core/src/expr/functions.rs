//! Typed constructors for dialect functions and composite expressions

use std::marker::PhantomData;

use chrono::{NaiveDate, NaiveDateTime};

use crate::dialect::FunctionName;
use crate::value::SqlType;

use super::{BooleanExpr, Expr, Textual, TypedExpr};

/// Date and timestamp types accepted by the date-part functions
pub trait Temporal: SqlType {}

impl Temporal for NaiveDate {}
impl Temporal for NaiveDateTime {}
impl Temporal for Option<NaiveDate> {}
impl Temporal for Option<NaiveDateTime> {}

/// Call a function registered with the dialect
pub fn function<T: SqlType>(name: FunctionName, args: Vec<Expr>) -> TypedExpr<T> {
    TypedExpr::new(Expr::Function { name, args })
}

fn unary<T: SqlType>(name: FunctionName, arg: Expr) -> TypedExpr<T> {
    function(name, vec![arg])
}

pub fn year<T: Temporal>(expr: impl Into<TypedExpr<T>>) -> TypedExpr<i32> {
    unary(FunctionName::YEAR, expr.into().into_expr())
}

pub fn month<T: Temporal>(expr: impl Into<TypedExpr<T>>) -> TypedExpr<i32> {
    unary(FunctionName::MONTH, expr.into().into_expr())
}

pub fn day<T: Temporal>(expr: impl Into<TypedExpr<T>>) -> TypedExpr<i32> {
    unary(FunctionName::DAY, expr.into().into_expr())
}

pub fn hour<T: Temporal>(expr: impl Into<TypedExpr<T>>) -> TypedExpr<i32> {
    unary(FunctionName::HOUR, expr.into().into_expr())
}

pub fn minute<T: Temporal>(expr: impl Into<TypedExpr<T>>) -> TypedExpr<i32> {
    unary(FunctionName::MINUTE, expr.into().into_expr())
}

pub fn second<T: Temporal>(expr: impl Into<TypedExpr<T>>) -> TypedExpr<i32> {
    unary(FunctionName::SECOND, expr.into().into_expr())
}

pub fn current_date() -> TypedExpr<NaiveDate> {
    function(FunctionName::CURRENT_DATE, Vec::new())
}

pub fn current_timestamp() -> TypedExpr<NaiveDateTime> {
    function(FunctionName::CURRENT_TIMESTAMP, Vec::new())
}

pub fn upper<T: Textual>(expr: impl Into<TypedExpr<T>>) -> TypedExpr<T> {
    unary(FunctionName::UPPER, expr.into().into_expr())
}

pub fn lower<T: Textual>(expr: impl Into<TypedExpr<T>>) -> TypedExpr<T> {
    unary(FunctionName::LOWER, expr.into().into_expr())
}

pub fn max<T: SqlType>(expr: impl Into<TypedExpr<T>>) -> TypedExpr<T> {
    unary(FunctionName::MAX, expr.into().into_expr())
}

pub fn min<T: SqlType>(expr: impl Into<TypedExpr<T>>) -> TypedExpr<T> {
    unary(FunctionName::MIN, expr.into().into_expr())
}

pub fn sum<T: SqlType>(expr: impl Into<TypedExpr<T>>) -> TypedExpr<T> {
    unary(FunctionName::SUM, expr.into().into_expr())
}

pub fn avg<T: SqlType>(expr: impl Into<TypedExpr<T>>) -> TypedExpr<f64> {
    unary(FunctionName::AVG, expr.into().into_expr())
}

/// `count(*)`
pub fn count() -> TypedExpr<i64> {
    TypedExpr::new(Expr::CountAll)
}

pub fn count_of<T: SqlType>(expr: impl Into<TypedExpr<T>>) -> TypedExpr<i64> {
    unary(FunctionName::COUNT, expr.into().into_expr())
}

pub fn count_distinct<T: SqlType>(expr: impl Into<TypedExpr<T>>) -> TypedExpr<i64> {
    unary(FunctionName::COUNT_DISTINCT, expr.into().into_expr())
}

/// Next value of a sequence, qualified with the default schema when `schema` is `None`
pub fn next_value<T: SqlType>(schema: Option<&str>, name: &str) -> TypedExpr<T> {
    TypedExpr::new(Expr::NextValue {
        catalog: None,
        schema: schema.map(str::to_string),
        name: name.to_string(),
    })
}

/// Start a `coalesce(...)` over nullable expressions
pub fn coalesce<T: SqlType>(first: impl Into<TypedExpr<Option<T>>>) -> Coalesce<T> {
    Coalesce {
        args: vec![first.into().into_expr()],
        _type: PhantomData,
    }
}

/// A `coalesce` whose arguments so far may all be null
pub struct Coalesce<T> {
    args: Vec<Expr>,
    _type: PhantomData<fn() -> T>,
}

impl<T: SqlType> Coalesce<T> {
    pub fn or_else(mut self, next: impl Into<TypedExpr<Option<T>>>) -> Self {
        self.args.push(next.into().into_expr());
        self
    }

    /// Finish with a non-null fallback expression
    pub fn or_else_non_null(mut self, last: impl Into<TypedExpr<T>>) -> TypedExpr<T> {
        self.args.push(last.into().into_expr());
        function(FunctionName::COALESCE, self.args)
    }

    /// Finish with a bound fallback value
    pub fn or_value(self, value: impl Into<T>) -> TypedExpr<T> {
        self.or_else_non_null(TypedExpr::<T>::value(value))
    }

    /// Finish without a non-null fallback
    pub fn nullable(self) -> TypedExpr<Option<T>> {
        function(FunctionName::COALESCE, self.args)
    }
}

/// Start a `case when ... then ... end`
pub fn case<T: SqlType>(when: BooleanExpr, then: impl Into<TypedExpr<T>>) -> Case<T> {
    Case {
        branches: vec![(when, then.into().into_expr())],
        _type: PhantomData,
    }
}

pub struct Case<T> {
    branches: Vec<(BooleanExpr, Expr)>,
    _type: PhantomData<fn() -> T>,
}

impl<T: SqlType> Case<T> {
    pub fn when(mut self, when: BooleanExpr, then: impl Into<TypedExpr<T>>) -> Self {
        self.branches.push((when, then.into().into_expr()));
        self
    }

    pub fn otherwise(self, otherwise: impl Into<TypedExpr<T>>) -> TypedExpr<T> {
        TypedExpr::new(Expr::Case {
            branches: self.branches,
            otherwise: Some(Box::new(otherwise.into().into_expr())),
        })
    }

    /// Without `else` the result is null when no branch matches
    pub fn end(self) -> TypedExpr<Option<T>> {
        TypedExpr::new(Expr::Case {
            branches: self.branches,
            otherwise: None,
        })
    }
}
