use std::sync::Arc;

use crate::builder::{Select, SelectCore};
use crate::operator::Operator;
use crate::render::{Render, RenderContext};
use crate::value::Value;
use crate::Result;

use super::Expr;

/// The right-hand side of a predicate over one expression
#[derive(Debug, Clone)]
pub enum Condition {
    Compare {
        op: Operator,
        rhs: Expr,
    },
    /// Always holds at least one value
    In {
        negated: bool,
        values: Vec<Value>,
    },
    InSelect {
        negated: bool,
        select: Arc<SelectCore>,
    },
    IsNull {
        negated: bool,
    },
    Like {
        negated: bool,
        pattern: Expr,
        escape: Option<char>,
    },
    Between {
        low: Expr,
        high: Expr,
    },
}

/// Boolean condition tree
///
/// `And`/`Or` hold flattened operand lists; a mixed child is wrapped in
/// parentheses when rendered, nothing else is.
#[derive(Debug, Clone)]
pub enum BooleanExpr {
    Predicate {
        lhs: Expr,
        condition: Condition,
        selectivity: Option<f64>,
    },
    Exists {
        negated: bool,
        select: Arc<SelectCore>,
    },
    And(Vec<BooleanExpr>),
    Or(Vec<BooleanExpr>),
    Not(Box<BooleanExpr>),
    Parenthesis(Box<BooleanExpr>),
}

impl BooleanExpr {
    pub fn and(self, other: BooleanExpr) -> BooleanExpr {
        let mut operands = match self {
            BooleanExpr::And(operands) => operands,
            single => vec![single],
        };
        match other {
            BooleanExpr::And(more) => operands.extend(more),
            single => operands.push(single),
        }
        BooleanExpr::And(operands)
    }

    pub fn or(self, other: BooleanExpr) -> BooleanExpr {
        let mut operands = match self {
            BooleanExpr::Or(operands) => operands,
            single => vec![single],
        };
        match other {
            BooleanExpr::Or(more) => operands.extend(more),
            single => operands.push(single),
        }
        BooleanExpr::Or(operands)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> BooleanExpr {
        BooleanExpr::Not(Box::new(self))
    }

    /// Force parentheses around this condition
    pub fn parenthesized(self) -> BooleanExpr {
        BooleanExpr::Parenthesis(Box::new(self))
    }

    pub fn exists<T>(select: &Select<T>) -> BooleanExpr {
        BooleanExpr::Exists {
            negated: false,
            select: Arc::new(select.core().clone()),
        }
    }

    pub fn not_exists<T>(select: &Select<T>) -> BooleanExpr {
        BooleanExpr::Exists {
            negated: true,
            select: Arc::new(select.core().clone()),
        }
    }

    fn render_operands(
        operands: &[BooleanExpr],
        keyword: &str,
        ctx: &mut RenderContext<'_>,
    ) -> Result<()> {
        for (i, operand) in operands.iter().enumerate() {
            if i > 0 {
                ctx.write(keyword);
            }
            let mixed = matches!(
                (keyword, operand),
                (" and ", BooleanExpr::Or(_)) | (" or ", BooleanExpr::And(_))
            );
            if mixed {
                ctx.write("(");
                operand.render(ctx)?;
                ctx.write(")");
            } else {
                operand.render(ctx)?;
            }
        }
        Ok(())
    }
}

fn not_prefix(negated: bool) -> &'static str {
    if negated {
        "not "
    } else {
        ""
    }
}

impl Render for Condition {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        match self {
            Condition::Compare { op, rhs } => {
                ctx.write(" ");
                ctx.write(op.as_str());
                ctx.write(" ");
                rhs.render(ctx)?;
            }
            Condition::In { negated, values } => {
                ctx.write(" ");
                ctx.write(not_prefix(*negated));
                ctx.write("in (");
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        ctx.write(", ");
                    }
                    ctx.bind(value.clone());
                }
                ctx.write(")");
            }
            Condition::InSelect { negated, select } => {
                ctx.write(" ");
                ctx.write(not_prefix(*negated));
                ctx.write("in ");
                select.render_subquery(ctx)?;
            }
            Condition::IsNull { negated } => {
                ctx.write(if *negated { " is not null" } else { " is null" });
            }
            Condition::Like {
                negated,
                pattern,
                escape,
            } => {
                ctx.write(" ");
                ctx.write(not_prefix(*negated));
                ctx.write("like ");
                pattern.render(ctx)?;
                if let Some(escape) = escape {
                    let literal = ctx.dialect().string_literal(&escape.to_string());
                    ctx.write(" escape ");
                    ctx.write(&literal);
                }
            }
            Condition::Between { low, high } => {
                ctx.write(" between ");
                low.render(ctx)?;
                ctx.write(" and ");
                high.render(ctx)?;
            }
        }
        Ok(())
    }
}

impl Render for BooleanExpr {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        match self {
            BooleanExpr::Predicate {
                lhs,
                condition,
                selectivity,
            } => {
                lhs.render(ctx)?;
                condition.render(ctx)?;
                if let Some(selectivity) = selectivity {
                    let hint = ctx.dialect().selectivity(*selectivity);
                    ctx.write(&hint);
                }
            }
            BooleanExpr::Exists { negated, select } => {
                ctx.write(not_prefix(*negated));
                ctx.write("exists ");
                select.render_subquery(ctx)?;
            }
            BooleanExpr::And(operands) => Self::render_operands(operands, " and ", ctx)?,
            BooleanExpr::Or(operands) => Self::render_operands(operands, " or ", ctx)?,
            BooleanExpr::Not(inner) => {
                ctx.write("not ");
                match inner.as_ref() {
                    BooleanExpr::Parenthesis(_) => inner.render(ctx)?,
                    other => {
                        ctx.write("(");
                        other.render(ctx)?;
                        ctx.write(")");
                    }
                }
            }
            BooleanExpr::Parenthesis(inner) => {
                ctx.write("(");
                inner.render(ctx)?;
                ctx.write(")");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::dialect::Db2Dialect;
    use crate::scope::Scope;

    fn eq(i: i32) -> BooleanExpr {
        BooleanExpr::Predicate {
            lhs: Expr::Literal(Value::I32(i)),
            condition: Condition::Compare {
                op: Operator::EQ,
                rhs: Expr::Value(Value::I32(i)),
            },
            selectivity: None,
        }
    }

    fn sql(condition: &BooleanExpr) -> String {
        let scope = Scope::new(Database::builder().build());
        condition.render_with(&scope).unwrap().sql
    }

    #[test]
    fn test_leaves_are_not_wrapped() {
        assert_eq!(sql(&eq(1)), "1 = ?");
        assert_eq!(sql(&eq(1).and(eq(2)).and(eq(3))), "1 = ? and 2 = ? and 3 = ?");
    }

    #[test]
    fn test_mixed_operators_keep_grouping() {
        let grouped = eq(1).and(eq(2)).or(eq(3));
        assert_eq!(sql(&grouped), "(1 = ? and 2 = ?) or 3 = ?");

        let other_way = eq(1).and(eq(2).or(eq(3)));
        assert_eq!(sql(&other_way), "1 = ? and (2 = ? or 3 = ?)");
    }

    #[test]
    fn test_not_and_explicit_parenthesis() {
        assert_eq!(sql(&eq(1).not()), "not (1 = ?)");
        assert_eq!(sql(&eq(1).parenthesized().and(eq(2))), "(1 = ?) and 2 = ?");
        assert_eq!(sql(&eq(1).parenthesized().not()), "not (1 = ?)");
    }

    #[test]
    fn test_in_null_like_between() {
        let in_list = BooleanExpr::Predicate {
            lhs: Expr::Literal(Value::I32(0)),
            condition: Condition::In {
                negated: true,
                values: vec![Value::I32(1), Value::I32(2)],
            },
            selectivity: None,
        };
        assert_eq!(sql(&in_list), "0 not in (?, ?)");

        let null = BooleanExpr::Predicate {
            lhs: Expr::Literal(Value::I32(0)),
            condition: Condition::IsNull { negated: true },
            selectivity: None,
        };
        assert_eq!(sql(&null), "0 is not null");

        let like = BooleanExpr::Predicate {
            lhs: Expr::Literal(Value::from("a")),
            condition: Condition::Like {
                negated: false,
                pattern: Expr::Value(Value::from("a!%%")),
                escape: Some('!'),
            },
            selectivity: None,
        };
        assert_eq!(sql(&like), "'a' like ? escape '!'");

        let between = BooleanExpr::Predicate {
            lhs: Expr::Literal(Value::I32(5)),
            condition: Condition::Between {
                low: Expr::Value(Value::I32(1)),
                high: Expr::Value(Value::I32(9)),
            },
            selectivity: None,
        };
        assert_eq!(sql(&between), "5 between ? and ?");
    }

    #[test]
    fn test_selectivity_hint_is_dialect_specific() {
        let hinted = BooleanExpr::Predicate {
            lhs: Expr::Literal(Value::I32(1)),
            condition: Condition::Compare {
                op: Operator::EQ,
                rhs: Expr::Value(Value::I32(1)),
            },
            selectivity: Some(0.5),
        };
        assert_eq!(sql(&hinted), "1 = ?");

        let scope = Scope::new(Database::builder().dialect(Db2Dialect::new()).build());
        assert_eq!(
            hinted.render_with(&scope).unwrap().sql,
            "1 = ? selectivity 0.500000"
        );
    }
}
