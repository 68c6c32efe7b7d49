//! Comparison operators

use std::fmt::{self, Display};

/// Binary comparison operator rendered between two operands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operator(&'static str);

impl Operator {
    pub const EQ: Self = Operator("=");
    pub const NE: Self = Operator("<>");
    pub const LT: Self = Operator("<");
    pub const LE: Self = Operator("<=");
    pub const GT: Self = Operator(">");
    pub const GE: Self = Operator(">=");

    /// Create a database-specific operator
    ///
    /// # Examples
    /// ```
    /// use gantry_core::Operator;
    ///
    /// // PostgreSQL full-text match
    /// let matches = Operator::custom("@@");
    /// assert_eq!(matches.as_str(), "@@");
    /// ```
    pub const fn custom(op: &'static str) -> Self {
        Operator(op)
    }

    pub fn as_str(&self) -> &str {
        self.0
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Types that can be converted to comparison operators
pub trait IntoOperator {
    fn into_operator(self) -> Operator;
}

impl IntoOperator for Operator {
    fn into_operator(self) -> Operator {
        self
    }
}

/// String forms of the standard comparisons
///
/// # Panics
/// On anything other than `=`, `<>`, `!=`, `<`, `<=`, `>`, `>=`.
/// Use [`Operator::custom`] for other operators.
impl IntoOperator for &str {
    fn into_operator(self) -> Operator {
        match self {
            "=" => Operator::EQ,
            "<>" | "!=" => Operator::NE,
            "<" => Operator::LT,
            "<=" => Operator::LE,
            ">" => Operator::GT,
            ">=" => Operator::GE,
            _ => panic!(
                "Unknown comparison '{}'. Use Operator constants or Operator::custom(\"{}\").",
                self, self
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_constants() {
        assert_eq!(Operator::EQ.as_str(), "=");
        assert_eq!(Operator::NE.as_str(), "<>");
        assert_eq!(Operator::GE.to_string(), ">=");
    }

    #[test]
    fn test_string_conversion() {
        assert_eq!("!=".into_operator(), Operator::NE);
        assert_eq!("<>".into_operator(), Operator::NE);
        assert_eq!("<=".into_operator(), Operator::LE);
    }

    #[test]
    #[should_panic(expected = "Unknown comparison 'LIKE'")]
    fn test_like_is_not_a_comparison() {
        "LIKE".into_operator();
    }
}
