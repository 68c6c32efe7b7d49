//! Error types for Gantry

use thiserror::Error;

/// The main error type for Gantry operations
#[derive(Error, Debug)]
pub enum Error {
    /// No visible alias owns the referenced column
    #[error("Column '{column}' could not be resolved against aliases [{}]", .searched.join(", "))]
    UnresolvedColumn { column: String, searched: Vec<String> },

    /// More than one visible alias owns the referenced column
    #[error("Column '{column}' is ambiguous, candidates are [{}]", .candidates.join(", "))]
    AmbiguousColumn {
        column: String,
        candidates: Vec<String>,
    },

    /// An explicitly named alias is not in scope
    #[error("Alias '{alias}' is not in scope, visible aliases are [{}]", .visible.join(", "))]
    UnknownAlias { alias: String, visible: Vec<String> },

    /// An explicitly named alias exists but its table lacks the column
    #[error("Column '{column}' not found in '{table}' (alias '{alias}')")]
    NoSuchColumn {
        alias: String,
        table: String,
        column: String,
    },

    /// IN / NOT IN with no values
    #[error("At least one value is required for '{operator}' on {target}")]
    EmptyInList { operator: String, target: String },

    /// A projection label was used twice
    #[error("Projection label '{label}' is already in use")]
    LabelCollision { label: String },

    /// Two aliases with the same name in one scope
    #[error("Alias '{alias}' is already declared in this scope")]
    DuplicateAlias { alias: String },

    /// The dialect has no strategy and no fallback for a feature
    #[error("Dialect '{dialect}' does not support {feature}")]
    DialectUnsupported { dialect: String, feature: String },

    /// Projection and row mapper disagree on the number of columns
    #[error("Internal error: projection has {labels} columns but row mapper decodes {components}")]
    InternalShapeMismatch { labels: usize, components: usize },

    /// Invalid query configuration
    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    /// A row value could not be converted to the requested type
    #[error("Cannot decode column '{label}': {message}")]
    Decode { label: String, message: String },

    /// Database connection or execution error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience Result type for Gantry operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn unresolved_column(column: impl Into<String>, searched: Vec<String>) -> Self {
        Self::UnresolvedColumn {
            column: column.into(),
            searched,
        }
    }

    pub fn ambiguous_column(column: impl Into<String>, candidates: Vec<String>) -> Self {
        Self::AmbiguousColumn {
            column: column.into(),
            candidates,
        }
    }

    pub fn unknown_alias(alias: impl Into<String>, visible: Vec<String>) -> Self {
        Self::UnknownAlias {
            alias: alias.into(),
            visible,
        }
    }

    pub fn no_such_column(
        alias: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Self::NoSuchColumn {
            alias: alias.into(),
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn empty_in_list(operator: impl Into<String>, target: impl Into<String>) -> Self {
        Self::EmptyInList {
            operator: operator.into(),
            target: target.into(),
        }
    }

    pub fn label_collision(label: impl Into<String>) -> Self {
        Self::LabelCollision {
            label: label.into(),
        }
    }

    pub fn duplicate_alias(alias: impl Into<String>) -> Self {
        Self::DuplicateAlias {
            alias: alias.into(),
        }
    }

    /// Create a new dialect unsupported error
    pub fn dialect_unsupported(dialect: impl Into<String>, feature: impl Into<String>) -> Self {
        Self::DialectUnsupported {
            dialect: dialect.into(),
            feature: feature.into(),
        }
    }

    /// Create a new invalid query error
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    pub fn decode(label: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            label: label.into(),
            message: message.into(),
        }
    }
}
