//! Gantry Core - typed SQL query construction
//!
//! Tables are described once as [`Table`]s with typed column tokens. Queries
//! attach [`Alias`]es of those tables to a [`Scope`], build expression trees
//! over the column tokens and render them through a [`Dialect`] into SQL
//! text, an ordered argument list and a [`RowMapper`] for the results.
//!
//! ```
//! use gantry_core::{Database, QueryBuilder, Table, TypedExpr, Value};
//!
//! #[derive(serde::Deserialize)]
//! struct Widget {
//!     widget_id: i64,
//!     name: String,
//! }
//!
//! let mut builder = Table::<Widget>::builder("WIDGET");
//! let widget_id = builder.column::<i64>("WIDGET_ID");
//! let name = builder.column::<String>("NAME");
//! let widgets = builder.build();
//!
//! let db = Database::builder().build();
//! let w = widgets.alias("w");
//! let select = db
//!     .from(&w)
//!     .select(&name, "n")?
//!     .where_(TypedExpr::from(&widget_id).eq(7i64));
//!
//! let rendered = select.render()?;
//! assert_eq!(rendered.sql, "select w.NAME as n from WIDGET as w where w.WIDGET_ID = ?");
//! assert_eq!(rendered.args, vec![Value::I64(7)]);
//! # Ok::<(), gantry_core::Error>(())
//! ```

pub mod builder;
pub mod catalog;
pub mod database;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod expr;
pub mod operator;
pub mod projection;
pub mod render;
pub mod row;
pub mod scope;
pub mod types;
pub mod value;

// Re-export main types
pub use builder::{
    Delete, DeleteInitial, Insert, InsertRow, JoinType, Order, QueryBuilder, Select, SelectFrom,
    SelectInto, Update,
};
pub use catalog::{Col, Table, TableBuilder};
pub use database::{Database, DatabaseBuilder, DatabaseConfig};
pub use dialect::{
    AnsiDialect, Db2Dialect, Dialect, DialectKind, FunctionName, FunctionSpec, IsolationLevel,
    LockLevel, OracleDialect, PostgresDialect,
};
pub use error::{Error, Result};
pub use executor::{AnyExecutor, SqlExecutor};
pub use expr::{column, column_in, col_in, BooleanExpr, TypedExpr};
pub use operator::{IntoOperator, Operator};
pub use projection::Projection;
pub use render::RenderedSql;
pub use row::{Row, RowMapper, TupleAppend};
pub use scope::{Alias, Scope};
pub use types::{BooleanAsNumber, DataType, TypeAdapter};
pub use value::{SqlType, Value, ValueKind};
