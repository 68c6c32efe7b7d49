//! Table definitions and typed column tokens

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::database::Database;
use crate::scope::Alias;
use crate::types::DataType;
use crate::value::SqlType;

static NEXT_TABLE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a table definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableId(u64);

/// Identity of a column: its table plus its position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnId {
    pub table: TableId,
    pub index: usize,
}

/// A column of a table
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    field: String,
    data_type: DataType,
    nullable: bool,
}

impl Column {
    /// SQL column name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field name of the row type this column maps to
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }
}

/// Untyped table metadata shared by aliases and statements
#[derive(Debug)]
pub struct TableInfo {
    id: TableId,
    catalog: Option<String>,
    schema: Option<String>,
    name: String,
    columns: Vec<Column>,
}

impl TableInfo {
    pub fn id(&self) -> TableId {
        self.id
    }

    pub fn catalog(&self) -> Option<&str> {
        self.catalog.as_deref()
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, id: ColumnId) -> Option<&Column> {
        if id.table != self.id {
            return None;
        }
        self.columns.get(id.index)
    }

    pub fn column_named(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_for_field(&self, field: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.field == field)
    }
}

/// A table whose rows decode into `R`
pub struct Table<R> {
    info: Arc<TableInfo>,
    _row: PhantomData<fn() -> R>,
}

impl<R> Clone for Table<R> {
    fn clone(&self) -> Self {
        Self {
            info: Arc::clone(&self.info),
            _row: PhantomData,
        }
    }
}

impl<R> fmt::Debug for Table<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table").field("info", &self.info).finish()
    }
}

impl<R> Table<R> {
    /// Start defining a table
    ///
    /// # Examples
    /// ```
    /// use gantry_core::Table;
    ///
    /// #[derive(serde::Deserialize)]
    /// struct Widget {
    ///     widget_id: i64,
    ///     name: String,
    /// }
    ///
    /// let mut builder = Table::<Widget>::builder("WIDGET").schema("TEST");
    /// let widget_id = builder.column::<i64>("WIDGET_ID");
    /// let name = builder.column::<String>("NAME");
    /// let widgets = builder.build();
    ///
    /// assert_eq!(widgets.info().columns().len(), 2);
    /// assert_eq!(name.name(), "NAME");
    /// # let _ = widget_id;
    /// ```
    pub fn builder(name: impl Into<String>) -> TableBuilder<R> {
        TableBuilder {
            id: TableId(NEXT_TABLE_ID.fetch_add(1, Ordering::Relaxed)),
            catalog: None,
            schema: None,
            name: name.into(),
            columns: Vec::new(),
            _row: PhantomData,
        }
    }

    pub fn info(&self) -> &Arc<TableInfo> {
        &self.info
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// DDL creating this table in the database's dialect
    pub fn create_table_sql(&self, database: &Database) -> String {
        let dialect = database.dialect();
        let columns = self
            .info
            .columns
            .iter()
            .map(|c| {
                let null = if c.nullable { "" } else { " not null" };
                format!("{} {}{}", c.name, dialect.type_name(&c.data_type), null)
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "create table {} ({})",
            database.qualified_table_name(&self.info),
            columns
        )
    }
}

impl<R> Table<R>
where
    R: DeserializeOwned + 'static,
{
    /// Alias this table for use in a statement
    pub fn alias(&self, name: impl Into<String>) -> Alias<R> {
        Alias::for_table(Arc::clone(&self.info), name.into())
    }
}

/// Collects column declarations for a [`Table`]
pub struct TableBuilder<R> {
    id: TableId,
    catalog: Option<String>,
    schema: Option<String>,
    name: String,
    columns: Vec<Column>,
    _row: PhantomData<fn() -> R>,
}

impl<R> TableBuilder<R> {
    pub fn catalog(mut self, catalog: impl Into<String>) -> Self {
        self.catalog = Some(catalog.into());
        self
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Declare a column mapped to the lowercased column name as field
    pub fn column<T: SqlType>(&mut self, name: &str) -> Col<T> {
        self.declare(name, &name.to_lowercase(), T::data_type())
    }

    /// Declare a column with an explicit field name and data type
    ///
    /// # Panics
    ///
    /// If the table already has a column called `name` or mapped to `field`.
    pub fn declare<T: SqlType>(&mut self, name: &str, field: &str, data_type: DataType) -> Col<T> {
        if let Some(existing) = self
            .columns
            .iter()
            .find(|c| c.name == name || c.field == field)
        {
            panic!(
                "Table {} declares column {} (field '{}') twice",
                self.name, existing.name, existing.field
            );
        }
        let index = self.columns.len();
        self.columns.push(Column {
            name: name.to_string(),
            field: field.to_string(),
            data_type,
            nullable: T::nullable(),
        });
        Col {
            id: ColumnId {
                table: self.id,
                index,
            },
            name: Arc::from(name),
            _type: PhantomData,
        }
    }

    pub fn build(self) -> Table<R> {
        Table {
            info: Arc::new(TableInfo {
                id: self.id,
                catalog: self.catalog,
                schema: self.schema,
                name: self.name,
                columns: self.columns,
            }),
            _row: PhantomData,
        }
    }
}

/// Typed token for a column of one table definition
pub struct Col<T> {
    id: ColumnId,
    name: Arc<str>,
    _type: PhantomData<fn() -> T>,
}

impl<T> Clone for Col<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: Arc::clone(&self.name),
            _type: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Col<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Col")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

impl<T> Col<T> {
    pub fn id(&self) -> ColumnId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn shared_name(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }
}
