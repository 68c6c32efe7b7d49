//! Boundary towards whatever runs the rendered statements

use std::future::Future;

use sqlx::any::{AnyArguments, AnyRow};
use sqlx::AnyPool;
use sqlx::query::Query;
use sqlx::Any;
use tracing::debug;

use crate::builder::{Delete, Insert, QueryBuilder, Select, Update};
use crate::row::RowMapper;
use crate::value::Value;
use crate::{Error, Result};

/// Runs SQL text with ordered arguments
pub trait SqlExecutor: Send + Sync {
    /// Run a query and decode every row through `mapper`
    fn query<T: Send + 'static>(
        &self,
        sql: &str,
        args: &[Value],
        mapper: &RowMapper<T>,
    ) -> impl Future<Output = Result<Vec<T>>> + Send;

    /// Run a statement and return the affected row count
    fn update(&self, sql: &str, args: &[Value]) -> impl Future<Output = Result<u64>> + Send;

    /// Run `preamble` and then the query inside one transaction, so both
    /// reach the same connection
    fn query_isolated<T: Send + 'static>(
        &self,
        preamble: &str,
        sql: &str,
        args: &[Value],
        mapper: &RowMapper<T>,
    ) -> impl Future<Output = Result<Vec<T>>> + Send;
}

impl<T: Send + 'static> Select<T> {
    /// Every row, running the isolation preamble first when there is one
    pub async fn list<E: SqlExecutor>(&self, executor: &E) -> Result<Vec<T>> {
        let rendered = self.render()?;
        match &rendered.preamble {
            Some(preamble) => {
                executor
                    .query_isolated(preamble, &rendered.sql, &rendered.args, self.row_mapper())
                    .await
            }
            None => {
                executor
                    .query(&rendered.sql, &rendered.args, self.row_mapper())
                    .await
            }
        }
    }

    /// At most one row; more than one is an error
    pub async fn optional<E: SqlExecutor>(&self, executor: &E) -> Result<Option<T>> {
        let mut rows = self.list(executor).await?;
        if rows.len() > 1 {
            return Err(Error::invalid_query(format!(
                "expected at most one row, got {}",
                rows.len()
            )));
        }
        Ok(rows.pop())
    }
}

async fn execute_one<Q: QueryBuilder, E: SqlExecutor>(statement: &Q, executor: &E) -> Result<u64> {
    let rendered = statement.render()?;
    executor.update(&rendered.sql, &rendered.args).await
}

impl<R> Update<R> {
    pub async fn execute<E: SqlExecutor>(&self, executor: &E) -> Result<u64> {
        execute_one(self, executor).await
    }
}

impl<R> Delete<R> {
    pub async fn execute<E: SqlExecutor>(&self, executor: &E) -> Result<u64> {
        execute_one(self, executor).await
    }
}

impl<R> Insert<R> {
    /// Total rows inserted over all rendered statements
    pub async fn execute<E: SqlExecutor>(&self, executor: &E) -> Result<u64> {
        let mut total = 0;
        for statement in self.render()? {
            total += executor.update(&statement.sql, &statement.args).await?;
        }
        Ok(total)
    }
}

/// [`SqlExecutor`] over a `sqlx` pool of the `Any` driver.
///
/// Drivers must be installed with `sqlx::any::install_default_drivers`
/// before the pool is created.
#[derive(Debug, Clone)]
pub struct AnyExecutor {
    pool: AnyPool,
}

impl AnyExecutor {
    pub async fn connect(url: &str) -> Result<Self> {
        Ok(Self {
            pool: AnyPool::connect(url).await?,
        })
    }

    pub fn from_pool(pool: AnyPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }
}

fn bind_values<'q>(
    mut query: Query<'q, Any, AnyArguments<'q>>,
    args: &'q [Value],
) -> Query<'q, Any, AnyArguments<'q>> {
    for arg in args {
        query = match arg {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(*b),
            Value::I16(i) => query.bind(*i),
            Value::I32(i) => query.bind(*i),
            Value::I64(i) => query.bind(*i),
            Value::F32(f) => query.bind(*f),
            Value::F64(f) => query.bind(*f),
            Value::String(s) => query.bind(s.as_str()),
            Value::Bytes(b) => query.bind(b.as_slice()),
            Value::Json(j) => query.bind(j.to_string()),
            Value::Date(d) => query.bind(d.to_string()),
            Value::Timestamp(t) => query.bind(t.to_string()),
            #[cfg(feature = "uuid-support")]
            Value::Uuid(u) => query.bind(u.to_string()),
            #[cfg(feature = "decimal-support")]
            Value::Decimal(d) => query.bind(d.to_string()),
        };
    }
    query
}

impl SqlExecutor for AnyExecutor {
    async fn query<T: Send + 'static>(
        &self,
        sql: &str,
        args: &[Value],
        mapper: &RowMapper<T>,
    ) -> Result<Vec<T>> {
        debug!(sql, args = args.len(), "executing query");
        let rows: Vec<AnyRow> = bind_values(sqlx::query(sql), args)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(|row| mapper.map_row(row)).collect()
    }

    async fn update(&self, sql: &str, args: &[Value]) -> Result<u64> {
        debug!(sql, args = args.len(), "executing statement");
        let result = bind_values(sqlx::query(sql), args)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn query_isolated<T: Send + 'static>(
        &self,
        preamble: &str,
        sql: &str,
        args: &[Value],
        mapper: &RowMapper<T>,
    ) -> Result<Vec<T>> {
        debug!(preamble, sql, args = args.len(), "executing isolated query");
        let mut tx = self.pool.begin().await?;
        sqlx::query(preamble).execute(&mut *tx).await?;
        let rows: Vec<AnyRow> = bind_values(sqlx::query(sql), args)
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;
        rows.iter().map(|row| mapper.map_row(row)).collect()
    }
}
