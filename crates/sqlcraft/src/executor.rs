//! Executor boundary: anything that can run parameterized SQL and decode rows.
//!
//! Builders render `(sql, args)` pairs and hand them to an [`Executor`];
//! the same builder works against a direct connection, a transaction, or a
//! pooled client, because all of them implement this one trait. The crate
//! ships implementations for `tokio-postgres` (and `deadpool-postgres`
//! behind the `pool` feature); other backends only need to implement the
//! four methods below.
//!
//! All methods are async and cancellation-safe in the usual Rust sense:
//! dropping the returned future abandons the call.

use tokio_postgres::types::ToSql;

use crate::error::{CraftError, CraftResult};
use crate::row::Row;
use crate::value::Value;

/// Outcome of a statement that returns no rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecResult {
    /// Number of rows the statement affected.
    pub rows_affected: u64,
    /// Auto-generated identifier reported by the driver, when the backend
    /// exposes one (MySQL-style drivers do; PostgreSQL does not — use a
    /// RETURNING clause there instead).
    pub last_insert_id: Option<u64>,
}

/// A thing that can run parameterized SQL and decode rows.
pub trait Executor: Send + Sync {
    /// Execute a query and return all rows.
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = CraftResult<Vec<Row>>> + Send;

    /// Execute a query and return the first row, if any.
    fn query_opt(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = CraftResult<Option<Row>>> + Send {
        async move {
            let rows = self.query(sql, params).await?;
            Ok(rows.into_iter().next())
        }
    }

    /// Execute a query and return the first row.
    ///
    /// Returns [`CraftError::NotFound`] when the result set is empty, so
    /// callers can branch on existence versus failure.
    fn query_one(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = CraftResult<Row>> + Send {
        async move {
            let rows = self.query(sql, params).await?;
            rows.into_iter()
                .next()
                .ok_or_else(|| CraftError::not_found("Expected one row, got none"))
        }
    }

    /// Execute a statement and return the affected-row outcome.
    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = CraftResult<ExecResult>> + Send;
}

fn param_refs(params: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
}

impl Executor for tokio_postgres::Client {
    async fn query(&self, sql: &str, params: &[Value]) -> CraftResult<Vec<Row>> {
        let refs = param_refs(params);
        let rows = tokio_postgres::Client::query(self, sql, &refs).await?;
        rows.iter().map(Row::from_pg).collect()
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> CraftResult<ExecResult> {
        let refs = param_refs(params);
        let rows_affected = tokio_postgres::Client::execute(self, sql, &refs).await?;
        Ok(ExecResult {
            rows_affected,
            last_insert_id: None,
        })
    }
}

impl Executor for tokio_postgres::Transaction<'_> {
    async fn query(&self, sql: &str, params: &[Value]) -> CraftResult<Vec<Row>> {
        let refs = param_refs(params);
        let rows = tokio_postgres::Transaction::query(self, sql, &refs).await?;
        rows.iter().map(Row::from_pg).collect()
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> CraftResult<ExecResult> {
        let refs = param_refs(params);
        let rows_affected = tokio_postgres::Transaction::execute(self, sql, &refs).await?;
        Ok(ExecResult {
            rows_affected,
            last_insert_id: None,
        })
    }
}

impl<C: Executor> Executor for &C {
    async fn query(&self, sql: &str, params: &[Value]) -> CraftResult<Vec<Row>> {
        (*self).query(sql, params).await
    }

    async fn query_opt(&self, sql: &str, params: &[Value]) -> CraftResult<Option<Row>> {
        (*self).query_opt(sql, params).await
    }

    async fn query_one(&self, sql: &str, params: &[Value]) -> CraftResult<Row> {
        (*self).query_one(sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> CraftResult<ExecResult> {
        (*self).execute(sql, params).await
    }
}

// ===== deadpool-postgres support =====

#[cfg(feature = "pool")]
impl Executor for deadpool_postgres::ClientWrapper {
    async fn query(&self, sql: &str, params: &[Value]) -> CraftResult<Vec<Row>> {
        Executor::query(&**self, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> CraftResult<ExecResult> {
        Executor::execute(&**self, sql, params).await
    }
}

#[cfg(feature = "pool")]
impl Executor for deadpool_postgres::Client {
    async fn query(&self, sql: &str, params: &[Value]) -> CraftResult<Vec<Row>> {
        Executor::query(&**self, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> CraftResult<ExecResult> {
        Executor::execute(&**self, sql, params).await
    }
}

#[cfg(feature = "pool")]
impl Executor for deadpool_postgres::Transaction<'_> {
    async fn query(&self, sql: &str, params: &[Value]) -> CraftResult<Vec<Row>> {
        Executor::query(&**self, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> CraftResult<ExecResult> {
        Executor::execute(&**self, sql, params).await
    }
}
