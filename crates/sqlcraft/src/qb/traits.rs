//! Shared traits for statement builders.

use crate::dialect::Dialect;
use crate::error::CraftResult;
use crate::executor::{ExecResult, Executor};
use crate::row::{FromRow, Row};
use crate::value::{Value, inline_args};

/// A builder that can render itself into a `(sql, args)` pair.
pub trait SqlStatement {
    /// The dialect this statement renders for.
    fn dialect(&self) -> &'static dyn Dialect;

    /// Render with canonical `?` placeholders.
    ///
    /// Rendering is idempotent and never mutates the builder.
    fn build(&self) -> (String, Vec<Value>);

    /// Render the executable statement: placeholders rebound through the
    /// dialect, arguments in placeholder order.
    fn to_sql(&self) -> (String, Vec<Value>) {
        let (sql, args) = self.build();
        (self.dialect().rebind(&sql), args)
    }

    /// Render with arguments inlined as literals, for logs and debugging.
    fn debug_sql(&self) -> String {
        let (sql, args) = self.build();
        inline_args(&sql, &args)
    }
}

/// A statement that mutates data (INSERT/UPDATE/DELETE/UPSERT).
pub trait Mutation: SqlStatement + Sync {
    /// Execute and return the affected-row outcome.
    fn execute(
        &self,
        conn: &impl Executor,
    ) -> impl std::future::Future<Output = CraftResult<ExecResult>> + Send
    where
        Self: Sized,
    {
        async move {
            let (sql, args) = self.to_sql();
            conn.execute(&sql, &args).await
        }
    }

    /// Execute and return all rows (for statements with a RETURNING clause).
    fn query(
        &self,
        conn: &impl Executor,
    ) -> impl std::future::Future<Output = CraftResult<Vec<Row>>> + Send
    where
        Self: Sized,
    {
        async move {
            let (sql, args) = self.to_sql();
            conn.query(&sql, &args).await
        }
    }

    /// Execute and return exactly one row (for statements with a RETURNING
    /// clause); an empty result set is a not-found error.
    fn query_one(
        &self,
        conn: &impl Executor,
    ) -> impl std::future::Future<Output = CraftResult<Row>> + Send
    where
        Self: Sized,
    {
        async move {
            let (sql, args) = self.to_sql();
            conn.query_one(&sql, &args).await
        }
    }

    /// Execute and decode one returned row into `T`.
    fn fetch_one<T: FromRow>(
        &self,
        conn: &impl Executor,
    ) -> impl std::future::Future<Output = CraftResult<T>> + Send
    where
        Self: Sized,
    {
        async move {
            let row = self.query_one(conn).await?;
            T::from_row(&row)
        }
    }
}
