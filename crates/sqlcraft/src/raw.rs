//! Raw SQL escape hatch.
//!
//! For statements the builders cannot express. The SQL is taken verbatim
//! (canonical `?` placeholders) and only rebound through the dialect; the
//! caller owns placeholder/argument correctness.

use crate::dialect::Dialect;
use crate::error::CraftResult;
use crate::executor::{ExecResult, Executor};
use crate::row::{FromRow, Row};
use crate::value::{Value, inline_args};

/// A raw SQL statement plus its positional arguments.
#[derive(Clone, Debug)]
pub struct Raw {
    dialect: &'static dyn Dialect,
    sql: String,
    args: Vec<Value>,
}

impl Raw {
    /// Wrap a statement with `?` placeholders for the given dialect.
    pub fn new(dialect: &'static dyn Dialect, sql: &str, args: Vec<Value>) -> Self {
        Self {
            dialect,
            sql: sql.to_string(),
            args,
        }
    }

    /// The executable statement: placeholders rebound, arguments in order.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        (self.dialect.rebind(&self.sql), self.args.clone())
    }

    /// Render with arguments inlined as literals, for logs and debugging.
    pub fn debug_sql(&self) -> String {
        inline_args(&self.sql, &self.args)
    }

    /// Execute and return the affected-row outcome.
    pub async fn execute(&self, conn: &impl Executor) -> CraftResult<ExecResult> {
        let (sql, args) = self.to_sql();
        conn.execute(&sql, &args).await
    }

    /// Execute and return all rows.
    pub async fn query(&self, conn: &impl Executor) -> CraftResult<Vec<Row>> {
        let (sql, args) = self.to_sql();
        conn.query(&sql, &args).await
    }

    /// Execute and return the first row, if any.
    pub async fn query_opt(&self, conn: &impl Executor) -> CraftResult<Option<Row>> {
        let (sql, args) = self.to_sql();
        conn.query_opt(&sql, &args).await
    }

    /// Execute and return the first row; empty result is a not-found error.
    pub async fn query_one(&self, conn: &impl Executor) -> CraftResult<Row> {
        let (sql, args) = self.to_sql();
        conn.query_one(&sql, &args).await
    }

    /// Execute and decode all rows into `T`.
    pub async fn fetch_all<T: FromRow>(&self, conn: &impl Executor) -> CraftResult<Vec<T>> {
        let rows = self.query(conn).await?;
        rows.iter().map(T::from_row).collect()
    }

    /// Execute and decode exactly one row into `T`.
    pub async fn fetch_one<T: FromRow>(&self, conn: &impl Executor) -> CraftResult<T> {
        let row = self.query_one(conn).await?;
        T::from_row(&row)
    }

    /// Execute and return one generic mapping (text-coerced).
    pub async fn row(&self, conn: &impl Executor) -> CraftResult<Row> {
        Ok(self.query_one(conn).await?.coerce_text())
    }

    /// Execute and return all rows as generic mappings (text-coerced).
    pub async fn rows(&self, conn: &impl Executor) -> CraftResult<Vec<Row>> {
        let rows = self.query(conn).await?;
        Ok(rows.into_iter().map(Row::coerce_text).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MYSQL, POSTGRES};

    #[test]
    fn raw_passes_sql_through() {
        let raw = Raw::new(&MYSQL, "SELECT 1 FROM dual WHERE a = ?", vec![1.into()]);
        let (sql, args) = raw.to_sql();
        assert_eq!(sql, "SELECT 1 FROM dual WHERE a = ?");
        assert_eq!(args, vec![Value::Int(1)]);
    }

    #[test]
    fn raw_rebinds_for_postgres() {
        let raw = Raw::new(
            &POSTGRES,
            "SELECT * FROM t WHERE a = ? AND b = ?",
            vec![1.into(), 2.into()],
        );
        let (sql, _) = raw.to_sql();
        assert_eq!(sql, "SELECT * FROM t WHERE a = $1 AND b = $2");
    }

    #[test]
    fn raw_debug_inlines() {
        let raw = Raw::new(&MYSQL, "SELECT * FROM t WHERE a = ?", vec!["x".into()]);
        assert_eq!(raw.debug_sql(), "SELECT * FROM t WHERE a = 'x'");
    }
}
