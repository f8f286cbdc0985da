//! Query logging.
//!
//! A [`QueryLogger`] is a purely observational callback invoked after every
//! terminal execution with the rendered SQL, its arguments, the elapsed
//! time, and the error if one occurred. [`LoggedExecutor`] wraps any
//! [`Executor`] and feeds the logger; it never alters results or control
//! flow.

use std::time::{Duration, Instant};

use crate::error::{CraftError, CraftResult};
use crate::executor::{ExecResult, Executor};
use crate::row::Row;
use crate::value::Value;

/// Observational callback for executed statements.
pub trait QueryLogger: Send + Sync {
    fn log_query(
        &self,
        sql: &str,
        args: &[Value],
        elapsed: Duration,
        error: Option<&CraftError>,
    );
}

impl<L: QueryLogger> QueryLogger for &L {
    fn log_query(
        &self,
        sql: &str,
        args: &[Value],
        elapsed: Duration,
        error: Option<&CraftError>,
    ) {
        (*self).log_query(sql, args, elapsed, error);
    }
}

impl<L: QueryLogger> QueryLogger for std::sync::Arc<L> {
    fn log_query(
        &self,
        sql: &str,
        args: &[Value],
        elapsed: Duration,
        error: Option<&CraftError>,
    ) {
        (**self).log_query(sql, args, elapsed, error);
    }
}

/// Executor wrapper that times every call and reports it to a logger.
#[derive(Clone, Debug)]
pub struct LoggedExecutor<C, L> {
    inner: C,
    logger: L,
}

impl<C: Executor, L: QueryLogger> LoggedExecutor<C, L> {
    /// Wrap `inner`, reporting every call to `logger`.
    pub fn new(inner: C, logger: L) -> Self {
        Self { inner, logger }
    }

    /// The wrapped executor.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Unwrap back into the inner executor.
    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: Executor, L: QueryLogger> Executor for LoggedExecutor<C, L> {
    async fn query(&self, sql: &str, params: &[Value]) -> CraftResult<Vec<Row>> {
        let start = Instant::now();
        let result = self.inner.query(sql, params).await;
        self.logger
            .log_query(sql, params, start.elapsed(), result.as_ref().err());
        result
    }

    async fn query_opt(&self, sql: &str, params: &[Value]) -> CraftResult<Option<Row>> {
        let start = Instant::now();
        let result = self.inner.query_opt(sql, params).await;
        self.logger
            .log_query(sql, params, start.elapsed(), result.as_ref().err());
        result
    }

    async fn query_one(&self, sql: &str, params: &[Value]) -> CraftResult<Row> {
        let start = Instant::now();
        let result = self.inner.query_one(sql, params).await;
        self.logger
            .log_query(sql, params, start.elapsed(), result.as_ref().err());
        result
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> CraftResult<ExecResult> {
        let start = Instant::now();
        let result = self.inner.execute(sql, params).await;
        self.logger
            .log_query(sql, params, start.elapsed(), result.as_ref().err());
        result
    }
}

/// A `tracing`-based logger emitting one event per executed statement.
///
/// Enable via the crate feature: `sqlcraft = { features = ["tracing"] }`.
#[cfg(feature = "tracing")]
#[derive(Debug, Clone)]
pub struct TracingLogger {
    /// Tracing event level to emit at.
    pub level: tracing::Level,
    /// Truncate long SQL strings (in chars). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

#[cfg(feature = "tracing")]
impl Default for TracingLogger {
    fn default() -> Self {
        Self {
            level: tracing::Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

#[cfg(feature = "tracing")]
impl TracingLogger {
    /// Create a logger with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the tracing event level.
    pub fn level(mut self, level: tracing::Level) -> Self {
        self.level = level;
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    fn truncate_sql<'a>(&self, sql: &'a str) -> std::borrow::Cow<'a, str> {
        match self.max_sql_length {
            Some(max) if sql.chars().count() > max => {
                let cut: String = sql.chars().take(max).collect();
                std::borrow::Cow::Owned(format!("{cut}..."))
            }
            _ => std::borrow::Cow::Borrowed(sql),
        }
    }
}

#[cfg(feature = "tracing")]
impl QueryLogger for TracingLogger {
    fn log_query(
        &self,
        sql: &str,
        args: &[Value],
        elapsed: Duration,
        error: Option<&CraftError>,
    ) {
        /// Dispatch a tracing event at a runtime-determined level.
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    tracing::Level::ERROR => tracing::error!($($field)*),
                    tracing::Level::WARN  => tracing::warn!($($field)*),
                    tracing::Level::INFO  => tracing::info!($($field)*),
                    tracing::Level::DEBUG => tracing::debug!($($field)*),
                    tracing::Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let sql = self.truncate_sql(sql);
        match error {
            Some(err) => emit_at_level!(
                self.level,
                target: "sqlcraft.sql",
                sql = %sql,
                param_count = args.len(),
                elapsed_ms = elapsed.as_millis() as u64,
                error = %err,
            ),
            None => emit_at_level!(
                self.level,
                target: "sqlcraft.sql",
                sql = %sql,
                param_count = args.len(),
                elapsed_ms = elapsed.as_millis() as u64,
            ),
        }
    }
}
