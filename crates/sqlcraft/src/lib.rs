//! # sqlcraft
//!
//! A fluent, dialect-aware SQL query builder with pluggable executors.
//!
//! ## Features
//!
//! - **Fluent builders**: SELECT / INSERT / UPDATE / DELETE / UPSERT, each a
//!   chainable accumulator that renders `(sql, args)` on demand
//! - **Dialect strategy**: one [`Dialect`] trait covers quoting,
//!   placeholders, limit/offset, and conflict clauses; MySQL and PostgreSQL
//!   ship in the box
//! - **Executor boundary**: builders execute against anything implementing
//!   [`Executor`] — a connection, a transaction, or a pooled client
//! - **Typed values**: arguments are a closed [`Value`] sum type, so
//!   argument lists stay cloneable and exhaustively checked
//! - **Pagination**: offset pagination with display bounds, plus keyset
//!   (cursor) pagination over a monotonic column
//! - **Query logging**: wrap any executor in a [`LoggedExecutor`] to observe
//!   SQL, arguments, timing, and errors
//!
//! ## Quick start
//!
//! ```ignore
//! use sqlcraft::qb;
//!
//! // SELECT with composed predicates
//! let page = qb::select(["*"])
//!     .from("users")
//!     .and_eq("status", "active")
//!     .and_group(|g| g.and_where("age", ">=", 18).or_is_null("age"))
//!     .order_by("id")
//!     .paginate(&client, 2, 10)
//!     .await?;
//!
//! // INSERT … ON DUPLICATE KEY UPDATE
//! qb::insert("users")
//!     .columns(["email", "name"])
//!     .values(("a@x.com", "Alice"))
//!     .on_conflict_do_update()
//!     .execute(&client)
//!     .await?;
//! ```

pub mod dialect;
pub mod error;
pub mod executor;
mod ident;
pub mod logger;
pub mod qb;
pub mod raw;
pub mod row;
pub mod value;

pub use dialect::{Dialect, MYSQL, MySqlDialect, POSTGRES, PostgresDialect};
pub use error::{CraftError, CraftResult};
pub use executor::{ExecResult, Executor};
pub use logger::{LoggedExecutor, QueryLogger};
pub use qb::{
    Conditions, Craft, DeleteBuilder, InsertBuilder, KeysetPage, Mutation, Paginated,
    SelectBuilder, SortDirection, SqlStatement, UpdateBuilder, UpsertBuilder, delete, insert,
    select, update, upsert,
};
pub use raw::Raw;
pub use row::{FromRow, FromValue, Row};
pub use value::{IntoValues, Record, Value};

#[cfg(feature = "tracing")]
pub use logger::TracingLogger;
