//! Query builders.
//!
//! Builders are detached from any connection: they accumulate clause
//! fragments, render `(sql, args)` on demand, and hand execution to
//! whatever [`Executor`](crate::executor::Executor) the terminal call
//! receives. The free functions below build for the MySQL dialect; use a
//! [`Craft`] facade to target another dialect with the same API.
//!
//! ```ignore
//! use sqlcraft::qb;
//!
//! let users = qb::select(["*"])
//!     .from("users")
//!     .and_eq("status", "active")
//!     .order_by_desc("created_at")
//!     .limit(20)
//!     .fetch_all::<User>(&client)
//!     .await?;
//!
//! qb::insert("users")
//!     .columns(["name", "email"])
//!     .values(("alice", "alice@example.com"))
//!     .execute(&client)
//!     .await?;
//! ```

mod condition;
mod delete;
mod insert;
mod select;
mod traits;
mod update;
mod upsert;

pub use condition::Conditions;
pub use delete::DeleteBuilder;
pub use insert::InsertBuilder;
pub use select::{KeysetPage, Paginated, SelectBuilder, SortDirection};
pub use traits::{Mutation, SqlStatement};
pub use update::UpdateBuilder;
pub use upsert::UpsertBuilder;

use crate::dialect::{Dialect, MYSQL, POSTGRES};
use crate::raw::Raw;
use crate::value::Value;

/// Entry point binding every builder to one dialect.
#[derive(Clone, Copy, Debug)]
pub struct Craft {
    dialect: &'static dyn Dialect,
}

impl Craft {
    /// Build statements for the given dialect.
    pub fn new(dialect: &'static dyn Dialect) -> Self {
        Self { dialect }
    }

    /// Build MySQL-syntax statements.
    pub fn mysql() -> Self {
        Self::new(&MYSQL)
    }

    /// Build PostgreSQL-syntax statements.
    pub fn postgres() -> Self {
        Self::new(&POSTGRES)
    }

    /// The dialect this facade builds for.
    pub fn dialect(&self) -> &'static dyn Dialect {
        self.dialect
    }

    /// Start a SELECT of the given columns.
    pub fn select<I, S>(&self, columns: I) -> SelectBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SelectBuilder::new(self.dialect, columns)
    }

    /// Start an INSERT into `table`.
    pub fn insert(&self, table: &str) -> InsertBuilder {
        InsertBuilder::new(self.dialect, table)
    }

    /// Start an UPDATE of `table`.
    pub fn update(&self, table: &str) -> UpdateBuilder {
        UpdateBuilder::new(self.dialect, table)
    }

    /// Start a DELETE from `table`.
    pub fn delete(&self, table: &str) -> DeleteBuilder {
        DeleteBuilder::new(self.dialect, table)
    }

    /// Start an UPSERT into `table`.
    pub fn upsert(&self, table: &str) -> UpsertBuilder {
        UpsertBuilder::new(self.dialect, table)
    }

    /// Wrap a raw SQL statement with `?` placeholders.
    pub fn raw(&self, sql: &str, args: Vec<Value>) -> Raw {
        Raw::new(self.dialect, sql, args)
    }
}

/// Start a MySQL-dialect SELECT of the given columns.
pub fn select<I, S>(columns: I) -> SelectBuilder
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    SelectBuilder::new(&MYSQL, columns)
}

/// Start a MySQL-dialect INSERT into `table`.
pub fn insert(table: &str) -> InsertBuilder {
    InsertBuilder::new(&MYSQL, table)
}

/// Start a MySQL-dialect UPDATE of `table`.
pub fn update(table: &str) -> UpdateBuilder {
    UpdateBuilder::new(&MYSQL, table)
}

/// Start a MySQL-dialect DELETE from `table`.
pub fn delete(table: &str) -> DeleteBuilder {
    DeleteBuilder::new(&MYSQL, table)
}

/// Start a MySQL-dialect UPSERT into `table`.
pub fn upsert(table: &str) -> UpsertBuilder {
    UpsertBuilder::new(&MYSQL, table)
}
