//! Dialect abstraction mapping abstract SQL fragments to engine syntax.
//!
//! A [`Dialect`] is a stateless strategy object: every method is a pure
//! function of its inputs, so a single static instance can be shared by any
//! number of builders concurrently. Builders render clause text with the
//! canonical `?` placeholder and call [`Dialect::rebind`] exactly once over
//! the finished statement, which keeps placeholder numbering a whole-statement
//! concern instead of a per-fragment one.

use std::fmt;

/// Strategy object translating abstract SQL operations into one database
/// engine's concrete syntax.
pub trait Dialect: Send + Sync + fmt::Debug {
    /// Quote a single identifier segment, doubling embedded quote characters.
    fn quote_ident(&self, name: &str) -> String;

    /// Render the `n`-th (1-based) placeholder token.
    fn placeholder(&self, n: usize) -> String;

    /// Rewrite canonical `?` placeholders into this dialect's tokens,
    /// numbered left to right.
    fn rebind(&self, sql: &str) -> String {
        let mut out = String::with_capacity(sql.len());
        let mut n = 0usize;
        for ch in sql.chars() {
            if ch == '?' {
                n += 1;
                out.push_str(&self.placeholder(n));
            } else {
                out.push(ch);
            }
        }
        out
    }

    /// Render a LIMIT clause.
    fn limit(&self, limit: i64) -> String {
        format!("LIMIT {limit}")
    }

    /// Render an OFFSET clause.
    fn offset(&self, offset: i64) -> String {
        format!("OFFSET {offset}")
    }

    /// Render one ORDER BY expression (without the `ORDER BY` keyword).
    fn order_by(&self, column: &str, desc: bool) -> String {
        let quoted = self.quote_path(column);
        if desc {
            format!("{quoted} DESC")
        } else {
            quoted
        }
    }

    /// Quote a possibly dotted path (`a.b` becomes two quoted segments).
    fn quote_path(&self, path: &str) -> String {
        path.split('.')
            .map(|seg| self.quote_ident(seg))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Replacement for the `INSERT INTO` keyword that skips conflicting rows,
    /// for engines that spell "ignore" as a keyword.
    fn insert_ignore(&self) -> Option<&'static str> {
        None
    }

    /// Trailing do-nothing conflict clause, for engines that spell "ignore"
    /// as a suffix.
    fn insert_do_nothing(&self) -> Option<&'static str> {
        None
    }

    /// Replacement for the `INSERT INTO` keyword that deletes-then-inserts
    /// on conflict, for engines that support it.
    fn insert_replace(&self) -> Option<&'static str> {
        None
    }

    /// Render the conflict-resolution clause of an upsert.
    ///
    /// `conflict` names the unique columns (rendered only by engines that
    /// need an explicit conflict target). The assigned column set is:
    /// all of `updatable` when neither selector was given, otherwise
    /// `(updatable ∩ requested) ∪ (updatable \ excluded)` where each half
    /// applies only when its list is non-empty.
    fn conflict_clause(
        &self,
        conflict: &[String],
        updatable: &[String],
        requested: &[String],
        excluded: &[String],
    ) -> String;
}

/// Select the columns an upsert conflict clause assigns.
pub(crate) fn conflict_update_columns<'a>(
    updatable: &'a [String],
    requested: &[String],
    excluded: &[String],
) -> Vec<&'a String> {
    let has_requested = !requested.is_empty();
    let has_excluded = !excluded.is_empty();
    updatable
        .iter()
        .filter(|col| {
            if !has_requested && !has_excluded {
                return true;
            }
            (has_requested && requested.contains(col))
                || (has_excluded && !excluded.contains(col))
        })
        .collect()
}

/// MySQL syntax: backtick quoting, `?` placeholders,
/// `INSERT IGNORE` / `ON DUPLICATE KEY UPDATE`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

/// Shared static instance of [`MySqlDialect`].
pub static MYSQL: MySqlDialect = MySqlDialect;

impl Dialect for MySqlDialect {
    fn quote_ident(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn placeholder(&self, _n: usize) -> String {
        "?".to_string()
    }

    fn rebind(&self, sql: &str) -> String {
        // MySQL binds by position with the same token; nothing to rewrite.
        sql.to_string()
    }

    fn insert_ignore(&self) -> Option<&'static str> {
        Some("INSERT IGNORE INTO")
    }

    fn insert_replace(&self) -> Option<&'static str> {
        Some("REPLACE INTO")
    }

    fn conflict_clause(
        &self,
        _conflict: &[String],
        updatable: &[String],
        requested: &[String],
        excluded: &[String],
    ) -> String {
        // MySQL infers the unique key from the schema; the conflict target
        // columns are accepted for API parity but not rendered.
        let assignments: Vec<String> = conflict_update_columns(updatable, requested, excluded)
            .into_iter()
            .map(|col| {
                let q = self.quote_ident(col);
                format!("{q} = VALUES({q})")
            })
            .collect();
        if assignments.is_empty() {
            return String::new();
        }
        format!("ON DUPLICATE KEY UPDATE {}", assignments.join(", "))
    }
}

/// PostgreSQL syntax: double-quote quoting, `$n` placeholders,
/// `ON CONFLICT … DO UPDATE / DO NOTHING`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

/// Shared static instance of [`PostgresDialect`].
pub static POSTGRES: PostgresDialect = PostgresDialect;

impl Dialect for PostgresDialect {
    fn quote_ident(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn placeholder(&self, n: usize) -> String {
        format!("${n}")
    }

    fn insert_do_nothing(&self) -> Option<&'static str> {
        Some("ON CONFLICT DO NOTHING")
    }

    fn conflict_clause(
        &self,
        conflict: &[String],
        updatable: &[String],
        requested: &[String],
        excluded: &[String],
    ) -> String {
        let assignments: Vec<String> = conflict_update_columns(updatable, requested, excluded)
            .into_iter()
            .map(|col| {
                let q = self.quote_ident(col);
                format!("{q} = EXCLUDED.{q}")
            })
            .collect();
        if assignments.is_empty() {
            return String::new();
        }
        let target = if conflict.is_empty() {
            String::new()
        } else {
            let cols: Vec<String> = conflict.iter().map(|c| self.quote_ident(c)).collect();
            format!("({}) ", cols.join(", "))
        };
        format!("ON CONFLICT {target}DO UPDATE SET {}", assignments.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn mysql_quotes_backticks() {
        assert_eq!(MYSQL.quote_ident("users"), "`users`");
        assert_eq!(MYSQL.quote_ident("a`b"), "`a``b`");
    }

    #[test]
    fn postgres_quotes_double() {
        assert_eq!(POSTGRES.quote_ident("users"), "\"users\"");
        assert_eq!(POSTGRES.quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn mysql_rebind_is_identity() {
        let sql = "SELECT * FROM `t` WHERE `a` = ? AND `b` = ?";
        assert_eq!(MYSQL.rebind(sql), sql);
    }

    #[test]
    fn postgres_rebind_numbers_placeholders() {
        let sql = "SELECT * FROM \"t\" WHERE \"a\" = ? AND \"b\" IN (?, ?)";
        assert_eq!(
            POSTGRES.rebind(sql),
            "SELECT * FROM \"t\" WHERE \"a\" = $1 AND \"b\" IN ($2, $3)"
        );
    }

    #[test]
    fn quote_path_splits_segments() {
        assert_eq!(MYSQL.quote_path("u.id"), "`u`.`id`");
        assert_eq!(MYSQL.quote_path("id"), "`id`");
    }

    #[test]
    fn order_by_desc() {
        assert_eq!(MYSQL.order_by("name", true), "`name` DESC");
        assert_eq!(MYSQL.order_by("name", false), "`name`");
    }

    #[test]
    fn mysql_conflict_clause_all_columns() {
        let clause = MYSQL.conflict_clause(&[], &strings(&["name", "email"]), &[], &[]);
        assert_eq!(
            clause,
            "ON DUPLICATE KEY UPDATE `name` = VALUES(`name`), `email` = VALUES(`email`)"
        );
    }

    #[test]
    fn mysql_conflict_clause_requested_subset() {
        let clause = MYSQL.conflict_clause(
            &[],
            &strings(&["id", "name", "email"]),
            &strings(&["email"]),
            &[],
        );
        assert_eq!(clause, "ON DUPLICATE KEY UPDATE `email` = VALUES(`email`)");
    }

    #[test]
    fn mysql_conflict_clause_excluded() {
        let clause = MYSQL.conflict_clause(
            &[],
            &strings(&["id", "name", "email"]),
            &[],
            &strings(&["id"]),
        );
        assert_eq!(
            clause,
            "ON DUPLICATE KEY UPDATE `name` = VALUES(`name`), `email` = VALUES(`email`)"
        );
    }

    #[test]
    fn mysql_conflict_clause_requested_not_updatable() {
        // A requested column outside the insert column list is never assigned.
        let clause = MYSQL.conflict_clause(
            &[],
            &strings(&["id", "name"]),
            &strings(&["email"]),
            &[],
        );
        assert_eq!(clause, "");
    }

    #[test]
    fn postgres_conflict_clause_renders_target() {
        let clause = POSTGRES.conflict_clause(
            &strings(&["email"]),
            &strings(&["name", "email"]),
            &strings(&["name"]),
            &[],
        );
        assert_eq!(
            clause,
            "ON CONFLICT (\"email\") DO UPDATE SET \"name\" = EXCLUDED.\"name\""
        );
    }
}
