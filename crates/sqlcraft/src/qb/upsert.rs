//! UPSERT builder: INSERT with a conflict-resolution clause.

use crate::dialect::Dialect;
use crate::error::{CraftError, CraftResult};
use crate::executor::Executor;
use crate::ident::parse_table;
use crate::qb::traits::{Mutation, SqlStatement};
use crate::value::{IntoValues, Record, Value};

/// Accumulates an INSERT plus the conflict policy that turns it into an
/// upsert: which columns identify the conflict, and which columns the
/// conflicting row is updated from.
#[derive(Clone, Debug)]
pub struct UpsertBuilder {
    dialect: &'static dyn Dialect,
    table: String,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    conflict_columns: Vec<String>,
    /// `Some` once `do_update` was called; the list may be empty (= all columns).
    update_columns: Option<Vec<String>>,
    /// `Some` once `do_update_except` was called.
    update_excluded: Option<Vec<String>>,
    do_nothing: bool,
}

impl UpsertBuilder {
    /// Create a builder upserting into `table`.
    pub fn new(dialect: &'static dyn Dialect, table: &str) -> Self {
        Self {
            dialect,
            table: table.to_string(),
            columns: Vec::new(),
            rows: Vec::new(),
            conflict_columns: Vec::new(),
            update_columns: None,
            update_excluded: None,
            do_nothing: false,
        }
    }

    /// Declare the column list explicitly.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Append one positional value row (tuple or `Vec<Value>`).
    pub fn values(mut self, row: impl IntoValues) -> Self {
        self.rows.push(row.into_values());
        self
    }

    /// Append a row from a record's static column descriptor.
    pub fn values_record<R: Record>(mut self, record: &R) -> Self {
        if self.columns.is_empty() {
            self.columns = R::columns().iter().map(|c| c.to_string()).collect();
        }
        let values = record.values();
        let row = self
            .columns
            .iter()
            .map(|col| {
                R::columns()
                    .iter()
                    .position(|c| c == col)
                    .and_then(|i| values.get(i).cloned())
                    .unwrap_or(Value::Null)
            })
            .collect();
        self.rows.push(row);
        self
    }

    /// Append one row per record.
    pub fn values_records<R: Record>(mut self, records: &[R]) -> Self {
        for record in records {
            self = self.values_record(record);
        }
        self
    }

    /// Append a row from (column, value) pairs.
    pub fn values_map<I, S, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        let pairs: Vec<(String, Value)> = pairs
            .into_iter()
            .map(|(c, v)| (c.into(), v.into()))
            .collect();
        if self.columns.is_empty() {
            self.columns = pairs.iter().map(|(c, _)| c.clone()).collect();
        }
        let row = self
            .columns
            .iter()
            .map(|col| {
                pairs
                    .iter()
                    .find(|(c, _)| c == col)
                    .map(|(_, v)| v.clone())
                    .unwrap_or(Value::Null)
            })
            .collect();
        self.rows.push(row);
        self
    }

    /// Name the columns that determine uniqueness. Rendered only by
    /// dialects that need an explicit conflict target; MySQL-style engines
    /// infer the unique key from the schema.
    pub fn on_conflict<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conflict_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// On conflict, update the named columns from the incoming row.
    /// An empty list means every declared column.
    pub fn do_update<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.update_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// On conflict, update every declared column except the named ones.
    pub fn do_update_except<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.update_excluded = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// On conflict, keep the existing row untouched.
    pub fn do_nothing(mut self) -> Self {
        self.do_nothing = true;
        self
    }

    fn build_upsert(&self) -> (String, Vec<Value>) {
        let mut args = Vec::new();

        let keyword = if self.do_nothing {
            self.dialect.insert_ignore().unwrap_or("INSERT INTO")
        } else {
            "INSERT INTO"
        };
        let mut sql = format!("{keyword} {}", parse_table(self.dialect, &self.table));

        if !self.columns.is_empty() {
            let quoted: Vec<String> = self
                .columns
                .iter()
                .map(|c| self.dialect.quote_ident(c))
                .collect();
            sql.push_str(&format!(" ({})", quoted.join(", ")));
        }

        if !self.rows.is_empty() {
            let row_parts: Vec<String> = self
                .rows
                .iter()
                .map(|row| format!("({})", vec!["?"; row.len()].join(", ")))
                .collect();
            sql.push_str(" VALUES ");
            sql.push_str(&row_parts.join(", "));
            for row in &self.rows {
                args.extend(row.iter().cloned());
            }
        }

        if self.do_nothing {
            if self.dialect.insert_ignore().is_none() {
                if let Some(clause) = self.dialect.insert_do_nothing() {
                    sql.push(' ');
                    sql.push_str(clause);
                }
            }
        } else if self.update_columns.is_some() || self.update_excluded.is_some() {
            let requested = self.update_columns.as_deref().unwrap_or(&[]);
            let excluded = self.update_excluded.as_deref().unwrap_or(&[]);
            let clause = self.dialect.conflict_clause(
                &self.conflict_columns,
                &self.columns,
                requested,
                excluded,
            );
            if !clause.is_empty() {
                sql.push(' ');
                sql.push_str(&clause);
            }
        }

        (sql, args)
    }

    /// Execute, then return the driver-reported auto-generated id.
    ///
    /// Execution failures surface as-is. Note that after an upsert the id
    /// refers to whichever row the engine reports last; MySQL-style engines
    /// cannot distinguish an insert from an update here.
    pub async fn exec_return_id(&self, conn: &impl Executor) -> CraftResult<u64> {
        let result = self.execute(conn).await?;
        result.last_insert_id.ok_or_else(|| {
            CraftError::unsupported("executor reports no generated id; use RETURNING")
        })
    }
}

impl SqlStatement for UpsertBuilder {
    fn dialect(&self) -> &'static dyn Dialect {
        self.dialect
    }

    fn build(&self) -> (String, Vec<Value>) {
        self.build_upsert()
    }
}

impl Mutation for UpsertBuilder {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MYSQL, POSTGRES};

    fn upsert(table: &str) -> UpsertBuilder {
        UpsertBuilder::new(&MYSQL, table)
    }

    struct Account {
        email: String,
        name: String,
        visits: i64,
    }

    impl Record for Account {
        fn columns() -> &'static [&'static str] {
            &["email", "name", "visits"]
        }

        fn values(&self) -> Vec<Value> {
            vec![
                self.email.clone().into(),
                self.name.clone().into(),
                self.visits.into(),
            ]
        }
    }

    #[test]
    fn upsert_update_all_columns() {
        let (sql, args) = upsert("accounts")
            .columns(["email", "name"])
            .values(("a@x.com", "A"))
            .do_update::<[&str; 0], &str>([])
            .to_sql();
        assert_eq!(
            sql,
            "INSERT INTO `accounts` (`email`, `name`) VALUES (?, ?) \
             ON DUPLICATE KEY UPDATE `email` = VALUES(`email`), `name` = VALUES(`name`)"
        );
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn upsert_update_subset() {
        let (sql, _) = upsert("accounts")
            .columns(["email", "name", "visits"])
            .values(("a@x.com", "A", 1))
            .do_update(["name"])
            .to_sql();
        assert!(sql.ends_with("ON DUPLICATE KEY UPDATE `name` = VALUES(`name`)"));
    }

    #[test]
    fn upsert_update_except() {
        let (sql, _) = upsert("accounts")
            .columns(["email", "name", "visits"])
            .values(("a@x.com", "A", 1))
            .do_update_except(["email"])
            .to_sql();
        assert!(sql.ends_with(
            "ON DUPLICATE KEY UPDATE `name` = VALUES(`name`), `visits` = VALUES(`visits`)"
        ));
    }

    #[test]
    fn upsert_without_policy_is_plain_insert() {
        let (sql, _) = upsert("accounts")
            .columns(["email"])
            .values(("a@x.com",))
            .to_sql();
        assert_eq!(sql, "INSERT INTO `accounts` (`email`) VALUES (?)");
    }

    #[test]
    fn upsert_do_nothing_uses_ignore_keyword() {
        let (sql, _) = upsert("accounts")
            .columns(["email"])
            .values(("a@x.com",))
            .do_nothing()
            .to_sql();
        assert_eq!(sql, "INSERT IGNORE INTO `accounts` (`email`) VALUES (?)");
    }

    #[test]
    fn upsert_record() {
        let account = Account {
            email: "a@x.com".into(),
            name: "A".into(),
            visits: 1,
        };
        let (sql, args) = upsert("accounts")
            .values_record(&account)
            .do_update(["name", "visits"])
            .to_sql();
        assert_eq!(
            sql,
            "INSERT INTO `accounts` (`email`, `name`, `visits`) VALUES (?, ?, ?) \
             ON DUPLICATE KEY UPDATE `name` = VALUES(`name`), `visits` = VALUES(`visits`)"
        );
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn upsert_postgres_renders_conflict_target() {
        let (sql, _) = UpsertBuilder::new(&POSTGRES, "accounts")
            .columns(["email", "name"])
            .values(("a@x.com", "A"))
            .on_conflict(["email"])
            .do_update(["name"])
            .to_sql();
        assert_eq!(
            sql,
            "INSERT INTO \"accounts\" (\"email\", \"name\") VALUES ($1, $2) \
             ON CONFLICT (\"email\") DO UPDATE SET \"name\" = EXCLUDED.\"name\""
        );
    }

    #[test]
    fn upsert_multi_row() {
        let (sql, args) = upsert("accounts")
            .columns(["email", "name"])
            .values(("a@x.com", "A"))
            .values(("b@x.com", "B"))
            .do_update::<[&str; 0], &str>([])
            .to_sql();
        assert!(sql.contains("VALUES (?, ?), (?, ?)"));
        assert_eq!(args.len(), 4);
    }
}
