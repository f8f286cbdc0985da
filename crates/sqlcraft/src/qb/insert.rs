//! INSERT query builder.

use crate::dialect::Dialect;
use crate::error::{CraftError, CraftResult};
use crate::executor::Executor;
use crate::ident::parse_table;
use crate::qb::select::SelectBuilder;
use crate::qb::traits::{Mutation, SqlStatement};
use crate::value::{IntoValues, Record, Value};

/// Conflict handling for an INSERT.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ConflictMode {
    /// Fail on conflict (default).
    Fail,
    /// Skip conflicting rows (dialect ignore keyword or do-nothing clause).
    Ignore,
    /// Delete-then-insert on conflict (dialect replace keyword).
    Replace,
    /// Overwrite the conflicting row with the incoming values.
    Update,
}

/// Accumulates one INSERT statement: declared columns, value rows (or an
/// embedded sub-select), and the conflict mode.
#[derive(Clone, Debug)]
pub struct InsertBuilder {
    dialect: &'static dyn Dialect,
    table: String,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    conflict: ConflictMode,
    from_select: Option<SelectBuilder>,
    returning: Vec<String>,
}

impl InsertBuilder {
    /// Create a builder inserting into `table`.
    pub fn new(dialect: &'static dyn Dialect, table: &str) -> Self {
        Self {
            dialect,
            table: table.to_string(),
            columns: Vec::new(),
            rows: Vec::new(),
            conflict: ConflictMode::Fail,
            from_select: None,
            returning: Vec::new(),
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

    /// Append a row from (column, value) pairs.
    ///
    /// With no columns declared yet, the pair keys become the column list;
    /// otherwise values are aligned to the declared columns, with NULL for
    /// any column the pairs do not mention.
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
            self.rows.push(pairs.into_iter().map(|(_, v)| v).collect());
        } else {
            self.rows.push(align_row(&self.columns, pairs));
        }
        self
    }

    /// Append a row from a record's static column descriptor.
    ///
    /// With no columns declared, the record's columns become the column
    /// list; otherwise record fields are matched to the declared columns in
    /// declared order, with NULL for columns the record does not carry.
    pub fn values_record<R: Record>(mut self, record: &R) -> Self {
        if self.columns.is_empty() {
            self.columns = R::columns().iter().map(|c| c.to_string()).collect();
        }
        let pairs: Vec<(String, Value)> = R::columns()
            .iter()
            .map(|c| c.to_string())
            .zip(record.values())
            .collect();
        self.rows.push(align_row(&self.columns, pairs));
        self
    }

    /// Append one row per record.
    pub fn values_records<R: Record>(mut self, records: &[R]) -> Self {
        for record in records {
            self = self.values_record(record);
        }
        self
    }

    /// Replace the VALUES clause with an embedded sub-select
    /// (`INSERT … SELECT`).
    pub fn from_select(mut self, select: SelectBuilder) -> Self {
        self.from_select = Some(select);
        self
    }

    /// Skip conflicting rows instead of failing.
    pub fn ignore(mut self) -> Self {
        self.conflict = ConflictMode::Ignore;
        self
    }

    /// Delete-then-insert on conflict, for dialects with a replace keyword.
    pub fn replace(mut self) -> Self {
        self.conflict = ConflictMode::Replace;
        self
    }

    /// On conflict, overwrite the existing row with the incoming values of
    /// every declared column.
    pub fn on_conflict_do_update(mut self) -> Self {
        self.conflict = ConflictMode::Update;
        self
    }

    /// Add a RETURNING clause (for dialects/backends that support one).
    pub fn returning<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.returning = columns.into_iter().map(Into::into).collect();
        self
    }

    fn build_insert(&self) -> (String, Vec<Value>) {
        let mut args = Vec::new();

        let keyword = match self.conflict {
            ConflictMode::Ignore => self.dialect.insert_ignore().unwrap_or("INSERT INTO"),
            ConflictMode::Replace => self.dialect.insert_replace().unwrap_or("INSERT INTO"),
            _ => "INSERT INTO",
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

        if let Some(ref select) = self.from_select {
            let (select_sql, select_args) = select.build();
            sql.push(' ');
            sql.push_str(&select_sql);
            args.extend(select_args);
        } else if !self.rows.is_empty() {
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

        match self.conflict {
            ConflictMode::Update => {
                let clause =
                    self.dialect
                        .conflict_clause(&[], &self.columns, &self.columns, &[]);
                if !clause.is_empty() {
                    sql.push(' ');
                    sql.push_str(&clause);
                }
            }
            ConflictMode::Ignore => {
                // Engines without an ignore keyword express this as a suffix.
                if self.dialect.insert_ignore().is_none() {
                    if let Some(clause) = self.dialect.insert_do_nothing() {
                        sql.push(' ');
                        sql.push_str(clause);
                    }
                }
            }
            ConflictMode::Replace | ConflictMode::Fail => {}
        }

        if !self.returning.is_empty() {
            sql.push_str(" RETURNING ");
            sql.push_str(&self.returning.join(", "));
        }

        (sql, args)
    }

    /// Execute, then return the driver-reported auto-generated id.
    ///
    /// Execution failures surface as-is. Backends that do not report a
    /// generated id (PostgreSQL) yield an unsupported-shape error — use a
    /// RETURNING clause with [`Mutation::query_one`] there instead.
    pub async fn exec_return_id(&self, conn: &impl Executor) -> CraftResult<u64> {
        let result = self.execute(conn).await?;
        result.last_insert_id.ok_or_else(|| {
            CraftError::unsupported("executor reports no generated id; use RETURNING")
        })
    }
}

impl SqlStatement for InsertBuilder {
    fn dialect(&self) -> &'static dyn Dialect {
        self.dialect
    }

    fn build(&self) -> (String, Vec<Value>) {
        self.build_insert()
    }
}

impl Mutation for InsertBuilder {}

/// Align (column, value) pairs to a declared column list, substituting
/// NULL for absent columns.
fn align_row(columns: &[String], mut pairs: Vec<(String, Value)>) -> Vec<Value> {
    columns
        .iter()
        .map(|col| {
            pairs
                .iter()
                .position(|(c, _)| c == col)
                .map(|i| pairs.swap_remove(i).1)
                .unwrap_or(Value::Null)
        })
        .collect()
}
