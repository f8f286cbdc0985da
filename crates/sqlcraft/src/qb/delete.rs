//! DELETE query builder.

use crate::dialect::Dialect;
use crate::ident::{parse_table, quote_join_condition};
use crate::qb::condition::Conditions;
use crate::qb::traits::{Mutation, SqlStatement};
use crate::value::Value;

/// Accumulates one DELETE statement: joins, the shared WHERE assembler,
/// ordering, and an optional LIMIT.
#[derive(Clone, Debug)]
pub struct DeleteBuilder {
    dialect: &'static dyn Dialect,
    table: String,
    joins: Vec<String>,
    wheres: Conditions,
    orders: Vec<String>,
    limit: Option<i64>,
    returning: Vec<String>,
}

impl DeleteBuilder {
    /// Create a builder deleting from `table`.
    pub fn new(dialect: &'static dyn Dialect, table: &str) -> Self {
        Self {
            dialect,
            table: table.to_string(),
            joins: Vec::new(),
            wheres: Conditions::new(dialect),
            orders: Vec::new(),
            limit: None,
            returning: Vec::new(),
        }
    }

    /// Add `column op value`; the operator string is trusted verbatim.
    pub fn and_where(mut self, column: &str, op: &str, value: impl Into<Value>) -> Self {
        self.wheres.add_cmp(column, op, value.into(), false);
        self
    }

    /// Add `column = value`.
    pub fn and_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.wheres.add_cmp(column, "=", value.into(), false);
        self
    }

    /// Add `column IN (values…)`.
    pub fn and_in(mut self, column: &str, values: Vec<Value>) -> Self {
        self.wheres.add_in(column, values, false, false);
        self
    }

    /// Add `column IS NULL`.
    pub fn and_is_null(mut self, column: &str) -> Self {
        self.wheres.add_null(column, false, false);
        self
    }

    /// Add a raw condition; the caller owns placeholder correctness.
    pub fn and_raw(mut self, condition: &str, args: Vec<Value>) -> Self {
        self.wheres.add_raw(condition, args, false);
        self
    }

    /// Add `column op value`, joined with OR.
    pub fn or_where(mut self, column: &str, op: &str, value: impl Into<Value>) -> Self {
        self.wheres.add_cmp(column, op, value.into(), true);
        self
    }

    /// Add a parenthesized predicate group.
    pub fn and_group(mut self, f: impl FnOnce(Conditions) -> Conditions) -> Self {
        let group = f(Conditions::new(self.dialect));
        self.wheres.add_group(group, false);
        self
    }

    /// Add an INNER JOIN (multi-table delete).
    pub fn join(mut self, table: &str, condition: &str) -> Self {
        let table = parse_table(self.dialect, table);
        let condition = quote_join_condition(self.dialect, condition);
        self.joins.push(format!("JOIN {table} ON {condition}"));
        self
    }

    /// Add `ORDER BY column`.
    pub fn order_by(mut self, column: &str) -> Self {
        self.orders.push(self.dialect.order_by(column, false));
        self
    }

    /// Add `ORDER BY column DESC`.
    pub fn order_by_desc(mut self, column: &str) -> Self {
        self.orders.push(self.dialect.order_by(column, true));
        self
    }

    /// Limit the number of deleted rows (dialect permitting).
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
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

    fn build_delete(&self) -> (String, Vec<Value>) {
        let mut sql = format!("DELETE FROM {}", parse_table(self.dialect, &self.table));
        let mut args = Vec::new();

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }

        if !self.wheres.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.wheres.clause());
            args.extend_from_slice(self.wheres.args());
        }

        if !self.orders.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.orders.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push(' ');
            sql.push_str(&self.dialect.limit(limit));
        }

        if !self.returning.is_empty() {
            sql.push_str(" RETURNING ");
            sql.push_str(&self.returning.join(", "));
        }

        (sql, args)
    }
}

impl SqlStatement for DeleteBuilder {
    fn dialect(&self) -> &'static dyn Dialect {
        self.dialect
    }

    fn build(&self) -> (String, Vec<Value>) {
        self.build_delete()
    }
}

impl Mutation for DeleteBuilder {}
