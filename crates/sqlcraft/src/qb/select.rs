//! SELECT query builder.

use crate::dialect::Dialect;
use crate::error::{CraftError, CraftResult};
use crate::executor::Executor;
use crate::ident::{parse_table, quote_join_condition};
use crate::qb::condition::Conditions;
use crate::qb::traits::SqlStatement;
use crate::row::{FromRow, FromValue, Row};
use crate::value::Value;

/// Sort direction for ordered reads and keyset pagination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// One page of offset-based pagination, with display bounds.
#[derive(Clone, Debug, PartialEq)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub per_page: i64,
    pub current_page: i64,
    pub last_page: i64,
    /// 1-based index of the first row on this page; 0 when the page is empty.
    pub from: i64,
    /// 1-based index of the last row on this page; 0 when the page is empty.
    pub to: i64,
}

/// One page of cursor-based (keyset) pagination.
#[derive(Clone, Debug, PartialEq)]
pub struct KeysetPage<T> {
    pub data: Vec<T>,
    pub has_more: bool,
    /// Cursor column value of the last row, present only when more rows remain.
    pub next_cursor: Option<Value>,
    /// Cursor column value of the first row; `None` on an empty page.
    pub prev_cursor: Option<Value>,
}

/// Accumulates the clauses of one SELECT statement and renders them in
/// fixed order: columns, FROM, joins, WHERE, GROUP BY, HAVING, ORDER BY,
/// LIMIT, OFFSET.
#[derive(Clone, Debug)]
pub struct SelectBuilder {
    dialect: &'static dyn Dialect,
    columns: Vec<String>,
    from: Option<String>,
    joins: Vec<String>,
    wheres: Conditions,
    group_by: Vec<String>,
    having: Conditions,
    orders: Vec<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl SelectBuilder {
    /// Create a builder selecting the given columns (rendered verbatim).
    pub fn new<I, S>(dialect: &'static dyn Dialect, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            columns.push("*".to_string());
        }
        Self {
            dialect,
            columns,
            from: None,
            joins: Vec::new(),
            wheres: Conditions::new(dialect),
            group_by: Vec::new(),
            having: Conditions::new(dialect),
            orders: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Set the FROM table; an embedded alias (`"orders o"`, `"orders AS o"`)
    /// is detected and left unquoted.
    pub fn from(mut self, table: &str) -> Self {
        self.from = Some(parse_table(self.dialect, table));
        self
    }

    // ==================== WHERE ====================

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

    /// Add `column != value`.
    pub fn and_ne(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.wheres.add_cmp(column, "!=", value.into(), false);
        self
    }

    /// Add `column IN (values…)`; an empty list renders an always-false
    /// predicate instead of invalid SQL.
    pub fn and_in(mut self, column: &str, values: Vec<Value>) -> Self {
        self.wheres.add_in(column, values, false, false);
        self
    }

    /// Add `column NOT IN (values…)`; an empty list renders an always-true
    /// predicate.
    pub fn and_not_in(mut self, column: &str, values: Vec<Value>) -> Self {
        self.wheres.add_in(column, values, true, false);
        self
    }

    /// Add `column IS NULL`.
    pub fn and_is_null(mut self, column: &str) -> Self {
        self.wheres.add_null(column, false, false);
        self
    }

    /// Add `column IS NOT NULL`.
    pub fn and_is_not_null(mut self, column: &str) -> Self {
        self.wheres.add_null(column, true, false);
        self
    }

    /// Add `column BETWEEN from AND to`.
    pub fn and_between(
        mut self,
        column: &str,
        from: impl Into<Value>,
        to: impl Into<Value>,
    ) -> Self {
        self.wheres
            .add_between(column, from.into(), to.into(), false, false);
        self
    }

    /// Add `column NOT BETWEEN from AND to`.
    pub fn and_not_between(
        mut self,
        column: &str,
        from: impl Into<Value>,
        to: impl Into<Value>,
    ) -> Self {
        self.wheres
            .add_between(column, from.into(), to.into(), true, false);
        self
    }

    /// Add a raw condition; the caller owns placeholder correctness.
    pub fn and_raw(mut self, condition: &str, args: Vec<Value>) -> Self {
        self.wheres.add_raw(condition, args, false);
        self
    }

    /// Add `EXISTS (subquery)`.
    pub fn and_exists(mut self, subquery: &SelectBuilder) -> Self {
        let (sql, args) = subquery.build();
        self.wheres.add_exists(&sql, args, false, false);
        self
    }

    /// Add `NOT EXISTS (subquery)`.
    pub fn and_not_exists(mut self, subquery: &SelectBuilder) -> Self {
        let (sql, args) = subquery.build();
        self.wheres.add_exists(&sql, args, true, false);
        self
    }

    /// Add `column op value`, joined with OR.
    pub fn or_where(mut self, column: &str, op: &str, value: impl Into<Value>) -> Self {
        self.wheres.add_cmp(column, op, value.into(), true);
        self
    }

    /// Add `column = value`, joined with OR.
    pub fn or_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.wheres.add_cmp(column, "=", value.into(), true);
        self
    }

    /// Add `column IN (values…)`, joined with OR.
    pub fn or_in(mut self, column: &str, values: Vec<Value>) -> Self {
        self.wheres.add_in(column, values, false, true);
        self
    }

    /// Add `column IS NULL`, joined with OR.
    pub fn or_is_null(mut self, column: &str) -> Self {
        self.wheres.add_null(column, false, true);
        self
    }

    /// Add a raw condition, joined with OR.
    pub fn or_raw(mut self, condition: &str, args: Vec<Value>) -> Self {
        self.wheres.add_raw(condition, args, true);
        self
    }

    /// Build a parenthesized predicate group against a fresh assembler and
    /// append it as one fragment, joined with AND.
    pub fn and_group(mut self, f: impl FnOnce(Conditions) -> Conditions) -> Self {
        let group = f(Conditions::new(self.dialect));
        self.wheres.add_group(group, false);
        self
    }

    /// Like [`SelectBuilder::and_group`], joined with OR.
    pub fn or_group(mut self, f: impl FnOnce(Conditions) -> Conditions) -> Self {
        let group = f(Conditions::new(self.dialect));
        self.wheres.add_group(group, true);
        self
    }

    /// Add `column op value` only when `condition` holds.
    pub fn when(self, condition: bool, column: &str, op: &str, value: impl Into<Value>) -> Self {
        if condition {
            self.and_where(column, op, value)
        } else {
            self
        }
    }

    /// Apply `f` to the builder only when `condition` holds.
    pub fn when_func(self, condition: bool, f: impl FnOnce(Self) -> Self) -> Self {
        if condition { f(self) } else { self }
    }

    // ==================== JOIN ====================

    fn push_join(mut self, kind: &str, table: &str, condition: &str) -> Self {
        let table = parse_table(self.dialect, table);
        let condition = quote_join_condition(self.dialect, condition);
        self.joins.push(format!("{kind} {table} ON {condition}"));
        self
    }

    /// Add an INNER JOIN.
    pub fn join(self, table: &str, condition: &str) -> Self {
        self.push_join("INNER JOIN", table, condition)
    }

    /// Add an INNER JOIN.
    pub fn inner_join(self, table: &str, condition: &str) -> Self {
        self.push_join("INNER JOIN", table, condition)
    }

    /// Add a LEFT JOIN.
    pub fn left_join(self, table: &str, condition: &str) -> Self {
        self.push_join("LEFT JOIN", table, condition)
    }

    /// Add a RIGHT JOIN.
    pub fn right_join(self, table: &str, condition: &str) -> Self {
        self.push_join("RIGHT JOIN", table, condition)
    }

    /// Add a FULL OUTER JOIN.
    pub fn full_join(self, table: &str, condition: &str) -> Self {
        self.push_join("FULL OUTER JOIN", table, condition)
    }

    /// Add a CROSS JOIN (no condition).
    pub fn cross_join(mut self, table: &str) -> Self {
        let table = parse_table(self.dialect, table);
        self.joins.push(format!("CROSS JOIN {table}"));
        self
    }

    // ==================== grouping & ordering ====================

    /// Add GROUP BY columns (rendered verbatim).
    pub fn group_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Add a HAVING condition with `?` placeholders and its arguments.
    pub fn having(mut self, condition: &str, args: Vec<Value>) -> Self {
        self.having.add_raw(condition, args, false);
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

    /// Add a raw ORDER BY expression.
    pub fn order_by_raw(mut self, expression: &str) -> Self {
        self.orders.push(expression.to_string());
        self
    }

    // ==================== pagination clauses ====================

    /// Set LIMIT.
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set OFFSET.
    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Set LIMIT/OFFSET from a 1-based page number and page size.
    pub fn page(mut self, page: i64, per_page: i64) -> Self {
        let page = page.max(1);
        let per_page = per_page.max(1);
        self.limit = Some(per_page);
        self.offset = Some((page - 1) * per_page);
        self
    }

    // ==================== rendering ====================

    fn build_select(&self) -> (String, Vec<Value>) {
        let mut sql = format!("SELECT {}", self.columns.join(", "));
        let mut args = Vec::new();

        if let Some(ref from) = self.from {
            sql.push_str(" FROM ");
            sql.push_str(from);
        }

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }

        if !self.wheres.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.wheres.clause());
            args.extend_from_slice(self.wheres.args());
        }

        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group_by.join(", "));
        }

        if !self.having.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(&self.having.clause());
            args.extend_from_slice(self.having.args());
        }

        if !self.orders.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.orders.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push(' ');
            sql.push_str(&self.dialect.limit(limit));
        }

        if let Some(offset) = self.offset {
            sql.push(' ');
            sql.push_str(&self.dialect.offset(offset));
        }

        (sql, args)
    }

    /// Render the COUNT variant: the column list becomes `COUNT(*)` and
    /// ordering/limit/offset are dropped. Grouped queries are wrapped in a
    /// derived table so the count covers groups, not rows.
    fn build_count(&self) -> (String, Vec<Value>) {
        let alias = self.dialect.quote_ident("aggregate");
        if self.group_by.is_empty() && self.having.is_empty() {
            let mut qb = self.clone();
            qb.columns = vec![format!("COUNT(*) AS {alias}")];
            qb.orders.clear();
            qb.limit = None;
            qb.offset = None;
            qb.build_select()
        } else {
            let mut inner = self.clone();
            inner.columns = vec!["1".to_string()];
            inner.orders.clear();
            inner.limit = None;
            inner.offset = None;
            let (inner_sql, args) = inner.build_select();
            (
                format!("SELECT COUNT(*) AS {alias} FROM ({inner_sql}) AS t"),
                args,
            )
        }
    }

    // ==================== execution ====================

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

    /// Execute and decode the first row into `T`, if any.
    pub async fn fetch_opt<T: FromRow>(&self, conn: &impl Executor) -> CraftResult<Option<T>> {
        let row = self.query_opt(conn).await?;
        row.as_ref().map(T::from_row).transpose()
    }

    /// Execute and decode exactly one row into `T`; empty result is a
    /// not-found error.
    pub async fn fetch_one<T: FromRow>(&self, conn: &impl Executor) -> CraftResult<T> {
        let row = self.query_one(conn).await?;
        T::from_row(&row)
    }

    /// Execute and return one generic column-to-value mapping.
    ///
    /// Byte values holding valid UTF-8 are coerced to text; other bytes are
    /// left as opaque binary.
    pub async fn row(&self, conn: &impl Executor) -> CraftResult<Row> {
        Ok(self.query_one(conn).await?.coerce_text())
    }

    /// Execute and return all rows as generic mappings (text-coerced).
    pub async fn rows(&self, conn: &impl Executor) -> CraftResult<Vec<Row>> {
        let rows = self.query(conn).await?;
        Ok(rows.into_iter().map(Row::coerce_text).collect())
    }

    /// Narrow to a single column and return its value from the first row.
    pub async fn field(&self, conn: &impl Executor, column: &str) -> CraftResult<Value> {
        let mut qb = self.clone();
        qb.columns = vec![self.dialect.quote_path(column)];
        let (sql, args) = qb.to_sql();
        let row = conn.query_one(&sql, &args).await?;
        Ok(row
            .get_index(0)
            .cloned()
            .unwrap_or(Value::Null)
            .coerce_text())
    }

    /// Narrow to a single column and collect its value from every row.
    pub async fn pluck(&self, conn: &impl Executor, column: &str) -> CraftResult<Vec<Value>> {
        let mut qb = self.clone();
        qb.columns = vec![self.dialect.quote_path(column)];
        let (sql, args) = qb.to_sql();
        let rows = conn.query(&sql, &args).await?;
        Ok(rows
            .into_iter()
            .map(|r| {
                r.get_index(0)
                    .cloned()
                    .unwrap_or(Value::Null)
                    .coerce_text()
            })
            .collect())
    }

    // ==================== aggregates ====================

    async fn aggregate(&self, conn: &impl Executor, expr: String) -> CraftResult<Value> {
        let mut qb = self.clone();
        qb.columns = vec![format!("{expr} AS {}", self.dialect.quote_ident("aggregate"))];
        qb.orders.clear();
        qb.limit = None;
        qb.offset = None;
        let (sql, args) = qb.to_sql();
        let row = conn.query_opt(&sql, &args).await?;
        Ok(row
            .and_then(|r| r.get("aggregate").cloned())
            .unwrap_or(Value::Null))
    }

    /// Count matching rows.
    pub async fn count(&self, conn: &impl Executor) -> CraftResult<i64> {
        let (sql, args) = self.build_count();
        let sql = self.dialect.rebind(&sql);
        let row = conn.query_one(&sql, &args).await?;
        row.try_get("aggregate")
    }

    /// Count non-NULL values of one column.
    pub async fn count_column(&self, conn: &impl Executor, column: &str) -> CraftResult<i64> {
        let expr = format!("COUNT({})", self.dialect.quote_path(column));
        match self.aggregate(conn, expr).await? {
            Value::Null => Ok(0),
            v => i64::from_value(&v, column),
        }
    }

    /// Sum one column; an empty result set yields `0.0`.
    pub async fn sum(&self, conn: &impl Executor, column: &str) -> CraftResult<f64> {
        let expr = format!("SUM({})", self.dialect.quote_path(column));
        numeric_or_zero(self.aggregate(conn, expr).await?, column)
    }

    /// Average one column; an empty result set yields `0.0`.
    pub async fn avg(&self, conn: &impl Executor, column: &str) -> CraftResult<f64> {
        let expr = format!("AVG({})", self.dialect.quote_path(column));
        numeric_or_zero(self.aggregate(conn, expr).await?, column)
    }

    /// Maximum value of one column (`Null` on an empty result set).
    pub async fn max(&self, conn: &impl Executor, column: &str) -> CraftResult<Value> {
        let expr = format!("MAX({})", self.dialect.quote_path(column));
        self.aggregate(conn, expr).await
    }

    /// Minimum value of one column (`Null` on an empty result set).
    pub async fn min(&self, conn: &impl Executor, column: &str) -> CraftResult<Value> {
        let expr = format!("MIN({})", self.dialect.quote_path(column));
        self.aggregate(conn, expr).await
    }

    /// Whether any row matches, via `SELECT EXISTS(… LIMIT 1)`.
    pub async fn exists(&self, conn: &impl Executor) -> CraftResult<bool> {
        let mut qb = self.clone();
        qb.limit = Some(1);
        let (inner, args) = qb.build_select();
        let sql = self.dialect.rebind(&format!("SELECT EXISTS({inner})"));
        let row = conn.query_one(&sql, &args).await?;
        match row.get_index(0) {
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::Int(i)) => Ok(*i != 0),
            other => Err(CraftError::decode(
                "exists",
                format!("expected boolean, got {other:?}"),
            )),
        }
    }

    /// Run the statement under EXPLAIN and return the plan rows.
    pub async fn explain(&self, conn: &impl Executor) -> CraftResult<Vec<Row>> {
        let (sql, args) = self.to_sql();
        conn.query(&format!("EXPLAIN {sql}"), &args).await
    }

    // ==================== pagination ====================

    /// Offset pagination: issues a COUNT against a copy of this query
    /// (without ordering/limit/offset), then fetches the requested page.
    pub async fn paginate(
        self,
        conn: &impl Executor,
        page: i64,
        per_page: i64,
    ) -> CraftResult<Paginated<Row>> {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let total = self.count(conn).await?;
        let last_page = (total + per_page - 1) / per_page;
        let offset = (page - 1) * per_page;

        let mut qb = self;
        qb.limit = Some(per_page);
        qb.offset = Some(offset);
        let data = qb.rows(conn).await?;

        let (from, to) = if data.is_empty() {
            (0, 0)
        } else {
            (offset + 1, offset + data.len() as i64)
        };

        Ok(Paginated {
            data,
            total,
            per_page,
            current_page: page,
            last_page,
            from,
            to,
        })
    }

    /// Keyset pagination over a monotonic column.
    ///
    /// Fetches `per_page + 1` rows to detect a further page; the sentinel
    /// row is trimmed. Any previously added ORDER BY is replaced with the
    /// cursor column's ordering.
    pub async fn keyset_paginate(
        self,
        conn: &impl Executor,
        column: &str,
        last_value: Option<Value>,
        per_page: i64,
        direction: SortDirection,
    ) -> CraftResult<KeysetPage<Row>> {
        let per_page = per_page.max(1);
        let desc = direction == SortDirection::Desc;

        let mut qb = self;
        if let Some(cursor) = last_value {
            let op = if desc { "<" } else { ">" };
            qb.wheres.add_cmp(column, op, cursor, false);
        }
        qb.orders = vec![qb.dialect.order_by(column, desc)];
        qb.limit = Some(per_page + 1);
        qb.offset = None;

        let mut data = qb.rows(conn).await?;
        let has_more = data.len() as i64 > per_page;
        if has_more {
            data.truncate(per_page as usize);
        }

        let next_cursor = if has_more {
            data.last().and_then(|r| r.get(column).cloned())
        } else {
            None
        };
        let prev_cursor = data.first().and_then(|r| r.get(column).cloned());

        Ok(KeysetPage {
            data,
            has_more,
            next_cursor,
            prev_cursor,
        })
    }
}

impl SqlStatement for SelectBuilder {
    fn dialect(&self) -> &'static dyn Dialect {
        self.dialect
    }

    fn build(&self) -> (String, Vec<Value>) {
        self.build_select()
    }
}

fn numeric_or_zero(value: Value, column: &str) -> CraftResult<f64> {
    match value {
        Value::Null => Ok(0.0),
        v => f64::from_value(&v, column),
    }
}
