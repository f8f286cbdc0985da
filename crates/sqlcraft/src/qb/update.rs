//! UPDATE query builder.

use crate::dialect::Dialect;
use crate::ident::{parse_table, quote_join_condition};
use crate::qb::condition::Conditions;
use crate::qb::traits::{Mutation, SqlStatement};
use crate::value::{Record, Value};

/// Accumulates one UPDATE statement: SET assignments, optional joins
/// (multi-table update), the shared WHERE assembler, and an optional LIMIT.
///
/// SET arguments always precede WHERE arguments in the rendered list,
/// matching placeholder order.
#[derive(Clone, Debug)]
pub struct UpdateBuilder {
    dialect: &'static dyn Dialect,
    table: String,
    sets: Vec<String>,
    set_args: Vec<Value>,
    joins: Vec<String>,
    wheres: Conditions,
    limit: Option<i64>,
    /// Allow-list applied by `set_record`.
    columns: Vec<String>,
    returning: Vec<String>,
}

impl UpdateBuilder {
    /// Create a builder updating `table`.
    pub fn new(dialect: &'static dyn Dialect, table: &str) -> Self {
        Self {
            dialect,
            table: table.to_string(),
            sets: Vec::new(),
            set_args: Vec::new(),
            joins: Vec::new(),
            wheres: Conditions::new(dialect),
            limit: None,
            columns: Vec::new(),
            returning: Vec::new(),
        }
    }

    // ==================== SET ====================

    /// Assign `column = value`.
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.sets
            .push(format!("{} = ?", self.dialect.quote_path(column)));
        self.set_args.push(value.into());
        self
    }

    /// Assign a raw SET expression with its own placeholders and arguments.
    pub fn set_raw(mut self, expression: &str, args: Vec<Value>) -> Self {
        self.sets.push(expression.to_string());
        self.set_args.extend(args);
        self
    }

    /// Assign from (column, value) pairs, in pair order.
    pub fn set_map<I, S, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        for (column, value) in pairs {
            let column: String = column.into();
            self = self.set(&column, value);
        }
        self
    }

    /// Assign every column a record carries, filtered by the
    /// [`UpdateBuilder::columns`] allow-list when one was declared.
    pub fn set_record<R: Record>(mut self, record: &R) -> Self {
        let values = record.values();
        for (column, value) in R::columns().iter().zip(values) {
            if !self.columns.is_empty() && !self.columns.iter().any(|c| c == column) {
                continue;
            }
            self = self.set(column, value);
        }
        self
    }

    /// Restrict `set_record` to the named columns.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Assign `column = column + n`.
    pub fn increment(mut self, column: &str, by: i64) -> Self {
        let q = self.dialect.quote_path(column);
        self.sets.push(format!("{q} = {q} + ?"));
        self.set_args.push(Value::Int(by));
        self
    }

    /// Assign `column = column - n`.
    pub fn decrement(mut self, column: &str, by: i64) -> Self {
        let q = self.dialect.quote_path(column);
        self.sets.push(format!("{q} = {q} - ?"));
        self.set_args.push(Value::Int(by));
        self
    }

    // ==================== JOIN ====================

    /// Add an INNER JOIN before SET (multi-table update).
    pub fn join(mut self, table: &str, condition: &str) -> Self {
        let table = parse_table(self.dialect, table);
        let condition = quote_join_condition(self.dialect, condition);
        self.joins.push(format!("JOIN {table} ON {condition}"));
        self
    }

    /// Add a LEFT JOIN before SET.
    pub fn left_join(mut self, table: &str, condition: &str) -> Self {
        let table = parse_table(self.dialect, table);
        let condition = quote_join_condition(self.dialect, condition);
        self.joins.push(format!("LEFT JOIN {table} ON {condition}"));
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

    /// Add `column IS NOT NULL`.
    pub fn and_is_not_null(mut self, column: &str) -> Self {
        self.wheres.add_null(column, true, false);
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

    /// Add `column = value` to WHERE only when `condition` holds.
    pub fn when(self, condition: bool, column: &str, value: impl Into<Value>) -> Self {
        if condition {
            self.and_eq(column, value)
        } else {
            self
        }
    }

    /// Apply `f` only when `condition` holds.
    pub fn when_func(self, condition: bool, f: impl FnOnce(Self) -> Self) -> Self {
        if condition { f(self) } else { self }
    }

    // ==================== misc ====================

    /// Limit the number of updated rows (dialect permitting).
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

    fn build_update(&self) -> (String, Vec<Value>) {
        let mut sql = format!("UPDATE {}", parse_table(self.dialect, &self.table));
        let mut args = Vec::new();

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }

        if !self.sets.is_empty() {
            sql.push_str(" SET ");
            sql.push_str(&self.sets.join(", "));
            args.extend(self.set_args.iter().cloned());
        }

        if !self.wheres.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.wheres.clause());
            args.extend_from_slice(self.wheres.args());
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

impl SqlStatement for UpdateBuilder {
    fn dialect(&self) -> &'static dyn Dialect {
        self.dialect
    }

    fn build(&self) -> (String, Vec<Value>) {
        self.build_update()
    }
}

impl Mutation for UpdateBuilder {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MYSQL, POSTGRES};

    fn update(table: &str) -> UpdateBuilder {
        UpdateBuilder::new(&MYSQL, table)
    }

    struct Profile {
        nickname: String,
        age: i64,
    }

    impl Record for Profile {
        fn columns() -> &'static [&'static str] {
            &["nickname", "age"]
        }

        fn values(&self) -> Vec<Value> {
            vec![self.nickname.clone().into(), self.age.into()]
        }
    }

    #[test]
    fn simple_update() {
        let (sql, args) = update("users")
            .set("status", "inactive")
            .and_eq("id", 1)
            .to_sql();
        assert_eq!(sql, "UPDATE `users` SET `status` = ? WHERE `id` = ?");
        assert_eq!(
            args,
            vec![Value::Text("inactive".into()), Value::Int(1)]
        );
    }

    #[test]
    fn set_args_precede_where_args() {
        let (_, args) = update("users")
            .set("name", "B")
            .set("age", 31)
            .and_eq("id", 9)
            .to_sql();
        assert_eq!(
            args,
            vec![Value::Text("B".into()), Value::Int(31), Value::Int(9)]
        );
    }

    #[test]
    fn set_raw_expression() {
        let (sql, args) = update("users")
            .set_raw("`updated_at` = NOW()", vec![])
            .and_eq("id", 1)
            .to_sql();
        assert_eq!(sql, "UPDATE `users` SET `updated_at` = NOW() WHERE `id` = ?");
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn set_map_in_pair_order() {
        let (sql, _) = update("users")
            .set_map([("name", Value::from("A")), ("age", Value::from(30))])
            .and_eq("id", 1)
            .to_sql();
        assert_eq!(
            sql,
            "UPDATE `users` SET `name` = ?, `age` = ? WHERE `id` = ?"
        );
    }

    #[test]
    fn set_record_all_columns() {
        let p = Profile {
            nickname: "kit".into(),
            age: 40,
        };
        let (sql, args) = update("users").set_record(&p).and_eq("id", 1).to_sql();
        assert_eq!(
            sql,
            "UPDATE `users` SET `nickname` = ?, `age` = ? WHERE `id` = ?"
        );
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn set_record_with_allow_list() {
        let p = Profile {
            nickname: "kit".into(),
            age: 40,
        };
        let (sql, args) = update("users")
            .columns(["age"])
            .set_record(&p)
            .and_eq("id", 1)
            .to_sql();
        assert_eq!(sql, "UPDATE `users` SET `age` = ? WHERE `id` = ?");
        assert_eq!(args, vec![Value::Int(40), Value::Int(1)]);
    }

    #[test]
    fn increment_decrement() {
        let (sql, args) = update("posts")
            .increment("views", 1)
            .and_eq("id", 5)
            .to_sql();
        assert_eq!(
            sql,
            "UPDATE `posts` SET `views` = `views` + ? WHERE `id` = ?"
        );
        assert_eq!(args, vec![Value::Int(1), Value::Int(5)]);

        let (sql, _) = update("posts").decrement("stock", 3).to_sql();
        assert_eq!(sql, "UPDATE `posts` SET `stock` = `stock` - ?");
    }

    #[test]
    fn join_before_set() {
        let (sql, _) = update("orders")
            .join("users", "orders.user_id = users.id")
            .set("orders.status", "done")
            .to_sql();
        assert_eq!(
            sql,
            "UPDATE `orders` JOIN `users` ON `orders`.`user_id` = `users`.`id` SET `orders`.`status` = ?"
        );
    }

    #[test]
    fn where_in_and_limit() {
        let (sql, args) = update("users")
            .set("status", "archived")
            .and_in("id", vec![1.into(), 2.into()])
            .limit(10)
            .to_sql();
        assert_eq!(
            sql,
            "UPDATE `users` SET `status` = ? WHERE `id` IN (?, ?) LIMIT 10"
        );
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn when_applies_conditionally() {
        let (sql, _) = update("users")
            .set("a", 1)
            .when(true, "id", 7)
            .when(false, "role", "admin")
            .to_sql();
        assert_eq!(sql, "UPDATE `users` SET `a` = ? WHERE `id` = ?");
    }

    #[test]
    fn postgres_placeholder_numbering_spans_set_and_where() {
        let (sql, _) = UpdateBuilder::new(&POSTGRES, "users")
            .set("name", "B")
            .set("age", 31)
            .and_eq("id", 9)
            .to_sql();
        assert_eq!(
            sql,
            "UPDATE \"users\" SET \"name\" = $1, \"age\" = $2 WHERE \"id\" = $3"
        );
    }
}
