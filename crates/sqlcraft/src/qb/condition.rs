//! Shared predicate assembler for WHERE and HAVING clauses.
//!
//! SELECT, UPDATE, and DELETE builders all accumulate predicates through
//! this one type. Each call renders a fragment of boolean-expression text
//! (with canonical `?` placeholders) and appends its argument values, so
//! insertion order simultaneously fixes clause order and argument-to-
//! placeholder alignment. Connectives are resolved at render time: every
//! fragment joins to its predecessor with AND unless it was added through
//! an `or_*` variant.

use crate::dialect::Dialect;
use crate::value::Value;

#[derive(Clone, Debug)]
struct Fragment {
    sql: String,
    or: bool,
}

/// Accumulates predicate fragments plus a parallel argument list.
///
/// Also serves as the isolated assembler handed to `*_group` closures:
/// the fluent `and_*` / `or_*` methods consume and return `self`.
#[derive(Clone, Debug)]
pub struct Conditions {
    dialect: &'static dyn Dialect,
    fragments: Vec<Fragment>,
    args: Vec<Value>,
}

impl Conditions {
    /// Create an empty assembler for the given dialect.
    pub fn new(dialect: &'static dyn Dialect) -> Self {
        Self {
            dialect,
            fragments: Vec::new(),
            args: Vec::new(),
        }
    }

    /// Whether any predicate has been added.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Argument values accumulated so far, in placeholder order.
    pub(crate) fn args(&self) -> &[Value] {
        &self.args
    }

    // ==================== core accumulation ====================

    /// `column op ?` — the operator is trusted verbatim.
    pub(crate) fn add_cmp(&mut self, column: &str, op: &str, value: Value, or: bool) {
        let quoted = self.dialect.quote_path(column);
        self.fragments.push(Fragment {
            sql: format!("{quoted} {op} ?"),
            or,
        });
        self.args.push(value);
    }

    /// `column IN (?, …)` / `column NOT IN (?, …)`.
    ///
    /// An empty list renders the constant predicate `1 = 0` (for IN) or
    /// `1 = 1` (for NOT IN) instead of the invalid `IN ()`.
    pub(crate) fn add_in(&mut self, column: &str, values: Vec<Value>, negated: bool, or: bool) {
        if values.is_empty() {
            self.fragments.push(Fragment {
                sql: if negated { "1 = 1" } else { "1 = 0" }.to_string(),
                or,
            });
            return;
        }
        let quoted = self.dialect.quote_path(column);
        let placeholders = vec!["?"; values.len()].join(", ");
        let op = if negated { "NOT IN" } else { "IN" };
        self.fragments.push(Fragment {
            sql: format!("{quoted} {op} ({placeholders})"),
            or,
        });
        self.args.extend(values);
    }

    /// `column IS NULL` / `column IS NOT NULL`.
    pub(crate) fn add_null(&mut self, column: &str, not_null: bool, or: bool) {
        let quoted = self.dialect.quote_path(column);
        let op = if not_null { "IS NOT NULL" } else { "IS NULL" };
        self.fragments.push(Fragment {
            sql: format!("{quoted} {op}"),
            or,
        });
    }

    /// `column BETWEEN ? AND ?` / `column NOT BETWEEN ? AND ?`.
    pub(crate) fn add_between(
        &mut self,
        column: &str,
        from: Value,
        to: Value,
        negated: bool,
        or: bool,
    ) {
        let quoted = self.dialect.quote_path(column);
        let op = if negated { "NOT BETWEEN" } else { "BETWEEN" };
        self.fragments.push(Fragment {
            sql: format!("{quoted} {op} ? AND ?"),
            or,
        });
        self.args.push(from);
        self.args.push(to);
    }

    /// Literal condition text; the caller owns placeholder correctness.
    pub(crate) fn add_raw(&mut self, condition: &str, args: Vec<Value>, or: bool) {
        self.fragments.push(Fragment {
            sql: condition.to_string(),
            or,
        });
        self.args.extend(args);
    }

    /// Append another assembler's joined output as one parenthesized fragment.
    pub(crate) fn add_group(&mut self, group: Conditions, or: bool) {
        if group.is_empty() {
            return;
        }
        let (clause, args) = group.build();
        self.fragments.push(Fragment {
            sql: format!("({clause})"),
            or,
        });
        self.args.extend(args);
    }

    /// `EXISTS (…)` / `NOT EXISTS (…)` over an embedded sub-select.
    pub(crate) fn add_exists(&mut self, sub_sql: &str, sub_args: Vec<Value>, negated: bool, or: bool) {
        let op = if negated { "NOT EXISTS" } else { "EXISTS" };
        self.fragments.push(Fragment {
            sql: format!("{op} ({sub_sql})"),
            or,
        });
        self.args.extend(sub_args);
    }

    // ==================== fluent surface (used inside group closures) ====================

    /// Add `column op value`, joined with AND.
    pub fn and_where(mut self, column: &str, op: &str, value: impl Into<Value>) -> Self {
        self.add_cmp(column, op, value.into(), false);
        self
    }

    /// Add `column = value`, joined with AND.
    pub fn and_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.add_cmp(column, "=", value.into(), false);
        self
    }

    /// Add `column IN (values…)`, joined with AND.
    pub fn and_in(mut self, column: &str, values: Vec<Value>) -> Self {
        self.add_in(column, values, false, false);
        self
    }

    /// Add `column IS NULL`, joined with AND.
    pub fn and_is_null(mut self, column: &str) -> Self {
        self.add_null(column, false, false);
        self
    }

    /// Add `column IS NOT NULL`, joined with AND.
    pub fn and_is_not_null(mut self, column: &str) -> Self {
        self.add_null(column, true, false);
        self
    }

    /// Add `column BETWEEN from AND to`, joined with AND.
    pub fn and_between(
        mut self,
        column: &str,
        from: impl Into<Value>,
        to: impl Into<Value>,
    ) -> Self {
        self.add_between(column, from.into(), to.into(), false, false);
        self
    }

    /// Add a raw condition, joined with AND.
    pub fn and_raw(mut self, condition: &str, args: Vec<Value>) -> Self {
        self.add_raw(condition, args, false);
        self
    }

    /// Add `column op value`, joined with OR.
    pub fn or_where(mut self, column: &str, op: &str, value: impl Into<Value>) -> Self {
        self.add_cmp(column, op, value.into(), true);
        self
    }

    /// Add `column = value`, joined with OR.
    pub fn or_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.add_cmp(column, "=", value.into(), true);
        self
    }

    /// Add `column IN (values…)`, joined with OR.
    pub fn or_in(mut self, column: &str, values: Vec<Value>) -> Self {
        self.add_in(column, values, false, true);
        self
    }

    /// Add `column IS NULL`, joined with OR.
    pub fn or_is_null(mut self, column: &str) -> Self {
        self.add_null(column, false, true);
        self
    }

    /// Add a raw condition, joined with OR.
    pub fn or_raw(mut self, condition: &str, args: Vec<Value>) -> Self {
        self.add_raw(condition, args, true);
        self
    }

    /// Add a nested parenthesized group, joined with AND.
    pub fn and_group(mut self, f: impl FnOnce(Conditions) -> Conditions) -> Self {
        let group = f(Conditions::new(self.dialect));
        self.add_group(group, false);
        self
    }

    /// Add a nested parenthesized group, joined with OR.
    pub fn or_group(mut self, f: impl FnOnce(Conditions) -> Conditions) -> Self {
        let group = f(Conditions::new(self.dialect));
        self.add_group(group, true);
        self
    }

    // ==================== rendering ====================

    /// Render the joined predicate text (no `WHERE` keyword, `?` placeholders).
    ///
    /// The first fragment is emitted as-is; each later fragment gets an
    /// `AND `/`OR ` prefix unless its text already begins with a connective
    /// token of its own. Any leading connective on the joined result is
    /// stripped.
    pub(crate) fn clause(&self) -> String {
        let mut out = String::new();
        for (i, frag) in self.fragments.iter().enumerate() {
            if i > 0 {
                out.push(' ');
                if frag.or {
                    out.push_str("OR ");
                } else if !starts_with_connective(&frag.sql) {
                    out.push_str("AND ");
                }
            }
            out.push_str(&frag.sql);
        }
        strip_leading_connective(out)
    }

    /// Render the clause and clone out its arguments.
    pub(crate) fn build(&self) -> (String, Vec<Value>) {
        (self.clause(), self.args.clone())
    }
}

fn starts_with_connective(sql: &str) -> bool {
    let t = sql.trim_start();
    t.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("AND "))
        || t.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("OR "))
}

fn strip_leading_connective(sql: String) -> String {
    let t = sql.trim_start();
    if t.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("AND ")) {
        t[4..].trim_start().to_string()
    } else if t.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("OR ")) {
        t[3..].trim_start().to_string()
    } else {
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::MYSQL;

    fn conds() -> Conditions {
        Conditions::new(&MYSQL)
    }

    #[test]
    fn single_condition() {
        let c = conds().and_where("id", "=", 1);
        let (sql, args) = c.build();
        assert_eq!(sql, "`id` = ?");
        assert_eq!(args, vec![Value::Int(1)]);
    }

    #[test]
    fn and_joining_is_implicit() {
        let c = conds()
            .and_eq("status", "active")
            .and_where("age", ">", 18);
        assert_eq!(c.clause(), "`status` = ? AND `age` > ?");
    }

    #[test]
    fn or_variant_joins_with_or() {
        let c = conds().and_eq("status", "active").or_eq("role", "admin");
        assert_eq!(c.clause(), "`status` = ? OR `role` = ?");
    }

    #[test]
    fn in_list_one_placeholder_per_value() {
        let c = conds().and_in("id", vec![1.into(), 2.into(), 3.into()]);
        let (sql, args) = c.build();
        assert_eq!(sql, "`id` IN (?, ?, ?)");
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn empty_in_list_renders_always_false() {
        let c = conds().and_in("id", vec![]);
        assert_eq!(c.clause(), "1 = 0");
    }

    #[test]
    fn null_checks_take_no_args() {
        let c = conds().and_is_null("deleted_at");
        let (sql, args) = c.build();
        assert_eq!(sql, "`deleted_at` IS NULL");
        assert!(args.is_empty());
    }

    #[test]
    fn between_appends_bounds_in_order() {
        let c = conds().and_between("age", 18, 65);
        let (sql, args) = c.build();
        assert_eq!(sql, "`age` BETWEEN ? AND ?");
        assert_eq!(args, vec![Value::Int(18), Value::Int(65)]);
    }

    #[test]
    fn raw_text_is_unmodified() {
        let c = conds().and_raw("`name` = 'John' AND `age` > ?", vec![18.into()]);
        assert_eq!(c.clause(), "`name` = 'John' AND `age` > ?");
    }

    #[test]
    fn group_first_has_no_connective() {
        let c = conds().and_group(|g| g.and_where("age", ">=", 18).and_where("age", "<=", 65));
        assert_eq!(c.clause(), "(`age` >= ? AND `age` <= ?)");
    }

    #[test]
    fn group_after_predicate_joins_with_and() {
        let c = conds()
            .and_eq("status", "active")
            .and_group(|g| g.and_where("age", ">=", 18).and_where("age", "<=", 65));
        assert_eq!(c.clause(), "`status` = ? AND (`age` >= ? AND `age` <= ?)");
    }

    #[test]
    fn or_group_joins_with_or() {
        let c = conds()
            .and_eq("status", "active")
            .or_group(|g| g.and_eq("role", "admin").or_eq("role", "moderator"));
        assert_eq!(c.clause(), "`status` = ? OR (`role` = ? OR `role` = ?)");
    }

    #[test]
    fn empty_group_is_skipped() {
        let c = conds().and_eq("a", 1).and_group(|g| g);
        assert_eq!(c.clause(), "`a` = ?");
    }

    #[test]
    fn group_args_follow_outer_args() {
        let c = conds()
            .and_eq("status", "active")
            .and_group(|g| g.and_between("age", 18, 65));
        let (_, args) = c.build();
        assert_eq!(
            args,
            vec![
                Value::Text("active".into()),
                Value::Int(18),
                Value::Int(65)
            ]
        );
    }

    #[test]
    fn self_carried_connective_is_not_doubled() {
        let c = conds()
            .and_eq("a", 1)
            .and_raw("AND `b` = 2", vec![]);
        assert_eq!(c.clause(), "`a` = ? AND `b` = 2");
    }

    #[test]
    fn leading_connective_is_stripped() {
        let c = conds().and_raw("AND `a` = 1", vec![]);
        assert_eq!(c.clause(), "`a` = 1");
    }

    #[test]
    fn or_tagged_first_fragment_is_stripped() {
        let c = conds().or_eq("a", 1);
        assert_eq!(c.clause(), "`a` = ?");
    }

    #[test]
    fn placeholder_count_matches_arg_count() {
        let c = conds()
            .and_eq("a", 1)
            .or_in("b", vec![2.into(), 3.into()])
            .and_between("c", 4, 5)
            .and_raw("`d` > ?", vec![6.into()])
            .and_group(|g| g.and_eq("e", 7).or_eq("f", "x"));
        let (sql, args) = c.build();
        assert_eq!(sql.matches('?').count(), args.len());
    }
}
