//! Integration tests driving builders against a scripted executor.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use sqlcraft::{
    CraftError, CraftResult, ExecResult, Executor, FromRow, LoggedExecutor, Mutation, QueryLogger,
    Row, SortDirection, SqlStatement, Value, qb,
};

/// One canned response for the scripted executor.
enum Reply {
    Rows(Vec<Row>),
    Exec(ExecResult),
    Fail(String),
}

/// Executor that records every call and replays canned responses in order.
struct ScriptedExecutor {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<(String, Vec<Value>)>>,
}

impl ScriptedExecutor {
    fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn empty() -> Self {
        Self::new(Vec::new())
    }

    fn recorded(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, sql: &str, params: &[Value]) -> Option<Reply> {
        self.calls
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        self.replies.lock().unwrap().pop_front()
    }
}

impl Executor for ScriptedExecutor {
    async fn query(&self, sql: &str, params: &[Value]) -> CraftResult<Vec<Row>> {
        match self.record(sql, params) {
            Some(Reply::Rows(rows)) => Ok(rows),
            Some(Reply::Fail(msg)) => Err(CraftError::Other(msg)),
            _ => Ok(Vec::new()),
        }
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> CraftResult<ExecResult> {
        match self.record(sql, params) {
            Some(Reply::Exec(result)) => Ok(result),
            Some(Reply::Fail(msg)) => Err(CraftError::Other(msg)),
            _ => Ok(ExecResult::default()),
        }
    }
}

fn id_row(id: i64) -> Row {
    Row::from_pairs([("id".to_string(), Value::Int(id))])
}

fn aggregate_row(value: Value) -> Row {
    Row::from_pairs([("aggregate".to_string(), value)])
}

#[tokio::test]
async fn paginate_computes_bounds_and_issues_two_queries() {
    let exec = ScriptedExecutor::new(vec![
        Reply::Rows(vec![aggregate_row(Value::Int(50))]),
        Reply::Rows((11..=20).map(id_row).collect()),
    ]);

    let page = qb::select(["*"])
        .from("users")
        .order_by("id")
        .paginate(&exec, 2, 10)
        .await
        .unwrap();

    assert_eq!(page.total, 50);
    assert_eq!(page.per_page, 10);
    assert_eq!(page.current_page, 2);
    assert_eq!(page.last_page, 5);
    assert_eq!(page.from, 11);
    assert_eq!(page.to, 20);
    assert_eq!(page.data.len(), 10);

    let calls = exec.recorded();
    assert_eq!(calls.len(), 2);
    // The count query drops ordering and carries no page limit.
    assert_eq!(calls[0].0, "SELECT COUNT(*) AS `aggregate` FROM `users`");
    assert_eq!(
        calls[1].0,
        "SELECT * FROM `users` ORDER BY `id` LIMIT 10 OFFSET 10"
    );
}

#[tokio::test]
async fn paginate_empty_table_has_zero_bounds() {
    let exec = ScriptedExecutor::new(vec![
        Reply::Rows(vec![aggregate_row(Value::Int(0))]),
        Reply::Rows(vec![]),
    ]);

    let page = qb::select(["*"])
        .from("users")
        .paginate(&exec, 1, 10)
        .await
        .unwrap();

    assert_eq!(page.total, 0);
    assert_eq!(page.last_page, 0);
    assert_eq!(page.from, 0);
    assert_eq!(page.to, 0);
    assert!(page.data.is_empty());
}

#[tokio::test]
async fn keyset_first_page_detects_more() {
    let exec = ScriptedExecutor::new(vec![Reply::Rows((1..=11).map(id_row).collect())]);

    let page = qb::select(["*"])
        .from("users")
        .keyset_paginate(&exec, "id", None, 10, SortDirection::Asc)
        .await
        .unwrap();

    assert!(page.has_more);
    assert_eq!(page.data.len(), 10);
    assert_eq!(page.next_cursor, Some(Value::Int(10)));
    assert_eq!(page.prev_cursor, Some(Value::Int(1)));

    let calls = exec.recorded();
    assert_eq!(calls[0].0, "SELECT * FROM `users` ORDER BY `id` LIMIT 11");
    assert!(calls[0].1.is_empty());
}

#[tokio::test]
async fn keyset_second_page_uses_cursor_predicate() {
    let exec = ScriptedExecutor::new(vec![Reply::Rows((11..=20).map(id_row).collect())]);

    let page = qb::select(["*"])
        .from("users")
        .keyset_paginate(&exec, "id", Some(Value::Int(10)), 10, SortDirection::Asc)
        .await
        .unwrap();

    assert!(!page.has_more);
    assert_eq!(page.data.len(), 10);
    assert_eq!(page.next_cursor, None);
    assert_eq!(page.prev_cursor, Some(Value::Int(11)));

    let calls = exec.recorded();
    assert_eq!(
        calls[0].0,
        "SELECT * FROM `users` WHERE `id` > ? ORDER BY `id` LIMIT 11"
    );
    assert_eq!(calls[0].1, vec![Value::Int(10)]);
}

#[tokio::test]
async fn keyset_descending_flips_predicate_and_order() {
    let exec = ScriptedExecutor::new(vec![Reply::Rows((1..=3).rev().map(id_row).collect())]);

    let page = qb::select(["*"])
        .from("users")
        .keyset_paginate(&exec, "id", Some(Value::Int(4)), 10, SortDirection::Desc)
        .await
        .unwrap();

    assert!(!page.has_more);
    assert_eq!(page.prev_cursor, Some(Value::Int(3)));

    let calls = exec.recorded();
    assert_eq!(
        calls[0].0,
        "SELECT * FROM `users` WHERE `id` < ? ORDER BY `id` DESC LIMIT 11"
    );
}

#[tokio::test]
async fn keyset_empty_result_has_no_cursors() {
    let exec = ScriptedExecutor::empty();

    let page = qb::select(["*"])
        .from("users")
        .keyset_paginate(&exec, "id", None, 10, SortDirection::Asc)
        .await
        .unwrap();

    assert!(!page.has_more);
    assert!(page.data.is_empty());
    assert_eq!(page.next_cursor, None);
    assert_eq!(page.prev_cursor, None);
}

#[tokio::test]
async fn sum_over_no_rows_is_zero() {
    // Empty result set entirely.
    let exec = ScriptedExecutor::empty();
    let sum = qb::select(["*"])
        .from("users")
        .and_eq("status", "missing")
        .sum(&exec, "age")
        .await
        .unwrap();
    assert_eq!(sum, 0.0);

    // NULL aggregate from the engine.
    let exec = ScriptedExecutor::new(vec![Reply::Rows(vec![aggregate_row(Value::Null)])]);
    let sum = qb::select(["*"]).from("users").sum(&exec, "age").await.unwrap();
    assert_eq!(sum, 0.0);
}

#[tokio::test]
async fn avg_decodes_numeric_text() {
    let exec =
        ScriptedExecutor::new(vec![Reply::Rows(vec![aggregate_row(Value::Text(
            "24.5".into(),
        ))])]);
    let avg = qb::select(["*"]).from("users").avg(&exec, "age").await.unwrap();
    assert_eq!(avg, 24.5);
}

#[tokio::test]
async fn count_uses_aggregate_alias() {
    let exec = ScriptedExecutor::new(vec![Reply::Rows(vec![aggregate_row(Value::Int(3))])]);
    let count = qb::select(["*"])
        .from("users")
        .and_eq("status", "active")
        .count(&exec)
        .await
        .unwrap();
    assert_eq!(count, 3);

    let calls = exec.recorded();
    assert_eq!(
        calls[0].0,
        "SELECT COUNT(*) AS `aggregate` FROM `users` WHERE `status` = ?"
    );
}

#[tokio::test]
async fn exists_wraps_limited_statement() {
    let exec = ScriptedExecutor::new(vec![Reply::Rows(vec![Row::from_pairs([(
        "exists".to_string(),
        Value::Bool(true),
    )])])]);

    let exists = qb::select(["*"])
        .from("users")
        .and_eq("id", 1)
        .exists(&exec)
        .await
        .unwrap();
    assert!(exists);

    let calls = exec.recorded();
    assert_eq!(
        calls[0].0,
        "SELECT EXISTS(SELECT * FROM `users` WHERE `id` = ? LIMIT 1)"
    );
}

#[tokio::test]
async fn fetch_one_on_empty_result_is_not_found() {
    let exec = ScriptedExecutor::empty();
    let err = qb::select(["*"])
        .from("users")
        .and_eq("id", 42)
        .fetch_one::<Row>(&exec)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn fetch_all_decodes_typed_records() {
    #[derive(Debug, PartialEq)]
    struct User {
        id: i64,
        name: String,
    }

    impl FromRow for User {
        fn from_row(row: &Row) -> CraftResult<Self> {
            Ok(User {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
            })
        }
    }

    let exec = ScriptedExecutor::new(vec![Reply::Rows(vec![
        Row::from_pairs([
            ("id".to_string(), Value::Int(1)),
            ("name".to_string(), Value::Text("A".into())),
        ]),
        Row::from_pairs([
            ("id".to_string(), Value::Int(2)),
            ("name".to_string(), Value::Text("B".into())),
        ]),
    ])]);

    let users: Vec<User> = qb::select(["*"]).from("users").fetch_all(&exec).await.unwrap();
    assert_eq!(
        users,
        vec![
            User {
                id: 1,
                name: "A".into()
            },
            User {
                id: 2,
                name: "B".into()
            }
        ]
    );
}

#[tokio::test]
async fn rows_coerce_utf8_bytes_to_text() {
    let exec = ScriptedExecutor::new(vec![Reply::Rows(vec![Row::from_pairs([
        ("name".to_string(), Value::Bytes(b"alice".to_vec())),
        ("blob".to_string(), Value::Bytes(vec![0xff, 0xfe])),
    ])])]);

    let rows = qb::select(["*"]).from("users").rows(&exec).await.unwrap();
    assert_eq!(rows[0].get("name"), Some(&Value::Text("alice".into())));
    assert_eq!(rows[0].get("blob"), Some(&Value::Bytes(vec![0xff, 0xfe])));
}

#[tokio::test]
async fn field_narrows_columns_without_touching_original() {
    let exec = ScriptedExecutor::new(vec![Reply::Rows(vec![Row::from_pairs([(
        "email".to_string(),
        Value::Text("a@x.com".into()),
    )])])]);

    let query = qb::select(["*"]).from("users").and_eq("id", 1);
    let email = query.field(&exec, "email").await.unwrap();
    assert_eq!(email, Value::Text("a@x.com".into()));

    // The narrowing happened on a copy; the original still selects *.
    assert_eq!(query.to_sql().0, "SELECT * FROM `users` WHERE `id` = ?");

    let calls = exec.recorded();
    assert_eq!(calls[0].0, "SELECT `email` FROM `users` WHERE `id` = ?");
}

#[tokio::test]
async fn pluck_collects_single_column() {
    let exec = ScriptedExecutor::new(vec![Reply::Rows(vec![
        Row::from_pairs([("name".to_string(), Value::Text("A".into()))]),
        Row::from_pairs([("name".to_string(), Value::Text("B".into()))]),
    ])]);

    let names = qb::select(["*"]).from("users").pluck(&exec, "name").await.unwrap();
    assert_eq!(
        names,
        vec![Value::Text("A".into()), Value::Text("B".into())]
    );
}

#[tokio::test]
async fn insert_round_trip_through_collecting_executor() {
    let exec = ScriptedExecutor::empty();

    qb::insert("t")
        .columns(["name", "email"])
        .values(("A", "a@x.com"))
        .execute(&exec)
        .await
        .unwrap();

    let calls = exec.recorded();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "INSERT INTO `t` (`name`, `email`) VALUES (?, ?)");
    assert_eq!(
        calls[0].1,
        vec![Value::Text("A".into()), Value::Text("a@x.com".into())]
    );
}

#[tokio::test]
async fn exec_return_id_reports_driver_id() {
    let exec = ScriptedExecutor::new(vec![Reply::Exec(ExecResult {
        rows_affected: 1,
        last_insert_id: Some(7),
    })]);

    let id = qb::insert("t")
        .columns(["name"])
        .values(("A",))
        .exec_return_id(&exec)
        .await
        .unwrap();
    assert_eq!(id, 7);
}

#[tokio::test]
async fn exec_return_id_surfaces_execution_failure() {
    let exec = ScriptedExecutor::new(vec![Reply::Fail("duplicate key".into())]);

    let err = qb::insert("t")
        .columns(["name"])
        .values(("A",))
        .exec_return_id(&exec)
        .await
        .unwrap_err();
    assert!(matches!(err, CraftError::Other(ref m) if m == "duplicate key"));
}

#[tokio::test]
async fn exec_return_id_without_driver_support_errors() {
    let exec = ScriptedExecutor::new(vec![Reply::Exec(ExecResult {
        rows_affected: 1,
        last_insert_id: None,
    })]);

    let err = qb::insert("t")
        .columns(["name"])
        .values(("A",))
        .exec_return_id(&exec)
        .await
        .unwrap_err();
    assert!(matches!(err, CraftError::Unsupported(_)));
}

#[tokio::test]
async fn update_and_delete_execute_with_aligned_args() {
    let exec = ScriptedExecutor::new(vec![
        Reply::Exec(ExecResult {
            rows_affected: 2,
            last_insert_id: None,
        }),
        Reply::Exec(ExecResult {
            rows_affected: 1,
            last_insert_id: None,
        }),
    ]);

    let updated = qb::update("users")
        .set("status", "archived")
        .and_where("last_login", "<", "2024-01-01")
        .execute(&exec)
        .await
        .unwrap();
    assert_eq!(updated.rows_affected, 2);

    let deleted = qb::delete("users")
        .and_eq("id", 9)
        .execute(&exec)
        .await
        .unwrap();
    assert_eq!(deleted.rows_affected, 1);

    let calls = exec.recorded();
    assert_eq!(
        calls[0].0,
        "UPDATE `users` SET `status` = ? WHERE `last_login` < ?"
    );
    assert_eq!(calls[1].0, "DELETE FROM `users` WHERE `id` = ?");
}

#[tokio::test]
async fn logged_executor_observes_calls_and_errors() {
    #[derive(Default)]
    struct CountingLogger {
        calls: Mutex<Vec<(String, usize, bool)>>,
    }

    impl QueryLogger for CountingLogger {
        fn log_query(
            &self,
            sql: &str,
            args: &[Value],
            _elapsed: Duration,
            error: Option<&CraftError>,
        ) {
            self.calls
                .lock()
                .unwrap()
                .push((sql.to_string(), args.len(), error.is_some()));
        }
    }

    let scripted = ScriptedExecutor::new(vec![
        Reply::Rows(vec![id_row(1)]),
        Reply::Fail("boom".into()),
    ]);
    let logger = CountingLogger::default();
    let logged = LoggedExecutor::new(scripted, &logger);

    qb::select(["*"])
        .from("users")
        .and_eq("id", 1)
        .query(&logged)
        .await
        .unwrap();
    qb::select(["*"]).from("users").query(&logged).await.unwrap_err();

    let observed = logger.calls.lock().unwrap().clone();
    assert_eq!(observed.len(), 2);
    assert_eq!(
        observed[0],
        ("SELECT * FROM `users` WHERE `id` = ?".to_string(), 1, false)
    );
    assert_eq!(observed[1], ("SELECT * FROM `users`".to_string(), 0, true));
}
