//! SQL-building walkthrough: renders statements without touching a database.
//!
//! Run with: `cargo run --example builder`

use sqlcraft::{Craft, SqlStatement, Value, qb};

fn show(label: &str, (sql, args): (String, Vec<Value>)) {
    println!("{label}:\n  {sql}\n  args: {args:?}\n");
}

fn main() {
    // Basic SELECT with composed predicates.
    show(
        "select",
        qb::select(["id", "name", "email"])
            .from("users")
            .and_eq("status", "active")
            .and_group(|g| g.and_where("age", ">=", 18).or_is_null("age"))
            .order_by_desc("created_at")
            .limit(20)
            .to_sql(),
    );

    // Joins quote bare identifier paths; aliases stay bare.
    show(
        "join",
        qb::select(["o.id", "u.name"])
            .from("orders o")
            .join("users u", "o.user_id = u.id")
            .and_where("o.total", ">", 100)
            .to_sql(),
    );

    // Conditional composition without breaking the chain.
    let min_age: Option<i64> = None;
    show(
        "conditional",
        qb::select(["*"])
            .from("users")
            .when(min_age.is_some(), "age", ">=", min_age.unwrap_or(0))
            .when_func(true, |q| q.and_is_not_null("email"))
            .to_sql(),
    );

    // INSERT ... ON DUPLICATE KEY UPDATE.
    show(
        "upsert",
        qb::upsert("accounts")
            .columns(["email", "name", "visits"])
            .values(("a@x.com", "Alice", 1))
            .do_update_except(["email"])
            .to_sql(),
    );

    // UPDATE with increment and a WHERE IN list.
    show(
        "update",
        qb::update("posts")
            .increment("views", 1)
            .and_in("id", vec![1.into(), 2.into(), 3.into()])
            .to_sql(),
    );

    // The same API renders PostgreSQL syntax through the facade.
    show(
        "postgres",
        Craft::postgres()
            .select(["*"])
            .from("users")
            .and_eq("status", "active")
            .and_where("age", ">", 18)
            .to_sql(),
    );

    // Page two of ten rows each.
    show(
        "page",
        qb::select(["*"]).from("users").order_by("id").page(2, 10).to_sql(),
    );
}
