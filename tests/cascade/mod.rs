//! Cascade scenario shared by the live database tests.
//!
//! Builds `customers <- orders <- invoices`, installs the first trigger
//! interactively and the second through the migration decorator, then
//! soft-deletes a customer and checks the timestamp reached both levels.

use std::sync::Arc;

use paranoid_cascade::config::FilterConfig;
use paranoid_cascade::dialect::Dialect;
use paranoid_cascade::interfaces::{
    ColumnSpec, ColumnType, OnDelete, Reference, SchemaMigrator, StatementExecutor,
};
use paranoid_cascade::migration::{paranoid_cascade, CascadeOptions, SqlMigrator};
use paranoid_cascade::session::{run, Session};
use paranoid_cascade::trigger::TriggerBuilder;

fn column(column_type: ColumnType) -> ColumnSpec {
    ColumnSpec::new(column_type)
}

fn soft_delete_table(extra: Vec<(String, ColumnSpec)>) -> Vec<(String, ColumnSpec)> {
    let mut columns = vec![("id".to_string(), column(ColumnType::Integer).primary_key())];
    columns.extend(extra);
    columns.push(("deletedAt".to_string(), column(ColumnType::Timestamp)));
    columns
}

async fn count(executor: &dyn StatementExecutor, sql: &str) -> String {
    executor
        .fetch_scalar(sql)
        .await
        .expect("count query failed")
        .unwrap_or_default()
}

pub async fn run_cascade_scenario(executor: Arc<dyn StatementExecutor>, dialect: Dialect, schema: &str) {
    let q = |ident: &str| dialect.quote(ident);

    println!("  creating customers and orders...");
    let migrator = SqlMigrator::new(Arc::clone(&executor), dialect);
    migrator
        .create_table("customers", &soft_delete_table(Vec::new()))
        .await
        .expect("create customers");
    migrator
        .create_table(
            "orders",
            &soft_delete_table(vec![(
                "customer_id".to_string(),
                column(ColumnType::Integer).references(Reference::Table("customers".into())),
            )]),
        )
        .await
        .expect("create orders");

    println!("  interactive session: y, c...");
    let mut session = Session::new(
        Arc::clone(&executor),
        TriggerBuilder::new(dialect, "deletedAt"),
        FilterConfig::for_schema(schema),
    );
    let mut transcript = Vec::new();
    let report = run(&mut session, &b"y\nc\n"[..], &mut transcript)
        .await
        .expect("first session");
    println!("{}", String::from_utf8_lossy(&transcript));
    assert_eq!(report.created, 1);
    assert_eq!(report.pending, 0);

    println!("  second session finds the relation covered...");
    let mut session = Session::new(
        Arc::clone(&executor),
        TriggerBuilder::new(dialect, "deletedAt"),
        FilterConfig::for_schema(schema),
    );
    let report = run(&mut session, &b"y\n"[..], &mut Vec::new())
        .await
        .expect("second session");
    assert_eq!(report.created, 0);
    assert_eq!(report.covered, 1);

    println!("  creating invoices through the migration decorator...");
    let decorated = paranoid_cascade(
        SqlMigrator::new(Arc::clone(&executor), dialect),
        CascadeOptions::new(dialect),
    );
    decorated
        .create_table(
            "invoices",
            &soft_delete_table(vec![(
                "order_id".to_string(),
                column(ColumnType::Integer)
                    .references(Reference::Table("orders".into()))
                    .on_delete(OnDelete::ParanoidCascade),
            )]),
        )
        .await
        .expect("create invoices");

    println!("  soft-deleting customer 1...");
    for sql in [
        format!("INSERT INTO {} ({}) VALUES (1)", q("customers"), q("id")),
        format!("INSERT INTO {} ({}) VALUES (2)", q("customers"), q("id")),
        format!(
            "INSERT INTO {} ({}, {}) VALUES (10, 1), (20, 2)",
            q("orders"),
            q("id"),
            q("customer_id")
        ),
        format!(
            "INSERT INTO {} ({}, {}) VALUES (100, 10), (200, 20)",
            q("invoices"),
            q("id"),
            q("order_id")
        ),
        format!(
            "UPDATE {} SET {} = CURRENT_TIMESTAMP WHERE {} = 1",
            q("customers"),
            q("deletedAt"),
            q("id")
        ),
    ] {
        executor.execute(&sql).await.expect("fixture statement");
    }

    let deleted = |table: &str| {
        format!(
            "SELECT COUNT(*) FROM {} WHERE {} IS NOT NULL",
            q(table),
            q("deletedAt")
        )
    };
    assert_eq!(count(executor.as_ref(), &deleted("orders")).await, "1");
    assert_eq!(count(executor.as_ref(), &deleted("invoices")).await, "1");

    // Soft-deleting again leaves children alone: the guard needs OLD IS NULL.
    executor
        .execute(&format!(
            "UPDATE {} SET {} = NULL WHERE {} = 10",
            q("orders"),
            q("deletedAt"),
            q("id")
        ))
        .await
        .expect("restore order");
    executor
        .execute(&format!(
            "UPDATE {} SET {} = CURRENT_TIMESTAMP WHERE {} = 1",
            q("customers"),
            q("deletedAt"),
            q("id")
        ))
        .await
        .expect("touch customer");
    assert_eq!(count(executor.as_ref(), &deleted("orders")).await, "0");

    println!("  cascade scenario passed");
}
