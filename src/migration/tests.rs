use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::interfaces::migrator::{ColumnType, MigrationError};
use crate::mock::{MockExecutor, MockMigrator};

fn cascade_to(reference: Reference) -> ColumnSpec {
    ColumnSpec::new(ColumnType::Integer)
        .references(reference)
        .on_delete(OnDelete::ParanoidCascade)
}

fn setup(options: CascadeOptions) -> (Arc<MockExecutor>, ParanoidCascade<MockMigrator>) {
    let executor = Arc::new(MockExecutor::new());
    let migrator = paranoid_cascade(MockMigrator::new(Arc::clone(&executor)), options);
    (executor, migrator)
}

#[test]
fn test_resolve_parent_key_precedence() {
    let resolver: PrimaryKeyResolver = Arc::new(|table: &str| format!("{}_pk", table));

    let explicit = Reference::Model {
        model: "customers".into(),
        key: Some("uuid".into()),
    };
    assert_eq!(resolve_parent_key(&explicit, Some(&resolver)), "uuid");

    let bare = Reference::Table("customers".into());
    assert_eq!(resolve_parent_key(&bare, Some(&resolver)), "customers_pk");
    assert_eq!(resolve_parent_key(&bare, None), "id");
}

#[tokio::test]
async fn test_add_column_defaults_to_id() {
    let (executor, migrator) = setup(CascadeOptions::new(Dialect::Mysql));

    migrator
        .add_column("orders", "customer_id", &cascade_to(Reference::Table("customers".into())))
        .await
        .unwrap();

    let statements = executor.trigger_statements().await;
    assert_eq!(statements.len(), 1);
    assert!(statements[0].contains("`on_customers_delete_update_orders` AFTER UPDATE ON `customers`"));
    assert!(statements[0].contains("WHERE `orders`.`customer_id` = NEW.`id`"));
}

#[tokio::test]
async fn test_add_column_uses_resolver() {
    let (executor, migrator) = setup(
        CascadeOptions::new(Dialect::Mysql).with_primary_key(|table| format!("{}_uuid", table)),
    );

    migrator
        .add_column("orders", "customer_id", &cascade_to(Reference::Table("customers".into())))
        .await
        .unwrap();

    let statements = executor.trigger_statements().await;
    assert_eq!(statements.len(), 1);
    assert!(statements[0].contains("= NEW.`customers_uuid`"));
}

#[tokio::test]
async fn test_add_column_explicit_key_beats_resolver() {
    let (executor, migrator) =
        setup(CascadeOptions::new(Dialect::Postgres).with_primary_key(|_| "ignored".to_string()));

    let reference = Reference::Model {
        model: "customers".into(),
        key: Some("code".into()),
    };
    migrator
        .add_column("orders", "customer_code", &cascade_to(reference))
        .await
        .unwrap();

    let statements = executor.trigger_statements().await;
    assert!(statements[0].contains("\"orders\".\"customer_code\" = NEW.\"code\""));
}

#[tokio::test]
async fn test_add_column_trigger_follows_schema_change() {
    let (executor, migrator) = setup(CascadeOptions::default());

    migrator
        .add_column("orders", "customer_id", &cascade_to(Reference::Table("customers".into())))
        .await
        .unwrap();

    let journal = executor.journal().await;
    assert_eq!(journal.len(), 2);
    assert_eq!(journal[0], "add_column orders.customer_id");
    assert!(journal[1].starts_with("CREATE TRIGGER"));
}

#[tokio::test]
async fn test_add_column_without_annotation_creates_nothing() {
    let (executor, migrator) = setup(CascadeOptions::default());

    let plain = ColumnSpec::new(ColumnType::Integer)
        .references(Reference::Table("customers".into()))
        .on_delete(OnDelete::Cascade);
    migrator.add_column("orders", "customer_id", &plain).await.unwrap();

    // Annotation without a reference is ignored too.
    let dangling = ColumnSpec::new(ColumnType::Integer).on_delete(OnDelete::ParanoidCascade);
    migrator.add_column("orders", "other_id", &dangling).await.unwrap();

    assert!(executor.trigger_statements().await.is_empty());
}

#[tokio::test]
async fn test_add_column_failure_skips_trigger() {
    let (executor, migrator) = setup(CascadeOptions::default());
    migrator.inner().set_fail_on_add_column(true).await;

    let result = migrator
        .add_column("orders", "customer_id", &cascade_to(Reference::Table("customers".into())))
        .await;

    assert!(matches!(result, Err(MigrationError::Rejected(_))));
    assert!(executor.journal().await.is_empty());
}

#[tokio::test]
async fn test_trigger_failure_propagates() {
    let (executor, migrator) = setup(CascadeOptions::default());
    executor.add_trigger("on_customers_delete_update_orders").await;

    let result = migrator
        .add_column("orders", "customer_id", &cascade_to(Reference::Table("customers".into())))
        .await;

    // No existence check on this path: the duplicate reaches the database.
    assert!(matches!(result, Err(MigrationError::Statement(_))));
}

#[tokio::test]
async fn test_create_table_installs_one_trigger_per_annotation() {
    let (executor, migrator) = setup(CascadeOptions::default());
    executor.set_trigger_barrier(2).await;

    let columns = vec![
        ("id".to_string(), ColumnSpec::new(ColumnType::Integer).primary_key()),
        (
            "customer_id".to_string(),
            cascade_to(Reference::Table("customers".into())),
        ),
        (
            "warehouse_id".to_string(),
            cascade_to(Reference::Table("warehouses".into())),
        ),
        (
            "deletedAt".to_string(),
            ColumnSpec::new(ColumnType::Timestamp),
        ),
    ];

    // Both statements must be in flight together to pass the barrier.
    tokio::time::timeout(
        Duration::from_secs(5),
        migrator.create_table("orders", &columns),
    )
    .await
    .expect("trigger statements ran sequentially")
    .unwrap();

    let journal = executor.journal().await;
    assert_eq!(journal[0], "create_table orders (id, customer_id, warehouse_id, deletedAt)");

    let statements = executor.trigger_statements().await;
    assert_eq!(statements.len(), 2);
    assert!(statements
        .iter()
        .any(|sql| sql.contains("`on_customers_delete_update_orders`")
            && sql.contains("`orders`.`customer_id` = NEW.`id`")));
    assert!(statements
        .iter()
        .any(|sql| sql.contains("`on_warehouses_delete_update_orders`")
            && sql.contains("`orders`.`warehouse_id` = NEW.`id`")));
}

#[tokio::test]
async fn test_create_table_failure_skips_triggers() {
    let (executor, migrator) = setup(CascadeOptions::default());
    migrator.inner().set_fail_on_create_table(true).await;

    let columns = vec![(
        "customer_id".to_string(),
        cascade_to(Reference::Table("customers".into())),
    )];
    assert!(migrator.create_table("orders", &columns).await.is_err());
    assert!(executor.trigger_statements().await.is_empty());
}

#[tokio::test]
async fn test_other_operations_pass_through() {
    let (executor, migrator) = setup(CascadeOptions::default());

    migrator.remove_column("orders", "note").await.unwrap();
    migrator.drop_table("legacy").await.unwrap();
    migrator.execute("SELECT 1").await.unwrap();
    migrator.connection().execute("SELECT 2").await.unwrap();

    assert_eq!(
        executor.journal().await,
        vec![
            "remove_column orders.note",
            "drop_table legacy",
            "SELECT 1",
            "SELECT 2"
        ]
    );
}

#[tokio::test]
async fn test_sql_migrator_renders_ddl() {
    let executor = Arc::new(MockExecutor::new());
    let migrator = SqlMigrator::new(Arc::clone(&executor), Dialect::Postgres);

    let columns = vec![
        ("id".to_string(), ColumnSpec::new(ColumnType::Integer).primary_key()),
        (
            "customer_id".to_string(),
            cascade_to(Reference::Table("customers".into())),
        ),
    ];
    migrator.create_table("orders", &columns).await.unwrap();

    let journal = executor.journal().await;
    assert_eq!(journal.len(), 1);
    assert!(journal[0].starts_with("CREATE TABLE \"orders\""));
    assert!(journal[0].contains("REFERENCES \"customers\" (\"id\")"));
    // The soft-delete cascade is not a database action.
    assert!(!journal[0].contains("ON DELETE"));
}

#[tokio::test]
async fn test_sql_migrator_add_column_with_foreign_key() {
    let executor = Arc::new(MockExecutor::new());
    let migrator = SqlMigrator::new(Arc::clone(&executor), Dialect::Mysql);

    let spec = ColumnSpec::new(ColumnType::Integer)
        .references(Reference::Table("customers".into()))
        .on_delete(OnDelete::SetNull);
    migrator.add_column("orders", "customer_id", &spec).await.unwrap();

    let journal = executor.journal().await;
    assert_eq!(journal.len(), 2);
    assert!(journal[0].starts_with("ALTER TABLE `orders` ADD COLUMN `customer_id`"));
    assert!(journal[1].contains("FOREIGN KEY (`customer_id`) REFERENCES `customers` (`id`)"));
    assert!(journal[1].contains("ON DELETE SET NULL"));
}

#[tokio::test]
async fn test_sql_migrator_runs_on_spawned_tasks() {
    let executor = Arc::new(MockExecutor::new());
    let migrator = Arc::new(paranoid_cascade(
        SqlMigrator::new(Arc::clone(&executor), Dialect::Postgres),
        CascadeOptions::new(Dialect::Postgres),
    ));

    let create = tokio::spawn({
        let migrator = Arc::clone(&migrator);
        async move {
            let columns = vec![
                ("id".to_string(), ColumnSpec::new(ColumnType::Integer).primary_key()),
                ("customer_id".to_string(), cascade_to(Reference::Table("customers".into()))),
            ];
            migrator.create_table("orders", &columns).await
        }
    });
    create.await.unwrap().unwrap();

    let alter = tokio::spawn({
        let migrator = Arc::clone(&migrator);
        async move {
            let spec = cascade_to(Reference::Table("orders".into()));
            migrator.add_column("invoices", "order_id", &spec).await?;
            migrator.remove_column("invoices", "legacy").await?;
            migrator.drop_table("archive").await
        }
    });
    alter.await.unwrap().unwrap();

    let triggers = executor.triggers().await;
    assert!(triggers.contains("on_customers_delete_update_orders"));
    assert!(triggers.contains("on_orders_delete_update_invoices"));
    let journal = executor.journal().await;
    assert!(journal.iter().any(|sql| sql.starts_with("DROP TABLE \"archive\"")));
}

#[tokio::test]
async fn test_sql_migrator_rejects_empty_table() {
    let migrator = SqlMigrator::new(MockExecutor::new(), Dialect::Mysql);
    assert!(matches!(
        migrator.create_table("empty", &[]).await,
        Err(MigrationError::EmptyTable(_))
    ));
}

#[tokio::test]
async fn test_decorated_sql_migrator_end_to_end() {
    let executor = Arc::new(MockExecutor::new());
    let migrator = paranoid_cascade(
        SqlMigrator::new(Arc::clone(&executor), Dialect::Mysql),
        CascadeOptions::new(Dialect::Mysql),
    );

    let spec: ColumnSpec = serde_json::from_str(
        r#"{"type":"integer","references":{"model":"customers","key":"id"},"onDelete":"PARANOID CASCADE"}"#,
    )
    .unwrap();
    migrator.add_column("orders", "customer_id", &spec).await.unwrap();

    let journal = executor.journal().await;
    assert_eq!(journal.len(), 3);
    assert!(journal[0].starts_with("ALTER TABLE"));
    assert!(journal[1].contains("FOREIGN KEY"));
    assert!(journal[2].starts_with("CREATE TRIGGER `on_customers_delete_update_orders`"));
    assert!(executor
        .triggers()
        .await
        .contains("on_customers_delete_update_orders"));
}
