//! SchemaMigrator rendering DDL with sea-query.

use async_trait::async_trait;
use sea_query::{
    Alias, ColumnDef, Expr, ForeignKey, ForeignKeyAction, ForeignKeyCreateStatement, Table,
};
use tracing::debug;

use crate::dialect::Dialect;
use crate::interfaces::executor::StatementExecutor;
use crate::interfaces::migrator::{
    ColumnSpec, ColumnType, MigrationError, OnDelete, Reference, Result, SchemaMigrator,
};

use super::resolve_parent_key;

/// Migrator issuing `CREATE TABLE` / `ALTER TABLE` on an executor.
///
/// Foreign keys marked `ParanoidCascade` get a plain constraint with no
/// `ON DELETE` action; wrap in `ParanoidCascade` for the trigger.
///
/// sea-query statements are not `Send`, so each one is rendered to a string
/// before the first await.
pub struct SqlMigrator<E> {
    executor: E,
    dialect: Dialect,
}

impl<E: StatementExecutor> SqlMigrator<E> {
    pub fn new(executor: E, dialect: Dialect) -> Self {
        Self { executor, dialect }
    }

    async fn run(&self, sql: String) -> Result<()> {
        debug!(%sql, "migration statement");
        self.executor.execute(&sql).await?;
        Ok(())
    }

    fn foreign_key(
        &self,
        table: &str,
        column: &str,
        reference: &Reference,
        on_delete: Option<OnDelete>,
    ) -> ForeignKeyCreateStatement {
        let parent_key = resolve_parent_key(reference, None);
        let mut fk = ForeignKey::create();
        fk.name(format!("fk_{}_{}", table, column))
            .from(Alias::new(table), Alias::new(column))
            .to(Alias::new(reference.table()), Alias::new(parent_key));
        if let Some(action) = on_delete.and_then(foreign_key_action) {
            fk.on_delete(action);
        }
        fk
    }
}

#[async_trait]
impl<E: StatementExecutor> SchemaMigrator for SqlMigrator<E> {
    async fn add_column(&self, table: &str, column: &str, spec: &ColumnSpec) -> Result<()> {
        let alter = self.dialect.build_table_alter(
            &Table::alter()
                .table(Alias::new(table))
                .add_column(&mut column_def(column, spec))
                .to_owned(),
        );
        let fk = spec.references.as_ref().map(|reference| {
            self.dialect
                .build_foreign_key(&self.foreign_key(table, column, reference, spec.on_delete))
        });

        self.run(alter).await?;
        if let Some(fk) = fk {
            self.run(fk).await?;
        }
        Ok(())
    }

    async fn create_table(&self, table: &str, columns: &[(String, ColumnSpec)]) -> Result<()> {
        if columns.is_empty() {
            return Err(MigrationError::EmptyTable(table.to_string()));
        }

        let sql = {
            let mut create = Table::create();
            create.table(Alias::new(table));
            for (column, spec) in columns {
                create.col(&mut column_def(column, spec));
                if let Some(reference) = &spec.references {
                    create.foreign_key(&mut self.foreign_key(table, column, reference, spec.on_delete));
                }
            }
            self.dialect.build_table_create(&create)
        };

        self.run(sql).await
    }

    async fn remove_column(&self, table: &str, column: &str) -> Result<()> {
        let sql = self.dialect.build_table_alter(
            &Table::alter()
                .table(Alias::new(table))
                .drop_column(Alias::new(column))
                .to_owned(),
        );
        self.run(sql).await
    }

    async fn drop_table(&self, table: &str) -> Result<()> {
        let sql = self.dialect.build_table_drop(&Table::drop().table(Alias::new(table)).to_owned());
        self.run(sql).await
    }

    async fn execute(&self, sql: &str) -> Result<()> {
        self.run(sql.to_string()).await
    }

    fn connection(&self) -> &dyn StatementExecutor {
        &self.executor
    }
}

fn column_def(name: &str, spec: &ColumnSpec) -> ColumnDef {
    let mut def = ColumnDef::new(Alias::new(name));
    match spec.column_type {
        ColumnType::Integer => def.integer(),
        ColumnType::BigInteger => def.big_integer(),
        ColumnType::String(Some(len)) => def.string_len(len),
        ColumnType::String(None) => def.string(),
        ColumnType::Text => def.text(),
        ColumnType::Boolean => def.boolean(),
        ColumnType::Timestamp => def.timestamp(),
        ColumnType::Uuid => def.uuid(),
    };
    // Primary keys are never nullable.
    if spec.primary_key {
        def.primary_key().not_null();
    } else if spec.nullable {
        def.null();
    } else {
        def.not_null();
    }
    if let Some(default) = &spec.default {
        def.default(Expr::cust(default.clone()));
    }
    def
}

/// Database-level action; `ParanoidCascade` has none.
fn foreign_key_action(on_delete: OnDelete) -> Option<ForeignKeyAction> {
    match on_delete {
        OnDelete::Cascade => Some(ForeignKeyAction::Cascade),
        OnDelete::Restrict => Some(ForeignKeyAction::Restrict),
        OnDelete::NoAction => Some(ForeignKeyAction::NoAction),
        OnDelete::SetNull => Some(ForeignKeyAction::SetNull),
        OnDelete::SetDefault => Some(ForeignKeyAction::SetDefault),
        OnDelete::ParanoidCascade => None,
    }
}
