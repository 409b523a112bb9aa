//! Mock SchemaMigrator implementation for testing.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::interfaces::executor::StatementExecutor;
use crate::interfaces::migrator::{ColumnSpec, MigrationError, Result, SchemaMigrator};

use super::MockExecutor;

/// Mock migrator that journals its operations into a shared `MockExecutor`,
/// so tests can see schema changes and trigger statements in one sequence.
pub struct MockMigrator {
    executor: Arc<MockExecutor>,
    fail_on_add_column: RwLock<bool>,
    fail_on_create_table: RwLock<bool>,
}

impl MockMigrator {
    pub fn new(executor: Arc<MockExecutor>) -> Self {
        Self {
            executor,
            fail_on_add_column: RwLock::new(false),
            fail_on_create_table: RwLock::new(false),
        }
    }

    pub fn executor(&self) -> &Arc<MockExecutor> {
        &self.executor
    }

    pub async fn set_fail_on_add_column(&self, fail: bool) {
        *self.fail_on_add_column.write().await = fail;
    }

    pub async fn set_fail_on_create_table(&self, fail: bool) {
        *self.fail_on_create_table.write().await = fail;
    }
}

#[async_trait]
impl SchemaMigrator for MockMigrator {
    async fn add_column(&self, table: &str, column: &str, _spec: &ColumnSpec) -> Result<()> {
        if *self.fail_on_add_column.read().await {
            return Err(MigrationError::Rejected(format!("add_column {}.{}", table, column)));
        }
        self.executor
            .record(format!("add_column {}.{}", table, column))
            .await;
        Ok(())
    }

    async fn create_table(&self, table: &str, columns: &[(String, ColumnSpec)]) -> Result<()> {
        if *self.fail_on_create_table.read().await {
            return Err(MigrationError::Rejected(format!("create_table {}", table)));
        }
        let names: Vec<&str> = columns.iter().map(|(name, _)| name.as_str()).collect();
        self.executor
            .record(format!("create_table {} ({})", table, names.join(", ")))
            .await;
        Ok(())
    }

    async fn remove_column(&self, table: &str, column: &str) -> Result<()> {
        self.executor
            .record(format!("remove_column {}.{}", table, column))
            .await;
        Ok(())
    }

    async fn drop_table(&self, table: &str) -> Result<()> {
        self.executor.record(format!("drop_table {}", table)).await;
        Ok(())
    }

    async fn execute(&self, sql: &str) -> Result<()> {
        Ok(self.executor.execute(sql).await?)
    }

    fn connection(&self) -> &dyn StatementExecutor {
        self.executor.as_ref()
    }
}
