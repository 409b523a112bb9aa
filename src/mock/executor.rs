//! Mock StatementExecutor for testing.
//!
//! Answers the catalog queries issued by the introspector and the trigger
//! existence check from an in-memory schema, and remembers the triggers
//! created through it so repeated sessions see them.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Barrier, RwLock};

use crate::interfaces::executor::{ExecutorError, Record, Result, StatementExecutor};
use crate::introspect::ForeignKeyRelation;

/// Mock executor backed by an in-memory catalog.
#[derive(Default)]
pub struct MockExecutor {
    soft_delete_tables: RwLock<BTreeSet<String>>,
    relations: RwLock<Vec<ForeignKeyRelation>>,
    triggers: RwLock<BTreeSet<String>>,
    journal: RwLock<Vec<String>>,
    fail_on_execute: RwLock<bool>,
    fail_on_fetch: RwLock<bool>,
    trigger_barrier: RwLock<Option<Arc<Barrier>>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_soft_delete_table(&self, table: &str) {
        self.soft_delete_tables.write().await.insert(table.to_string());
    }

    pub async fn add_relation(&self, relation: ForeignKeyRelation) {
        self.relations.write().await.push(relation);
    }

    /// Pretend a trigger was installed outside this executor.
    pub async fn add_trigger(&self, name: &str) {
        self.triggers.write().await.insert(name.to_string());
    }

    pub async fn set_fail_on_execute(&self, fail: bool) {
        *self.fail_on_execute.write().await = fail;
    }

    pub async fn set_fail_on_fetch(&self, fail: bool) {
        *self.fail_on_fetch.write().await = fail;
    }

    /// Hold every `CREATE TRIGGER` until `count` of them are in flight.
    pub async fn set_trigger_barrier(&self, count: usize) {
        *self.trigger_barrier.write().await = Some(Arc::new(Barrier::new(count)));
    }

    pub async fn triggers(&self) -> BTreeSet<String> {
        self.triggers.read().await.clone()
    }

    /// Every statement seen, in arrival order. Also carries entries written
    /// by `MockMigrator` for its own operations.
    pub async fn journal(&self) -> Vec<String> {
        self.journal.read().await.clone()
    }

    /// Executed `CREATE TRIGGER` statements only.
    pub async fn trigger_statements(&self) -> Vec<String> {
        self.journal
            .read()
            .await
            .iter()
            .filter(|sql| created_trigger_name(sql).is_some())
            .cloned()
            .collect()
    }

    pub async fn record(&self, entry: impl Into<String>) {
        self.journal.write().await.push(entry.into());
    }
}

#[async_trait]
impl StatementExecutor for MockExecutor {
    async fn execute(&self, sql: &str) -> Result<()> {
        if *self.fail_on_execute.read().await {
            return Err(ExecutorError::Database("mock execute failure".to_string()));
        }
        self.record(sql).await;

        if let Some(name) = created_trigger_name(sql) {
            let barrier = self.trigger_barrier.read().await.clone();
            if let Some(barrier) = barrier {
                barrier.wait().await;
            }

            let mut triggers = self.triggers.write().await;
            if !triggers.insert(name.clone()) {
                return Err(ExecutorError::Database(format!(
                    "trigger {} already exists",
                    name
                )));
            }
        }
        Ok(())
    }

    async fn fetch_all(&self, sql: &str) -> Result<Vec<Record>> {
        if *self.fail_on_fetch.read().await {
            return Err(ExecutorError::Database("mock fetch failure".to_string()));
        }
        self.record(sql).await;

        let quoted = |value: &str| sql.contains(&format!("'{}'", value));

        if sql.contains("triggers") {
            let triggers = self.triggers.read().await;
            return Ok(triggers
                .iter()
                .filter(|name| quoted(name))
                .map(|name| Record::new().with("trigger_name", Some(name.as_str())))
                .collect());
        }

        if sql.contains("key_column_usage") {
            let relations = self.relations.read().await;
            return Ok(relations
                .iter()
                .filter(|r| quoted(&r.table_name))
                .map(|r| {
                    Record::new()
                        .with("table_name", Some(r.table_name.as_str()))
                        .with("column_name", Some(r.column_name.as_str()))
                        .with("referenced_table_name", Some(r.referenced_table_name.as_str()))
                        .with("referenced_column_name", Some(r.referenced_column_name.as_str()))
                })
                .collect());
        }

        if sql.contains("columns") {
            let tables = self.soft_delete_tables.read().await;
            return Ok(tables
                .iter()
                .map(|t| Record::new().with("TABLE_NAME", Some(t.as_str())))
                .collect());
        }

        Ok(Vec::new())
    }
}

/// Name of the trigger a statement creates, without schema or quotes.
fn created_trigger_name(sql: &str) -> Option<String> {
    let (_, rest) = sql.split_once("CREATE TRIGGER ")?;
    let token = rest.split_whitespace().next()?;
    let name = token.rsplit('.').next()?;
    Some(name.trim_matches(|c| c == '`' || c == '"').to_string())
}
