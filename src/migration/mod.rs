//! Migration-time cascade triggers.
//!
//! `ParanoidCascade` wraps any `SchemaMigrator`. After a column or table is
//! created successfully, every column annotated with
//! `OnDelete::ParanoidCascade` gets a soft-delete cascade trigger on its
//! parent table. All other operations are forwarded untouched.
//!
//! No existence check happens on this path: declaring the same annotation in
//! two migrations installs the trigger twice, which the database rejects.

mod sql;

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use tracing::{debug, info, warn};

use crate::dialect::Dialect;
use crate::interfaces::executor::StatementExecutor;
use crate::interfaces::migrator::{
    ColumnSpec, OnDelete, Reference, Result, SchemaMigrator,
};
use crate::trigger::{build_trigger_name, TriggerBuilder, DEFAULT_SOFT_DELETE_COLUMN};

pub use sql::SqlMigrator;

/// Primary key column used when a reference names none and no resolver is set.
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// Maps a table name to its primary key column.
pub type PrimaryKeyResolver = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Options for `paranoid_cascade`.
#[derive(Clone)]
pub struct CascadeOptions {
    pub dialect: Dialect,
    pub soft_delete_column: String,
    pub get_primary_key: Option<PrimaryKeyResolver>,
}

impl Default for CascadeOptions {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            soft_delete_column: DEFAULT_SOFT_DELETE_COLUMN.to_string(),
            get_primary_key: None,
        }
    }
}

impl CascadeOptions {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }

    pub fn with_soft_delete_column(mut self, column: impl Into<String>) -> Self {
        self.soft_delete_column = column.into();
        self
    }

    pub fn with_primary_key<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.get_primary_key = Some(Arc::new(resolver));
        self
    }
}

/// Parent key for a reference: the explicit key, else the resolver's answer,
/// else `id`.
pub fn resolve_parent_key(reference: &Reference, resolver: Option<&PrimaryKeyResolver>) -> String {
    match (reference.key(), resolver) {
        (Some(key), _) => key.to_string(),
        (None, Some(resolve)) => resolve(reference.table()),
        (None, None) => DEFAULT_PRIMARY_KEY.to_string(),
    }
}

/// Wrap `migrator` so cascade annotations install triggers.
pub fn paranoid_cascade<M: SchemaMigrator>(migrator: M, options: CascadeOptions) -> ParanoidCascade<M> {
    ParanoidCascade::new(migrator, options)
}

/// Decorator adding soft-delete cascade triggers to a migrator.
pub struct ParanoidCascade<M> {
    inner: M,
    builder: TriggerBuilder,
    get_primary_key: Option<PrimaryKeyResolver>,
}

impl<M: SchemaMigrator> ParanoidCascade<M> {
    pub fn new(inner: M, options: CascadeOptions) -> Self {
        Self {
            inner,
            builder: TriggerBuilder::new(options.dialect, options.soft_delete_column),
            get_primary_key: options.get_primary_key,
        }
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }

    /// Trigger statement for one column, if it carries a cascade annotation.
    fn trigger_statement(&self, table: &str, column: &str, spec: &ColumnSpec) -> Option<String> {
        let Some(reference) = spec.paranoid_cascade() else {
            if spec.on_delete == Some(OnDelete::ParanoidCascade) {
                warn!(table, column, "PARANOID CASCADE without a reference; no trigger created");
            }
            return None;
        };

        let parent = reference.table();
        let parent_key = resolve_parent_key(reference, self.get_primary_key.as_ref());
        debug!(parent, %parent_key, table, column, "cascade annotation found");

        Some(
            self.builder
                .create_trigger_statement(parent, &parent_key, table, column),
        )
    }
}

#[async_trait]
impl<M: SchemaMigrator> SchemaMigrator for ParanoidCascade<M> {
    async fn add_column(&self, table: &str, column: &str, spec: &ColumnSpec) -> Result<()> {
        self.inner.add_column(table, column, spec).await?;

        if let Some(sql) = self.trigger_statement(table, column, spec) {
            self.inner.execute(&sql).await?;
            if let Some(reference) = spec.references.as_ref() {
                info!(
                    trigger = %build_trigger_name(reference.table(), table),
                    "cascade trigger created"
                );
            }
        }
        Ok(())
    }

    async fn create_table(&self, table: &str, columns: &[(String, ColumnSpec)]) -> Result<()> {
        self.inner.create_table(table, columns).await?;

        let statements: Vec<String> = columns
            .iter()
            .filter_map(|(column, spec)| self.trigger_statement(table, column, spec))
            .collect();
        if statements.is_empty() {
            return Ok(());
        }

        // Independent triggers; no ordering between them.
        try_join_all(statements.iter().map(|sql| self.inner.execute(sql))).await?;
        info!(table, triggers = statements.len(), "cascade triggers created");
        Ok(())
    }

    async fn remove_column(&self, table: &str, column: &str) -> Result<()> {
        self.inner.remove_column(table, column).await
    }

    async fn drop_table(&self, table: &str) -> Result<()> {
        self.inner.drop_table(table).await
    }

    async fn execute(&self, sql: &str) -> Result<()> {
        self.inner.execute(sql).await
    }

    fn connection(&self) -> &dyn StatementExecutor {
        self.inner.connection()
    }
}

#[cfg(test)]
mod tests;
