//! Schema migration interface.
//!
//! Models the subset of a migration tool that cascade triggers hook into:
//! adding a column, creating a table, and running arbitrary SQL.

use async_trait::async_trait;
use serde::Deserialize;

use super::executor::{ExecutorError, StatementExecutor};

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrationError>;

/// Errors from migration operations.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("migration statement failed: {0}")]
    Statement(#[from] ExecutorError),

    #[error("table {0} has no columns")]
    EmptyTable(String),

    #[error("migration rejected: {0}")]
    Rejected(String),
}

/// Column data types understood by the reference migrator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    BigInteger,
    String(Option<u32>),
    Text,
    Boolean,
    Timestamp,
    Uuid,
}

/// Referential action on parent deletion.
///
/// `ParanoidCascade` is never sent to the database: it asks for a
/// soft-delete propagation trigger instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum OnDelete {
    #[serde(rename = "CASCADE")]
    Cascade,
    #[serde(rename = "RESTRICT")]
    Restrict,
    #[serde(rename = "NO ACTION")]
    NoAction,
    #[serde(rename = "SET NULL")]
    SetNull,
    #[serde(rename = "SET DEFAULT")]
    SetDefault,
    #[serde(rename = "PARANOID CASCADE")]
    ParanoidCascade,
}

/// Target of a foreign-key column.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Reference {
    /// Bare table name; the key is resolved later.
    Table(String),
    /// Table with an optional explicit key column.
    Model { model: String, key: Option<String> },
}

impl Reference {
    pub fn table(&self) -> &str {
        match self {
            Reference::Table(table) => table,
            Reference::Model { model, .. } => model,
        }
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            Reference::Table(_) => None,
            Reference::Model { key, .. } => key.as_deref(),
        }
    }
}

/// Column specification passed to `add_column` / `create_table`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSpec {
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub references: Option<Reference>,
    #[serde(default)]
    pub on_delete: Option<OnDelete>,
}

fn default_nullable() -> bool {
    true
}

impl ColumnSpec {
    pub fn new(column_type: ColumnType) -> Self {
        Self {
            column_type,
            nullable: true,
            primary_key: false,
            default: None,
            references: None,
            on_delete: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn references(mut self, reference: Reference) -> Self {
        self.references = Some(reference);
        self
    }

    pub fn on_delete(mut self, action: OnDelete) -> Self {
        self.on_delete = Some(action);
        self
    }

    /// The parent reference, when this column asks for a soft-delete cascade.
    pub fn paranoid_cascade(&self) -> Option<&Reference> {
        match self.on_delete {
            Some(OnDelete::ParanoidCascade) => self.references.as_ref(),
            _ => None,
        }
    }
}

/// Interface for schema migration.
///
/// Implementations:
/// - `SqlMigrator`: renders DDL with sea-query and runs it on an executor
/// - `ParanoidCascade`: decorator adding soft-delete cascade triggers
/// - `MockMigrator`: in-memory, for tests
#[async_trait]
pub trait SchemaMigrator: Send + Sync {
    /// Add a column to an existing table.
    async fn add_column(&self, table: &str, column: &str, spec: &ColumnSpec) -> Result<()>;

    /// Create a table. Columns are given in declaration order.
    async fn create_table(&self, table: &str, columns: &[(String, ColumnSpec)]) -> Result<()>;

    /// Remove a column from a table.
    async fn remove_column(&self, table: &str, column: &str) -> Result<()>;

    /// Drop a table.
    async fn drop_table(&self, table: &str) -> Result<()>;

    /// Run an arbitrary statement.
    async fn execute(&self, sql: &str) -> Result<()>;

    /// The raw execution capability behind this migrator.
    fn connection(&self) -> &dyn StatementExecutor;
}
