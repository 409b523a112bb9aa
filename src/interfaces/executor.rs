//! SQL execution interface.

use async_trait::async_trait;

/// Result type for statement execution.
pub type Result<T> = std::result::Result<T, ExecutorError>;

/// Errors that can occur while executing a statement.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("database error: {0}")]
    Database(String),

    #[error("column {column} could not be decoded: {message}")]
    Decode { column: String, message: String },

    #[error("connection error: {0}")]
    Connection(String),
}

#[cfg(any(feature = "mysql", feature = "postgres"))]
impl From<sqlx::Error> for ExecutorError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::ColumnDecode { index, source } => ExecutorError::Decode {
                column: index,
                message: source.to_string(),
            },
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                ExecutorError::Connection(err.to_string())
            }
            other => ExecutorError::Database(other.to_string()),
        }
    }
}

/// A result row with text-decoded columns, in select order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    columns: Vec<(String, Option<String>)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column. Builder-style, used by backends and mocks.
    pub fn with(mut self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        self.columns.push((name.into(), value.map(Into::into)));
        self
    }

    /// Look up a column by name, case-insensitively.
    ///
    /// MySQL reports `information_schema` column labels in upper case while
    /// PostgreSQL reports them in lower case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(column, _)| column.eq_ignore_ascii_case(name))
            .and_then(|(_, value)| value.as_deref())
    }

    /// First column's value, if any.
    pub fn scalar(&self) -> Option<&str> {
        self.columns.first().and_then(|(_, value)| value.as_deref())
    }
}

/// Interface for raw SQL execution.
///
/// Implementations:
/// - `PgPool` / `MySqlPool`: sqlx-backed execution
/// - `MockExecutor`: in-memory, for tests
#[async_trait]
pub trait StatementExecutor: Send + Sync {
    /// Execute a statement (possibly several, for dialects that need them)
    /// and discard any rows.
    async fn execute(&self, sql: &str) -> Result<()>;

    /// Execute a query and return every row.
    async fn fetch_all(&self, sql: &str) -> Result<Vec<Record>>;

    /// Execute a query and return the first column of the first row.
    ///
    /// `None` when the query yields no rows or a NULL.
    async fn fetch_scalar(&self, sql: &str) -> Result<Option<String>> {
        let rows = self.fetch_all(sql).await?;
        Ok(rows
            .first()
            .and_then(|row| row.scalar())
            .map(str::to_string))
    }
}

#[async_trait]
impl<T: StatementExecutor + ?Sized> StatementExecutor for std::sync::Arc<T> {
    async fn execute(&self, sql: &str) -> Result<()> {
        (**self).execute(sql).await
    }

    async fn fetch_all(&self, sql: &str) -> Result<Vec<Record>> {
        (**self).fetch_all(sql).await
    }

    async fn fetch_scalar(&self, sql: &str) -> Result<Option<String>> {
        (**self).fetch_scalar(sql).await
    }
}
