//! sqlx-backed statement execution.
//!
//! Pools for each enabled backend implement `StatementExecutor`. Everything
//! goes through `sqlx::raw_sql` (text protocol): MySQL refuses
//! `CREATE TRIGGER` as a prepared statement, and the PostgreSQL trigger
//! definition is two statements.

use std::sync::Arc;

use tracing::{error, info};

#[cfg(not(all(feature = "mysql", feature = "postgres")))]
use crate::config::ConfigError;
use crate::config::ConnectionConfig;
use crate::dialect::Dialect;
use crate::error::Result;
use crate::interfaces::executor::StatementExecutor;
#[cfg(any(feature = "mysql", feature = "postgres"))]
use crate::{error::CascadeError, interfaces::executor::ExecutorError};

/// Pool size. The migration path issues a table's trigger statements
/// concurrently; the interactive path uses one connection at a time.
#[cfg(any(feature = "mysql", feature = "postgres"))]
const MAX_CONNECTIONS: u32 = 4;

#[cfg(any(feature = "mysql", feature = "postgres"))]
macro_rules! impl_statement_executor {
    ($pool:ty, $row:ty) => {
        #[async_trait::async_trait]
        impl StatementExecutor for $pool {
            async fn execute(&self, sql: &str) -> crate::interfaces::executor::Result<()> {
                sqlx::raw_sql(sql).execute(self).await?;
                Ok(())
            }

            async fn fetch_all(
                &self,
                sql: &str,
            ) -> crate::interfaces::executor::Result<Vec<crate::interfaces::Record>> {
                use sqlx::{Column, Row};

                let rows: Vec<$row> = sqlx::raw_sql(sql).fetch_all(self).await?;
                rows.iter()
                    .map(|row| {
                        row.columns().iter().try_fold(
                            crate::interfaces::Record::new(),
                            |record, column| -> crate::interfaces::executor::Result<_> {
                                // Catalog columns use domain types (`sql_identifier`,
                                // `character_data`); text-protocol values decode as
                                // strings either way.
                                let value: Option<String> = row
                                    .try_get(column.ordinal())
                                    .or_else(|_| row.try_get_unchecked(column.ordinal()))?;
                                Ok(record.with(column.name(), value))
                            },
                        )
                    })
                    .collect()
            }
        }
    };
}

#[cfg(feature = "mysql")]
pub mod mysql {
    //! MySQL backend.

    use super::*;

    impl_statement_executor!(sqlx::MySqlPool, sqlx::mysql::MySqlRow);

    pub async fn connect(url: &str) -> std::result::Result<sqlx::MySqlPool, ExecutorError> {
        Ok(sqlx::mysql::MySqlPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(url)
            .await?)
    }
}

#[cfg(feature = "postgres")]
pub mod postgres {
    //! PostgreSQL backend.

    use super::*;

    impl_statement_executor!(sqlx::PgPool, sqlx::postgres::PgRow);

    pub async fn connect(url: &str) -> std::result::Result<sqlx::PgPool, ExecutorError> {
        Ok(sqlx::postgres::PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(url)
            .await?)
    }
}

/// Open a pool for the configured dialect.
pub async fn connect(config: &ConnectionConfig) -> Result<Arc<dyn StatementExecutor>> {
    let url = config.url()?;
    info!(dialect = %config.dialect, "connecting");

    let executor: Arc<dyn StatementExecutor> = match config.dialect {
        #[cfg(feature = "mysql")]
        Dialect::Mysql => Arc::new(mysql::connect(&url).await.map_err(connect_failed)?),
        #[cfg(not(feature = "mysql"))]
        Dialect::Mysql => {
            error!("MySQL requested but 'mysql' feature is not enabled");
            return Err(ConfigError::DialectDisabled(Dialect::Mysql).into());
        }
        #[cfg(feature = "postgres")]
        Dialect::Postgres => Arc::new(postgres::connect(&url).await.map_err(connect_failed)?),
        #[cfg(not(feature = "postgres"))]
        Dialect::Postgres => {
            error!("PostgreSQL requested but 'postgres' feature is not enabled");
            return Err(ConfigError::DialectDisabled(Dialect::Postgres).into());
        }
    };

    Ok(executor)
}

#[cfg(any(feature = "mysql", feature = "postgres"))]
fn connect_failed(err: ExecutorError) -> CascadeError {
    error!("connection failed: {}", err);
    CascadeError::Setup(err)
}
