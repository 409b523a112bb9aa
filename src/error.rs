//! Error taxonomy for cascade sessions and migrations.

use crate::config::ConfigError;
use crate::interfaces::{ExecutorError, MigrationError};
use crate::introspect::ForeignKeyRelation;

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, CascadeError>;

/// Errors surfaced by the cascade tooling.
///
/// `Configuration`, `Setup` and `Io` end an interactive session.
/// `TriggerCreation` and `InvalidInput` are reported and the session carries on.
#[derive(Debug, thiserror::Error)]
pub enum CascadeError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("schema introspection failed: {0}")]
    Setup(#[source] ExecutorError),

    #[error("failed to create trigger for {relation}: {source}")]
    TriggerCreation {
        relation: ForeignKeyRelation,
        #[source]
        source: ExecutorError,
    },

    #[error("invalid option: {0:?}")]
    InvalidInput(String),

    #[error(transparent)]
    Migration(#[from] MigrationError),

    #[error("terminal error: {0}")]
    Io(#[from] std::io::Error),
}
