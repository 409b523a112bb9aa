//! Abstract interfaces for the external collaborators.
//!
//! These traits define the contracts for:
//! - Raw SQL execution (catalog queries, trigger installation)
//! - Schema migration (column and table creation)

pub mod executor;
pub mod migrator;

pub use executor::{ExecutorError, Record, StatementExecutor};
pub use migrator::{
    ColumnSpec, ColumnType, MigrationError, OnDelete, Reference, SchemaMigrator,
};
