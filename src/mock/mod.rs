//! In-memory collaborators for testing sessions and migrations without a
//! database.

mod executor;
mod migrator;

pub use executor::MockExecutor;
pub use migrator::MockMigrator;
