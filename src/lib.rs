//! Paranoid Cascade - soft-delete cascade triggers
//!
//! Installs database triggers that propagate a soft delete (setting the
//! `deletedAt` timestamp) from a parent row to the rows that reference it.
//! Triggers are installed either through an interactive session over an
//! existing schema, or by decorating a schema migrator so that columns
//! annotated `PARANOID CASCADE` get their trigger as they are created.

pub mod config;
pub mod dialect;
pub mod error;
pub mod interfaces;
pub mod introspect;
pub mod migration;
pub mod schema;
pub mod session;
pub mod sql;
pub mod trigger;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use config::{CascadeConfig, ConnectionConfig, FilterConfig};
pub use dialect::Dialect;
pub use error::{CascadeError, Result};
pub use introspect::{dedupe, ForeignKeyRelation, Introspector};
pub use migration::{paranoid_cascade, CascadeOptions, ParanoidCascade, SqlMigrator};
pub use session::{run, Session, SessionReport};
pub use trigger::{build_trigger_name, TriggerBuilder};
