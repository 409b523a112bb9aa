//! Soft-delete cascade trigger statements.
//!
//! Builds the `CREATE TRIGGER` text that propagates a parent's tombstone to
//! its dependent rows, and the catalog query that tells whether that trigger
//! is already installed. Nothing here touches a connection.

use sea_query::{Expr, Query, SimpleExpr};
use sha2::{Digest, Sha256};

use crate::dialect::Dialect;
use crate::schema::{InformationSchema, Triggers};

/// Default soft-delete column.
pub const DEFAULT_SOFT_DELETE_COLUMN: &str = "deletedAt";

/// Longest trigger name either dialect stores unchanged.
///
/// PostgreSQL truncates identifiers to 63 bytes; MySQL rejects names over 64
/// characters.
pub const MAX_TRIGGER_NAME_LEN: usize = 63;

/// Hex digits of the pair hash kept in a shortened name.
const NAME_HASH_LEN: usize = 8;

/// Deterministic trigger name for a (parent, child) pair.
///
/// Doubles as the identity of a relation: at most one cascade trigger
/// exists per pair, however many child columns point at the parent.
/// Names longer than `MAX_TRIGGER_NAME_LEN` keep a prefix and end in a hash
/// of the full name, so the stored name is the one the existence check
/// looks for.
pub fn build_trigger_name(parent_table: &str, child_table: &str) -> String {
    let name = format!("on_{}_delete_update_{}", parent_table, child_table);
    if name.len() <= MAX_TRIGGER_NAME_LEN {
        return name;
    }

    let digest = hex::encode(Sha256::digest(name.as_bytes()));
    let mut cut = MAX_TRIGGER_NAME_LEN - NAME_HASH_LEN - 1;
    while !name.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}_{}", &name[..cut], &digest[..NAME_HASH_LEN])
}

/// Renders trigger statements for one dialect and soft-delete column.
///
/// Without a schema, statements name tables unqualified and the existence
/// check looks in the connection's current schema.
#[derive(Debug, Clone)]
pub struct TriggerBuilder {
    dialect: Dialect,
    soft_delete_column: String,
    schema: Option<String>,
}

impl TriggerBuilder {
    pub fn new(dialect: Dialect, soft_delete_column: impl Into<String>) -> Self {
        Self {
            dialect,
            soft_delete_column: soft_delete_column.into(),
            schema: None,
        }
    }

    /// Qualify every table, function and catalog lookup with `schema`.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn soft_delete_column(&self) -> &str {
        &self.soft_delete_column
    }

    /// `AFTER UPDATE` row trigger on `parent_table` that stamps
    /// `child_table` rows whose `child_key` equals `NEW.parent_key`, firing
    /// only when the parent's soft-delete column goes from NULL to non-NULL.
    ///
    /// Not idempotent: callers check existence first.
    pub fn create_trigger_statement(
        &self,
        parent_table: &str,
        parent_key: &str,
        child_table: &str,
        child_key: &str,
    ) -> String {
        let q = |ident: &str| self.dialect.quote(ident);
        let trigger = build_trigger_name(parent_table, child_table);
        let name = q(&trigger);
        let qualified_name = self.qualify(&trigger);
        let deleted_at = q(&self.soft_delete_column);
        let parent = self.qualify(parent_table);
        let child = self.qualify(child_table);
        let update = format!(
            "UPDATE {child} SET {deleted_at} = NOW() WHERE {child}.{child_key} = NEW.{parent_key};",
            child_key = q(child_key),
            parent_key = q(parent_key),
        );

        match self.dialect {
            Dialect::Mysql => format!(
                "CREATE TRIGGER {qualified_name} AFTER UPDATE ON {parent} FOR EACH ROW\n\
                 BEGIN\n\
                 \x20 IF OLD.{deleted_at} IS NULL AND NEW.{deleted_at} IS NOT NULL THEN\n\
                 \x20   {update}\n\
                 \x20 END IF;\n\
                 END"
            ),
            // PostgreSQL triggers call a function; both share the name. The
            // trigger itself always lives in its table's schema.
            Dialect::Postgres => format!(
                "CREATE OR REPLACE FUNCTION {qualified_name}() RETURNS TRIGGER AS $$\n\
                 BEGIN\n\
                 \x20 {update}\n\
                 \x20 RETURN NEW;\n\
                 END;\n\
                 $$ LANGUAGE plpgsql;\n\
                 CREATE TRIGGER {name} AFTER UPDATE ON {parent} FOR EACH ROW\n\
                 WHEN (OLD.{deleted_at} IS NULL AND NEW.{deleted_at} IS NOT NULL)\n\
                 EXECUTE FUNCTION {qualified_name}();"
            ),
        }
    }

    /// Catalog query returning the trigger's name when it exists in the
    /// builder's schema, and no rows otherwise.
    pub fn exists_trigger_statement(&self, parent_table: &str, child_table: &str) -> String {
        let schema: SimpleExpr = match &self.schema {
            Some(schema) => Expr::val(schema.as_str()).into(),
            None => Expr::cust(self.dialect.current_schema()),
        };
        let query = Query::select()
            .column(Triggers::TriggerName)
            .from((InformationSchema::Schema, Triggers::Table))
            .and_where(Expr::col(Triggers::TriggerSchema).eq(schema))
            .and_where(
                Expr::col(Triggers::TriggerName).eq(build_trigger_name(parent_table, child_table)),
            )
            .and_where(Expr::col(Triggers::EventObjectTable).eq(parent_table))
            .limit(1)
            .to_owned();

        self.dialect.build_select(&query)
    }

    /// Quoted identifier, prefixed with the quoted schema when one is set.
    fn qualify(&self, ident: &str) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", self.dialect.quote(schema), self.dialect.quote(ident)),
            None => self.dialect.quote(ident),
        }
    }
}

impl Default for TriggerBuilder {
    fn default() -> Self {
        Self::new(Dialect::default(), DEFAULT_SOFT_DELETE_COLUMN)
    }
}
