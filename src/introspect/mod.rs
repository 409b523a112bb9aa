//! Schema introspection.
//!
//! Finds soft-deletable tables and the foreign keys between them, applies the
//! operator's table and tenant filters, and collapses relations to one per
//! (parent, child) pair.

use std::collections::{BTreeSet, HashMap};

use sea_query::{Cond, Expr, JoinType, Order, Query, SelectStatement};
use tracing::debug;

use crate::config::FilterConfig;
use crate::dialect::Dialect;
use crate::interfaces::executor::{ExecutorError, Record, Result, StatementExecutor};
use crate::schema::{
    Columns, InformationSchema, KeyColumnUsage, KeyUsageSide, ReferentialConstraints,
    RelationColumns,
};
use crate::trigger::build_trigger_name;

/// A foreign key from `table_name.column_name` to
/// `referenced_table_name.referenced_column_name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ForeignKeyRelation {
    pub table_name: String,
    pub column_name: String,
    pub referenced_table_name: String,
    pub referenced_column_name: String,
}

impl ForeignKeyRelation {
    pub fn new(
        table_name: impl Into<String>,
        column_name: impl Into<String>,
        referenced_table_name: impl Into<String>,
        referenced_column_name: impl Into<String>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            column_name: column_name.into(),
            referenced_table_name: referenced_table_name.into(),
            referenced_column_name: referenced_column_name.into(),
        }
    }

    /// Identity of the trigger that would cover this relation.
    pub fn trigger_name(&self) -> String {
        build_trigger_name(&self.referenced_table_name, &self.table_name)
    }

    fn from_record(record: &Record) -> Result<Self> {
        let field = |name: &str| {
            record
                .get(name)
                .map(str::to_string)
                .ok_or_else(|| ExecutorError::Decode {
                    column: name.to_string(),
                    message: "missing or NULL".to_string(),
                })
        };

        Ok(Self {
            table_name: field("table_name")?,
            column_name: field("column_name")?,
            referenced_table_name: field("referenced_table_name")?,
            referenced_column_name: field("referenced_column_name")?,
        })
    }
}

impl std::fmt::Display for ForeignKeyRelation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{} -> {}.{}",
            self.table_name, self.column_name, self.referenced_table_name, self.referenced_column_name
        )
    }
}

/// Read-only catalog queries against one executor.
pub struct Introspector<'a> {
    executor: &'a dyn StatementExecutor,
    dialect: Dialect,
    soft_delete_column: &'a str,
}

impl<'a> Introspector<'a> {
    pub fn new(
        executor: &'a dyn StatementExecutor,
        dialect: Dialect,
        soft_delete_column: &'a str,
    ) -> Self {
        Self {
            executor,
            dialect,
            soft_delete_column,
        }
    }

    /// Tables in `schema` carrying a nullable timestamp soft-delete column.
    pub async fn get_soft_delete_table_names(&self, schema: &str) -> Result<BTreeSet<String>> {
        let sql = self
            .dialect
            .build_select(&soft_delete_tables_query(schema, self.soft_delete_column));
        debug!(%sql, "listing soft-delete tables");

        let rows = self.executor.fetch_all(&sql).await?;
        rows.iter()
            .map(|row| {
                row.get("table_name")
                    .map(str::to_string)
                    .ok_or_else(|| ExecutorError::Decode {
                        column: "table_name".to_string(),
                        message: "missing or NULL".to_string(),
                    })
            })
            .collect()
    }

    /// Foreign keys whose dependent table is one of `table_names`.
    pub async fn get_foreign_keys_table_relations(
        &self,
        table_names: &BTreeSet<String>,
        schema: &str,
    ) -> Result<Vec<ForeignKeyRelation>> {
        if table_names.is_empty() {
            return Ok(Vec::new());
        }

        let sql = self.dialect.build_select(&match self.dialect {
            Dialect::Mysql => mysql_relations_query(table_names, schema),
            Dialect::Postgres => postgres_relations_query(table_names, schema),
        });
        debug!(%sql, tables = table_names.len(), "listing foreign keys");

        let rows = self.executor.fetch_all(&sql).await?;
        rows.iter().map(ForeignKeyRelation::from_record).collect()
    }

    /// Soft-delete tables narrowed by the filter, then their relations with
    /// tenant keys removed, one per (parent, child) pair.
    pub async fn discover(&self, filter: &FilterConfig) -> Result<Vec<ForeignKeyRelation>> {
        let tables = filter.apply_tables(self.get_soft_delete_table_names(&filter.schema).await?);
        let relations = self
            .get_foreign_keys_table_relations(&tables, &filter.schema)
            .await?;
        Ok(dedupe(filter.apply_tenants(relations)))
    }
}

/// Keep one relation per trigger identity.
///
/// Later entries overwrite earlier ones on the same key, so the surviving
/// column depends on input order. Output keeps first-seen key order.
pub fn dedupe(relations: Vec<ForeignKeyRelation>) -> Vec<ForeignKeyRelation> {
    let mut order: Vec<String> = Vec::new();
    let mut by_key: HashMap<String, ForeignKeyRelation> = HashMap::new();

    for relation in relations {
        let key = relation.trigger_name();
        if by_key.insert(key.clone(), relation).is_none() {
            order.push(key);
        }
    }

    order
        .into_iter()
        .filter_map(|key| by_key.remove(&key))
        .collect()
}

fn soft_delete_tables_query(schema: &str, soft_delete_column: &str) -> SelectStatement {
    Query::select()
        .distinct()
        .column(Columns::TableName)
        .from((InformationSchema::Schema, Columns::Table))
        .cond_where(
            Cond::all()
                .add(Expr::col(Columns::TableSchema).eq(schema))
                .add(Expr::col(Columns::ColumnName).eq(soft_delete_column))
                .add(Expr::col(Columns::IsNullable).eq("YES"))
                .add(
                    Cond::any()
                        .add(Expr::col(Columns::DataType).like("timestamp%"))
                        .add(Expr::col(Columns::DataType).eq("datetime")),
                ),
        )
        .order_by(Columns::TableName, Order::Asc)
        .to_owned()
}

fn mysql_relations_query(table_names: &BTreeSet<String>, schema: &str) -> SelectStatement {
    Query::select()
        .columns([
            KeyColumnUsage::TableName,
            KeyColumnUsage::ColumnName,
            KeyColumnUsage::ReferencedTableName,
            KeyColumnUsage::ReferencedColumnName,
        ])
        .from((InformationSchema::Schema, KeyColumnUsage::Table))
        .and_where(Expr::col(KeyColumnUsage::TableSchema).eq(schema))
        .and_where(Expr::col(KeyColumnUsage::ReferencedTableSchema).eq(schema))
        .and_where(Expr::col(KeyColumnUsage::ReferencedTableName).is_not_null())
        .and_where(
            Expr::col(KeyColumnUsage::TableName).is_in(table_names.iter().map(String::as_str)),
        )
        .order_by(KeyColumnUsage::TableName, Order::Asc)
        .order_by(KeyColumnUsage::ColumnName, Order::Asc)
        .to_owned()
}

/// Each dependent key column is paired with the referenced column at the same
/// position of the referenced key, so composite keys pair column by column.
fn postgres_relations_query(table_names: &BTreeSet<String>, schema: &str) -> SelectStatement {
    use KeyUsageSide::{Dependent, Referenced};

    Query::select()
        .expr_as(
            Expr::col((Dependent, KeyColumnUsage::TableName)),
            RelationColumns::TableName,
        )
        .expr_as(
            Expr::col((Dependent, KeyColumnUsage::ColumnName)),
            RelationColumns::ColumnName,
        )
        .expr_as(
            Expr::col((Referenced, KeyColumnUsage::TableName)),
            RelationColumns::ReferencedTableName,
        )
        .expr_as(
            Expr::col((Referenced, KeyColumnUsage::ColumnName)),
            RelationColumns::ReferencedColumnName,
        )
        .from_as((InformationSchema::Schema, KeyColumnUsage::Table), Dependent)
        .inner_join(
            (InformationSchema::Schema, ReferentialConstraints::Table),
            Cond::all()
                .add(
                    Expr::col((ReferentialConstraints::Table, ReferentialConstraints::ConstraintSchema))
                        .equals((Dependent, KeyColumnUsage::ConstraintSchema)),
                )
                .add(
                    Expr::col((ReferentialConstraints::Table, ReferentialConstraints::ConstraintName))
                        .equals((Dependent, KeyColumnUsage::ConstraintName)),
                ),
        )
        .join_as(
            JoinType::InnerJoin,
            (InformationSchema::Schema, KeyColumnUsage::Table),
            Referenced,
            Cond::all()
                .add(Expr::col((Referenced, KeyColumnUsage::ConstraintSchema)).equals((
                    ReferentialConstraints::Table,
                    ReferentialConstraints::UniqueConstraintSchema,
                )))
                .add(Expr::col((Referenced, KeyColumnUsage::ConstraintName)).equals((
                    ReferentialConstraints::Table,
                    ReferentialConstraints::UniqueConstraintName,
                )))
                .add(
                    Expr::col((Referenced, KeyColumnUsage::OrdinalPosition))
                        .equals((Dependent, KeyColumnUsage::PositionInUniqueConstraint)),
                ),
        )
        .and_where(Expr::col((Dependent, KeyColumnUsage::TableSchema)).eq(schema))
        .and_where(Expr::col((Referenced, KeyColumnUsage::TableSchema)).eq(schema))
        .and_where(
            Expr::col((Dependent, KeyColumnUsage::TableName))
                .is_in(table_names.iter().map(String::as_str)),
        )
        .order_by(RelationColumns::TableName, Order::Asc)
        .order_by(RelationColumns::ColumnName, Order::Asc)
        .to_owned()
}
