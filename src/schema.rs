//! Catalog schema definitions using sea-query.
//!
//! These define the `information_schema` table and column identifiers read by
//! the introspector and the trigger existence check. Lower-case names resolve
//! on both MySQL and PostgreSQL.

use sea_query::Iden;

/// The catalog schema itself.
#[derive(Iden)]
pub enum InformationSchema {
    #[iden = "information_schema"]
    Schema,
}

/// `information_schema.columns`
#[derive(Iden)]
pub enum Columns {
    Table,
    #[iden = "table_schema"]
    TableSchema,
    #[iden = "table_name"]
    TableName,
    #[iden = "column_name"]
    ColumnName,
    #[iden = "is_nullable"]
    IsNullable,
    #[iden = "data_type"]
    DataType,
}

/// `information_schema.key_column_usage`
///
/// The `referenced_*` columns are a MySQL extension.
/// `position_in_unique_constraint` is NULL outside foreign keys.
#[derive(Iden)]
pub enum KeyColumnUsage {
    Table,
    #[iden = "constraint_schema"]
    ConstraintSchema,
    #[iden = "constraint_name"]
    ConstraintName,
    #[iden = "table_schema"]
    TableSchema,
    #[iden = "table_name"]
    TableName,
    #[iden = "column_name"]
    ColumnName,
    #[iden = "ordinal_position"]
    OrdinalPosition,
    #[iden = "position_in_unique_constraint"]
    PositionInUniqueConstraint,
    #[iden = "referenced_table_schema"]
    ReferencedTableSchema,
    #[iden = "referenced_table_name"]
    ReferencedTableName,
    #[iden = "referenced_column_name"]
    ReferencedColumnName,
}

/// `information_schema.referential_constraints`
#[derive(Iden)]
pub enum ReferentialConstraints {
    Table,
    #[iden = "constraint_schema"]
    ConstraintSchema,
    #[iden = "constraint_name"]
    ConstraintName,
    #[iden = "unique_constraint_schema"]
    UniqueConstraintSchema,
    #[iden = "unique_constraint_name"]
    UniqueConstraintName,
}

/// Aliases for the two sides of a foreign key when `key_column_usage` is
/// read twice (PostgreSQL).
#[derive(Iden)]
pub enum KeyUsageSide {
    #[iden = "dependent"]
    Dependent,
    #[iden = "referenced"]
    Referenced,
}

/// `information_schema.triggers`
#[derive(Iden)]
pub enum Triggers {
    Table,
    #[iden = "trigger_schema"]
    TriggerSchema,
    #[iden = "trigger_name"]
    TriggerName,
    #[iden = "event_object_table"]
    EventObjectTable,
}

/// Output column labels shared by both dialects' relation queries.
#[derive(Iden)]
pub enum RelationColumns {
    #[iden = "table_name"]
    TableName,
    #[iden = "column_name"]
    ColumnName,
    #[iden = "referenced_table_name"]
    ReferencedTableName,
    #[iden = "referenced_column_name"]
    ReferencedColumnName,
}
