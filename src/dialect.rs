//! SQL dialect abstraction.
//!
//! Cascade triggers are only expressible on trigger-capable databases.
//! The dialect decides identifier quoting, which sea-query builder renders
//! statements, and the shape of the generated trigger.

use sea_query::{
    ForeignKeyCreateStatement, MysqlQueryBuilder, PostgresQueryBuilder, SelectStatement,
    TableAlterStatement, TableCreateStatement, TableDropStatement,
};
use serde::Deserialize;

/// Schema PostgreSQL creates unqualified tables in by default.
pub const DEFAULT_POSTGRES_SCHEMA: &str = "public";

/// Trigger-capable SQL dialects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Mysql,
    Postgres,
}

impl Dialect {
    /// Quote an identifier, doubling any embedded quote character.
    pub fn quote(&self, ident: &str) -> String {
        let q = match self {
            Dialect::Mysql => '`',
            Dialect::Postgres => '"',
        };
        let mut quoted = String::with_capacity(ident.len() + 2);
        quoted.push(q);
        for ch in ident.chars() {
            if ch == q {
                quoted.push(q);
            }
            quoted.push(ch);
        }
        quoted.push(q);
        quoted
    }

    /// SQL expression naming the connection's current schema.
    pub fn current_schema(&self) -> &'static str {
        match self {
            Dialect::Mysql => "DATABASE()",
            Dialect::Postgres => "current_schema()",
        }
    }

    /// Schema scanned when the configuration names none.
    ///
    /// A MySQL database is its schema; a PostgreSQL database is not, and
    /// tables land in `public` unless placed elsewhere.
    pub fn default_schema(&self, database: Option<&str>) -> Option<String> {
        match self {
            Dialect::Mysql => database.map(str::to_string),
            Dialect::Postgres => Some(DEFAULT_POSTGRES_SCHEMA.to_string()),
        }
    }

    /// Port used when the connection config names none.
    pub fn default_port(&self) -> u16 {
        match self {
            Dialect::Mysql => 3306,
            Dialect::Postgres => 5432,
        }
    }

    /// URL scheme understood by sqlx.
    pub fn scheme(&self) -> &'static str {
        match self {
            Dialect::Mysql => "mysql",
            Dialect::Postgres => "postgres",
        }
    }

    pub fn build_select(&self, stmt: &SelectStatement) -> String {
        match self {
            Dialect::Mysql => stmt.to_string(MysqlQueryBuilder),
            Dialect::Postgres => stmt.to_string(PostgresQueryBuilder),
        }
    }

    pub fn build_table_create(&self, stmt: &TableCreateStatement) -> String {
        match self {
            Dialect::Mysql => stmt.to_string(MysqlQueryBuilder),
            Dialect::Postgres => stmt.to_string(PostgresQueryBuilder),
        }
    }

    pub fn build_table_alter(&self, stmt: &TableAlterStatement) -> String {
        match self {
            Dialect::Mysql => stmt.to_string(MysqlQueryBuilder),
            Dialect::Postgres => stmt.to_string(PostgresQueryBuilder),
        }
    }

    pub fn build_table_drop(&self, stmt: &TableDropStatement) -> String {
        match self {
            Dialect::Mysql => stmt.to_string(MysqlQueryBuilder),
            Dialect::Postgres => stmt.to_string(PostgresQueryBuilder),
        }
    }

    pub fn build_foreign_key(&self, stmt: &ForeignKeyCreateStatement) -> String {
        match self {
            Dialect::Mysql => stmt.to_string(MysqlQueryBuilder),
            Dialect::Postgres => stmt.to_string(PostgresQueryBuilder),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.scheme())
    }
}
