//! Application configuration.
//!
//! One document describes both where to connect and which relations the
//! interactive session considers. It can be supplied as a single JSON line
//! or loaded from a YAML file with environment overrides.

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::dialect::Dialect;
use crate::introspect::ForeignKeyRelation;
use crate::trigger::DEFAULT_SOFT_DELETE_COLUMN;

/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "PARANOID_CASCADE_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "PARANOID_CASCADE";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "PARANOID_CASCADE_LOG";

/// Configuration errors. Always raised before any SQL is issued.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("allowListTables and denyListTables are mutually exclusive")]
    ConflictingTableLists,

    #[error("no schema configured and the connection names no MySQL database")]
    MissingSchema,

    #[error("connection needs either a url or a host")]
    MissingHost,

    #[error("{0} support is not enabled in this build")]
    DialectDisabled(Dialect),

    #[error("Failed to parse config: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<::config::ConfigError> for ConfigError {
    fn from(err: ::config::ConfigError) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Database connection parameters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConnectionConfig {
    pub dialect: Dialect,
    /// Full connection URL. Takes precedence over the individual parts.
    pub url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
}

impl ConnectionConfig {
    /// Connection URL for sqlx.
    pub fn url(&self) -> Result<String, ConfigError> {
        if let Some(url) = &self.url {
            return Ok(url.clone());
        }

        let host = self.host.as_deref().ok_or(ConfigError::MissingHost)?;
        let port = self.port.unwrap_or_else(|| self.dialect.default_port());
        let credentials = match (&self.user, &self.password) {
            (Some(user), Some(password)) => format!("{}:{}@", user, password),
            (Some(user), None) => format!("{}@", user),
            _ => String::new(),
        };
        let database = self.database.as_deref().unwrap_or_default();

        Ok(format!(
            "{}://{}{}:{}/{}",
            self.dialect.scheme(),
            credentials,
            host,
            port,
            database
        ))
    }
}

/// Top-level configuration for the interactive session.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CascadeConfig {
    pub connection: ConnectionConfig,
    /// Schema to scan. Defaults to the MySQL database, or `public` on
    /// PostgreSQL.
    pub schema: Option<String>,
    // The config crate lower-cases keys from files and the environment.
    #[serde(alias = "allow_list_tables", alias = "allowlisttables")]
    pub allow_list_tables: Option<Vec<String>>,
    #[serde(alias = "deny_list_tables", alias = "denylisttables")]
    pub deny_list_tables: Option<Vec<String>>,
    /// Referenced columns that are tenant keys; never cascaded across.
    #[serde(alias = "tenant_columns", alias = "tenantcolumns")]
    pub tenant_columns: Option<Vec<String>>,
    #[serde(alias = "soft_delete_column", alias = "softdeletecolumn")]
    pub soft_delete_column: String,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            schema: None,
            allow_list_tables: None,
            deny_list_tables: None,
            tenant_columns: None,
            soft_delete_column: DEFAULT_SOFT_DELETE_COLUMN.to_string(),
        }
    }
}

impl CascadeConfig {
    /// Parse a one-line JSON document.
    pub fn from_json(line: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(line.trim())?)
    }

    /// Load configuration from file and environment.
    ///
    /// Configuration sources (later overrides earlier):
    /// 1. File specified by `path` argument (if provided)
    /// 2. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 3. Environment variables with `CONFIG_ENV_PREFIX` prefix
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder();

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Validated filter for the session.
    pub fn filter(&self) -> Result<FilterConfig, ConfigError> {
        let schema = self
            .schema
            .clone()
            .or_else(|| {
                self.connection
                    .dialect
                    .default_schema(self.connection.database.as_deref())
            })
            .ok_or(ConfigError::MissingSchema)?;

        FilterConfig::new(
            schema,
            self.allow_list_tables.clone(),
            self.deny_list_tables.clone(),
            self.tenant_columns.clone(),
        )
    }
}

/// Which tables and relations the session considers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    pub schema: String,
    allow_list_tables: Option<BTreeSet<String>>,
    deny_list_tables: Option<BTreeSet<String>>,
    tenant_columns: BTreeSet<String>,
}

impl FilterConfig {
    /// Fails when both an allow-list and a deny-list are given.
    pub fn new(
        schema: impl Into<String>,
        allow_list_tables: Option<Vec<String>>,
        deny_list_tables: Option<Vec<String>>,
        tenant_columns: Option<Vec<String>>,
    ) -> Result<Self, ConfigError> {
        if allow_list_tables.is_some() && deny_list_tables.is_some() {
            return Err(ConfigError::ConflictingTableLists);
        }

        Ok(Self {
            schema: schema.into(),
            allow_list_tables: allow_list_tables.map(|tables| tables.into_iter().collect()),
            deny_list_tables: deny_list_tables.map(|tables| tables.into_iter().collect()),
            tenant_columns: tenant_columns.unwrap_or_default().into_iter().collect(),
        })
    }

    /// Filter with no table or tenant restrictions.
    pub fn for_schema(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            allow_list_tables: None,
            deny_list_tables: None,
            tenant_columns: BTreeSet::new(),
        }
    }

    /// Narrow the soft-delete table set by the allow- or deny-list.
    pub fn apply_tables(&self, tables: BTreeSet<String>) -> BTreeSet<String> {
        match (&self.allow_list_tables, &self.deny_list_tables) {
            (Some(allow), _) => tables.into_iter().filter(|t| allow.contains(t)).collect(),
            (_, Some(deny)) => tables.into_iter().filter(|t| !deny.contains(t)).collect(),
            _ => tables,
        }
    }

    /// Drop relations whose referenced column is a tenant key.
    pub fn apply_tenants(&self, relations: Vec<ForeignKeyRelation>) -> Vec<ForeignKeyRelation> {
        relations
            .into_iter()
            .filter(|r| !self.tenant_columns.contains(&r.referenced_column_name))
            .collect()
    }
}
