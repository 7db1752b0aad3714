//! Run configuration.
//!
//! The configuration file is JSON. It is checked against an embedded JSON
//! Schema, deserialized, then validated semantically; any failure is a
//! configuration error that aborts the run before the database is touched.
//!
//! # Example
//! ```rust
//! use ddlsync_core::config::Config;
//! use ddlsync_core::models::Dialect;
//!
//! let config = Config::from_json_str(r#"{
//!     "db": {
//!         "kind": "MSSQL",
//!         "connection": { "host": "db01", "database": "SALES", "login": "reader" },
//!         "objects": { "table": { "dir": "/ddl/{{schema-name}}/{{object-name}}.sql" } }
//!     }
//! }"#).expect("valid configuration");
//!
//! assert_eq!(config.db.kind, Dialect::Mssql);
//! ```

mod connection;
mod objects;
mod templates;

pub use connection::ConnectionParams;
pub use objects::{
    DEFAULT_DEMO_COUNT, FillDemoConfig, FillFilter, FillFormat, FillFullConfig, FilterMode,
    MaskRule, ObjectsConfig, PathConfig, SchemaMode, SchemaSelection, StorageOptions,
    TablePattern,
};
pub use templates::{
    BASE_NAME, OBJECT_NAME, PARENT_NAME, PathContext, SCHEMA_NAME, default_objects, resolve,
    supports_kind, validate_template,
};

use crate::models::{Dialect, ObjectKind};
use crate::validation::validate_config_document;
use crate::{DdlSyncError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Log file handling at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogMode {
    /// Truncate the log file
    #[default]
    Rewrite,
    /// Append to the log file
    Append,
}

/// Logging destination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Directory for the log file; console only when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    /// Truncate or append
    pub mode: LogMode,
}

/// Database connection and object settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbConfig {
    /// Dialect of the source database
    pub kind: Dialect,
    /// Connection parameters
    pub connection: ConnectionParams,
    /// What to synchronize
    #[serde(default)]
    pub objects: ObjectsConfig,
}

/// Complete run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Logging destination
    #[serde(default)]
    pub log: LogConfig,
    /// Database settings
    pub db: DbConfig,
}

impl Config {
    /// Reads and validates a configuration file.
    ///
    /// # Errors
    /// Fails when the file cannot be read or the configuration is invalid.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| DdlSyncError::io(format!("read config \"{}\"", path.display()), e))?;
        Self::from_json_str(&text)
    }

    /// Parses and validates a configuration document.
    ///
    /// # Errors
    /// Fails on malformed JSON, schema violations or semantic errors.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let document: serde_json::Value =
            serde_json::from_str(text).map_err(|e| DdlSyncError::Serialization {
                context: "parse configuration".to_string(),
                source: e,
            })?;
        validate_config_document(&document)?;

        let config: Self =
            serde_json::from_value(document).map_err(|e| DdlSyncError::Serialization {
                context: "deserialize configuration".to_string(),
                source: e,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Template configuration with the default path layout under `root`.
    pub fn template(dialect: Dialect, root: &str) -> Self {
        let database = match dialect {
            Dialect::Mssql => "MY_DATABASE",
            Dialect::Oracle => "MY_SERVICE",
        };
        let mut connection = ConnectionParams::new("localhost", database, "sa");
        connection.port = Some(dialect.default_port());
        Self {
            log: LogConfig {
                dir: Some(PathBuf::from(root).join("log")),
                mode: LogMode::Rewrite,
            },
            db: DbConfig {
                kind: dialect,
                connection,
                objects: default_objects(dialect, &format!("{}/ddl", root.trim_end_matches('/'))),
            },
        }
    }

    /// Serializes the configuration as pretty JSON.
    ///
    /// # Errors
    /// Fails only if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| DdlSyncError::Serialization {
            context: "serialize configuration".to_string(),
            source: e,
        })
    }

    /// Validates cross-field rules the schema cannot express.
    ///
    /// # Errors
    /// Returns a configuration error describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        self.db.connection.validate()?;

        let dialect = self.db.kind;
        let objects = &self.db.objects;

        for kind in ObjectKind::ALL {
            if let Some(template) = objects.dir_for(kind) {
                if !supports_kind(dialect, kind) {
                    return Err(DdlSyncError::configuration(format!(
                        "{kind} scripts are not supported for {dialect}"
                    )));
                }
                validate_template(kind.as_str(), template, kind.has_parent())?;
            }
        }
        if let Some(template) = objects.table_fill_full.dir.as_deref() {
            validate_template("table_fill_full", template, false)?;
        }
        if let Some(template) = objects.table_fill_demo.dir.as_deref() {
            validate_template("table_fill_demo", template, false)?;
        }

        if dialect == Dialect::Oracle && objects.storage.allow_filegroup {
            return Err(DdlSyncError::configuration(
                "allowFilegroup is not supported for ORA",
            ));
        }
        if dialect == Dialect::Mssql
            && (objects.storage.allow_storage || objects.storage.allow_tablespace)
        {
            return Err(DdlSyncError::configuration(
                "allowStorage and allowTablespace are not supported for MSSQL",
            ));
        }

        validate_table_list("table_fill_full.list", &objects.table_fill_full.list)?;
        if let Some(filter) = &objects.table_fill_demo.filter {
            validate_table_list("table_fill_demo.filter.list", &filter.list)?;
        }
        for rule in &objects.table_fill_demo.mock {
            if rule.field.trim().is_empty() {
                return Err(DdlSyncError::configuration(
                    "table_fill_demo.mock entries need a field pattern",
                ));
            }
        }
        Ok(())
    }
}

fn validate_table_list(owner: &str, list: &[TablePattern]) -> Result<()> {
    let mut seen = HashSet::new();
    for entry in list {
        if entry.schema.trim().is_empty() || entry.table.trim().is_empty() {
            return Err(DdlSyncError::configuration(format!(
                "{owner} entries need both schema and table"
            )));
        }
        let key = (entry.schema.to_uppercase(), entry.table.to_uppercase());
        if !seen.insert(key) {
            return Err(DdlSyncError::configuration(format!(
                "{owner} has duplicate entry {}.{}",
                entry.schema, entry.table
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(objects: serde_json::Value) -> String {
        json!({
            "log": { "mode": "APPEND" },
            "db": {
                "kind": "MSSQL",
                "connection": { "host": "db01", "database": "SALES", "login": "reader", "password": "x" },
                "objects": objects
            }
        })
        .to_string()
    }

    #[test]
    fn test_parse_full_configuration() {
        let config = Config::from_json_str(&document(json!({
            "schema": { "list": ["sys"], "mode": "EXCEPT" },
            "table": { "dir": "/ddl/{{base-name}}/{{schema-name}}/{{object-name}}.sql" },
            "index": { "dir": "/ddl/{{parent-name}}/{{object-name}}.sql" },
            "table_fill_full": { "dir": "/ff/{{object-name}}.sql", "list": [{ "schema": "HR", "table": "*" }] },
            "table_fill_demo": { "dir": "/fd/{{object-name}}.json", "format": "JSON",
                "mock": [{ "schema": "*", "table": "*", "field": "email*" }] }
        })))
        .expect("valid configuration");
        assert_eq!(config.log.mode, LogMode::Append);
        assert_eq!(config.db.objects.table_fill_demo.format, FillFormat::Json);
        assert_eq!(config.db.objects.table_fill_full.list.len(), 1);
    }

    #[test]
    fn test_unknown_placeholder_is_configuration_error() {
        let error = Config::from_json_str(&document(json!({
            "table": { "dir": "/ddl/{{table-name}}.sql" }
        })))
        .expect_err("unknown placeholder");
        assert!(matches!(error, DdlSyncError::Configuration { .. }));
    }

    #[test]
    fn test_parent_placeholder_only_for_children() {
        assert!(Config::from_json_str(&document(json!({
            "view": { "dir": "/ddl/{{parent-name}}/{{object-name}}.sql" }
        })))
        .is_err());
    }

    #[test]
    fn test_duplicate_full_list_entry() {
        let error = Config::from_json_str(&document(json!({
            "table_fill_full": { "dir": "/ff/{{object-name}}.sql",
                "list": [{ "schema": "HR", "table": "EMP" }, { "schema": "hr", "table": "emp" }] }
        })))
        .expect_err("duplicate entry");
        assert!(error.to_string().contains("duplicate"));
    }

    #[test]
    fn test_duplicate_demo_filter_entry_non_latin() {
        let error = Config::from_json_str(&document(json!({
            "table_fill_demo": { "dir": "/fd/{{object-name}}.sql",
                "filter": { "mode": "BLACKLIST",
                    "list": [{ "schema": "отчёты", "table": "журнал" }, { "schema": "ОТЧЁТЫ", "table": "ЖУРНАЛ" }] } }
        })))
        .expect_err("duplicate entry");
        assert!(error.to_string().contains("duplicate"));
    }

    #[test]
    fn test_empty_table_identifier() {
        assert!(Config::from_json_str(&document(json!({
            "table_fill_full": { "list": [{ "schema": "HR", "table": "" }] }
        })))
        .is_err());
    }

    #[test]
    fn test_dialect_kind_mismatch() {
        let error = Config::from_json_str(&document(json!({
            "package": { "dir": "/ddl/{{object-name}}.sql" }
        })))
        .expect_err("packages are Oracle only");
        assert!(error.to_string().contains("PACKAGE"));
    }

    #[test]
    fn test_schema_violation_is_configuration_error() {
        let error = Config::from_json_str(r#"{ "db": { "kind": "MSSQL" } }"#)
            .expect_err("connection is required");
        assert!(matches!(error, DdlSyncError::Configuration { .. }));
    }

    #[test]
    fn test_template_round_trips_through_validation() {
        for dialect in [Dialect::Mssql, Dialect::Oracle] {
            let template = Config::template(dialect, "/srv/ddlsync");
            let text = template.to_json_pretty().expect("serializable");
            let parsed = Config::from_json_str(&text).expect("template is valid");
            assert_eq!(parsed, template);
        }
    }
}
