//! JSON Schema validation for configuration files.
//!
//! The raw JSON document is checked against an embedded schema before it is
//! deserialized, so structural mistakes are reported with the offending path
//! instead of a generic serde message.

use jsonschema::Validator;
use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;

/// Configuration schema validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Schema compilation failed during initialization
    #[error("JSON Schema compilation failed: {message}")]
    SchemaCompilation { message: String },

    /// The document does not conform to the schema
    #[error("Configuration validation failed with {error_count} errors: {errors:?}")]
    ValidationFailed {
        error_count: usize,
        errors: Vec<String>,
    },
}

impl From<ValidationError> for crate::DdlSyncError {
    fn from(error: ValidationError) -> Self {
        Self::configuration(error.to_string())
    }
}

/// Embedded JSON Schema for the configuration file
const CONFIG_SCHEMA: &str = r##"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "title": "ddlsync configuration",
  "type": "object",
  "required": ["db"],
  "properties": {
    "log": {
      "type": "object",
      "properties": {
        "dir": { "type": ["string", "null"] },
        "mode": { "enum": ["REWRITE", "APPEND"] }
      },
      "additionalProperties": false
    },
    "db": {
      "type": "object",
      "required": ["kind", "connection"],
      "properties": {
        "kind": { "enum": ["MSSQL", "ORA"] },
        "connection": {
          "type": "object",
          "required": ["host", "database", "login"],
          "properties": {
            "host": { "type": "string", "minLength": 1 },
            "port": { "type": "integer", "minimum": 1, "maximum": 65535 },
            "database": { "type": "string", "minLength": 1 },
            "login": { "type": "string", "minLength": 1 },
            "password": { "type": "string" },
            "passwordCrypted": { "type": "boolean" },
            "encrypt": { "type": "boolean" }
          },
          "additionalProperties": false
        },
        "objects": {
          "type": "object",
          "properties": {
            "schema": {
              "type": "object",
              "properties": {
                "list": { "type": "array", "items": { "type": "string" } },
                "mode": { "enum": ["INCLUDE", "EXCEPT"] },
                "dir": { "type": ["string", "null"], "minLength": 1 }
              },
              "additionalProperties": false
            },
            "storage": {
              "type": "object",
              "properties": {
                "allowFilegroup": { "type": "boolean" },
                "allowStorage": { "type": "boolean" },
                "allowTablespace": { "type": "boolean" }
              },
              "additionalProperties": false
            },
            "stamp": { "type": "boolean" },
            "database": { "$ref": "#/$defs/path" },
            "table": { "$ref": "#/$defs/path" },
            "view": { "$ref": "#/$defs/path" },
            "mview": { "$ref": "#/$defs/path" },
            "index": { "$ref": "#/$defs/path" },
            "trigger": { "$ref": "#/$defs/path" },
            "package": { "$ref": "#/$defs/path" },
            "package_body": { "$ref": "#/$defs/path" },
            "procedure": { "$ref": "#/$defs/path" },
            "function": { "$ref": "#/$defs/path" },
            "type": { "$ref": "#/$defs/path" },
            "type_body": { "$ref": "#/$defs/path" },
            "sequence": { "$ref": "#/$defs/path" },
            "synonym": { "$ref": "#/$defs/path" },
            "job": { "$ref": "#/$defs/path" },
            "table_fill_full": {
              "type": "object",
              "properties": {
                "dir": { "type": ["string", "null"], "minLength": 1 },
                "format": { "enum": ["SQL", "JSON"] },
                "list": { "type": "array", "items": { "$ref": "#/$defs/table" } }
              },
              "additionalProperties": false
            },
            "table_fill_demo": {
              "type": "object",
              "properties": {
                "dir": { "type": ["string", "null"], "minLength": 1 },
                "format": { "enum": ["SQL", "JSON"] },
                "count": { "type": "integer", "minimum": 0 },
                "ignore_exists": { "type": "boolean" },
                "filter": {
                  "type": "object",
                  "required": ["mode"],
                  "properties": {
                    "mode": { "enum": ["WHITELIST", "BLACKLIST"] },
                    "list": { "type": "array", "items": { "$ref": "#/$defs/table" } }
                  },
                  "additionalProperties": false
                },
                "mock": {
                  "type": "array",
                  "items": {
                    "type": "object",
                    "required": ["schema", "table", "field"],
                    "properties": {
                      "schema": { "type": "string" },
                      "table": { "type": "string" },
                      "field": { "type": "string" }
                    },
                    "additionalProperties": false
                  }
                }
              },
              "additionalProperties": false
            }
          },
          "additionalProperties": false
        }
      },
      "additionalProperties": false
    }
  },
  "$defs": {
    "path": {
      "type": "object",
      "properties": { "dir": { "type": ["string", "null"], "minLength": 1 } },
      "additionalProperties": false
    },
    "table": {
      "type": "object",
      "required": ["schema", "table"],
      "properties": {
        "schema": { "type": "string" },
        "table": { "type": "string" }
      },
      "additionalProperties": false
    }
  }
}"##;

static COMPILED_SCHEMA: OnceLock<Validator> = OnceLock::new();

fn compiled_schema() -> Result<&'static Validator, ValidationError> {
    if let Some(validator) = COMPILED_SCHEMA.get() {
        return Ok(validator);
    }

    let schema_json: Value = serde_json::from_str(CONFIG_SCHEMA)
        .map_err(|e| ValidationError::SchemaCompilation {
            message: format!("Failed to parse embedded schema: {e}"),
        })?;

    let compiled =
        jsonschema::validator_for(&schema_json).map_err(|e| ValidationError::SchemaCompilation {
            message: format!("Schema compilation error: {e}"),
        })?;

    Ok(COMPILED_SCHEMA.get_or_init(|| compiled))
}

/// Validates a configuration document before deserialization.
///
/// # Errors
/// Returns [`ValidationError::ValidationFailed`] listing every violation.
pub fn validate_config_document(document: &Value) -> Result<(), ValidationError> {
    let schema = compiled_schema()?;

    let errors: Vec<String> = schema
        .iter_errors(document)
        .map(|error| error.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::ValidationFailed {
            error_count: errors.len(),
            errors,
        })
    }
}
