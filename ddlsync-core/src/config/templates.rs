//! Output path templates.
//!
//! Templates are plain paths with `{{base-name}}`, `{{schema-name}}`,
//! `{{parent-name}}` and `{{object-name}}` placeholders, substituted literally.

use super::objects::{ObjectsConfig, PathConfig};
use crate::models::{Dialect, ObjectKind};
use crate::{DdlSyncError, Result};
use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Database (or service) name placeholder
pub const BASE_NAME: &str = "{{base-name}}";
/// Schema name placeholder
pub const SCHEMA_NAME: &str = "{{schema-name}}";
/// Owning table placeholder, indexes and triggers only
pub const PARENT_NAME: &str = "{{parent-name}}";
/// Object name placeholder
pub const OBJECT_NAME: &str = "{{object-name}}";

static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();

#[allow(clippy::expect_used)]
fn placeholder_re() -> &'static Regex {
    PLACEHOLDER_RE
        .get_or_init(|| Regex::new(r"\{\{[^{}]*\}\}").expect("Invalid placeholder pattern"))
}

/// Checks that a template only uses known placeholders.
///
/// # Errors
/// Returns a configuration error naming the template owner on an empty
/// template, an unknown placeholder, or `{{parent-name}}` where no parent
/// exists.
pub fn validate_template(owner: &str, template: &str, allows_parent: bool) -> Result<()> {
    if template.trim().is_empty() {
        return Err(DdlSyncError::configuration(format!(
            "path template for {owner} is empty"
        )));
    }
    for found in placeholder_re().find_iter(template) {
        match found.as_str() {
            BASE_NAME | SCHEMA_NAME | OBJECT_NAME => {}
            PARENT_NAME if allows_parent => {}
            PARENT_NAME => {
                return Err(DdlSyncError::configuration(format!(
                    "path template for {owner} cannot use {PARENT_NAME}"
                )));
            }
            other => {
                return Err(DdlSyncError::configuration(format!(
                    "path template for {owner} has unknown placeholder {other}"
                )));
            }
        }
    }
    Ok(())
}

/// Names substituted into a template for one output file.
#[derive(Debug, Clone, Copy)]
pub struct PathContext<'a> {
    /// Database or service name
    pub base: &'a str,
    /// Schema name
    pub schema: &'a str,
    /// Owning table, if any
    pub parent: Option<&'a str>,
    /// Object name
    pub object: &'a str,
}

/// Substitutes placeholders into a template.
///
/// # Errors
/// Fails when the template needs a parent name the object does not have.
pub fn resolve(template: &str, ctx: &PathContext<'_>) -> Result<PathBuf> {
    let mut path = template
        .replace(BASE_NAME, ctx.base)
        .replace(SCHEMA_NAME, ctx.schema)
        .replace(OBJECT_NAME, ctx.object);
    if path.contains(PARENT_NAME) {
        let parent = ctx
            .parent
            .ok_or_else(|| DdlSyncError::not_found("parent table", ctx.object))?;
        path = path.replace(PARENT_NAME, parent);
    }
    Ok(PathBuf::from(path))
}

fn mssql_path(root: &str, folder: &str, suffix: &str) -> PathConfig {
    PathConfig::new(format!(
        "{root}/{BASE_NAME}/{SCHEMA_NAME}/{folder}/{BASE_NAME}.{SCHEMA_NAME}.{suffix}.sql"
    ))
}

fn oracle_path(root: &str, folder: &str, suffix: &str) -> PathConfig {
    PathConfig::new(format!(
        "{root}/{SCHEMA_NAME}/{folder}/{SCHEMA_NAME}.{suffix}.sql"
    ))
}

/// Default object selection and path layout under `root`.
pub fn default_objects(dialect: Dialect, root: &str) -> ObjectsConfig {
    let root = root.trim_end_matches(['/', '\\']);
    let mut objects = ObjectsConfig::default();
    match dialect {
        Dialect::Mssql => {
            objects.schema.dir = Some(format!(
                "{root}/{BASE_NAME}/{SCHEMA_NAME}/{BASE_NAME}.{SCHEMA_NAME}.SCH.sql"
            ));
            objects.database = PathConfig::new(format!("{root}/{BASE_NAME}/{BASE_NAME}.DTB.sql"));
            objects.table = mssql_path(root, "TABLE", &format!("TBL.{OBJECT_NAME}"));
            objects.view = mssql_path(root, "VIEW", &format!("VVW.{OBJECT_NAME}"));
            objects.index = mssql_path(
                root,
                "INDEX",
                &format!("TBL.{PARENT_NAME}.IDX.{OBJECT_NAME}"),
            );
            objects.trigger = mssql_path(root, "TRIGGER", &format!("TRG.{OBJECT_NAME}"));
            objects.procedure = mssql_path(root, "PROCEDURE", &format!("PRC.{OBJECT_NAME}"));
            objects.function = mssql_path(root, "FUNCTION", &format!("FUN.{OBJECT_NAME}"));
            objects.sequence = mssql_path(root, "SEQUENCE", &format!("SEQ.{OBJECT_NAME}"));
            objects.synonym = mssql_path(root, "SYNONYM", &format!("SYN.{OBJECT_NAME}"));
            objects.table_fill_full.dir = mssql_path(
                root,
                "TABLE.FILL.FULL",
                &format!("TBL.{OBJECT_NAME}.FF"),
            )
            .dir;
            objects.table_fill_demo.dir = mssql_path(
                root,
                "TABLE.FILL.DEMO",
                &format!("TBL.{OBJECT_NAME}.FD"),
            )
            .dir;
        }
        Dialect::Oracle => {
            objects.table = oracle_path(root, "TABLE", &format!("TBL.{OBJECT_NAME}"));
            objects.view = oracle_path(root, "VIEW", &format!("VVW.{OBJECT_NAME}"));
            objects.mview = oracle_path(root, "MVIEW", &format!("MVW.{OBJECT_NAME}"));
            objects.index = oracle_path(
                root,
                "INDEX",
                &format!("TBL.{PARENT_NAME}.IDX.{OBJECT_NAME}"),
            );
            objects.trigger = oracle_path(root, "TRIGGER", &format!("TRG.{OBJECT_NAME}"));
            objects.package = oracle_path(root, "PACKAGE", &format!("PKH.{OBJECT_NAME}"));
            objects.package_body =
                oracle_path(root, "PACKAGEBODY", &format!("PKB.{OBJECT_NAME}"));
            objects.procedure = oracle_path(root, "PROCEDURE", &format!("PRC.{OBJECT_NAME}"));
            objects.function = oracle_path(root, "FUNCTION", &format!("FUN.{OBJECT_NAME}"));
            objects.r#type = oracle_path(root, "TYPE", &format!("TPH.{OBJECT_NAME}"));
            objects.type_body = oracle_path(root, "TYPEBODY", &format!("TPB.{OBJECT_NAME}"));
            objects.sequence = oracle_path(root, "SEQUENCE", &format!("SEQ.{OBJECT_NAME}"));
            objects.synonym = oracle_path(root, "SYNONYM", &format!("SYN.{OBJECT_NAME}"));
            objects.job = oracle_path(root, "JOB", &format!("JOB.{OBJECT_NAME}"));
            objects.table_fill_full.dir = oracle_path(
                root,
                "TABLE.FILL.FULL",
                &format!("TBL.{OBJECT_NAME}.FF"),
            )
            .dir;
            objects.table_fill_demo.dir = oracle_path(
                root,
                "TABLE.FILL.DEMO",
                &format!("TBL.{OBJECT_NAME}.FD"),
            )
            .dir;
        }
    }
    objects
}

/// Object kinds a dialect can discover and render.
pub const fn supports_kind(dialect: Dialect, kind: ObjectKind) -> bool {
    match dialect {
        Dialect::Mssql => !matches!(
            kind,
            ObjectKind::MaterializedView
                | ObjectKind::Package
                | ObjectKind::PackageBody
                | ObjectKind::Type
                | ObjectKind::TypeBody
                | ObjectKind::Job
        ),
        Dialect::Oracle => !matches!(kind, ObjectKind::Database | ObjectKind::Schema),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_substitutes_all_placeholders() {
        let ctx = PathContext {
            base: "SALES",
            schema: "dbo",
            parent: Some("ORDERS"),
            object: "IX_ORDERS_DATE",
        };
        let path = resolve(
            "/ddl/{{base-name}}/{{schema-name}}/INDEX/{{base-name}}.{{schema-name}}.TBL.{{parent-name}}.IDX.{{object-name}}.sql",
            &ctx,
        )
        .expect("resolvable");
        assert_eq!(
            path,
            PathBuf::from("/ddl/SALES/dbo/INDEX/SALES.dbo.TBL.ORDERS.IDX.IX_ORDERS_DATE.sql")
        );
    }

    #[test]
    fn test_resolve_requires_parent_when_referenced() {
        let ctx = PathContext {
            base: "SALES",
            schema: "dbo",
            parent: None,
            object: "IX_LOST",
        };
        let error = resolve("{{parent-name}}/{{object-name}}.sql", &ctx).expect_err("no parent");
        assert!(error.to_string().contains("IX_LOST"));
    }

    #[test]
    fn test_validate_template() {
        assert!(validate_template("table", "{{schema-name}}/{{object-name}}.sql", false).is_ok());
        assert!(validate_template("index", "{{parent-name}}/{{object-name}}.sql", true).is_ok());
        assert!(validate_template("table", "{{parent-name}}/{{object-name}}.sql", false).is_err());
        assert!(validate_template("table", "{{schema}}/{{object-name}}.sql", false).is_err());
        assert!(validate_template("table", "  ", false).is_err());
    }

    #[test]
    fn test_default_layouts_are_valid() {
        for dialect in [Dialect::Mssql, Dialect::Oracle] {
            let objects = default_objects(dialect, "/srv/ddl/");
            for kind in ObjectKind::ALL {
                if let Some(template) = objects.dir_for(kind) {
                    assert!(supports_kind(dialect, kind), "{dialect} {kind}");
                    assert!(template.starts_with("/srv/ddl/"));
                    validate_template(kind.as_str(), template, kind.has_parent())
                        .expect("default template is valid");
                }
            }
        }
    }

    #[test]
    fn test_dialect_kind_support() {
        assert!(supports_kind(Dialect::Mssql, ObjectKind::Database));
        assert!(!supports_kind(Dialect::Mssql, ObjectKind::PackageBody));
        assert!(supports_kind(Dialect::Oracle, ObjectKind::Job));
        assert!(!supports_kind(Dialect::Oracle, ObjectKind::Schema));
    }
}
