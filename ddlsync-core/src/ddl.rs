//! Definition synthesis for catalog objects.

use crate::dialect::{DdlOptions, DdlTarget, SqlDialect, TableDescription};
use crate::executor::Executor;
use crate::models::ObjectKind;
use crate::{DdlSyncError, Result};
use sqlformat::{FormatOptions, Indent, QueryParams};

/// Renders the definition of one object with the dialect's generator.
///
/// # Errors
/// Fails with [`DdlSyncError::UnsupportedFeature`] when the dialect has no
/// generator for the kind, with `NotFound` when the object is gone, or with
/// the query error.
pub async fn synthesize(
    executor: &Executor,
    dialect: &dyn SqlDialect,
    kind: ObjectKind,
    target: &DdlTarget<'_>,
    options: &DdlOptions,
) -> Result<String> {
    let generator = dialect
        .generators()
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, generator)| *generator)
        .ok_or_else(|| {
            DdlSyncError::unsupported_feature(
                format!("{kind} definitions"),
                dialect.dialect().as_str(),
            )
        })?;
    let ddl = generator(executor, target, options).await?;
    Ok(ddl.trim().to_string())
}

/// Returns true when the dialect can render the kind.
pub fn can_synthesize(dialect: &dyn SqlDialect, kind: ObjectKind) -> bool {
    dialect.generators().iter().any(|(k, _)| *k == kind)
}

/// Fetches table comments and column specs.
///
/// # Errors
/// Propagates query failures.
pub async fn describe_columns(
    executor: &Executor,
    dialect: &dyn SqlDialect,
    schema: &str,
    table: &str,
) -> Result<TableDescription> {
    dialect.describe_columns(executor, schema, table).await
}

/// Appends the comment statements of a table to its definition.
pub fn with_description(
    dialect: &dyn SqlDialect,
    ddl: &str,
    schema: &str,
    table: &str,
    description: &TableDescription,
) -> String {
    let script = dialect.describe_script(schema, table, description);
    format!("{ddl}\n\n{script}").trim().to_string()
}

/// Returns true for kinds whose output is pretty-printed by [`post_format`].
pub const fn needs_post_format(kind: ObjectKind) -> bool {
    matches!(
        kind,
        ObjectKind::Table | ObjectKind::View | ObjectKind::Index | ObjectKind::Sequence
    )
}

/// Pretty-prints generated DDL and normalizes its lines.
///
/// Keyword case and identifier quoting are left as the generator wrote them.
pub fn post_format(text: &str) -> String {
    let options = FormatOptions {
        indent: Indent::Spaces(4),
        uppercase: false,
        lines_between_queries: 1,
    };
    let pretty = sqlformat::format(&normalize_lines(text), &QueryParams::None, options);
    normalize_lines(&pretty)
}

/// Normalizes line endings to LF and strips trailing whitespace per line.
pub fn normalize_lines(text: &str) -> String {
    text.replace("\r\n", "\n")
        .split('\n')
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Dialect;

    #[test]
    fn test_normalize_lines() {
        assert_eq!(
            normalize_lines("CREATE VIEW v AS   \r\nSELECT 1\t\r\nFROM t"),
            "CREATE VIEW v AS\nSELECT 1\nFROM t"
        );
        assert_eq!(normalize_lines(""), "");
    }

    #[test]
    fn test_post_format_breaks_clauses() {
        let text = post_format("CREATE VIEW [dbo].[V] AS SELECT [A], [B] FROM [dbo].[T] WHERE [A] = N'x'");
        assert!(text.lines().count() > 1, "{text}");
        assert!(text.starts_with("CREATE VIEW [dbo].[V]"), "{text}");
        assert!(text.contains("[dbo].[T]"), "{text}");
        assert!(text.contains("N'x'"), "{text}");
        assert!(text.lines().any(|line| line.trim_start() == "FROM"), "{text}");
        assert!(!text.contains('\r'));
        assert!(text.lines().all(|line| line == line.trim_end()), "{text}");
    }

    #[test]
    fn test_post_format_is_stable_across_line_endings() {
        let unix = post_format("CREATE SEQUENCE [dbo].[S]\n    START WITH 1\n    INCREMENT BY 1");
        let windows = post_format("CREATE SEQUENCE [dbo].[S]   \r\n    START WITH 1\r\n    INCREMENT BY 1");
        assert_eq!(unix, windows);
        assert_eq!(post_format(&unix), post_format(&unix));
        assert_eq!(post_format(""), "");
    }

    #[test]
    fn test_post_formatted_kinds() {
        assert!(needs_post_format(ObjectKind::Table));
        assert!(needs_post_format(ObjectKind::Sequence));
        assert!(!needs_post_format(ObjectKind::Procedure));
        assert!(!needs_post_format(ObjectKind::Trigger));
    }

    #[test]
    fn test_generator_coverage() {
        let mssql = Dialect::Mssql.sql();
        assert!(can_synthesize(mssql, ObjectKind::Database));
        assert!(!can_synthesize(mssql, ObjectKind::Package));
        assert!(!can_synthesize(mssql, ObjectKind::Job));

        let oracle = Dialect::Oracle.sql();
        assert!(can_synthesize(oracle, ObjectKind::Job));
        assert!(can_synthesize(oracle, ObjectKind::PackageBody));
        assert!(!can_synthesize(oracle, ObjectKind::Schema));
    }

    #[test]
    fn test_description_is_appended() {
        let description = TableDescription {
            table_comment: Some("People".into()),
            ..TableDescription::default()
        };
        assert_eq!(
            with_description(Dialect::Oracle.sql(), "CREATE TABLE \"HR\".\"P\" (\n    \"ID\" NUMBER\n);", "HR", "P", &description),
            "CREATE TABLE \"HR\".\"P\" (\n    \"ID\" NUMBER\n);\n\nCOMMENT ON TABLE \"HR\".\"P\" IS 'People';"
        );
        assert_eq!(
            with_description(Dialect::Oracle.sql(), "CREATE TABLE t", "HR", "T", &TableDescription::default()),
            "CREATE TABLE t"
        );
    }
}
