//! SQL Server catalog queries and T-SQL rendering.

mod ddl;

use super::{
    ColumnComment, ColumnSpec, DdlGenerator, FillLayout, INSERT_CHUNK_ROWS, SqlDialect,
    TableDescription, hex_upper, in_list, quote_literal,
};
use crate::Result;
use crate::config::ObjectsConfig;
use crate::executor::Executor;
use crate::fill::JsonValue;
use crate::models::{Dialect, FillKind, ObjectKind, TableFill};
use crate::value::{ColumnDescriptor, FromRecord, Record, Value};
use async_trait::async_trait;
use chrono::{NaiveTime, Timelike};

pub(crate) use ddl::column_type;

/// SQL Server dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mssql;

/// Quotes an identifier with brackets.
pub fn quote_ident(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

/// Schema-qualified, bracket-quoted object name.
pub fn qualified(schema: &str, name: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(name))
}

/// Unicode string literal.
fn quote_unicode(text: &str) -> String {
    format!("N{}", quote_literal(text))
}

struct CommentRow {
    column: Option<String>,
    comment: String,
}

impl FromRecord for CommentRow {
    fn from_record(record: &Record<'_>) -> Result<Self> {
        Ok(Self {
            column: record.opt_text("COLUMN_NAME")?,
            comment: record.opt_text("COMMENTS")?.unwrap_or_default(),
        })
    }
}

struct SpecRow {
    column: String,
    spec: String,
}

impl FromRecord for SpecRow {
    fn from_record(record: &Record<'_>) -> Result<Self> {
        let data_type = column_type(
            &record.text("DATA_TYPE")?,
            record.i64("MAX_LENGTH")?,
            record.i64("PRECISION")?,
            record.i64("SCALE")?,
        );
        let nullability = if record.flag("IS_NULLABLE")? {
            "NULL"
        } else {
            "NOT NULL"
        };
        Ok(Self {
            column: record.text("COLUMN_NAME")?,
            spec: format!("{data_type} {nullability}"),
        })
    }
}

struct FillColumnRow {
    name: String,
    data_type: String,
    is_identity: bool,
}

impl FromRecord for FillColumnRow {
    fn from_record(record: &Record<'_>) -> Result<Self> {
        Ok(Self {
            name: record.text("COLUMN_NAME")?,
            data_type: record.text("DATA_TYPE")?,
            is_identity: record.flag("IS_IDENTITY")?,
        })
    }
}

fn table_filter(schema: &str, table: &str) -> String {
    format!(
        "s.name = {} AND t.name = {}",
        quote_literal(schema),
        quote_literal(table)
    )
}

#[async_trait]
impl SqlDialect for Mssql {
    fn dialect(&self) -> Dialect {
        Dialect::Mssql
    }

    fn init_script(&self) -> Option<&'static str> {
        Some("SET NOCOUNT ON")
    }

    fn schemas_query(&self) -> String {
        "SELECT name AS SCHEMA_NAME FROM sys.schemas WHERE principal_id = 1 ORDER BY name"
            .to_string()
    }

    fn objects_query(&self, schemas: &[String], _objects: &ObjectsConfig) -> String {
        [
            "SELECT",
            "    s.name AS SCHEMA_NAME,",
            "    CASE o.type",
            "        WHEN 'U' THEN 'TABLE'",
            "        WHEN 'V' THEN 'VIEW'",
            "        WHEN 'P' THEN 'PROCEDURE'",
            "        WHEN 'FN' THEN 'FUNCTION'",
            "        WHEN 'IF' THEN 'FUNCTION'",
            "        WHEN 'TF' THEN 'FUNCTION'",
            "        WHEN 'TR' THEN 'TRIGGER'",
            "        WHEN 'SO' THEN 'SEQUENCE'",
            "        WHEN 'SN' THEN 'SYNONYM'",
            "    END AS OBJECT_TYPE,",
            "    o.name AS OBJECT_NAME",
            "FROM sys.objects o",
            "JOIN sys.schemas s ON o.schema_id = s.schema_id",
            "WHERE o.type IN ('U', 'V', 'P', 'FN', 'IF', 'TF', 'TR', 'SO', 'SN')",
            format!("  AND s.name IN ({})", in_list(schemas)).as_str(),
            "  AND o.is_ms_shipped = 0",
            "ORDER BY",
            "    CASE o.type WHEN 'U' THEN 1 WHEN 'V' THEN 2 ELSE 3 END,",
            "    s.name, o.name",
        ]
        .join("\n")
    }

    fn index_links_query(&self, schemas: &[String]) -> String {
        [
            "SELECT",
            "    s.name AS SCHEMA_NAME,",
            "    t.name AS PARENT_NAME,",
            "    i.name AS OBJECT_NAME",
            "FROM sys.indexes i",
            "JOIN sys.tables t ON i.object_id = t.object_id",
            "JOIN sys.schemas s ON t.schema_id = s.schema_id",
            "LEFT JOIN sys.key_constraints kc ON i.object_id = kc.parent_object_id AND i.index_id = kc.unique_index_id",
            format!("WHERE s.name IN ({})", in_list(schemas)).as_str(),
            "  AND i.type > 0",
            "  AND i.is_hypothetical = 0",
            "  AND t.is_ms_shipped = 0",
            "  AND (kc.type IS NULL OR kc.type NOT IN ('PK', 'UQ'))",
            "ORDER BY s.name, t.name, i.name",
        ]
        .join("\n")
    }

    fn trigger_links_query(&self, schemas: &[String]) -> String {
        [
            "SELECT",
            "    s.name AS SCHEMA_NAME,",
            "    OBJECT_NAME(tr.parent_id) AS PARENT_NAME,",
            "    tr.name AS OBJECT_NAME",
            "FROM sys.triggers tr",
            "JOIN sys.objects o ON tr.object_id = o.object_id",
            "JOIN sys.schemas s ON o.schema_id = s.schema_id",
            format!("WHERE s.name IN ({})", in_list(schemas)).as_str(),
            "  AND tr.parent_class = 1",
            "ORDER BY s.name, tr.name",
        ]
        .join("\n")
    }

    fn primary_keys_query(&self, schemas: &[String]) -> String {
        [
            "SELECT",
            "    s.name AS SCHEMA_NAME,",
            "    t.name AS TABLE_NAME,",
            "    c.name AS COLUMN_NAME",
            "FROM sys.key_constraints kc",
            "JOIN sys.tables t ON kc.parent_object_id = t.object_id",
            "JOIN sys.schemas s ON t.schema_id = s.schema_id",
            "JOIN sys.index_columns ic ON kc.parent_object_id = ic.object_id AND kc.unique_index_id = ic.index_id",
            "JOIN sys.columns c ON ic.object_id = c.object_id AND ic.column_id = c.column_id",
            format!("WHERE kc.type = 'PK' AND s.name IN ({})", in_list(schemas)).as_str(),
            "ORDER BY s.name, t.name, ic.key_ordinal",
        ]
        .join("\n")
    }

    fn generators(&self) -> &'static [(ObjectKind, DdlGenerator)] {
        ddl::GENERATORS
    }

    async fn describe_columns(
        &self,
        executor: &Executor,
        schema: &str,
        table: &str,
    ) -> Result<TableDescription> {
        let table_comments = executor
            .exec_as::<CommentRow>(&[
                "SELECT CAST(NULL AS NVARCHAR(128)) AS COLUMN_NAME, CAST(ep.value AS NVARCHAR(MAX)) AS COMMENTS",
                "FROM sys.extended_properties ep",
                "JOIN sys.tables t ON ep.major_id = t.object_id",
                "JOIN sys.schemas s ON t.schema_id = s.schema_id",
                format!("WHERE {}", table_filter(schema, table)).as_str(),
                "  AND ep.class = 1 AND ep.minor_id = 0",
                "  AND ep.name = 'MS_Description'",
            ]
            .join("\n"))
            .await?;

        let column_comments = executor
            .exec_as::<CommentRow>(&[
                "SELECT c.name AS COLUMN_NAME, CAST(ep.value AS NVARCHAR(MAX)) AS COMMENTS",
                "FROM sys.extended_properties ep",
                "JOIN sys.tables t ON ep.major_id = t.object_id",
                "JOIN sys.schemas s ON t.schema_id = s.schema_id",
                "JOIN sys.columns c ON ep.major_id = c.object_id AND ep.minor_id = c.column_id",
                format!("WHERE {}", table_filter(schema, table)).as_str(),
                "  AND ep.class = 1 AND ep.minor_id > 0",
                "  AND ep.name = 'MS_Description'",
                "ORDER BY c.column_id",
            ]
            .join("\n"))
            .await?;

        let specs = executor
            .exec_as::<SpecRow>(&[
                "SELECT",
                "    c.name AS COLUMN_NAME,",
                "    TYPE_NAME(c.user_type_id) AS DATA_TYPE,",
                "    c.max_length AS MAX_LENGTH,",
                "    c.precision AS PRECISION,",
                "    c.scale AS SCALE,",
                "    c.is_nullable AS IS_NULLABLE",
                "FROM sys.columns c",
                "JOIN sys.tables t ON c.object_id = t.object_id",
                "JOIN sys.schemas s ON t.schema_id = s.schema_id",
                format!("WHERE {}", table_filter(schema, table)).as_str(),
                "ORDER BY c.column_id",
            ]
            .join("\n"))
            .await?;

        Ok(TableDescription {
            table_comment: table_comments
                .into_iter()
                .map(|row| row.comment)
                .find(|c| !c.is_empty()),
            column_comments: column_comments
                .into_iter()
                .filter_map(|row| {
                    row.column.map(|column| ColumnComment {
                        column,
                        comment: row.comment,
                    })
                })
                .collect(),
            column_specs: specs
                .into_iter()
                .map(|row| ColumnSpec {
                    column: row.column,
                    spec: row.spec,
                })
                .collect(),
        })
    }

    fn describe_script(
        &self,
        schema: &str,
        table: &str,
        description: &TableDescription,
    ) -> String {
        let target = format!(
            "'SCHEMA', {}, 'TABLE', {}",
            quote_unicode(schema),
            quote_unicode(table)
        );
        let mut lines = Vec::new();
        if let Some(comment) = &description.table_comment {
            lines.push(format!(
                "EXEC sp_addextendedproperty 'MS_Description', {}, {target};",
                quote_unicode(comment)
            ));
        }
        for column in &description.column_comments {
            lines.push(format!(
                "EXEC sp_addextendedproperty 'MS_Description', {}, {target}, 'COLUMN', {};",
                quote_unicode(&column.comment),
                quote_unicode(&column.column)
            ));
        }
        lines.join("\n")
    }

    async fn fill_columns(
        &self,
        executor: &Executor,
        schema: &str,
        table: &str,
    ) -> Result<FillLayout> {
        let rows = executor
            .exec_as::<FillColumnRow>(&[
                "SELECT",
                "    c.name AS COLUMN_NAME,",
                "    TYPE_NAME(c.system_type_id) AS DATA_TYPE,",
                "    c.is_identity AS IS_IDENTITY",
                "FROM sys.columns c",
                "JOIN sys.tables t ON c.object_id = t.object_id",
                "JOIN sys.schemas s ON t.schema_id = s.schema_id",
                format!("WHERE {}", table_filter(schema, table)).as_str(),
                "  AND c.is_computed = 0",
                "  AND TYPE_NAME(c.system_type_id) <> 'timestamp'",
                "ORDER BY c.column_id",
            ]
            .join("\n"))
            .await?;

        Ok(FillLayout {
            has_identity: rows.iter().any(|r| r.is_identity),
            columns: rows
                .into_iter()
                .map(|r| ColumnDescriptor::new(r.name, r.data_type))
                .collect(),
        })
    }

    fn fill_query(&self, schema: &str, entry: &TableFill, layout: &FillLayout) -> String {
        let columns = layout
            .columns
            .iter()
            .map(|c| quote_ident(&c.name))
            .collect::<Vec<_>>()
            .join(", ");
        let direction = match entry.fill {
            FillKind::Full => "ASC",
            FillKind::Demo => "DESC",
        };
        let order = entry
            .pk_columns
            .iter()
            .map(|c| format!("{} {direction}", quote_ident(c)))
            .collect::<Vec<_>>()
            .join(", ");
        let top = match entry.fill {
            FillKind::Full => String::new(),
            FillKind::Demo => format!("TOP ({}) ", entry.count),
        };
        let mut script = format!(
            "SELECT {top}{columns} FROM {}",
            qualified(schema, &entry.name)
        );
        if !order.is_empty() {
            script.push_str(" ORDER BY ");
            script.push_str(&order);
        }
        script
    }

    fn render_literal(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Decimal(d) => d.clone(),
            Value::Float(f) if f.is_finite() => f.to_string(),
            Value::Float(_) => "NULL".to_string(),
            Value::Text(s) => quote_unicode(s),
            Value::Date(d) => format!("CAST('{}' AS DATE)", d.format("%Y-%m-%d")),
            Value::DateTime(dt) if dt.time() == NaiveTime::MIN => {
                format!("CAST('{}' AS DATE)", dt.format("%Y-%m-%d"))
            }
            Value::DateTime(dt) => format!(
                "CAST('{}' AS DATETIME2)",
                dt.format("%Y-%m-%d %H:%M:%S%.3f")
            ),
            Value::Time(t) => format!(
                "CAST('{:02}:{:02}:{:02}.{:03}' AS TIME)",
                t.hour(),
                t.minute(),
                t.second(),
                t.nanosecond() / 1_000_000
            ),
            Value::Binary(bytes) => format!("0x{}", hex_upper(bytes)),
            Value::List(_) | Value::Record(_) => {
                quote_unicode(&serde_json::to_string(&JsonValue(value)).unwrap_or_default())
            }
        }
    }

    fn insert_script(
        &self,
        schema: &str,
        table: &str,
        layout: &FillLayout,
        rows: &[Vec<String>],
    ) -> String {
        let target = qualified(schema, table);
        let columns = layout
            .columns
            .iter()
            .map(|c| quote_ident(&c.name))
            .collect::<Vec<_>>()
            .join(", ");

        let mut statements = Vec::new();
        if layout.has_identity {
            statements.push(format!("SET IDENTITY_INSERT {target} ON;"));
        }
        for chunk in rows.chunks(INSERT_CHUNK_ROWS) {
            let values = chunk
                .iter()
                .map(|row| format!("({})", row.join(", ")))
                .collect::<Vec<_>>()
                .join(",\n");
            statements.push(format!(
                "INSERT INTO {target} ({columns})\nVALUES\n{values};"
            ));
        }
        if layout.has_identity {
            statements.push(format!("SET IDENTITY_INSERT {target} OFF;"));
        }
        statements.join("\n")
    }

    fn preamble(&self, database: &str, _schema: &str) -> String {
        format!("USE {}\nGO\n\n", quote_ident(database))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn layout(identity: bool) -> FillLayout {
        FillLayout {
            columns: vec![
                ColumnDescriptor::new("ID", "int"),
                ColumnDescriptor::new("NAME", "nvarchar"),
            ],
            has_identity: identity,
        }
    }

    #[test]
    fn test_literals() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date");
        let midnight = date.and_hms_opt(0, 0, 0).expect("valid time");
        let afternoon = date.and_hms_milli_opt(14, 5, 9, 42).expect("valid time");

        assert_eq!(Mssql.render_literal(&Value::Null), "NULL");
        assert_eq!(Mssql.render_literal(&Value::Bool(true)), "1");
        assert_eq!(Mssql.render_literal(&Value::Decimal("12.50".into())), "12.50");
        assert_eq!(Mssql.render_literal(&Value::Text("O'Neil".into())), "N'O''Neil'");
        assert_eq!(
            Mssql.render_literal(&Value::DateTime(midnight)),
            "CAST('2024-03-01' AS DATE)"
        );
        assert_eq!(
            Mssql.render_literal(&Value::DateTime(afternoon)),
            "CAST('2024-03-01 14:05:09.042' AS DATETIME2)"
        );
        assert_eq!(Mssql.render_literal(&Value::Binary(vec![1, 255])), "0x01FF");
    }

    #[test]
    fn test_demo_fill_query_orders_descending_with_top() {
        let entry = TableFill::new("ORDERS", vec!["ID".into()], FillKind::Demo, 3);
        assert_eq!(
            Mssql.fill_query("dbo", &entry, &layout(false)),
            "SELECT TOP (3) [ID], [NAME] FROM [dbo].[ORDERS] ORDER BY [ID] DESC"
        );
    }

    #[test]
    fn test_full_fill_query_orders_ascending() {
        let entry = TableFill::new(
            "LINES",
            vec!["ORDER_ID".into(), "LINE_NO".into()],
            FillKind::Full,
            3,
        );
        assert_eq!(
            Mssql.fill_query("dbo", &entry, &layout(false)),
            "SELECT [ID], [NAME] FROM [dbo].[LINES] ORDER BY [ORDER_ID] ASC, [LINE_NO] ASC"
        );
    }

    #[test]
    fn test_insert_script_wraps_identity_inserts() {
        let rows = vec![
            vec!["1".to_string(), "N'a'".to_string()],
            vec!["2".to_string(), "NULL".to_string()],
        ];
        assert_eq!(
            Mssql.insert_script("dbo", "T", &layout(true), &rows),
            "SET IDENTITY_INSERT [dbo].[T] ON;\n\
             INSERT INTO [dbo].[T] ([ID], [NAME])\nVALUES\n(1, N'a'),\n(2, NULL);\n\
             SET IDENTITY_INSERT [dbo].[T] OFF;"
        );
    }

    #[test]
    fn test_insert_script_chunks_rows() {
        let rows: Vec<Vec<String>> = (0..INSERT_CHUNK_ROWS + 1)
            .map(|i| vec![i.to_string(), "NULL".to_string()])
            .collect();
        let script = Mssql.insert_script("dbo", "T", &layout(false), &rows);
        assert_eq!(script.matches("INSERT INTO").count(), 2);
    }

    #[test]
    fn test_describe_script() {
        let description = TableDescription {
            table_comment: Some("Customer orders".into()),
            column_comments: vec![ColumnComment {
                column: "ID".into(),
                comment: "Order's key".into(),
            }],
            column_specs: Vec::new(),
        };
        assert_eq!(
            Mssql.describe_script("dbo", "ORDERS", &description),
            "EXEC sp_addextendedproperty 'MS_Description', N'Customer orders', 'SCHEMA', N'dbo', 'TABLE', N'ORDERS';\n\
             EXEC sp_addextendedproperty 'MS_Description', N'Order''s key', 'SCHEMA', N'dbo', 'TABLE', N'ORDERS', 'COLUMN', N'ID';"
        );
        assert_eq!(
            Mssql.describe_script("dbo", "ORDERS", &TableDescription::default()),
            ""
        );
    }

    #[test]
    fn test_preamble_and_quoting() {
        assert_eq!(Mssql.preamble("SALES", "dbo"), "USE [SALES]\nGO\n\n");
        assert_eq!(quote_ident("odd]name"), "[odd]]name]");
    }
}
