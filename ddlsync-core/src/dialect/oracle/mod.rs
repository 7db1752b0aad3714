//! Oracle catalog queries and SQL*Plus-style rendering.

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
use chrono::NaiveTime;

/// Oracle dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct Oracle;

/// Quotes an identifier with double quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Schema-qualified, quoted object name.
pub fn qualified(schema: &str, name: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(name))
}

/// Session setup for `DBMS_METADATA` based generators.
const INIT_SCRIPT: &str = "BEGIN
    DBMS_METADATA.SET_TRANSFORM_PARAM(DBMS_METADATA.SESSION_TRANSFORM, 'PRETTY', TRUE);
    DBMS_METADATA.SET_TRANSFORM_PARAM(DBMS_METADATA.SESSION_TRANSFORM, 'SQLTERMINATOR', TRUE);
    DBMS_METADATA.SET_TRANSFORM_PARAM(DBMS_METADATA.SESSION_TRANSFORM, 'SEGMENT_ATTRIBUTES', FALSE);
END;";

/// Character types measured in characters or bytes.
const CHAR_TYPES: &[&str] = &["VARCHAR2", "CHAR", "NVARCHAR2", "NCHAR"];

/// Length, precision and scale of a catalog column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ColumnType {
    pub data_type: String,
    pub data_length: i64,
    pub precision: Option<i64>,
    pub scale: Option<i64>,
    pub char_length: i64,
    pub char_used: Option<String>,
}

impl ColumnType {
    fn from_record(record: &Record<'_>) -> Result<Self> {
        Ok(Self {
            data_type: record.text("DATA_TYPE")?,
            data_length: record.opt_i64("DATA_LENGTH")?.unwrap_or(0),
            precision: record.opt_i64("DATA_PRECISION")?,
            scale: record.opt_i64("DATA_SCALE")?,
            char_length: record.opt_i64("CHAR_LENGTH")?.unwrap_or(0),
            char_used: record.opt_text("CHAR_USED")?,
        })
    }

    /// Renders the type with its length, precision or scale.
    pub fn render(&self) -> String {
        let data_type = self.data_type.as_str();
        if CHAR_TYPES.contains(&data_type) {
            let length = if self.char_length > 0 {
                self.char_length
            } else {
                self.data_length
            };
            let unit = if self.char_used.as_deref() == Some("C") {
                "CHAR"
            } else {
                "BYTE"
            };
            format!("{data_type}({length} {unit})")
        } else if data_type == "NUMBER" {
            match (self.precision, self.scale) {
                (Some(p), Some(s)) if s != 0 => format!("NUMBER({p}, {s})"),
                (Some(p), _) => format!("NUMBER({p})"),
                (None, _) => data_type.to_string(),
            }
        } else if data_type == "FLOAT" {
            match self.precision {
                Some(p) => format!("FLOAT({p})"),
                None => data_type.to_string(),
            }
        } else if data_type == "RAW" {
            format!("RAW({})", self.data_length)
        } else {
            data_type.to_string()
        }
    }
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
        let nullability = if record.text("NULLABLE")? == "N" {
            "NOT NULL"
        } else {
            "NULL"
        };
        Ok(Self {
            column: record.text("COLUMN_NAME")?,
            spec: format!("{} {nullability}", ColumnType::from_record(record)?.render()),
        })
    }
}

struct FillColumnRow {
    name: String,
    data_type: String,
}

impl FromRecord for FillColumnRow {
    fn from_record(record: &Record<'_>) -> Result<Self> {
        Ok(Self {
            name: record.text("COLUMN_NAME")?,
            data_type: record.text("DATA_TYPE")?,
        })
    }
}

fn table_filter(schema: &str, table: &str) -> String {
    format!(
        "OWNER = {} AND TABLE_NAME = {}",
        quote_literal(schema),
        quote_literal(table)
    )
}

#[async_trait]
impl SqlDialect for Oracle {
    fn dialect(&self) -> Dialect {
        Dialect::Oracle
    }

    fn init_script(&self) -> Option<&'static str> {
        Some(INIT_SCRIPT)
    }

    fn schemas_query(&self) -> String {
        "SELECT USERNAME AS SCHEMA_NAME FROM ALL_USERS WHERE ORACLE_MAINTAINED = 'N' ORDER BY USERNAME"
            .to_string()
    }

    fn objects_query(&self, schemas: &[String], objects: &ObjectsConfig) -> String {
        let mut ignored = vec!["'INDEX'"];
        if objects.package_body.dir.is_none() {
            ignored.push("'PACKAGE BODY'");
        }
        if objects.type_body.dir.is_none() {
            ignored.push("'TYPE BODY'");
        }
        [
            "SELECT",
            "    o.OWNER AS SCHEMA_NAME,",
            "    REPLACE(o.OBJECT_TYPE, ' ', '_') AS OBJECT_TYPE,",
            "    o.OBJECT_NAME AS OBJECT_NAME",
            "FROM ALL_OBJECTS o",
            "WHERE o.TEMPORARY = 'N' AND o.STATUS = 'VALID'",
            format!("  AND o.OBJECT_TYPE NOT IN ({})", ignored.join(", ")).as_str(),
            format!("  AND o.OWNER IN ({})", in_list(schemas)).as_str(),
            "  AND o.OBJECT_NAME NOT LIKE 'SYS_IOT_OVER_%'",
            "  AND o.OBJECT_NAME NOT LIKE 'SYS_IL%'",
            "  AND o.OBJECT_NAME NOT LIKE 'SYS_PLSQL_%'",
            "  AND o.OBJECT_NAME NOT LIKE 'BIN$%'",
            "  AND NOT (o.OBJECT_TYPE = 'TABLE' AND EXISTS (",
            "      SELECT 1 FROM ALL_MVIEWS m WHERE m.OWNER = o.OWNER AND m.MVIEW_NAME = o.OBJECT_NAME))",
            "ORDER BY",
            "    CASE WHEN o.OBJECT_TYPE = 'TABLE' THEN 1 WHEN o.OBJECT_TYPE = 'VIEW' THEN 2 ELSE 3 END,",
            "    CASE WHEN o.OBJECT_TYPE IN ('PACKAGE BODY', 'TYPE BODY') THEN 2 ELSE 1 END,",
            "    o.OWNER, o.OBJECT_NAME",
        ]
        .join("\n")
    }

    fn index_links_query(&self, schemas: &[String]) -> String {
        [
            "SELECT",
            "    i.TABLE_OWNER AS SCHEMA_NAME,",
            "    i.TABLE_NAME AS PARENT_NAME,",
            "    i.INDEX_NAME AS OBJECT_NAME",
            "FROM ALL_INDEXES i",
            "LEFT JOIN ALL_CONSTRAINTS c ON i.TABLE_OWNER = c.OWNER AND i.TABLE_NAME = c.TABLE_NAME AND i.INDEX_NAME = c.INDEX_NAME",
            format!("WHERE i.TABLE_OWNER IN ({})", in_list(schemas)).as_str(),
            "  AND i.STATUS = 'VALID'",
            "  AND i.INDEX_TYPE <> 'LOB'",
            "  AND (c.CONSTRAINT_TYPE IS NULL OR c.CONSTRAINT_TYPE NOT IN ('P', 'U'))",
            "ORDER BY i.TABLE_OWNER, i.TABLE_NAME, i.INDEX_NAME",
        ]
        .join("\n")
    }

    fn trigger_links_query(&self, schemas: &[String]) -> String {
        [
            "SELECT",
            "    TABLE_OWNER AS SCHEMA_NAME,",
            "    TABLE_NAME AS PARENT_NAME,",
            "    TRIGGER_NAME AS OBJECT_NAME",
            "FROM ALL_TRIGGERS",
            format!("WHERE TABLE_OWNER IN ({})", in_list(schemas)).as_str(),
            "  AND BASE_OBJECT_TYPE = 'TABLE'",
            "ORDER BY TABLE_OWNER, TRIGGER_NAME",
        ]
        .join("\n")
    }

    fn primary_keys_query(&self, schemas: &[String]) -> String {
        [
            "SELECT",
            "    cons.OWNER AS SCHEMA_NAME,",
            "    cons.TABLE_NAME AS TABLE_NAME,",
            "    cols.COLUMN_NAME AS COLUMN_NAME",
            "FROM ALL_CONSTRAINTS cons",
            "JOIN ALL_CONS_COLUMNS cols ON cons.OWNER = cols.OWNER AND cons.CONSTRAINT_NAME = cols.CONSTRAINT_NAME",
            format!("WHERE cons.CONSTRAINT_TYPE = 'P' AND cons.OWNER IN ({})", in_list(schemas)).as_str(),
            "  AND cols.TABLE_NAME NOT LIKE 'BIN$%'",
            "ORDER BY cons.OWNER, cons.TABLE_NAME, cols.POSITION",
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
        let filter = table_filter(schema, table);
        let table_comments = executor
            .exec_as::<CommentRow>(&format!(
                "SELECT CAST(NULL AS VARCHAR2(128)) AS COLUMN_NAME, COMMENTS FROM ALL_TAB_COMMENTS WHERE {filter} AND COMMENTS IS NOT NULL"
            ))
            .await?;

        let column_comments = executor
            .exec_as::<CommentRow>(&[
                "SELECT cc.COLUMN_NAME, cc.COMMENTS",
                "FROM ALL_COL_COMMENTS cc",
                "JOIN ALL_TAB_COLUMNS tc ON cc.OWNER = tc.OWNER AND cc.TABLE_NAME = tc.TABLE_NAME AND cc.COLUMN_NAME = tc.COLUMN_NAME",
                format!(
                    "WHERE cc.OWNER = {} AND cc.TABLE_NAME = {} AND cc.COMMENTS IS NOT NULL",
                    quote_literal(schema),
                    quote_literal(table)
                )
                .as_str(),
                "ORDER BY tc.COLUMN_ID",
            ]
            .join("\n"))
            .await?;

        let specs = executor
            .exec_as::<SpecRow>(&[
                "SELECT COLUMN_NAME, DATA_TYPE, DATA_LENGTH, DATA_PRECISION, DATA_SCALE,",
                "       CHAR_LENGTH, CHAR_USED, NULLABLE",
                "FROM ALL_TAB_COLUMNS",
                format!("WHERE {filter}").as_str(),
                "ORDER BY COLUMN_ID",
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
        let target = qualified(schema, table);
        let mut lines = Vec::new();
        if let Some(comment) = &description.table_comment {
            lines.push(format!(
                "COMMENT ON TABLE {target} IS {};",
                quote_literal(comment)
            ));
        }
        for column in &description.column_comments {
            lines.push(format!(
                "COMMENT ON COLUMN {target}.{} IS {};",
                quote_ident(&column.column),
                quote_literal(&column.comment)
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
                "SELECT COLUMN_NAME, DATA_TYPE",
                "FROM ALL_TAB_COLS",
                format!("WHERE {}", table_filter(schema, table)).as_str(),
                "  AND HIDDEN_COLUMN = 'NO'",
                "  AND VIRTUAL_COLUMN = 'NO'",
                "ORDER BY COLUMN_ID",
            ]
            .join("\n"))
            .await?;

        Ok(FillLayout {
            columns: rows
                .into_iter()
                .map(|r| ColumnDescriptor::new(r.name, r.data_type))
                .collect(),
            has_identity: false,
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
            FillKind::Full => "",
            FillKind::Demo => " DESC NULLS LAST",
        };
        let order = entry
            .pk_columns
            .iter()
            .map(|c| format!("{}{direction}", quote_ident(c)))
            .collect::<Vec<_>>()
            .join(", ");

        let mut script = format!("SELECT {columns} FROM {}", qualified(schema, &entry.name));
        if !order.is_empty() {
            script.push_str(" ORDER BY ");
            script.push_str(&order);
        }
        if entry.fill == FillKind::Demo {
            script.push_str(&format!(" FETCH FIRST {} ROWS ONLY", entry.count));
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
            Value::Text(s) => quote_literal(s),
            Value::Date(d) => format!("TO_DATE('{}','YYYY-MM-DD')", d.format("%Y-%m-%d")),
            Value::DateTime(dt) if dt.time() == NaiveTime::MIN => {
                format!("TO_DATE('{}','YYYY-MM-DD')", dt.format("%Y-%m-%d"))
            }
            Value::DateTime(dt) => format!(
                "TO_TIMESTAMP('{}','YYYY-MM-DD HH24:MI:SS.FF3')",
                dt.format("%Y-%m-%d %H:%M:%S%.3f")
            ),
            Value::Time(t) => quote_literal(&t.format("%H:%M:%S%.3f").to_string()),
            Value::Binary(bytes) => format!("HEXTORAW('{}')", hex_upper(bytes)),
            Value::List(_) | Value::Record(_) => {
                quote_literal(&serde_json::to_string(&JsonValue(value)).unwrap_or_default())
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

        rows.chunks(INSERT_CHUNK_ROWS)
            .map(|chunk| {
                let selects = chunk
                    .iter()
                    .map(|row| format!("SELECT {} FROM DUAL", row.join(", ")))
                    .collect::<Vec<_>>()
                    .join("\nUNION ALL\n");
                format!("INSERT INTO {target} ({columns})\n{selects};")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn preamble(&self, _database: &str, schema: &str) -> String {
        format!("ALTER SESSION SET CURRENT_SCHEMA = {};\n\n", quote_ident(schema))
    }
}
