//! Table data export.
//!
//! A fill entry is read with the dialect's ordered, limited query over the
//! catalog's exportable columns. Demo rows are masked according to the
//! configured rules, then rendered either as an insert script or as a JSON
//! document that keeps column order.

use crate::config::{FillFormat, MaskRule, ObjectsConfig};
use crate::dialect::{FillLayout, SqlDialect};
use crate::executor::Executor;
use crate::mask::mask_value;
use crate::models::{FillKind, TableFill};
use crate::pattern;
use crate::value::{ColumnDescriptor, Value};
use crate::{DdlSyncError, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde_json::value::RawValue;

/// SQL fill content of a table without rows.
pub const NO_DATA_MARKER: &str = "--NO DATA";

/// JSON fill content of a table without rows.
pub const EMPTY_JSON_FILL: &str = r#"{"row":[]}"#;

/// Raw JSON number for a decimal text, or `None` when the text is not numeric.
///
/// A bare leading point (`.5`, `-.5`) is completed with a zero. Digits are
/// kept as-is, so precision beyond `f64` survives.
fn json_number(decimal: &str) -> Option<Box<RawValue>> {
    let text = decimal.trim();
    let text = if let Some(rest) = text.strip_prefix("-.") {
        format!("-0.{rest}")
    } else if let Some(rest) = text.strip_prefix('.') {
        format!("0.{rest}")
    } else {
        text.to_string()
    };
    let raw = RawValue::from_string(text).ok()?;
    raw.get().starts_with(|c: char| c == '-' || c.is_ascii_digit()).then_some(raw)
}

/// Serializes a [`Value`] as JSON.
///
/// Exact numerics are written as JSON numbers with their digits untouched,
/// temporal values use ISO-8601 text without a zone, and binary values are
/// base64.
pub(crate) struct JsonValue<'a>(pub &'a Value);

impl Serialize for JsonValue<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.0 {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Decimal(d) => match json_number(d) {
                Some(raw) => raw.serialize(serializer),
                None => serializer.serialize_str(d),
            },
            Value::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            Value::Float(_) => serializer.serialize_unit(),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Date(d) => serializer.collect_str(&d.format("%Y-%m-%d")),
            Value::DateTime(dt) => serializer.collect_str(&dt.format("%Y-%m-%dT%H:%M:%S%.3f")),
            Value::Time(t) => serializer.collect_str(&t.format("%H:%M:%S%.3f")),
            Value::Binary(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(&JsonValue(item))?;
                }
                seq.end()
            }
            Value::Record(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (key, value) in fields {
                    map.serialize_entry(key, &JsonValue(value))?;
                }
                map.end()
            }
        }
    }
}

struct JsonRow<'a> {
    columns: &'a [ColumnDescriptor],
    values: &'a [Value],
}

impl Serialize for JsonRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in self.columns.iter().zip(self.values) {
            map.serialize_entry(&column.name, &JsonValue(value))?;
        }
        map.end()
    }
}

#[derive(Serialize)]
struct FillDocument<'a> {
    schema_name: &'a str,
    object_name: &'a str,
    database_name: &'a str,
    row: Vec<JsonRow<'a>>,
}

/// Names of the table a fill belongs to.
#[derive(Debug, Clone, Copy)]
pub struct FillTarget<'a> {
    /// Database (SQL Server) or service (Oracle) name
    pub database: &'a str,
    /// Owning schema
    pub schema: &'a str,
    /// Table name
    pub table: &'a str,
}

/// Exports the rows of one fill entry.
///
/// # Errors
/// Fails when the table has no exportable columns, when a query fails, or
/// when the JSON document cannot be serialized.
pub async fn generate_fill(
    executor: &Executor,
    dialect: &dyn SqlDialect,
    database: &str,
    schema: &str,
    entry: &TableFill,
    objects: &ObjectsConfig,
) -> Result<String> {
    let layout = dialect.fill_columns(executor, schema, &entry.name).await?;
    if layout.columns.is_empty() {
        return Err(DdlSyncError::not_found("table", entry.name.as_str()));
    }

    let mut rows = executor
        .exec(&dialect.fill_query(schema, entry, &layout))
        .await?
        .rows;
    if entry.fill == FillKind::Demo {
        rows.truncate(usize::try_from(entry.count).unwrap_or(usize::MAX));
    }

    let target = FillTarget {
        database,
        schema,
        table: &entry.name,
    };
    mask_rows(&mut rows, &layout.columns, &target, objects.mask_rules_for(entry.fill));
    render_fill(dialect, objects.fill_format(entry.fill), &target, &layout, &rows)
}

/// Masks every column matched by a rule for this table.
pub fn mask_rows(
    rows: &mut [Vec<Value>],
    columns: &[ColumnDescriptor],
    target: &FillTarget<'_>,
    rules: &[MaskRule],
) {
    let masked: Vec<usize> = columns
        .iter()
        .enumerate()
        .filter(|(_, column)| {
            rules.iter().any(|rule| {
                pattern::matches_table(target.schema, target.table, &rule.schema, &rule.table)
                    && pattern::matches(&column.name, &rule.field)
            })
        })
        .map(|(idx, _)| idx)
        .collect();
    if masked.is_empty() {
        return;
    }
    tracing::trace!(
        "masking {} column(s) of {}.{}",
        masked.len(),
        target.schema,
        target.table
    );
    for row in rows.iter_mut() {
        for &idx in &masked {
            if let Some(value) = row.get_mut(idx) {
                *value = mask_value(value, columns[idx].is_time_only());
            }
        }
    }
}

/// Renders fetched rows in the requested format.
///
/// # Errors
/// Fails only when the JSON document cannot be serialized.
pub fn render_fill(
    dialect: &dyn SqlDialect,
    format: FillFormat,
    target: &FillTarget<'_>,
    layout: &FillLayout,
    rows: &[Vec<Value>],
) -> Result<String> {
    match format {
        FillFormat::Sql if rows.is_empty() => Ok(NO_DATA_MARKER.to_string()),
        FillFormat::Json if rows.is_empty() => Ok(EMPTY_JSON_FILL.to_string()),
        FillFormat::Sql => {
            let literals: Vec<Vec<String>> = rows
                .iter()
                .map(|row| row.iter().map(|v| dialect.render_literal(v)).collect())
                .collect();
            Ok(dialect.insert_script(target.schema, target.table, layout, &literals))
        }
        FillFormat::Json => {
            let document = FillDocument {
                schema_name: target.schema,
                object_name: target.table,
                database_name: target.database,
                row: rows
                    .iter()
                    .map(|values| JsonRow {
                        columns: &layout.columns,
                        values,
                    })
                    .collect(),
            };
            serde_json::to_string_pretty(&document).map_err(|source| {
                DdlSyncError::Serialization {
                    context: format!("fill {}.{}", target.schema, target.table),
                    source,
                }
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Dialect;
    use chrono::NaiveDate;

    fn target() -> FillTarget<'static> {
        FillTarget {
            database: "SALES",
            schema: "dbo",
            table: "CUSTOMER",
        }
    }

    fn layout() -> FillLayout {
        FillLayout {
            columns: vec![
                ColumnDescriptor::new("ID", "int"),
                ColumnDescriptor::new("NAME", "nvarchar"),
                ColumnDescriptor::new("BORN", "date"),
            ],
            has_identity: false,
        }
    }

    fn rows() -> Vec<Vec<Value>> {
        let born = NaiveDate::from_ymd_opt(1990, 5, 17).expect("valid date");
        vec![vec![
            Value::Int(7),
            Value::Text("Anna".into()),
            Value::Date(born),
        ]]
    }

    #[test]
    fn test_empty_fill_markers() {
        let sql = Dialect::Mssql.sql();
        assert_eq!(
            render_fill(sql, FillFormat::Sql, &target(), &layout(), &[]).expect("render"),
            NO_DATA_MARKER
        );
        assert_eq!(
            render_fill(sql, FillFormat::Json, &target(), &layout(), &[]).expect("render"),
            EMPTY_JSON_FILL
        );
    }

    #[test]
    fn test_json_fill_keeps_column_order() {
        let text = render_fill(
            Dialect::Mssql.sql(),
            FillFormat::Json,
            &target(),
            &layout(),
            &rows(),
        )
        .expect("render");
        assert_eq!(
            text,
            "{\n  \"schema_name\": \"dbo\",\n  \"object_name\": \"CUSTOMER\",\n  \"database_name\": \"SALES\",\n  \"row\": [\n    {\n      \"ID\": 7,\n      \"NAME\": \"Anna\",\n      \"BORN\": \"1990-05-17\"\n    }\n  ]\n}"
        );
    }

    #[test]
    fn test_sql_fill_renders_literals() {
        let text = render_fill(
            Dialect::Mssql.sql(),
            FillFormat::Sql,
            &target(),
            &layout(),
            &rows(),
        )
        .expect("render");
        assert_eq!(
            text,
            "INSERT INTO [dbo].[CUSTOMER] ([ID], [NAME], [BORN])\nVALUES\n(7, N'Anna', CAST('1990-05-17' AS DATE));"
        );
    }

    #[test]
    fn test_json_value_shapes() {
        let value = Value::Record(vec![
            ("amount".into(), Value::Decimal("10.50".into())),
            ("blob".into(), Value::Binary(vec![1, 2, 3])),
            ("ratio".into(), Value::Float(f64::INFINITY)),
            ("tags".into(), Value::List(vec![Value::Bool(true), Value::Null])),
        ]);
        let text = serde_json::to_string(&JsonValue(&value)).expect("serialize");
        assert_eq!(
            text,
            r#"{"amount":10.50,"blob":"AQID","ratio":null,"tags":[true,null]}"#
        );
    }

    #[test]
    fn test_json_fill_writes_exact_numerics_as_numbers() {
        let layout = FillLayout {
            columns: vec![
                ColumnDescriptor::new("ID", "number"),
                ColumnDescriptor::new("AMOUNT", "decimal"),
                ColumnDescriptor::new("RATE", "number"),
                ColumnDescriptor::new("CODE", "number"),
            ],
            has_identity: false,
        };
        let rows = vec![vec![
            Value::Decimal("12345678901234567890".into()),
            Value::Decimal("10.50".into()),
            Value::Decimal("-.25".into()),
            Value::Decimal("NaN".into()),
        ]];
        let text = render_fill(
            Dialect::Oracle.sql(),
            FillFormat::Json,
            &target(),
            &layout,
            &rows,
        )
        .expect("render");
        assert!(text.contains("\"ID\": 12345678901234567890,"));
        assert!(text.contains("\"AMOUNT\": 10.50,"));
        assert!(text.contains("\"RATE\": -0.25,"));
        assert!(text.contains("\"CODE\": \"NaN\""));

        let parsed: serde_json::Value = serde_json::from_str(&text).expect("valid json");
        assert!(parsed["row"][0]["AMOUNT"].is_number());
    }

    #[test]
    fn test_mask_rows_only_touches_matching_columns() {
        let mut data = rows();
        let original = data.clone();
        let rules = vec![MaskRule::new("dbo", "CUST*", "NAME")];
        mask_rows(&mut data, &layout().columns, &target(), &rules);
        assert_eq!(data[0][0], original[0][0]);
        assert_eq!(data[0][2], original[0][2]);
        let Value::Text(name) = &data[0][1] else {
            panic!("text stays text");
        };
        assert_eq!(name.chars().count(), 4);
    }

    #[test]
    fn test_mask_rows_ignores_other_tables() {
        let mut data = rows();
        let original = data.clone();
        let rules = vec![MaskRule::new("dbo", "ORDERS", "*")];
        mask_rows(&mut data, &layout().columns, &target(), &rules);
        assert_eq!(data, original);
    }
}
