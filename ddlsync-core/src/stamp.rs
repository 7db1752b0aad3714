//! Descriptive header block prepended to generated definitions.

use crate::dialect::TableDescription;
use crate::{DdlSyncError, Result};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

/// First line of a stamp block.
pub const STAMP_START: &str = "/*DDLSYNC.SCHEMA.START";
/// Last line of a stamp block.
pub const STAMP_STOP: &str = "DDLSYNC.SCHEMA.STOP*/";

#[derive(Debug, Serialize)]
struct StampColumn<'a> {
    object_name: &'a str,
    spec: &'a str,
    description: &'a str,
}

#[derive(Debug, Serialize)]
struct StampData<'a> {
    object_name: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    columns: Option<Vec<StampColumn<'a>>>,
}

/// Renders the stamp of an object.
///
/// `table` carries the column list and comments of tables; other kinds pass
/// `None` and get only their name and an empty description.
///
/// # Errors
/// Fails when the block cannot be serialized.
pub fn make_stamp(object_name: &str, table: Option<&TableDescription>) -> Result<String> {
    let data = StampData {
        object_name,
        description: table
            .and_then(|t| t.table_comment.as_deref())
            .unwrap_or_default(),
        columns: table.map(|t| {
            t.column_specs
                .iter()
                .map(|c| StampColumn {
                    object_name: &c.column,
                    spec: &c.spec,
                    description: t.comment_of(&c.column).unwrap_or_default(),
                })
                .collect()
        }),
    };

    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    data.serialize(&mut serializer)
        .map_err(|source| DdlSyncError::Serialization {
            context: format!("stamp of {object_name}"),
            source,
        })?;
    let json = String::from_utf8_lossy(&buf);
    Ok(format!("{STAMP_START}\n{json}\n{STAMP_STOP}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{ColumnComment, ColumnSpec};

    #[test]
    fn test_stamp_without_columns() {
        let stamp = make_stamp("V_ORDERS", None).expect("stamp");
        assert_eq!(
            stamp,
            "/*DDLSYNC.SCHEMA.START\n{\n    \"object_name\": \"V_ORDERS\",\n    \"description\": \"\"\n}\nDDLSYNC.SCHEMA.STOP*/"
        );
    }

    #[test]
    fn test_table_stamp_lists_columns_with_comments() {
        let description = TableDescription {
            table_comment: Some("Orders".into()),
            column_comments: vec![ColumnComment {
                column: "ID".into(),
                comment: "Order key".into(),
            }],
            column_specs: vec![
                ColumnSpec {
                    column: "ID".into(),
                    spec: "INT NOT NULL".into(),
                },
                ColumnSpec {
                    column: "NOTE".into(),
                    spec: "NVARCHAR(200) NULL".into(),
                },
            ],
        };
        let stamp = make_stamp("ORDERS", Some(&description)).expect("stamp");
        assert!(stamp.starts_with(STAMP_START));
        assert!(stamp.ends_with(STAMP_STOP));

        let json = stamp
            .trim_start_matches(STAMP_START)
            .trim_end_matches(STAMP_STOP);
        let parsed: serde_json::Value = serde_json::from_str(json).expect("valid json");
        assert_eq!(parsed["description"], "Orders");
        assert_eq!(parsed["columns"][0]["description"], "Order key");
        assert_eq!(parsed["columns"][1]["spec"], "NVARCHAR(200) NULL");
        assert_eq!(parsed["columns"][1]["description"], "");
        assert!(stamp.contains("\n    \"object_name\": \"ORDERS\""));
    }
}
