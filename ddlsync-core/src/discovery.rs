//! Catalog discovery.
//!
//! Builds the per-schema inventory of a run: the objects to render, the
//! index and trigger ownership links, and the tables selected for data
//! export. Every query runs once across all retained schemas; any failure
//! aborts discovery without a partial result.

use crate::config::{DbConfig, ObjectsConfig};
use crate::executor::Executor;
use crate::models::{CatalogObject, FillKind, Link, ObjectKind, Schema, TableFill};
use crate::value::{FromRecord, Record};
use crate::Result;

struct SchemaRow(String);

impl FromRecord for SchemaRow {
    fn from_record(record: &Record<'_>) -> Result<Self> {
        Ok(Self(record.text("SCHEMA_NAME")?))
    }
}

/// An object row of the catalog listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ObjectRow {
    pub schema: String,
    pub kind: String,
    pub name: String,
}

impl FromRecord for ObjectRow {
    fn from_record(record: &Record<'_>) -> Result<Self> {
        Ok(Self {
            schema: record.text("SCHEMA_NAME")?,
            kind: record.text("OBJECT_TYPE")?,
            name: record.text("OBJECT_NAME")?,
        })
    }
}

/// A child object and the table it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LinkRow {
    pub schema: String,
    pub parent: String,
    pub name: String,
}

impl FromRecord for LinkRow {
    fn from_record(record: &Record<'_>) -> Result<Self> {
        Ok(Self {
            schema: record.text("SCHEMA_NAME")?,
            parent: record.text("PARENT_NAME")?,
            name: record.text("OBJECT_NAME")?,
        })
    }
}

/// One primary key column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct KeyRow {
    pub schema: String,
    pub table: String,
    pub column: String,
}

impl FromRecord for KeyRow {
    fn from_record(record: &Record<'_>) -> Result<Self> {
        Ok(Self {
            schema: record.text("SCHEMA_NAME")?,
            table: record.text("TABLE_NAME")?,
            column: record.text("COLUMN_NAME")?,
        })
    }
}

/// Raw catalog listings of the retained schemas.
#[derive(Debug, Clone, Default)]
pub(crate) struct CatalogRows {
    pub objects: Vec<ObjectRow>,
    pub index_links: Vec<LinkRow>,
    pub trigger_links: Vec<LinkRow>,
    pub primary_keys: Vec<KeyRow>,
}

/// Discovers the schemas, objects, links and fill entries to synchronize.
///
/// An empty schema selection is a successful, empty result.
///
/// # Errors
/// Returns the error of the first failing catalog query.
pub async fn discover(executor: &Executor, db: &DbConfig) -> Result<Vec<Schema>> {
    let sql = db.kind.sql();
    let objects = &db.objects;

    let schema_names: Vec<String> = executor
        .exec_as::<SchemaRow>(&sql.schemas_query())
        .await?
        .into_iter()
        .map(|SchemaRow(name)| name)
        .filter(|name| objects.schema.retains(name))
        .collect();
    if schema_names.is_empty() {
        tracing::info!("no schemas selected");
        return Ok(Vec::new());
    }
    tracing::debug!("schemas selected: {}", schema_names.join(", "));

    let mut rows = CatalogRows {
        objects: executor
            .exec_as(&sql.objects_query(&schema_names, objects))
            .await?,
        index_links: executor
            .exec_as(&sql.index_links_query(&schema_names))
            .await?,
        trigger_links: executor
            .exec_as(&sql.trigger_links_query(&schema_names))
            .await?,
        primary_keys: Vec::new(),
    };
    if objects.fill_enabled(FillKind::Full) || objects.fill_enabled(FillKind::Demo) {
        rows.primary_keys = executor
            .exec_as(&sql.primary_keys_query(&schema_names))
            .await?;
    }

    Ok(build_inventory(schema_names, rows, objects))
}

/// Assembles schemas from catalog listings.
pub(crate) fn build_inventory(
    schema_names: Vec<String>,
    rows: CatalogRows,
    objects: &ObjectsConfig,
) -> Vec<Schema> {
    let mut schemas: Vec<Schema> = schema_names.into_iter().map(Schema::new).collect();

    for row in rows.objects {
        let Some(kind) = ObjectKind::from_catalog(&row.kind) else {
            tracing::debug!("skip {}.{}: unknown kind {}", row.schema, row.name, row.kind);
            continue;
        };
        if let Some(schema) = find_schema(&mut schemas, &row.schema) {
            schema.objects.push(CatalogObject::new(kind, row.name));
        }
    }

    for row in rows.index_links {
        if let Some(schema) = find_schema(&mut schemas, &row.schema) {
            schema
                .objects
                .push(CatalogObject::new(ObjectKind::Index, row.name.as_str()).with_parent(row.parent.as_str()));
            schema.links.push(child_link(ObjectKind::Index, row));
        }
    }

    for row in rows.trigger_links {
        if let Some(schema) = find_schema(&mut schemas, &row.schema) {
            match schema
                .objects
                .iter_mut()
                .find(|o| o.kind == ObjectKind::Trigger && o.name == row.name)
            {
                Some(trigger) => trigger.parent = Some(row.parent.clone()),
                None => schema.objects.push(
                    CatalogObject::new(ObjectKind::Trigger, row.name.as_str())
                        .with_parent(row.parent.as_str()),
                ),
            }
            schema.links.push(child_link(ObjectKind::Trigger, row));
        }
    }

    let count = objects.table_fill_demo.effective_count();
    for row in rows.primary_keys {
        let Some(schema) = find_schema(&mut schemas, &row.schema) else {
            continue;
        };
        if let Some(entry) = schema.table_fills.iter_mut().find(|f| f.name == row.table) {
            entry.pk_columns.push(row.column);
            continue;
        }
        let is_full = objects
            .table_fill_full
            .list
            .iter()
            .any(|p| p.matches(&schema.name, &row.table));
        let fill = if is_full { FillKind::Full } else { FillKind::Demo };
        if !objects.fill_enabled(fill) {
            continue;
        }
        schema
            .table_fills
            .push(TableFill::new(row.table, vec![row.column], fill, count));
    }

    if let Some(filter) = objects
        .table_fill_demo
        .filter
        .as_ref()
        .filter(|f| !f.list.is_empty())
    {
        for schema in &mut schemas {
            let name = schema.name.clone();
            schema
                .table_fills
                .retain(|f| f.fill == FillKind::Full || filter.retains(&name, &f.name));
        }
    }

    schemas
}

fn find_schema<'a>(schemas: &'a mut [Schema], name: &str) -> Option<&'a mut Schema> {
    schemas.iter_mut().find(|s| s.name == name)
}

fn child_link(kind: ObjectKind, row: LinkRow) -> Link {
    Link {
        parent_kind: ObjectKind::Table,
        parent_name: row.parent,
        kind,
        name: row.name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FillFilter, FilterMode, TablePattern};

    fn object(schema: &str, kind: &str, name: &str) -> ObjectRow {
        ObjectRow {
            schema: schema.into(),
            kind: kind.into(),
            name: name.into(),
        }
    }

    fn link(schema: &str, parent: &str, name: &str) -> LinkRow {
        LinkRow {
            schema: schema.into(),
            parent: parent.into(),
            name: name.into(),
        }
    }

    fn key(schema: &str, table: &str, column: &str) -> KeyRow {
        KeyRow {
            schema: schema.into(),
            table: table.into(),
            column: column.into(),
        }
    }

    fn fill_config() -> ObjectsConfig {
        let mut objects = ObjectsConfig::default();
        objects.table_fill_full.dir = Some("/out/{{object-name}}.FF.sql".into());
        objects.table_fill_full.list = vec![TablePattern::new("HR", "EMP*")];
        objects.table_fill_demo.dir = Some("/out/{{object-name}}.FD.sql".into());
        objects
    }

    #[test]
    fn test_objects_links_and_unknown_kinds() {
        let rows = CatalogRows {
            objects: vec![
                object("HR", "TABLE", "EMPLOYEES"),
                object("HR", "TRIGGER", "TR_EMP"),
                object("HR", "LOB", "SYS_LOB0001"),
                object("OTHER", "TABLE", "IGNORED"),
            ],
            index_links: vec![link("HR", "EMPLOYEES", "IX_EMP_NAME")],
            trigger_links: vec![link("HR", "EMPLOYEES", "TR_EMP")],
            primary_keys: Vec::new(),
        };
        let schemas = build_inventory(vec!["HR".into()], rows, &ObjectsConfig::default());
        assert_eq!(schemas.len(), 1);
        let hr = &schemas[0];

        let names: Vec<_> = hr.objects.iter().map(|o| (o.kind, o.name.as_str())).collect();
        assert_eq!(
            names,
            vec![
                (ObjectKind::Table, "EMPLOYEES"),
                (ObjectKind::Trigger, "TR_EMP"),
                (ObjectKind::Index, "IX_EMP_NAME"),
            ]
        );
        assert_eq!(hr.objects[1].parent.as_deref(), Some("EMPLOYEES"));
        assert_eq!(hr.objects[2].parent.as_deref(), Some("EMPLOYEES"));
        assert_eq!(hr.links.len(), 2);
        assert!(hr.links.iter().all(|l| l.parent_kind == ObjectKind::Table));
    }

    #[test]
    fn test_full_and_demo_classification() {
        let rows = CatalogRows {
            primary_keys: vec![
                key("HR", "EMPLOYEES", "ID"),
                key("HR", "LOGS", "LOG_ID"),
                key("HR", "LOGS", "LINE"),
            ],
            ..CatalogRows::default()
        };
        let schemas = build_inventory(vec!["HR".into()], rows, &fill_config());
        let fills = &schemas[0].table_fills;
        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0].name, "EMPLOYEES");
        assert_eq!(fills[0].fill, FillKind::Full);
        assert_eq!(fills[1].name, "LOGS");
        assert_eq!(fills[1].fill, FillKind::Demo);
        assert_eq!(fills[1].pk_columns, vec!["LOG_ID".to_string(), "LINE".to_string()]);
        assert_eq!(fills[1].count, 3);
    }

    #[test]
    fn test_tables_without_key_have_no_fill() {
        let rows = CatalogRows {
            objects: vec![object("HR", "TABLE", "HEAP")],
            ..CatalogRows::default()
        };
        let schemas = build_inventory(vec!["HR".into()], rows, &fill_config());
        assert!(schemas[0].table_fills.is_empty());
    }

    #[test]
    fn test_demo_filter_never_drops_full_entries() {
        let mut objects = fill_config();
        objects.table_fill_demo.filter = Some(FillFilter {
            mode: FilterMode::Whitelist,
            list: vec![TablePattern::new("HR", "AUDIT")],
        });
        let rows = CatalogRows {
            primary_keys: vec![
                key("HR", "EMPLOYEES", "ID"),
                key("HR", "LOGS", "ID"),
                key("HR", "AUDIT", "ID"),
            ],
            ..CatalogRows::default()
        };
        let schemas = build_inventory(vec!["HR".into()], rows, &objects);
        let names: Vec<_> = schemas[0]
            .table_fills
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["EMPLOYEES", "AUDIT"]);
    }

    #[test]
    fn test_blacklist_drops_matching_demo_entries() {
        let mut objects = fill_config();
        objects.table_fill_demo.filter = Some(FillFilter {
            mode: FilterMode::Blacklist,
            list: vec![TablePattern::new("*", "LOG*")],
        });
        let rows = CatalogRows {
            primary_keys: vec![key("HR", "LOGS", "ID"), key("HR", "DEPT", "ID")],
            ..CatalogRows::default()
        };
        let schemas = build_inventory(vec!["HR".into()], rows, &objects);
        assert_eq!(schemas[0].table_fills.len(), 1);
        assert_eq!(schemas[0].table_fills[0].name, "DEPT");
    }

    #[test]
    fn test_disabled_fill_kind_adds_no_entries() {
        let mut objects = fill_config();
        objects.table_fill_demo.dir = None;
        let rows = CatalogRows {
            primary_keys: vec![key("HR", "EMPLOYEES", "ID"), key("HR", "LOGS", "ID")],
            ..CatalogRows::default()
        };
        let schemas = build_inventory(vec!["HR".into()], rows, &objects);
        assert_eq!(schemas[0].table_fills.len(), 1);
        assert_eq!(schemas[0].table_fills[0].fill, FillKind::Full);
    }
}
