use super::{qualified, quote_ident};
use crate::dialect::{DdlGenerator, DdlOptions, DdlTarget, group_consecutive, quote_literal};
use crate::executor::Executor;
use crate::models::{Dialect, ObjectKind};
use crate::value::{FromRecord, Record};
use crate::{DdlSyncError, Result};
use futures::FutureExt;
use futures::future::BoxFuture;

pub(super) static GENERATORS: &[(ObjectKind, DdlGenerator)] = &[
    (ObjectKind::Database, database),
    (ObjectKind::Schema, schema),
    (ObjectKind::Table, table),
    (ObjectKind::View, view),
    (ObjectKind::Procedure, procedure),
    (ObjectKind::Function, function),
    (ObjectKind::Trigger, trigger),
    (ObjectKind::Index, index),
    (ObjectKind::Sequence, sequence),
    (ObjectKind::Synonym, synonym),
];

/// Character types whose length is reported in bytes.
const BYTE_LENGTH_TYPES: &[&str] = &["varchar", "char", "varbinary", "binary"];
/// Double-byte character types.
const DOUBLE_BYTE_TYPES: &[&str] = &["nvarchar", "nchar"];
/// Types that carry a fractional-seconds scale.
const SCALED_TIME_TYPES: &[&str] = &["datetime2", "time", "datetimeoffset"];

/// Renders a column type with length, precision and scale.
///
/// A max length of -1 is `MAX`; double-byte types report bytes, so their
/// length is halved.
pub(crate) fn column_type(data_type: &str, max_length: i64, precision: i64, scale: i64) -> String {
    let lower = data_type.to_lowercase();
    let upper = data_type.to_uppercase();
    if BYTE_LENGTH_TYPES.contains(&lower.as_str()) {
        if max_length == -1 {
            format!("{upper}(MAX)")
        } else {
            format!("{upper}({max_length})")
        }
    } else if DOUBLE_BYTE_TYPES.contains(&lower.as_str()) {
        if max_length == -1 {
            format!("{upper}(MAX)")
        } else {
            format!("{upper}({})", max_length / 2)
        }
    } else if lower == "decimal" || lower == "numeric" {
        format!("{upper}({precision}, {scale})")
    } else if SCALED_TIME_TYPES.contains(&lower.as_str()) {
        format!("{upper}({scale})")
    } else {
        upper
    }
}

fn object_filter(target: &DdlTarget<'_>, alias: &str) -> String {
    format!(
        "s.name = {} AND {alias}.name = {}",
        quote_literal(target.schema),
        quote_literal(target.name)
    )
}

struct ColumnRow {
    name: String,
    data_type: String,
    max_length: i64,
    precision: i64,
    scale: i64,
    is_nullable: bool,
    identity: Option<(String, String)>,
    computed: Option<String>,
    is_persisted: bool,
    default_value: Option<String>,
}

impl FromRecord for ColumnRow {
    fn from_record(record: &Record<'_>) -> Result<Self> {
        let identity = if record.flag("IS_IDENTITY")? {
            Some((
                record.opt_text("SEED_VALUE")?.unwrap_or_else(|| "1".into()),
                record
                    .opt_text("INCREMENT_VALUE")?
                    .unwrap_or_else(|| "1".into()),
            ))
        } else {
            None
        };
        Ok(Self {
            name: record.text("COLUMN_NAME")?,
            data_type: record.text("DATA_TYPE")?,
            max_length: record.i64("MAX_LENGTH")?,
            precision: record.i64("PRECISION")?,
            scale: record.i64("SCALE")?,
            is_nullable: record.flag("IS_NULLABLE")?,
            identity,
            computed: record.opt_text("COMPUTED_DEFINITION")?,
            is_persisted: record.flag("IS_PERSISTED")?,
            default_value: record.opt_text("DEFAULT_VALUE")?,
        })
    }
}

impl ColumnRow {
    fn render(&self) -> String {
        let name = quote_ident(&self.name);
        if let Some(expression) = &self.computed {
            let persisted = if self.is_persisted { " PERSISTED" } else { "" };
            return format!("{name} AS {expression}{persisted}");
        }
        let mut def = format!(
            "{name} {}",
            column_type(&self.data_type, self.max_length, self.precision, self.scale)
        );
        if let Some((seed, increment)) = &self.identity {
            def.push_str(&format!(" IDENTITY({seed}, {increment})"));
        }
        if !self.is_nullable {
            def.push_str(" NOT NULL");
        }
        if let Some(default) = &self.default_value {
            def.push_str(&format!(" DEFAULT {default}"));
        }
        def
    }
}

struct KeyColumnRow {
    constraint: String,
    constraint_type: String,
    column: String,
}

impl FromRecord for KeyColumnRow {
    fn from_record(record: &Record<'_>) -> Result<Self> {
        Ok(Self {
            constraint: record.text("CONSTRAINT_NAME")?,
            constraint_type: record.text("CONSTRAINT_TYPE")?,
            column: record.text("COLUMN_NAME")?,
        })
    }
}

struct ForeignKeyRow {
    name: String,
    ref_schema: String,
    ref_table: String,
    column: String,
    ref_column: String,
    delete_action: String,
    update_action: String,
}

impl FromRecord for ForeignKeyRow {
    fn from_record(record: &Record<'_>) -> Result<Self> {
        Ok(Self {
            name: record.text("FK_NAME")?,
            ref_schema: record.text("REF_SCHEMA")?,
            ref_table: record.text("REF_TABLE")?,
            column: record.text("FK_COLUMN")?,
            ref_column: record.text("REF_COLUMN")?,
            delete_action: record.opt_text("DELETE_ACTION")?.unwrap_or_default(),
            update_action: record.opt_text("UPDATE_ACTION")?.unwrap_or_default(),
        })
    }
}

fn referential_action(clause: &str, action: &str) -> String {
    match action {
        "" | "NO_ACTION" => String::new(),
        other => format!(" ON {clause} {}", other.replace('_', " ")),
    }
}

fn bracket_list<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.map(quote_ident).collect::<Vec<_>>().join(", ")
}

struct TextRow(String);

impl FromRecord for TextRow {
    fn from_record(record: &Record<'_>) -> Result<Self> {
        Ok(Self(record.text("TEXT")?))
    }
}

fn table<'a>(
    executor: &'a Executor,
    target: &'a DdlTarget<'a>,
    options: &'a DdlOptions,
) -> BoxFuture<'a, Result<String>> {
    async move {
        let filter = object_filter(target, "tb");
        let columns = executor
            .exec_as::<ColumnRow>(&[
                "SELECT",
                "    c.name AS COLUMN_NAME,",
                "    TYPE_NAME(c.user_type_id) AS DATA_TYPE,",
                "    c.max_length AS MAX_LENGTH,",
                "    c.precision AS PRECISION,",
                "    c.scale AS SCALE,",
                "    c.is_nullable AS IS_NULLABLE,",
                "    c.is_identity AS IS_IDENTITY,",
                "    CONVERT(NVARCHAR(64), ic.seed_value) AS SEED_VALUE,",
                "    CONVERT(NVARCHAR(64), ic.increment_value) AS INCREMENT_VALUE,",
                "    cc.definition AS COMPUTED_DEFINITION,",
                "    cc.is_persisted AS IS_PERSISTED,",
                "    OBJECT_DEFINITION(c.default_object_id) AS DEFAULT_VALUE",
                "FROM sys.columns c",
                "JOIN sys.tables tb ON c.object_id = tb.object_id",
                "JOIN sys.schemas s ON tb.schema_id = s.schema_id",
                "LEFT JOIN sys.identity_columns ic ON c.object_id = ic.object_id AND c.column_id = ic.column_id",
                "LEFT JOIN sys.computed_columns cc ON c.object_id = cc.object_id AND c.column_id = cc.column_id",
                format!("WHERE {filter}").as_str(),
                "ORDER BY c.column_id",
            ]
            .join("\n"))
            .await?;
        if columns.is_empty() {
            return Err(DdlSyncError::not_found("table", target.name));
        }

        let keys = executor
            .exec_as::<KeyColumnRow>(&[
                "SELECT",
                "    kc.name AS CONSTRAINT_NAME,",
                "    kc.type AS CONSTRAINT_TYPE,",
                "    c.name AS COLUMN_NAME",
                "FROM sys.key_constraints kc",
                "JOIN sys.tables tb ON kc.parent_object_id = tb.object_id",
                "JOIN sys.schemas s ON tb.schema_id = s.schema_id",
                "JOIN sys.index_columns ic ON kc.parent_object_id = ic.object_id AND kc.unique_index_id = ic.index_id",
                "JOIN sys.columns c ON ic.object_id = c.object_id AND ic.column_id = c.column_id",
                format!("WHERE {filter}").as_str(),
                "ORDER BY kc.type, kc.name, ic.key_ordinal",
            ]
            .join("\n"))
            .await?;

        let foreign_keys = executor
            .exec_as::<ForeignKeyRow>(&[
                "SELECT",
                "    fk.name AS FK_NAME,",
                "    rs.name AS REF_SCHEMA,",
                "    rt.name AS REF_TABLE,",
                "    pc.name AS FK_COLUMN,",
                "    rc.name AS REF_COLUMN,",
                "    fk.delete_referential_action_desc AS DELETE_ACTION,",
                "    fk.update_referential_action_desc AS UPDATE_ACTION",
                "FROM sys.foreign_keys fk",
                "JOIN sys.tables tb ON fk.parent_object_id = tb.object_id",
                "JOIN sys.schemas s ON tb.schema_id = s.schema_id",
                "JOIN sys.tables rt ON fk.referenced_object_id = rt.object_id",
                "JOIN sys.schemas rs ON rt.schema_id = rs.schema_id",
                "JOIN sys.foreign_key_columns fkc ON fkc.constraint_object_id = fk.object_id",
                "JOIN sys.columns pc ON fkc.parent_object_id = pc.object_id AND fkc.parent_column_id = pc.column_id",
                "JOIN sys.columns rc ON fkc.referenced_object_id = rc.object_id AND fkc.referenced_column_id = rc.column_id",
                format!("WHERE {filter}").as_str(),
                "ORDER BY fk.name, fkc.constraint_column_id",
            ]
            .join("\n"))
            .await?;

        let mut parts: Vec<String> = columns.iter().map(ColumnRow::render).collect();

        for (name, members) in group_consecutive(keys, |k| k.constraint.clone()) {
            let kind = if members[0].constraint_type.trim() == "PK" {
                "PRIMARY KEY"
            } else {
                "UNIQUE"
            };
            parts.push(format!(
                "CONSTRAINT {} {kind} ({})",
                quote_ident(&name),
                bracket_list(members.iter().map(|m| m.column.as_str()))
            ));
        }

        for (name, members) in group_consecutive(foreign_keys, |f| f.name.clone()) {
            let head = &members[0];
            parts.push(format!(
                "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}){}{}",
                quote_ident(&name),
                bracket_list(members.iter().map(|m| m.column.as_str())),
                qualified(&head.ref_schema, &head.ref_table),
                bracket_list(members.iter().map(|m| m.ref_column.as_str())),
                referential_action("DELETE", &head.delete_action),
                referential_action("UPDATE", &head.update_action),
            ));
        }

        let mut ddl = format!(
            "CREATE TABLE {} (\n    {}\n)",
            qualified(target.schema, target.name),
            parts.join(",\n    ")
        );

        if options.storage.allow_filegroup {
            let filegroups = executor
                .exec_as::<TextRow>(&[
                    "SELECT fg.name AS TEXT",
                    "FROM sys.tables tb",
                    "JOIN sys.schemas s ON tb.schema_id = s.schema_id",
                    "JOIN sys.indexes i ON tb.object_id = i.object_id AND i.index_id IN (0, 1)",
                    "JOIN sys.filegroups fg ON i.data_space_id = fg.data_space_id",
                    format!("WHERE {filter}").as_str(),
                ]
                .join("\n"))
                .await?;
            if let Some(TextRow(filegroup)) = filegroups.into_iter().next() {
                ddl.push_str(&format!(" ON {}", quote_ident(&filegroup)));
            }
        }

        Ok(ddl)
    }
    .boxed()
}

/// Definition text of a module object from `sys.sql_modules`.
async fn module_text(
    executor: &Executor,
    target: &DdlTarget<'_>,
    kind: &str,
    types: &str,
) -> Result<String> {
    let rows = executor
        .exec_as::<TextRow>(&[
            "SELECT m.definition AS TEXT",
            "FROM sys.sql_modules m",
            "JOIN sys.objects o ON m.object_id = o.object_id",
            "JOIN sys.schemas s ON o.schema_id = s.schema_id",
            format!("WHERE {} AND o.type IN ({types})", object_filter(target, "o")).as_str(),
        ]
        .join("\n"))
        .await?;
    if rows.is_empty() {
        return Err(DdlSyncError::not_found(kind, target.name));
    }
    Ok(rows
        .into_iter()
        .map(|TextRow(text)| text)
        .collect::<Vec<_>>()
        .join("\n"))
}

fn view<'a>(
    executor: &'a Executor,
    target: &'a DdlTarget<'a>,
    _options: &'a DdlOptions,
) -> BoxFuture<'a, Result<String>> {
    module_text(executor, target, "view", "'V'").boxed()
}

fn procedure<'a>(
    executor: &'a Executor,
    target: &'a DdlTarget<'a>,
    _options: &'a DdlOptions,
) -> BoxFuture<'a, Result<String>> {
    module_text(executor, target, "procedure", "'P'").boxed()
}

fn function<'a>(
    executor: &'a Executor,
    target: &'a DdlTarget<'a>,
    _options: &'a DdlOptions,
) -> BoxFuture<'a, Result<String>> {
    module_text(executor, target, "function", "'FN', 'IF', 'TF'").boxed()
}

fn trigger<'a>(
    executor: &'a Executor,
    target: &'a DdlTarget<'a>,
    _options: &'a DdlOptions,
) -> BoxFuture<'a, Result<String>> {
    module_text(executor, target, "trigger", "'TR'").boxed()
}

struct IndexColumnRow {
    index_type: String,
    is_unique: bool,
    table: String,
    filter: Option<String>,
    filegroup: Option<String>,
    column: String,
    is_descending: bool,
    is_included: bool,
}

impl FromRecord for IndexColumnRow {
    fn from_record(record: &Record<'_>) -> Result<Self> {
        Ok(Self {
            index_type: record.text("INDEX_TYPE")?,
            is_unique: record.flag("IS_UNIQUE")?,
            table: record.text("TABLE_NAME")?,
            filter: record.opt_text("FILTER_DEFINITION")?,
            filegroup: record.opt_text("FILEGROUP_NAME")?,
            column: record.text("COLUMN_NAME")?,
            is_descending: record.flag("IS_DESC")?,
            is_included: record.flag("IS_INCLUDED")?,
        })
    }
}

/// Storage layout of an index, from `sys.indexes.type_desc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IndexLayout {
    /// B-tree index, `CLUSTERED` or `NONCLUSTERED`
    Rowstore(&'static str),
    ClusteredColumnstore,
    NonclusteredColumnstore,
}

impl IndexLayout {
    /// XML, spatial and memory-optimized hash indexes have no renderer.
    fn from_type_desc(type_desc: &str) -> Result<Self> {
        match type_desc.trim().to_uppercase().as_str() {
            "CLUSTERED" => Ok(Self::Rowstore("CLUSTERED")),
            "NONCLUSTERED" => Ok(Self::Rowstore("NONCLUSTERED")),
            "CLUSTERED COLUMNSTORE" => Ok(Self::ClusteredColumnstore),
            "NONCLUSTERED COLUMNSTORE" => Ok(Self::NonclusteredColumnstore),
            other => Err(DdlSyncError::unsupported_feature(
                format!("{} indexes", other.to_lowercase()),
                Dialect::Mssql.as_str(),
            )),
        }
    }
}

fn index<'a>(
    executor: &'a Executor,
    target: &'a DdlTarget<'a>,
    options: &'a DdlOptions,
) -> BoxFuture<'a, Result<String>> {
    async move {
        let mut filter = object_filter(target, "i");
        if let Some(parent) = target.parent {
            filter.push_str(&format!(" AND t.name = {}", quote_literal(parent)));
        }
        let rows = executor
            .exec_as::<IndexColumnRow>(&[
                "SELECT",
                "    i.type_desc AS INDEX_TYPE,",
                "    i.is_unique AS IS_UNIQUE,",
                "    t.name AS TABLE_NAME,",
                "    i.filter_definition AS FILTER_DEFINITION,",
                "    fg.name AS FILEGROUP_NAME,",
                "    c.name AS COLUMN_NAME,",
                "    ic.is_descending_key AS IS_DESC,",
                "    ic.is_included_column AS IS_INCLUDED",
                "FROM sys.indexes i",
                "JOIN sys.objects t ON i.object_id = t.object_id",
                "JOIN sys.schemas s ON t.schema_id = s.schema_id",
                "JOIN sys.index_columns ic ON i.object_id = ic.object_id AND i.index_id = ic.index_id",
                "JOIN sys.columns c ON ic.object_id = c.object_id AND ic.column_id = c.column_id",
                "LEFT JOIN sys.filegroups fg ON i.data_space_id = fg.data_space_id",
                format!("WHERE {filter}").as_str(),
                "ORDER BY ic.is_included_column, ic.key_ordinal, ic.index_column_id",
            ]
            .join("\n"))
            .await?;

        let Some(head) = rows.first() else {
            return Err(DdlSyncError::not_found("index", target.name));
        };

        let table = qualified(target.schema, &head.table);
        let mut ddl = match IndexLayout::from_type_desc(&head.index_type)? {
            IndexLayout::Rowstore(organization) => {
                let unique = if head.is_unique { "UNIQUE " } else { "" };
                let keys = rows
                    .iter()
                    .filter(|r| !r.is_included)
                    .map(|r| {
                        let direction = if r.is_descending { "DESC" } else { "ASC" };
                        format!("{} {direction}", quote_ident(&r.column))
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                let mut ddl = format!(
                    "CREATE {unique}{organization} INDEX {} ON {table} ({keys})",
                    quote_ident(target.name),
                );
                let included: Vec<&str> = rows
                    .iter()
                    .filter(|r| r.is_included)
                    .map(|r| r.column.as_str())
                    .collect();
                if !included.is_empty() {
                    ddl.push_str(&format!(" INCLUDE ({})", bracket_list(included.into_iter())));
                }
                ddl
            }
            IndexLayout::ClusteredColumnstore => format!(
                "CREATE CLUSTERED COLUMNSTORE INDEX {} ON {table}",
                quote_ident(target.name)
            ),
            // columnstore columns carry no key order
            IndexLayout::NonclusteredColumnstore => format!(
                "CREATE NONCLUSTERED COLUMNSTORE INDEX {} ON {table} ({})",
                quote_ident(target.name),
                bracket_list(rows.iter().map(|r| r.column.as_str()))
            ),
        };
        if let Some(predicate) = &head.filter {
            ddl.push_str(&format!(" WHERE {predicate}"));
        }
        if options.storage.allow_filegroup {
            if let Some(filegroup) = &head.filegroup {
                ddl.push_str(&format!(" ON {}", quote_ident(filegroup)));
            }
        }
        Ok(ddl)
    }
    .boxed()
}

struct SequenceRow {
    data_type: String,
    start: String,
    increment: String,
    minimum: String,
    maximum: String,
    is_cycling: bool,
    is_cached: bool,
    cache_size: Option<i64>,
}

impl FromRecord for SequenceRow {
    fn from_record(record: &Record<'_>) -> Result<Self> {
        Ok(Self {
            data_type: record.text("DATA_TYPE")?,
            start: record.text("START_VALUE")?,
            increment: record.text("INCREMENT")?,
            minimum: record.text("MIN_VALUE")?,
            maximum: record.text("MAX_VALUE")?,
            is_cycling: record.flag("IS_CYCLING")?,
            is_cached: record.flag("IS_CACHED")?,
            cache_size: record.opt_i64("CACHE_SIZE")?,
        })
    }
}

fn sequence<'a>(
    executor: &'a Executor,
    target: &'a DdlTarget<'a>,
    _options: &'a DdlOptions,
) -> BoxFuture<'a, Result<String>> {
    async move {
        let rows = executor
            .exec_as::<SequenceRow>(&[
                "SELECT",
                "    TYPE_NAME(seq.user_type_id) AS DATA_TYPE,",
                "    CONVERT(NVARCHAR(64), seq.start_value) AS START_VALUE,",
                "    CONVERT(NVARCHAR(64), seq.increment) AS INCREMENT,",
                "    CONVERT(NVARCHAR(64), seq.minimum_value) AS MIN_VALUE,",
                "    CONVERT(NVARCHAR(64), seq.maximum_value) AS MAX_VALUE,",
                "    seq.is_cycling AS IS_CYCLING,",
                "    seq.is_cached AS IS_CACHED,",
                "    seq.cache_size AS CACHE_SIZE",
                "FROM sys.sequences seq",
                "JOIN sys.schemas s ON seq.schema_id = s.schema_id",
                format!("WHERE {}", object_filter(target, "seq")).as_str(),
            ]
            .join("\n"))
            .await?;
        let seq = rows
            .into_iter()
            .next()
            .ok_or_else(|| DdlSyncError::not_found("sequence", target.name))?;

        let cycle = if seq.is_cycling { "CYCLE" } else { "NO CYCLE" };
        let cache = match (seq.is_cached, seq.cache_size) {
            (false, _) => " NO CACHE".to_string(),
            (true, Some(size)) => format!(" CACHE {size}"),
            (true, None) => " CACHE".to_string(),
        };
        Ok(format!(
            "CREATE SEQUENCE {} AS {} START WITH {} INCREMENT BY {} MINVALUE {} MAXVALUE {} {cycle}{cache}",
            qualified(target.schema, target.name),
            seq.data_type.to_uppercase(),
            seq.start,
            seq.increment,
            seq.minimum,
            seq.maximum,
        ))
    }
    .boxed()
}

fn synonym<'a>(
    executor: &'a Executor,
    target: &'a DdlTarget<'a>,
    _options: &'a DdlOptions,
) -> BoxFuture<'a, Result<String>> {
    async move {
        let rows = executor
            .exec_as::<TextRow>(&[
                "SELECT syn.base_object_name AS TEXT",
                "FROM sys.synonyms syn",
                "JOIN sys.schemas s ON syn.schema_id = s.schema_id",
                format!("WHERE {}", object_filter(target, "syn")).as_str(),
            ]
            .join("\n"))
            .await?;
        let TextRow(base) = rows
            .into_iter()
            .next()
            .ok_or_else(|| DdlSyncError::not_found("synonym", target.name))?;
        Ok(format!(
            "CREATE SYNONYM {} FOR {base}",
            qualified(target.schema, target.name)
        ))
    }
    .boxed()
}

struct DatabaseRow {
    collation: Option<String>,
}

impl FromRecord for DatabaseRow {
    fn from_record(record: &Record<'_>) -> Result<Self> {
        Ok(Self {
            collation: record.opt_text("COLLATION_NAME")?,
        })
    }
}

fn database<'a>(
    executor: &'a Executor,
    target: &'a DdlTarget<'a>,
    _options: &'a DdlOptions,
) -> BoxFuture<'a, Result<String>> {
    async move {
        let rows = executor
            .exec_as::<DatabaseRow>(&format!(
                "SELECT collation_name AS COLLATION_NAME FROM sys.databases WHERE name = {}",
                quote_literal(target.name)
            ))
            .await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DdlSyncError::not_found("database", target.name))?;
        let mut ddl = format!("CREATE DATABASE {}", quote_ident(target.name));
        if let Some(collation) = row.collation {
            ddl.push_str(&format!(" COLLATE {collation}"));
        }
        Ok(ddl)
    }
    .boxed()
}

fn schema<'a>(
    executor: &'a Executor,
    target: &'a DdlTarget<'a>,
    _options: &'a DdlOptions,
) -> BoxFuture<'a, Result<String>> {
    async move {
        let rows = executor
            .exec_as::<TextRow>(&[
                "SELECT p.name AS TEXT",
                "FROM sys.schemas s",
                "JOIN sys.database_principals p ON s.principal_id = p.principal_id",
                format!("WHERE s.name = {}", quote_literal(target.name)).as_str(),
            ]
            .join("\n"))
            .await?;
        let TextRow(owner) = rows
            .into_iter()
            .next()
            .ok_or_else(|| DdlSyncError::not_found("schema", target.name))?;
        Ok(format!(
            "CREATE SCHEMA {} AUTHORIZATION {}",
            quote_ident(target.name),
            quote_ident(&owner)
        ))
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlimited_varchar_renders_max() {
        assert_eq!(column_type("varchar", -1, 0, 0), "VARCHAR(MAX)");
        assert_eq!(column_type("varbinary", -1, 0, 0), "VARBINARY(MAX)");
    }

    #[test]
    fn test_double_byte_length_is_halved() {
        assert_eq!(column_type("nvarchar", 100, 0, 0), "NVARCHAR(50)");
        assert_eq!(column_type("nchar", 20, 0, 0), "NCHAR(10)");
        assert_eq!(column_type("nvarchar", -1, 0, 0), "NVARCHAR(MAX)");
    }

    #[test]
    fn test_decimal_always_renders_precision_and_scale() {
        assert_eq!(column_type("decimal", 9, 18, 0), "DECIMAL(18, 0)");
        assert_eq!(column_type("numeric", 9, 10, 4), "NUMERIC(10, 4)");
    }

    #[test]
    fn test_time_types_render_scale() {
        assert_eq!(column_type("datetime2", 8, 27, 7), "DATETIME2(7)");
        assert_eq!(column_type("time", 5, 16, 3), "TIME(3)");
        assert_eq!(column_type("int", 4, 10, 0), "INT");
    }

    #[test]
    fn test_column_rendering() {
        let identity = ColumnRow {
            name: "ID".into(),
            data_type: "int".into(),
            max_length: 4,
            precision: 10,
            scale: 0,
            is_nullable: false,
            identity: Some(("1".into(), "1".into())),
            computed: None,
            is_persisted: false,
            default_value: None,
        };
        assert_eq!(identity.render(), "[ID] INT IDENTITY(1, 1) NOT NULL");

        let computed = ColumnRow {
            name: "TOTAL".into(),
            computed: Some("([QTY]*[PRICE])".into()),
            is_persisted: true,
            identity: None,
            ..identity
        };
        assert_eq!(computed.render(), "[TOTAL] AS ([QTY]*[PRICE]) PERSISTED");
    }

    #[test]
    fn test_index_layout_from_type_desc() {
        assert_eq!(
            IndexLayout::from_type_desc("CLUSTERED").expect("rowstore"),
            IndexLayout::Rowstore("CLUSTERED")
        );
        assert_eq!(
            IndexLayout::from_type_desc("NONCLUSTERED").expect("rowstore"),
            IndexLayout::Rowstore("NONCLUSTERED")
        );
        assert_eq!(
            IndexLayout::from_type_desc("NONCLUSTERED COLUMNSTORE").expect("columnstore"),
            IndexLayout::NonclusteredColumnstore
        );
        for desc in ["XML", "SPATIAL", "NONCLUSTERED HASH", "HEAP"] {
            let error = IndexLayout::from_type_desc(desc).expect_err(desc);
            assert!(
                matches!(error, DdlSyncError::UnsupportedFeature { .. }),
                "{desc}: {error:?}"
            );
        }
    }

    #[test]
    fn test_referential_action() {
        assert_eq!(referential_action("DELETE", "NO_ACTION"), "");
        assert_eq!(referential_action("DELETE", "SET_NULL"), " ON DELETE SET NULL");
    }
}
