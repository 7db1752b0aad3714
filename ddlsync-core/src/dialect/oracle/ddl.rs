use super::{ColumnType, qualified, quote_ident};
use crate::dialect::{DdlGenerator, DdlOptions, DdlTarget, group_consecutive, quote_literal};
use crate::executor::Executor;
use crate::models::ObjectKind;
use crate::value::{FromRecord, Record};
use crate::{DdlSyncError, Result};
use futures::FutureExt;
use futures::future::BoxFuture;

pub(super) static GENERATORS: &[(ObjectKind, DdlGenerator)] = &[
    (ObjectKind::Table, table),
    (ObjectKind::View, view),
    (ObjectKind::MaterializedView, materialized_view),
    (ObjectKind::Index, index),
    (ObjectKind::Trigger, trigger),
    (ObjectKind::Procedure, procedure),
    (ObjectKind::Function, function),
    (ObjectKind::Package, package),
    (ObjectKind::PackageBody, package_body),
    (ObjectKind::Type, type_spec),
    (ObjectKind::TypeBody, type_body),
    (ObjectKind::Sequence, sequence),
    (ObjectKind::Synonym, synonym),
    (ObjectKind::Job, job),
];

fn owner_filter(target: &DdlTarget<'_>, owner: &str, name: &str) -> String {
    format!(
        "{owner} = {} AND {name} = {}",
        quote_literal(target.schema),
        quote_literal(target.name)
    )
}

struct TextRow(String);

impl FromRecord for TextRow {
    fn from_record(record: &Record<'_>) -> Result<Self> {
        Ok(Self(record.opt_text("TEXT")?.unwrap_or_default()))
    }
}

struct ColumnRow {
    name: String,
    column_type: ColumnType,
    nullable: bool,
    default_value: Option<String>,
    is_virtual: bool,
    identity: Option<String>,
}

impl FromRecord for ColumnRow {
    fn from_record(record: &Record<'_>) -> Result<Self> {
        Ok(Self {
            name: record.text("COLUMN_NAME")?,
            column_type: ColumnType::from_record(record)?,
            nullable: record.text("NULLABLE")? != "N",
            default_value: record
                .opt_text("DATA_DEFAULT")?
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            is_virtual: record.flag("VIRTUAL_COLUMN")?,
            identity: record.opt_text("GENERATION_TYPE")?,
        })
    }
}

impl ColumnRow {
    fn render(&self) -> String {
        let mut def = format!("{} {}", quote_ident(&self.name), self.column_type.render());
        if self.is_virtual {
            if let Some(expression) = &self.default_value {
                def.push_str(&format!(" GENERATED ALWAYS AS ({expression}) VIRTUAL"));
            }
            return def;
        }
        if let Some(generation) = &self.identity {
            def.push_str(&format!(" GENERATED {generation} AS IDENTITY"));
        } else if let Some(default) = &self.default_value {
            def.push_str(&format!(" DEFAULT {default}"));
        }
        if !self.nullable {
            def.push_str(" NOT NULL");
        }
        def
    }
}

struct ConstraintRow {
    name: String,
    constraint_type: String,
    column: String,
    ref_schema: Option<String>,
    ref_table: Option<String>,
    ref_column: Option<String>,
    delete_rule: Option<String>,
}

impl FromRecord for ConstraintRow {
    fn from_record(record: &Record<'_>) -> Result<Self> {
        Ok(Self {
            name: record.text("CONSTRAINT_NAME")?,
            constraint_type: record.text("CONSTRAINT_TYPE")?,
            column: record.text("COLUMN_NAME")?,
            ref_schema: record.opt_text("REF_SCHEMA")?,
            ref_table: record.opt_text("REF_TABLE")?,
            ref_column: record.opt_text("REF_COLUMN")?,
            delete_rule: record.opt_text("DELETE_RULE")?,
        })
    }
}

fn quoted_list<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.map(quote_ident).collect::<Vec<_>>().join(", ")
}

fn render_constraint(name: &str, members: &[ConstraintRow]) -> String {
    let head = &members[0];
    let columns = quoted_list(members.iter().map(|m| m.column.as_str()));
    match head.constraint_type.as_str() {
        "P" => format!("CONSTRAINT {} PRIMARY KEY ({columns})", quote_ident(name)),
        "U" => format!("CONSTRAINT {} UNIQUE ({columns})", quote_ident(name)),
        _ => {
            let referenced = qualified(
                head.ref_schema.as_deref().unwrap_or_default(),
                head.ref_table.as_deref().unwrap_or_default(),
            );
            let ref_columns = quoted_list(members.iter().filter_map(|m| m.ref_column.as_deref()));
            let on_delete = match head.delete_rule.as_deref() {
                Some(rule) if rule != "NO ACTION" => format!(" ON DELETE {rule}"),
                _ => String::new(),
            };
            format!(
                "CONSTRAINT {} FOREIGN KEY ({columns}) REFERENCES {referenced} ({ref_columns}){on_delete}",
                quote_ident(name)
            )
        }
    }
}

struct StorageRow {
    tablespace: Option<String>,
    pct_free: Option<i64>,
    initial: Option<i64>,
    next: Option<i64>,
}

impl FromRecord for StorageRow {
    fn from_record(record: &Record<'_>) -> Result<Self> {
        Ok(Self {
            tablespace: record.opt_text("TABLESPACE_NAME")?,
            pct_free: record.opt_i64("PCT_FREE")?,
            initial: record.opt_i64("INITIAL_EXTENT")?,
            next: record.opt_i64("NEXT_EXTENT")?,
        })
    }
}

impl StorageRow {
    fn render(&self, options: &DdlOptions) -> String {
        let mut clauses = Vec::new();
        if options.storage.allow_storage {
            if let Some(pct_free) = self.pct_free {
                clauses.push(format!("PCTFREE {pct_free}"));
            }
            let extents: Vec<String> = [("INITIAL", self.initial), ("NEXT", self.next)]
                .into_iter()
                .filter_map(|(label, size)| size.map(|s| format!("{label} {s}")))
                .collect();
            if !extents.is_empty() {
                clauses.push(format!("STORAGE ({})", extents.join(" ")));
            }
        }
        if options.storage.allow_tablespace {
            if let Some(tablespace) = &self.tablespace {
                clauses.push(format!("TABLESPACE {}", quote_ident(tablespace)));
            }
        }
        clauses.join("\n")
    }
}

fn table<'a>(
    executor: &'a Executor,
    target: &'a DdlTarget<'a>,
    options: &'a DdlOptions,
) -> BoxFuture<'a, Result<String>> {
    async move {
        let columns = executor
            .exec_as::<ColumnRow>(&[
                "SELECT",
                "    c.COLUMN_NAME, c.DATA_TYPE, c.DATA_LENGTH, c.DATA_PRECISION, c.DATA_SCALE,",
                "    c.CHAR_LENGTH, c.CHAR_USED, c.NULLABLE, c.DATA_DEFAULT, c.VIRTUAL_COLUMN,",
                "    i.GENERATION_TYPE",
                "FROM ALL_TAB_COLS c",
                "LEFT JOIN ALL_TAB_IDENTITY_COLS i ON c.OWNER = i.OWNER AND c.TABLE_NAME = i.TABLE_NAME AND c.COLUMN_NAME = i.COLUMN_NAME",
                format!("WHERE {}", owner_filter(target, "c.OWNER", "c.TABLE_NAME")).as_str(),
                "  AND c.HIDDEN_COLUMN = 'NO'",
                "ORDER BY c.COLUMN_ID",
            ]
            .join("\n"))
            .await?;
        if columns.is_empty() {
            return Err(DdlSyncError::not_found("table", target.name));
        }

        let constraints = executor
            .exec_as::<ConstraintRow>(&[
                "SELECT",
                "    c.CONSTRAINT_NAME, c.CONSTRAINT_TYPE, cc.COLUMN_NAME,",
                "    rc.OWNER AS REF_SCHEMA, rc.TABLE_NAME AS REF_TABLE, rc.COLUMN_NAME AS REF_COLUMN,",
                "    c.DELETE_RULE",
                "FROM ALL_CONSTRAINTS c",
                "JOIN ALL_CONS_COLUMNS cc ON c.OWNER = cc.OWNER AND c.CONSTRAINT_NAME = cc.CONSTRAINT_NAME",
                "LEFT JOIN ALL_CONS_COLUMNS rc ON c.R_OWNER = rc.OWNER AND c.R_CONSTRAINT_NAME = rc.CONSTRAINT_NAME AND cc.POSITION = rc.POSITION",
                format!("WHERE {}", owner_filter(target, "c.OWNER", "c.TABLE_NAME")).as_str(),
                "  AND c.CONSTRAINT_TYPE IN ('P', 'U', 'R')",
                "ORDER BY CASE c.CONSTRAINT_TYPE WHEN 'P' THEN 1 WHEN 'U' THEN 2 ELSE 3 END, c.CONSTRAINT_NAME, cc.POSITION",
            ]
            .join("\n"))
            .await?;

        let mut parts: Vec<String> = columns.iter().map(ColumnRow::render).collect();
        for (name, members) in group_consecutive(constraints, |c| c.name.clone()) {
            parts.push(render_constraint(&name, &members));
        }

        let mut ddl = format!(
            "CREATE TABLE {} (\n    {}\n)",
            qualified(target.schema, target.name),
            parts.join(",\n    ")
        );

        if options.storage.allow_storage || options.storage.allow_tablespace {
            let storage = executor
                .exec_as::<StorageRow>(&format!(
                    "SELECT TABLESPACE_NAME, PCT_FREE, INITIAL_EXTENT, NEXT_EXTENT FROM ALL_TABLES WHERE {}",
                    owner_filter(target, "OWNER", "TABLE_NAME")
                ))
                .await?;
            if let Some(row) = storage.first() {
                let clause = row.render(options);
                if !clause.is_empty() {
                    ddl.push('\n');
                    ddl.push_str(&clause);
                }
            }
        }
        ddl.push(';');
        Ok(ddl)
    }
    .boxed()
}

fn view<'a>(
    executor: &'a Executor,
    target: &'a DdlTarget<'a>,
    _options: &'a DdlOptions,
) -> BoxFuture<'a, Result<String>> {
    async move {
        let rows = executor
            .exec_as::<TextRow>(&format!(
                "SELECT TEXT FROM ALL_VIEWS WHERE {}",
                owner_filter(target, "OWNER", "VIEW_NAME")
            ))
            .await?;
        let TextRow(text) = rows
            .into_iter()
            .next()
            .ok_or_else(|| DdlSyncError::not_found("view", target.name))?;
        Ok(format!(
            "CREATE OR REPLACE VIEW {} AS\n{};",
            qualified(target.schema, target.name),
            text.trim()
        ))
    }
    .boxed()
}

struct MviewRow {
    query: String,
    refresh_method: Option<String>,
    refresh_mode: Option<String>,
}

impl FromRecord for MviewRow {
    fn from_record(record: &Record<'_>) -> Result<Self> {
        Ok(Self {
            query: record.opt_text("QUERY")?.unwrap_or_default(),
            refresh_method: record.opt_text("REFRESH_METHOD")?,
            refresh_mode: record.opt_text("REFRESH_MODE")?,
        })
    }
}

fn materialized_view<'a>(
    executor: &'a Executor,
    target: &'a DdlTarget<'a>,
    _options: &'a DdlOptions,
) -> BoxFuture<'a, Result<String>> {
    async move {
        let rows = executor
            .exec_as::<MviewRow>(&format!(
                "SELECT QUERY, REFRESH_METHOD, REFRESH_MODE FROM ALL_MVIEWS WHERE {}",
                owner_filter(target, "OWNER", "MVIEW_NAME")
            ))
            .await?;
        let mview = rows
            .into_iter()
            .next()
            .ok_or_else(|| DdlSyncError::not_found("materialized view", target.name))?;
        let refresh = match (mview.refresh_method.as_deref(), mview.refresh_mode.as_deref()) {
            (Some("NEVER"), _) => "NEVER REFRESH".to_string(),
            (Some(method), Some(mode)) if mode != "NEVER" => format!("REFRESH {method} ON {mode}"),
            (Some(method), _) => format!("REFRESH {method}"),
            (None, _) => String::new(),
        };
        let mut ddl = format!(
            "CREATE MATERIALIZED VIEW {}",
            qualified(target.schema, target.name)
        );
        if !refresh.is_empty() {
            ddl.push('\n');
            ddl.push_str(&refresh);
        }
        ddl.push_str(&format!("\nAS\n{};", mview.query.trim()));
        Ok(ddl)
    }
    .boxed()
}

/// Source lines of a stored unit from `ALL_SOURCE`, or `None` when absent.
async fn source_text(executor: &Executor, target: &DdlTarget<'_>, source_type: &str) -> Result<Option<String>> {
    let rows = executor
        .exec_as::<TextRow>(&format!(
            "SELECT TEXT FROM ALL_SOURCE WHERE {} AND TYPE = {} ORDER BY LINE",
            owner_filter(target, "OWNER", "NAME"),
            quote_literal(source_type)
        ))
        .await?;
    if rows.is_empty() {
        return Ok(None);
    }
    let text: String = rows.into_iter().map(|TextRow(line)| line).collect();
    Ok(Some(format!("CREATE OR REPLACE {}\n/", text.trim_end())))
}

async fn stored_unit(
    executor: &Executor,
    target: &DdlTarget<'_>,
    source_type: &str,
    body_type: Option<&str>,
) -> Result<String> {
    let spec = source_text(executor, target, source_type)
        .await?
        .ok_or_else(|| DdlSyncError::not_found(source_type.to_lowercase(), target.name))?;
    match body_type {
        Some(body_type) => match source_text(executor, target, body_type).await? {
            Some(body) => Ok(format!("{spec}\n\n{body}")),
            None => Ok(spec),
        },
        None => Ok(spec),
    }
}

fn trigger<'a>(
    executor: &'a Executor,
    target: &'a DdlTarget<'a>,
    _options: &'a DdlOptions,
) -> BoxFuture<'a, Result<String>> {
    stored_unit(executor, target, "TRIGGER", None).boxed()
}

fn procedure<'a>(
    executor: &'a Executor,
    target: &'a DdlTarget<'a>,
    _options: &'a DdlOptions,
) -> BoxFuture<'a, Result<String>> {
    stored_unit(executor, target, "PROCEDURE", None).boxed()
}

fn function<'a>(
    executor: &'a Executor,
    target: &'a DdlTarget<'a>,
    _options: &'a DdlOptions,
) -> BoxFuture<'a, Result<String>> {
    stored_unit(executor, target, "FUNCTION", None).boxed()
}

fn package<'a>(
    executor: &'a Executor,
    target: &'a DdlTarget<'a>,
    options: &'a DdlOptions,
) -> BoxFuture<'a, Result<String>> {
    let body = (!options.separate_package_body).then_some("PACKAGE BODY");
    stored_unit(executor, target, "PACKAGE", body).boxed()
}

fn package_body<'a>(
    executor: &'a Executor,
    target: &'a DdlTarget<'a>,
    _options: &'a DdlOptions,
) -> BoxFuture<'a, Result<String>> {
    stored_unit(executor, target, "PACKAGE BODY", None).boxed()
}

fn type_spec<'a>(
    executor: &'a Executor,
    target: &'a DdlTarget<'a>,
    options: &'a DdlOptions,
) -> BoxFuture<'a, Result<String>> {
    let body = (!options.separate_type_body).then_some("TYPE BODY");
    stored_unit(executor, target, "TYPE", body).boxed()
}

fn type_body<'a>(
    executor: &'a Executor,
    target: &'a DdlTarget<'a>,
    _options: &'a DdlOptions,
) -> BoxFuture<'a, Result<String>> {
    stored_unit(executor, target, "TYPE BODY", None).boxed()
}

struct IndexColumnRow {
    uniqueness: String,
    index_type: String,
    table_owner: String,
    table_name: String,
    tablespace: Option<String>,
    column: String,
    descending: bool,
    expression: Option<String>,
}

impl FromRecord for IndexColumnRow {
    fn from_record(record: &Record<'_>) -> Result<Self> {
        Ok(Self {
            uniqueness: record.text("UNIQUENESS")?,
            index_type: record.text("INDEX_TYPE")?,
            table_owner: record.text("TABLE_OWNER")?,
            table_name: record.text("TABLE_NAME")?,
            tablespace: record.opt_text("TABLESPACE_NAME")?,
            column: record.text("COLUMN_NAME")?,
            descending: record.opt_text("DESCEND")?.as_deref() == Some("DESC"),
            expression: record
                .opt_text("COLUMN_EXPRESSION")?
                .map(|e| e.trim().to_string()),
        })
    }
}

impl IndexColumnRow {
    fn render_key(&self) -> String {
        let key = match &self.expression {
            Some(expression) => expression.clone(),
            None => quote_ident(&self.column),
        };
        if self.descending {
            format!("{key} DESC")
        } else {
            key
        }
    }
}

fn index<'a>(
    executor: &'a Executor,
    target: &'a DdlTarget<'a>,
    options: &'a DdlOptions,
) -> BoxFuture<'a, Result<String>> {
    async move {
        let mut filter = owner_filter(target, "i.OWNER", "i.INDEX_NAME");
        if let Some(parent) = target.parent {
            filter.push_str(&format!(" AND i.TABLE_NAME = {}", quote_literal(parent)));
        }
        let rows = executor
            .exec_as::<IndexColumnRow>(&[
                "SELECT",
                "    i.UNIQUENESS, i.INDEX_TYPE, i.TABLE_OWNER, i.TABLE_NAME, i.TABLESPACE_NAME,",
                "    ic.COLUMN_NAME, ic.DESCEND, ie.COLUMN_EXPRESSION",
                "FROM ALL_INDEXES i",
                "JOIN ALL_IND_COLUMNS ic ON i.OWNER = ic.INDEX_OWNER AND i.INDEX_NAME = ic.INDEX_NAME",
                "LEFT JOIN ALL_IND_EXPRESSIONS ie ON ic.INDEX_OWNER = ie.INDEX_OWNER AND ic.INDEX_NAME = ie.INDEX_NAME AND ic.COLUMN_POSITION = ie.COLUMN_POSITION",
                format!("WHERE {filter}").as_str(),
                "ORDER BY ic.COLUMN_POSITION",
            ]
            .join("\n"))
            .await?;
        let Some(head) = rows.first() else {
            return Err(DdlSyncError::not_found("index", target.name));
        };

        let kind = if head.index_type.starts_with("BITMAP") {
            "BITMAP "
        } else if head.uniqueness == "UNIQUE" {
            "UNIQUE "
        } else {
            ""
        };
        let keys = rows
            .iter()
            .map(IndexColumnRow::render_key)
            .collect::<Vec<_>>()
            .join(", ");
        let mut ddl = format!(
            "CREATE {kind}INDEX {} ON {} ({keys})",
            qualified(target.schema, target.name),
            qualified(&head.table_owner, &head.table_name)
        );
        if options.storage.allow_tablespace {
            if let Some(tablespace) = &head.tablespace {
                ddl.push_str(&format!(" TABLESPACE {}", quote_ident(tablespace)));
            }
        }
        ddl.push(';');
        Ok(ddl)
    }
    .boxed()
}

struct SequenceRow {
    min_value: String,
    max_value: String,
    increment: String,
    cycle: bool,
    order: bool,
    cache_size: i64,
}

impl FromRecord for SequenceRow {
    fn from_record(record: &Record<'_>) -> Result<Self> {
        Ok(Self {
            min_value: record.text("MIN_VALUE")?,
            max_value: record.text("MAX_VALUE")?,
            increment: record.text("INCREMENT_BY")?,
            cycle: record.flag("CYCLE_FLAG")?,
            order: record.flag("ORDER_FLAG")?,
            cache_size: record.opt_i64("CACHE_SIZE")?.unwrap_or(0),
        })
    }
}

impl SequenceRow {
    /// MAX_VALUE for descending sequences, MIN_VALUE otherwise.
    fn start(&self) -> &str {
        if self.increment.trim_start().starts_with('-') {
            &self.max_value
        } else {
            &self.min_value
        }
    }
}

fn sequence<'a>(
    executor: &'a Executor,
    target: &'a DdlTarget<'a>,
    _options: &'a DdlOptions,
) -> BoxFuture<'a, Result<String>> {
    async move {
        let rows = executor
            .exec_as::<SequenceRow>(&format!(
                "SELECT MIN_VALUE, MAX_VALUE, INCREMENT_BY, CYCLE_FLAG, ORDER_FLAG, CACHE_SIZE FROM ALL_SEQUENCES WHERE {}",
                owner_filter(target, "SEQUENCE_OWNER", "SEQUENCE_NAME")
            ))
            .await?;
        let seq = rows
            .into_iter()
            .next()
            .ok_or_else(|| DdlSyncError::not_found("sequence", target.name))?;
        let cache = if seq.cache_size > 0 {
            format!("CACHE {}", seq.cache_size)
        } else {
            "NOCACHE".to_string()
        };
        Ok(format!(
            "CREATE SEQUENCE {} MINVALUE {} MAXVALUE {} INCREMENT BY {} START WITH {} {cache} {} {};",
            qualified(target.schema, target.name),
            seq.min_value,
            seq.max_value,
            seq.increment,
            seq.start(),
            if seq.order { "ORDER" } else { "NOORDER" },
            if seq.cycle { "CYCLE" } else { "NOCYCLE" },
        ))
    }
    .boxed()
}

struct SynonymRow {
    table_owner: Option<String>,
    table_name: String,
    db_link: Option<String>,
}

impl FromRecord for SynonymRow {
    fn from_record(record: &Record<'_>) -> Result<Self> {
        Ok(Self {
            table_owner: record.opt_text("TABLE_OWNER")?,
            table_name: record.text("TABLE_NAME")?,
            db_link: record.opt_text("DB_LINK")?,
        })
    }
}

fn synonym<'a>(
    executor: &'a Executor,
    target: &'a DdlTarget<'a>,
    _options: &'a DdlOptions,
) -> BoxFuture<'a, Result<String>> {
    async move {
        let rows = executor
            .exec_as::<SynonymRow>(&format!(
                "SELECT TABLE_OWNER, TABLE_NAME, DB_LINK FROM ALL_SYNONYMS WHERE {}",
                owner_filter(target, "OWNER", "SYNONYM_NAME")
            ))
            .await?;
        let syn = rows
            .into_iter()
            .next()
            .ok_or_else(|| DdlSyncError::not_found("synonym", target.name))?;
        let mut referenced = match &syn.table_owner {
            Some(owner) => qualified(owner, &syn.table_name),
            None => quote_ident(&syn.table_name),
        };
        if let Some(link) = &syn.db_link {
            referenced.push('@');
            referenced.push_str(link);
        }
        Ok(format!(
            "CREATE OR REPLACE SYNONYM {} FOR {referenced};",
            qualified(target.schema, target.name)
        ))
    }
    .boxed()
}

fn job<'a>(
    executor: &'a Executor,
    target: &'a DdlTarget<'a>,
    _options: &'a DdlOptions,
) -> BoxFuture<'a, Result<String>> {
    async move {
        let rows = executor
            .exec_as::<TextRow>(&format!(
                "SELECT DBMS_METADATA.GET_DDL('PROCOBJ', {}, {}) AS TEXT FROM DUAL",
                quote_literal(target.name),
                quote_literal(target.schema)
            ))
            .await?;
        rows.into_iter()
            .map(|TextRow(text)| text.trim().to_string())
            .find(|text| !text.is_empty())
            .ok_or_else(|| DdlSyncError::not_found("job", target.name))
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str) -> ColumnRow {
        ColumnRow {
            name: name.into(),
            column_type: ColumnType {
                data_type: "NUMBER".into(),
                data_length: 22,
                precision: Some(10),
                scale: Some(0),
                char_length: 0,
                char_used: None,
            },
            nullable: true,
            default_value: None,
            is_virtual: false,
            identity: None,
        }
    }

    #[test]
    fn test_identity_column() {
        let id = ColumnRow {
            nullable: false,
            identity: Some("BY DEFAULT".into()),
            default_value: Some("\"HR\".\"ISEQ$$_1\".nextval".into()),
            ..column("ID")
        };
        assert_eq!(
            id.render(),
            "\"ID\" NUMBER(10) GENERATED BY DEFAULT AS IDENTITY NOT NULL"
        );
    }

    #[test]
    fn test_virtual_column() {
        let total = ColumnRow {
            is_virtual: true,
            default_value: Some("\"QTY\"*\"PRICE\"".into()),
            ..column("TOTAL")
        };
        assert_eq!(
            total.render(),
            "\"TOTAL\" NUMBER(10) GENERATED ALWAYS AS (\"QTY\"*\"PRICE\") VIRTUAL"
        );
    }

    #[test]
    fn test_default_value() {
        let status = ColumnRow {
            default_value: Some("0".into()),
            ..column("STATUS")
        };
        assert_eq!(status.render(), "\"STATUS\" NUMBER(10) DEFAULT 0");
    }

    #[test]
    fn test_foreign_key_constraint() {
        let members = vec![ConstraintRow {
            name: "FK_EMP_DEPT".into(),
            constraint_type: "R".into(),
            column: "DEPT_ID".into(),
            ref_schema: Some("HR".into()),
            ref_table: Some("DEPT".into()),
            ref_column: Some("ID".into()),
            delete_rule: Some("CASCADE".into()),
        }];
        assert_eq!(
            render_constraint("FK_EMP_DEPT", &members),
            "CONSTRAINT \"FK_EMP_DEPT\" FOREIGN KEY (\"DEPT_ID\") REFERENCES \"HR\".\"DEPT\" (\"ID\") ON DELETE CASCADE"
        );
    }

    #[test]
    fn test_descending_sequence_starts_at_max() {
        let seq = SequenceRow {
            min_value: "1".into(),
            max_value: "1000".into(),
            increment: "-1".into(),
            cycle: false,
            order: false,
            cache_size: 20,
        };
        assert_eq!(seq.start(), "1000");
        let ascending = SequenceRow {
            increment: "5".into(),
            ..seq
        };
        assert_eq!(ascending.start(), "1");
    }

    #[test]
    fn test_storage_clause_follows_toggles() {
        let row = StorageRow {
            tablespace: Some("USERS".into()),
            pct_free: Some(10),
            initial: Some(65536),
            next: None,
        };
        let mut options = DdlOptions::default();
        assert_eq!(row.render(&options), "");
        options.storage.allow_tablespace = true;
        assert_eq!(row.render(&options), "TABLESPACE \"USERS\"");
        options.storage.allow_storage = true;
        assert_eq!(
            row.render(&options),
            "PCTFREE 10\nSTORAGE (INITIAL 65536)\nTABLESPACE \"USERS\""
        );
    }
}
