//! Dialect-specific catalog SQL and rendering.
//!
//! Discovery, synthesis and fill generation are written once against
//! [`SqlDialect`]. Each backend supplies its catalog queries, its literal and
//! identifier rendering, and a static table mapping object kinds to DDL
//! generators.

pub mod mssql;
pub mod oracle;

use crate::Result;
use crate::config::{ObjectsConfig, StorageOptions};
use crate::executor::Executor;
use crate::models::{Dialect, ObjectKind, TableFill};
use crate::value::{ColumnDescriptor, Value};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::fmt::Write as _;

/// Renders the definition of one object.
pub type DdlGenerator =
    for<'a> fn(&'a Executor, &'a DdlTarget<'a>, &'a DdlOptions) -> BoxFuture<'a, Result<String>>;

/// The object a generator renders.
#[derive(Debug, Clone, Copy)]
pub struct DdlTarget<'a> {
    /// Owning schema
    pub schema: &'a str,
    /// Object name
    pub name: &'a str,
    /// Owning table of indexes and triggers
    pub parent: Option<&'a str>,
}

/// Settings that change generated definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DdlOptions {
    /// Database (SQL Server) or service (Oracle) name
    pub database: String,
    /// Storage clause toggles
    pub storage: StorageOptions,
    /// Package bodies are written to their own files
    pub separate_package_body: bool,
    /// Type bodies are written to their own files
    pub separate_type_body: bool,
}

impl DdlOptions {
    /// Derives generator options from the object settings.
    pub fn new(database: impl Into<String>, objects: &ObjectsConfig) -> Self {
        Self {
            database: database.into(),
            storage: objects.storage,
            separate_package_body: objects.package_body.dir.is_some(),
            separate_type_body: objects.type_body.dir.is_some(),
        }
    }
}

/// A column comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnComment {
    /// Column name
    pub column: String,
    /// Comment text
    pub comment: String,
}

/// A rendered column type with nullability, e.g. `NVARCHAR(50) NOT NULL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Column name
    pub column: String,
    /// Rendered type
    pub spec: String,
}

/// Comments and column specs of a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableDescription {
    /// Table comment, if any
    pub table_comment: Option<String>,
    /// Column comments in catalog order
    pub column_comments: Vec<ColumnComment>,
    /// Column specs in column order
    pub column_specs: Vec<ColumnSpec>,
}

impl TableDescription {
    /// Comment of one column, if any.
    pub fn comment_of(&self, column: &str) -> Option<&str> {
        self.column_comments
            .iter()
            .find(|c| c.column == column)
            .map(|c| c.comment.as_str())
    }

    /// Returns true when neither the table nor any column is commented.
    pub fn has_comments(&self) -> bool {
        self.table_comment.is_some() || !self.column_comments.is_empty()
    }
}

/// Exportable columns of a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillLayout {
    /// Columns in table order, typed from the catalog
    pub columns: Vec<ColumnDescriptor>,
    /// The table has an identity column
    pub has_identity: bool,
}

/// Catalog queries and rendering rules of one backend.
#[async_trait]
pub trait SqlDialect: Send + Sync {
    /// Dialect tag.
    fn dialect(&self) -> Dialect;

    /// Script run on every new session.
    fn init_script(&self) -> Option<&'static str>;

    /// Lists candidate schemas as `SCHEMA_NAME`.
    fn schemas_query(&self) -> String;

    /// Lists objects as `SCHEMA_NAME`, `OBJECT_TYPE`, `OBJECT_NAME`, tables
    /// and views first.
    fn objects_query(&self, schemas: &[String], objects: &ObjectsConfig) -> String;

    /// Lists standalone indexes as `SCHEMA_NAME`, `PARENT_NAME`, `OBJECT_NAME`.
    fn index_links_query(&self, schemas: &[String]) -> String;

    /// Lists table triggers as `SCHEMA_NAME`, `PARENT_NAME`, `OBJECT_NAME`.
    fn trigger_links_query(&self, schemas: &[String]) -> String;

    /// Lists primary key columns as `SCHEMA_NAME`, `TABLE_NAME`,
    /// `COLUMN_NAME`, in key order.
    fn primary_keys_query(&self, schemas: &[String]) -> String;

    /// DDL generators by object kind.
    fn generators(&self) -> &'static [(ObjectKind, DdlGenerator)];

    /// Fetches table and column comments plus column specs.
    ///
    /// # Errors
    /// Propagates query failures; missing comments are not an error.
    async fn describe_columns(
        &self,
        executor: &Executor,
        schema: &str,
        table: &str,
    ) -> Result<TableDescription>;

    /// Renders comments as statements that recreate them.
    fn describe_script(&self, schema: &str, table: &str, description: &TableDescription)
    -> String;

    /// Fetches the exportable columns of a table.
    ///
    /// # Errors
    /// Propagates query failures.
    async fn fill_columns(&self, executor: &Executor, schema: &str, table: &str)
    -> Result<FillLayout>;

    /// Builds the ordered, limited row query of a fill entry.
    fn fill_query(&self, schema: &str, entry: &TableFill, layout: &FillLayout) -> String;

    /// Renders a value as a SQL literal.
    fn render_literal(&self, value: &Value) -> String;

    /// Renders literal rows as insert statements.
    fn insert_script(
        &self,
        schema: &str,
        table: &str,
        layout: &FillLayout,
        rows: &[Vec<String>],
    ) -> String;

    /// Prefix that selects the database or schema of a script.
    fn preamble(&self, database: &str, schema: &str) -> String;
}

impl Dialect {
    /// Catalog SQL and rendering rules of the dialect.
    pub fn sql(self) -> &'static dyn SqlDialect {
        match self {
            Self::Mssql => &mssql::Mssql,
            Self::Oracle => &oracle::Oracle,
        }
    }
}

/// Rows per generated INSERT statement.
pub const INSERT_CHUNK_ROWS: usize = 1000;

/// Quotes text as a SQL string literal.
pub(crate) fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// Renders names as a comma-separated list of string literals.
pub(crate) fn in_list(names: &[String]) -> String {
    names
        .iter()
        .map(|n| quote_literal(n))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Uppercase hex digits of a byte string.
pub(crate) fn hex_upper(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02X}");
    }
    out
}

/// Groups consecutive rows that share a key, keeping first-seen order.
pub(crate) fn group_consecutive<T, K, F>(rows: Vec<T>, key: F) -> Vec<(K, Vec<T>)>
where
    K: PartialEq,
    F: Fn(&T) -> K,
{
    let mut groups: Vec<(K, Vec<T>)> = Vec::new();
    for row in rows {
        let k = key(&row);
        match groups.last_mut() {
            Some((last, members)) if *last == k => members.push(row),
            _ => groups.push((k, vec![row])),
        }
    }
    groups
}
