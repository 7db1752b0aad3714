//! Object selection, output paths and table-fill settings.

use crate::models::{FillKind, ObjectKind};
use crate::pattern::{matches_table, same_name};
use serde::{Deserialize, Serialize};

/// Default number of rows exported by a demo fill.
pub const DEFAULT_DEMO_COUNT: u32 = 3;

/// Schema inclusion mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SchemaMode {
    /// Keep only listed schemas
    Include,
    /// Drop listed schemas
    #[default]
    Except,
}

/// Which schemas to synchronize.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaSelection {
    /// Schema names compared case-insensitively
    pub list: Vec<String>,
    /// How `list` is applied
    pub mode: SchemaMode,
    /// Output path template for schema scripts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

impl SchemaSelection {
    /// Returns true when a discovered schema passes the filter.
    pub fn retains(&self, schema: &str) -> bool {
        let listed = self.list.iter().any(|s| same_name(s, schema));
        match self.mode {
            SchemaMode::Include => listed,
            SchemaMode::Except => !listed,
        }
    }
}

/// Output path template of one object kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Path template; unset disables the kind
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

impl PathConfig {
    /// Creates a path config with a template.
    pub fn new(dir: impl Into<String>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }
}

/// Storage clause toggles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageOptions {
    /// Render `ON [filegroup]` for SQL Server tables and indexes
    pub allow_filegroup: bool,
    /// Render Oracle `PCTFREE`/`STORAGE (...)` clauses
    pub allow_storage: bool,
    /// Render Oracle `TABLESPACE` clauses
    pub allow_tablespace: bool,
}

/// Output format of a table fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FillFormat {
    /// Insert script
    #[default]
    Sql,
    /// Structured JSON records
    Json,
}

/// A schema and table wildcard pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablePattern {
    /// Schema pattern
    pub schema: String,
    /// Table pattern
    pub table: String,
}

impl TablePattern {
    /// Creates a pattern pair.
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Returns true when the table matches both patterns.
    pub fn matches(&self, schema: &str, table: &str) -> bool {
        matches_table(schema, table, &self.schema, &self.table)
    }
}

/// A column masking rule for demo fills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskRule {
    /// Schema pattern
    pub schema: String,
    /// Table pattern
    pub table: String,
    /// Column pattern
    pub field: String,
}

impl MaskRule {
    /// Creates a masking rule.
    pub fn new(schema: impl Into<String>, table: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
            field: field.into(),
        }
    }
}

/// Demo filter mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FilterMode {
    /// Keep only matching demo tables
    Whitelist,
    /// Drop matching demo tables
    Blacklist,
}

/// Post-discovery filter applied to demo fill entries only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillFilter {
    /// How `list` is applied
    pub mode: FilterMode,
    /// Table patterns
    #[serde(default)]
    pub list: Vec<TablePattern>,
}

impl FillFilter {
    /// Returns true when a demo table passes the filter.
    pub fn retains(&self, schema: &str, table: &str) -> bool {
        let listed = self.list.iter().any(|p| p.matches(schema, table));
        match self.mode {
            FilterMode::Whitelist => listed,
            FilterMode::Blacklist => !listed,
        }
    }
}

/// Full data export settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillFullConfig {
    /// Output path template
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    /// Output format
    pub format: FillFormat,
    /// Tables exported in full
    pub list: Vec<TablePattern>,
}

/// Demo data export settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillDemoConfig {
    /// Output path template
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    /// Output format
    pub format: FillFormat,
    /// Row limit; zero disables demo fills
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    /// Keep existing demo files without regenerating them
    pub ignore_exists: bool,
    /// Whitelist or blacklist of demo tables
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<FillFilter>,
    /// Column masking rules
    pub mock: Vec<MaskRule>,
}

impl FillDemoConfig {
    /// Row limit for demo fills.
    pub fn effective_count(&self) -> u32 {
        self.count.unwrap_or(DEFAULT_DEMO_COUNT)
    }
}

/// What to synchronize and where to put it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectsConfig {
    /// Schema filter and schema script path
    pub schema: SchemaSelection,
    /// Database script path
    pub database: PathConfig,
    /// Storage clause toggles
    pub storage: StorageOptions,
    /// Prefix generated DDL with a descriptive header block
    pub stamp: bool,
    /// Table scripts
    pub table: PathConfig,
    /// View scripts
    pub view: PathConfig,
    /// Materialized view scripts
    pub mview: PathConfig,
    /// Index scripts
    pub index: PathConfig,
    /// Trigger scripts
    pub trigger: PathConfig,
    /// Package specification scripts
    pub package: PathConfig,
    /// Package body scripts; unset stores bodies with their specification
    pub package_body: PathConfig,
    /// Procedure scripts
    pub procedure: PathConfig,
    /// Function scripts
    pub function: PathConfig,
    /// Type specification scripts
    pub r#type: PathConfig,
    /// Type body scripts; unset stores bodies with their specification
    pub type_body: PathConfig,
    /// Sequence scripts
    pub sequence: PathConfig,
    /// Synonym scripts
    pub synonym: PathConfig,
    /// Scheduler job scripts
    pub job: PathConfig,
    /// Full data export
    pub table_fill_full: FillFullConfig,
    /// Demo data export
    pub table_fill_demo: FillDemoConfig,
}

impl ObjectsConfig {
    /// Path template configured for an object kind.
    pub fn dir_for(&self, kind: ObjectKind) -> Option<&str> {
        let path = match kind {
            ObjectKind::Database => return self.database.dir.as_deref(),
            ObjectKind::Schema => return self.schema.dir.as_deref(),
            ObjectKind::Table => &self.table,
            ObjectKind::View => &self.view,
            ObjectKind::MaterializedView => &self.mview,
            ObjectKind::Index => &self.index,
            ObjectKind::Trigger => &self.trigger,
            ObjectKind::Procedure => &self.procedure,
            ObjectKind::Function => &self.function,
            ObjectKind::Sequence => &self.sequence,
            ObjectKind::Synonym => &self.synonym,
            ObjectKind::Package => &self.package,
            ObjectKind::PackageBody => &self.package_body,
            ObjectKind::Type => &self.r#type,
            ObjectKind::TypeBody => &self.type_body,
            ObjectKind::Job => &self.job,
        };
        path.dir.as_deref()
    }

    /// Path template configured for a fill classification.
    pub fn fill_dir_for(&self, fill: FillKind) -> Option<&str> {
        match fill {
            FillKind::Full => self.table_fill_full.dir.as_deref(),
            FillKind::Demo => self.table_fill_demo.dir.as_deref(),
        }
    }

    /// Output format of a fill classification.
    pub fn fill_format(&self, fill: FillKind) -> FillFormat {
        match fill {
            FillKind::Full => self.table_fill_full.format,
            FillKind::Demo => self.table_fill_demo.format,
        }
    }

    /// Returns true when fills of the classification are produced.
    pub fn fill_enabled(&self, fill: FillKind) -> bool {
        match fill {
            FillKind::Full => self.table_fill_full.dir.is_some(),
            FillKind::Demo => {
                self.table_fill_demo.dir.is_some() && self.table_fill_demo.effective_count() > 0
            }
        }
    }

    /// Mask rules that apply to a table; full fills are never masked.
    pub fn mask_rules_for(&self, fill: FillKind) -> &[MaskRule] {
        match fill {
            FillKind::Full => &[],
            FillKind::Demo => &self.table_fill_demo.mock,
        }
    }
}
