//! Catalog inventory built by discovery and consumed by synchronization.
//!
//! A [`Schema`] owns its objects, links and table-fill entries. Inventories
//! are rebuilt on every run and never persisted.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported database dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    /// Microsoft SQL Server
    #[serde(rename = "MSSQL")]
    Mssql,
    /// Oracle Database
    #[serde(rename = "ORA")]
    Oracle,
}

impl Dialect {
    /// Default listener port for the dialect.
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Mssql => 1433,
            Self::Oracle => 1521,
        }
    }

    /// Configuration tag of the dialect.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mssql => "MSSQL",
            Self::Oracle => "ORA",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of object kinds that can be synchronized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKind {
    /// Database-level definition
    Database,
    /// Schema definition
    Schema,
    /// Table
    Table,
    /// View
    View,
    /// Materialized view
    MaterializedView,
    /// Index on a table
    Index,
    /// Trigger on a table
    Trigger,
    /// Stored procedure
    Procedure,
    /// Function
    Function,
    /// Sequence
    Sequence,
    /// Synonym
    Synonym,
    /// Package specification
    Package,
    /// Package body
    PackageBody,
    /// Object type specification
    Type,
    /// Object type body
    TypeBody,
    /// Scheduler job
    Job,
}

impl ObjectKind {
    /// Every kind, in reporting order.
    pub const ALL: [Self; 16] = [
        Self::Database,
        Self::Schema,
        Self::Table,
        Self::View,
        Self::MaterializedView,
        Self::Index,
        Self::Trigger,
        Self::Procedure,
        Self::Function,
        Self::Sequence,
        Self::Synonym,
        Self::Package,
        Self::PackageBody,
        Self::Type,
        Self::TypeBody,
        Self::Job,
    ];

    /// Catalog spelling of the kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Database => "DATABASE",
            Self::Schema => "SCHEMA",
            Self::Table => "TABLE",
            Self::View => "VIEW",
            Self::MaterializedView => "MATERIALIZED_VIEW",
            Self::Index => "INDEX",
            Self::Trigger => "TRIGGER",
            Self::Procedure => "PROCEDURE",
            Self::Function => "FUNCTION",
            Self::Sequence => "SEQUENCE",
            Self::Synonym => "SYNONYM",
            Self::Package => "PACKAGE",
            Self::PackageBody => "PACKAGE_BODY",
            Self::Type => "TYPE",
            Self::TypeBody => "TYPE_BODY",
            Self::Job => "JOB",
        }
    }

    /// Parses a catalog kind name; spaces are treated as underscores.
    pub fn from_catalog(name: &str) -> Option<Self> {
        let normalized = name.trim().replace(' ', "_").to_uppercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
    }

    /// Returns true for kinds filed under a parent table.
    pub const fn has_parent(self) -> bool {
        matches!(self, Self::Index | Self::Trigger)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Synchronization outcome of an object or fill entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectState {
    /// Not visited yet
    Unprocessed,
    /// Existing file matched the generated content
    NoChange,
    /// No file existed; it was created
    Insert,
    /// Existing file differed; it was rewritten
    Update,
    /// Generation or file access failed
    Error,
    /// No output path is configured for the kind
    Ignore,
}

impl ObjectState {
    /// Returns true once the state can no longer change.
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Unprocessed)
    }
}

/// Moves `state` to a terminal value exactly once.
///
/// Returns false, leaving the state untouched, when it is already terminal.
fn settle(state: &mut ObjectState, next: ObjectState) -> bool {
    if state.is_terminal() || !next.is_terminal() {
        return false;
    }
    *state = next;
    true
}

/// A database object discovered in a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogObject {
    /// Object kind
    pub kind: ObjectKind,
    /// Object name
    pub name: String,
    /// Owning table for indexes and triggers
    pub parent: Option<String>,
    state: ObjectState,
}

impl CatalogObject {
    /// Creates an unprocessed object.
    pub fn new(kind: ObjectKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            parent: None,
            state: ObjectState::Unprocessed,
        }
    }

    /// Builder method to set the owning table.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Current state.
    pub const fn state(&self) -> ObjectState {
        self.state
    }

    /// Records the terminal state; returns false if one was already recorded.
    pub fn settle(&mut self, state: ObjectState) -> bool {
        settle(&mut self.state, state)
    }
}

/// Records that an index or trigger belongs to a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Kind of the owning object
    pub parent_kind: ObjectKind,
    /// Name of the owning object
    pub parent_name: String,
    /// Kind of the child object
    pub kind: ObjectKind,
    /// Name of the child object
    pub name: String,
}

/// Fill classification of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillKind {
    /// Complete content, ascending by key
    Full,
    /// Bounded sample, most recent by key
    Demo,
}

impl FillKind {
    /// Report label of the fill kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Full => "TABLE FILL FULL",
            Self::Demo => "TABLE FILL DEMO",
        }
    }
}

/// A table selected for data export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFill {
    /// Table name
    pub name: String,
    /// Primary key columns in key order
    pub pk_columns: Vec<String>,
    /// Fill classification
    pub fill: FillKind,
    /// Row limit for demo fills
    pub count: u32,
    state: ObjectState,
}

impl TableFill {
    /// Creates an unprocessed fill entry.
    pub fn new(name: impl Into<String>, pk_columns: Vec<String>, fill: FillKind, count: u32) -> Self {
        Self {
            name: name.into(),
            pk_columns,
            fill,
            count,
            state: ObjectState::Unprocessed,
        }
    }

    /// Current state.
    pub const fn state(&self) -> ObjectState {
        self.state
    }

    /// Records the terminal state; returns false if one was already recorded.
    pub fn settle(&mut self, state: ObjectState) -> bool {
        settle(&mut self.state, state)
    }
}

/// A schema with everything discovered in it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    /// Schema name
    pub name: String,
    /// Objects in discovery order
    pub objects: Vec<CatalogObject>,
    /// Index and trigger ownership
    pub links: Vec<Link>,
    /// Tables selected for data export
    pub table_fills: Vec<TableFill>,
}

impl Schema {
    /// Creates an empty schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Finds the owning table of a child object.
    pub fn parent_of<'a>(&'a self, object: &'a CatalogObject) -> Option<&'a str> {
        object.parent.as_deref().or_else(|| {
            self.links
                .iter()
                .find(|link| link.kind == object.kind && link.name == object.name)
                .map(|link| link.parent_name.as_str())
        })
    }

    /// Counts objects of a kind.
    pub fn count_of(&self, kind: ObjectKind) -> usize {
        self.objects.iter().filter(|o| o.kind == kind).count()
    }

    /// Counts fill entries of a classification.
    pub fn fill_count_of(&self, fill: FillKind) -> usize {
        self.table_fills.iter().filter(|f| f.fill == fill).count()
    }
}

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;
