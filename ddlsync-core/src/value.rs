//! Driver-neutral row batches.
//!
//! Every query result is a [`RowSet`]: an ordered list of column descriptors
//! carried alongside the rows, so consumers walk declared columns instead of
//! probing result objects by key.

use crate::{DdlSyncError, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// A single decoded cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL
    Null,
    /// Boolean (`bit` on SQL Server)
    Bool(bool),
    /// Integer that fits in 64 bits
    Int(i64),
    /// Exact numeric kept in its decimal text form
    Decimal(String),
    /// Approximate numeric
    Float(f64),
    /// Character data
    Text(String),
    /// Calendar date without time of day
    Date(NaiveDate),
    /// Date with time of day
    DateTime(NaiveDateTime),
    /// Time of day only
    Time(NaiveTime),
    /// Raw bytes
    Binary(Vec<u8>),
    /// Ordered collection
    List(Vec<Value>),
    /// Keyed record, keys in declaration order
    Record(Vec<(String, Value)>),
}

impl Value {
    /// Returns true for SQL NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Renders scalar values as plain text, or `None` for NULL and composites.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Null | Self::List(_) | Self::Record(_) | Self::Binary(_) => None,
            Self::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            Self::Int(i) => Some(i.to_string()),
            Self::Decimal(d) => Some(d.clone()),
            Self::Float(f) => Some(f.to_string()),
            Self::Text(s) => Some(s.clone()),
            Self::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            Self::DateTime(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S%.3f").to_string()),
            Self::Time(t) => Some(t.format("%H:%M:%S%.3f").to_string()),
        }
    }
}

/// Name and server type of a result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Column name as reported by the server
    pub name: String,
    /// Lower-cased server type name (e.g. `nvarchar`, `time`, `number`)
    pub sql_type: String,
}

impl ColumnDescriptor {
    /// Creates a descriptor, lower-casing the type name.
    pub fn new(name: impl Into<String>, sql_type: impl AsRef<str>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.as_ref().to_lowercase(),
        }
    }

    /// Returns true when the column holds a time of day without a date.
    pub fn is_time_only(&self) -> bool {
        self.sql_type == "time"
    }
}

/// Rows returned by one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    /// Column descriptors in select-list order
    pub columns: Vec<ColumnDescriptor>,
    /// Row values, each aligned with `columns`
    pub rows: Vec<Vec<Value>>,
}

impl RowSet {
    /// Creates a row set from descriptors and rows.
    pub fn new(columns: Vec<ColumnDescriptor>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true when the statement produced no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterates rows as name-addressable records.
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(|values| Record {
            columns: &self.columns,
            values,
        })
    }
}

/// Borrowed view of one row with column lookup by name.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    columns: &'a [ColumnDescriptor],
    values: &'a [Value],
}

impl<'a> Record<'a> {
    /// Looks up a column value by case-insensitive name.
    pub fn get(&self, name: &str) -> Option<&'a Value> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
            .and_then(|idx| self.values.get(idx))
    }

    fn require(&self, name: &str) -> Result<&'a Value> {
        self.get(name)
            .ok_or_else(|| DdlSyncError::query_failed(format!("column '{name}' missing in result")))
    }

    /// Reads a non-null value as text.
    ///
    /// # Errors
    /// Fails if the column is absent, NULL or not representable as text.
    pub fn text(&self, name: &str) -> Result<String> {
        self.opt_text(name)?
            .ok_or_else(|| DdlSyncError::query_failed(format!("column '{name}' is NULL")))
    }

    /// Reads a nullable value as text.
    ///
    /// # Errors
    /// Fails if the column is absent.
    pub fn opt_text(&self, name: &str) -> Result<Option<String>> {
        Ok(self.require(name)?.as_text())
    }

    /// Reads a nullable integer, accepting numeric text from drivers that
    /// report every NUMBER as decimal.
    ///
    /// # Errors
    /// Fails if the column is absent or holds a non-integer value.
    pub fn opt_i64(&self, name: &str) -> Result<Option<i64>> {
        match self.require(name)? {
            Value::Null => Ok(None),
            Value::Int(i) => Ok(Some(*i)),
            Value::Bool(b) => Ok(Some(i64::from(*b))),
            Value::Decimal(s) | Value::Text(s) => s
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| DdlSyncError::query_failed(format!("column '{name}' is not an integer: {s}"))),
            other => Err(DdlSyncError::query_failed(format!(
                "column '{name}' is not an integer: {other:?}"
            ))),
        }
    }

    /// Reads a non-null integer.
    ///
    /// # Errors
    /// Fails if the column is absent, NULL or not an integer.
    pub fn i64(&self, name: &str) -> Result<i64> {
        self.opt_i64(name)?
            .ok_or_else(|| DdlSyncError::query_failed(format!("column '{name}' is NULL")))
    }

    /// Reads a flag; `1`, `Y`, `YES` and `TRUE` are true, NULL is false.
    ///
    /// # Errors
    /// Fails if the column is absent.
    pub fn flag(&self, name: &str) -> Result<bool> {
        Ok(match self.require(name)? {
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Text(s) | Value::Decimal(s) => {
                matches!(s.trim().to_uppercase().as_str(), "1" | "Y" | "YES" | "TRUE")
            }
            _ => false,
        })
    }
}

/// Decodes a typed struct from a catalog row.
pub trait FromRecord: Sized {
    /// Builds the value from one record.
    ///
    /// # Errors
    /// Fails when a required column is absent or has the wrong shape.
    fn from_record(record: &Record<'_>) -> Result<Self>;
}
