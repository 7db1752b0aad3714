//! Schema and data synchronization engine for ddlsync.
//!
//! The engine connects to a SQL Server or Oracle database, reconstructs the
//! definition of every selected object from the catalog, optionally exports
//! table rows, and writes one file per object. Files are only rewritten when
//! their generated content changed, so repeated runs against an unchanged
//! database touch nothing.
//!
//! # Security Guarantees
//! - The source database is only ever read
//! - Passwords are held in zeroizing containers and never logged
//! - Obfuscated passwords are sealed with AES-GCM under a derived key
//!
//! # Architecture
//! - [`executor::Executor`] owns the single session and retries lost connections
//! - [`discovery`] builds the per-schema inventory
//! - [`ddl`] and [`fill`] render object definitions and row exports
//! - [`sync`] diffs the output against existing files and reports outcomes

pub mod adapters;
pub mod config;
pub mod ddl;
pub mod dialect;
pub mod discovery;
pub mod error;
pub mod executor;
pub mod files;
pub mod fill;
pub mod logging;
pub mod mask;
pub mod models;
pub mod pattern;
pub mod security;
pub mod stamp;
pub mod sync;
pub mod validation;
pub mod value;

// Re-export commonly used types
pub use config::{Config, ConnectionParams, DbConfig, ObjectsConfig};
pub use error::{DdlSyncError, Result};
pub use executor::{Driver, Executor, Session};
pub use files::{FileStore, LocalFiles};
pub use models::{
    CatalogObject, Dialect, FillKind, Link, ObjectKind, ObjectState, Schema, TableFill,
};
pub use sync::{SyncDriver, SyncReport, synchronize};
pub use validation::{ValidationError, validate_config_document};
pub use value::{ColumnDescriptor, RowSet, Value};
