//! Error types with credential sanitization.
//!
//! Error messages never carry passwords or decrypted credentials. Driver
//! messages are passed through verbatim because catalog failures are only
//! useful with the server's own wording.

use thiserror::Error;

/// Markers that identify a lost or broken connection in driver messages.
const CONNECTION_LOST_MARKERS: &[&str] = &[
    "ESOCKET",
    "ECONNRESET",
    "ETIMEDOUT",
    "CONNECTIONERROR",
    "CONNECTION RESET",
    "CONNECTION REFUSED",
    "BROKEN PIPE",
    "TIMED OUT",
    "ORA-03113",
    "ORA-03114",
    "ORA-03135",
    "ORA-12170",
    "DPI-1080",
];

/// Main error type for ddlsync operations.
///
/// # Security
/// Connection parameters are never formatted into error messages.
#[derive(Debug, Error)]
pub enum DdlSyncError {
    /// Connecting or authenticating to the database failed
    #[error("error connect to {dialect}: {context}")]
    Connection { dialect: String, context: String },

    /// A script was executed before any connection was opened
    #[error("use \"open\" for connect to database")]
    NotOpened,

    /// A second script was submitted while one was still running
    #[error("parallel exec not allowed")]
    ParallelExec,

    /// Query execution failed
    #[error("error execute: {context}")]
    QueryExecution { context: String },

    /// An object named by the caller is absent from the catalog
    #[error("{kind} not found: {name}")]
    NotFound { kind: String, name: String },

    /// No generator exists for the object kind in this dialect
    #[error("Unsupported operation: {feature} not supported for {dialect}")]
    UnsupportedFeature { feature: String, dialect: String },

    /// Configuration or validation error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// I/O operation failed
    #[error("I/O operation failed: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization or deserialization failed
    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Password obfuscation or recovery failed
    #[error("Password obfuscation failed: {context}")]
    Obfuscation { context: String },
}

/// Convenience type alias for Results with DdlSyncError
pub type Result<T> = std::result::Result<T, DdlSyncError>;

impl DdlSyncError {
    /// Creates a connection error for the given dialect
    pub fn connection_failed(dialect: impl Into<String>, context: impl ToString) -> Self {
        Self::Connection {
            dialect: dialect.into(),
            context: context.to_string(),
        }
    }

    /// Creates a query execution error
    pub fn query_failed(context: impl Into<String>) -> Self {
        Self::QueryExecution {
            context: context.into(),
        }
    }

    /// Creates a "not found" error for a catalog lookup
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an unsupported feature error
    pub fn unsupported_feature(feature: impl Into<String>, dialect: impl Into<String>) -> Self {
        Self::UnsupportedFeature {
            feature: feature.into(),
            dialect: dialect.into(),
        }
    }

    /// Creates an I/O error with the path or operation as context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Returns true when the failure is a lost connection that a reconnect may fix.
    ///
    /// Connection errors are always transient. Query errors are transient only
    /// when the driver text carries one of the connection-loss markers.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connection { .. } => true,
            Self::QueryExecution { context } => {
                let upper = context.to_uppercase();
                CONNECTION_LOST_MARKERS
                    .iter()
                    .any(|marker| upper.contains(marker))
            }
            _ => false,
        }
    }
}
