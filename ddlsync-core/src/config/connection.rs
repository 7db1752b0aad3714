//! Database connection parameters.

use crate::models::Dialect;
use crate::security::{Credentials, reveal_password};
use serde::{Deserialize, Serialize};

/// Parameters used to open the executor's connection.
///
/// # Security
/// The password is never included in `Debug` or `Display` output. When
/// `password_crypted` is set it holds the obfuscated form produced by
/// `ddlsync crypt`.
///
/// # Example
/// ```rust
/// use ddlsync_core::config::ConnectionParams;
///
/// let params = ConnectionParams::new("db01", "SALES", "reader")
///     .with_port(14330)
///     .with_password("secret");
///
/// assert!(params.validate().is_ok());
/// assert!(!format!("{params:?}").contains("secret"));
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionParams {
    /// Server host name or address
    pub host: String,
    /// Listener port; the dialect default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Database name (SQL Server) or service name (Oracle)
    pub database: String,
    /// Login name
    pub login: String,
    /// Password, plain or obfuscated
    #[serde(default)]
    pub password: String,
    /// Whether `password` holds the obfuscated form
    #[serde(default)]
    pub password_crypted: bool,
    /// Request an encrypted transport (SQL Server only)
    #[serde(default)]
    pub encrypt: bool,
}

impl std::fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("login", &self.login)
            .field("password", &"****")
            .field("password_crypted", &self.password_crypted)
            .field("encrypt", &self.encrypt)
            .finish()
    }
}

impl std::fmt::Display for ConnectionParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}/{}",
            self.host,
            self.port.map_or_else(String::new, |p| format!(":{p}")),
            self.database
        )
        // Login and password are intentionally omitted
    }
}

impl ConnectionParams {
    /// Creates parameters with an empty password and the dialect default port.
    pub fn new(host: impl Into<String>, database: impl Into<String>, login: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            database: database.into(),
            login: login.into(),
            password: String::new(),
            password_crypted: false,
            encrypt: false,
        }
    }

    /// Builder method to set the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Builder method to set a plain password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self.password_crypted = false;
        self
    }

    /// Builder method to set an obfuscated password.
    pub fn with_crypted_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self.password_crypted = true;
        self
    }

    /// Port to connect to for the given dialect.
    pub fn port_for(&self, dialect: Dialect) -> u16 {
        self.port.unwrap_or_else(|| dialect.default_port())
    }

    /// Returns the login and plaintext password in zeroizing storage.
    ///
    /// # Errors
    /// Fails when an obfuscated password cannot be recovered.
    pub fn credentials(&self) -> crate::Result<Credentials> {
        let password = if self.password.is_empty() {
            None
        } else if self.password_crypted {
            Some(reveal_password(&self.password)?.to_string())
        } else {
            Some(self.password.clone())
        };
        Ok(Credentials::new(self.login.clone(), password))
    }

    /// Validates connection parameters.
    ///
    /// # Errors
    /// Returns error if a required value is empty or the port is zero
    pub fn validate(&self) -> crate::Result<()> {
        if self.host.trim().is_empty() {
            return Err(crate::DdlSyncError::configuration("host cannot be empty"));
        }
        if self.port == Some(0) {
            return Err(crate::DdlSyncError::configuration(
                "port must be greater than 0",
            ));
        }
        if self.database.trim().is_empty() {
            return Err(crate::DdlSyncError::configuration(
                "database cannot be empty",
            ));
        }
        if self.login.trim().is_empty() {
            return Err(crate::DdlSyncError::configuration("login cannot be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::obscure_password;

    #[test]
    fn test_display_omits_credentials() {
        let params = ConnectionParams::new("db01", "SALES", "reader")
            .with_port(1433)
            .with_password("s3cret");
        let shown = params.to_string();
        assert_eq!(shown, "db01:1433/SALES");
        assert!(!format!("{params:?}").contains("s3cret"));
    }

    #[test]
    fn test_validate() {
        assert!(ConnectionParams::new("", "db", "u").validate().is_err());
        assert!(ConnectionParams::new("h", "", "u").validate().is_err());
        assert!(ConnectionParams::new("h", "db", "").validate().is_err());
        assert!(ConnectionParams::new("h", "db", "u").with_port(0).validate().is_err());
        assert!(ConnectionParams::new("h", "db", "u").validate().is_ok());
    }

    #[test]
    fn test_default_port_per_dialect() {
        let params = ConnectionParams::new("h", "db", "u");
        assert_eq!(params.port_for(Dialect::Mssql), 1433);
        assert_eq!(params.port_for(Dialect::Oracle), 1521);
        assert_eq!(params.with_port(50000).port_for(Dialect::Oracle), 50000);
    }

    #[test]
    fn test_credentials_reveal_crypted_password() {
        let crypted = obscure_password("p@ss").expect("obfuscation works");
        let params = ConnectionParams::new("h", "db", "u").with_crypted_password(crypted);
        let creds = params.credentials().expect("recoverable");
        assert_eq!(creds.login(), "u");
        assert_eq!(creds.password(), Some("p@ss"));
    }

    #[test]
    fn test_credentials_without_password() {
        let creds = ConnectionParams::new("h", "db", "u")
            .credentials()
            .expect("no password is fine");
        assert!(!creds.has_password());
    }
}
