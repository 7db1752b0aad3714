//! Login material handed to a driver at connect time.

use zeroize::{Zeroize, Zeroizing};

/// Database login and plaintext password, zeroed on drop.
///
/// Built by [`ConnectionParams::credentials`](crate::config::ConnectionParams::credentials)
/// right before a connect and dropped as soon as the driver has them.
///
/// ```rust
/// use ddlsync_core::security::Credentials;
///
/// let login = Credentials::new("reader", Some("secret".to_string()));
/// assert_eq!(login.login(), "reader");
/// assert_eq!(login.password_or_empty(), "secret");
/// ```
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct Credentials {
    login: Zeroizing<String>,
    password: Zeroizing<Option<String>>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let password = if self.has_password() { "****" } else { "<none>" };
        f.debug_struct("Credentials")
            .field("login", &*self.login)
            .field("password", &password)
            .finish()
    }
}

impl Credentials {
    /// Wraps a login and an optional password.
    pub fn new(login: impl Into<String>, password: Option<String>) -> Self {
        Self {
            login: Zeroizing::new(login.into()),
            password: Zeroizing::new(password),
        }
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Password for drivers that take an empty string for "no password".
    pub fn password_or_empty(&self) -> &str {
        self.password().unwrap_or_default()
    }

    pub fn has_password(&self) -> bool {
        self.password.as_ref().is_some_and(|p| !p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_masks_password() {
        let login = Credentials::new("reader", Some("hunter2".to_string()));
        let shown = format!("{login:?}");
        assert!(shown.contains("reader"));
        assert!(shown.contains("****"));
        assert!(!shown.contains("hunter2"));
    }

    #[test]
    fn test_missing_and_empty_password() {
        let login = Credentials::new("reader", None);
        assert!(!login.has_password());
        assert_eq!(login.password_or_empty(), "");
        assert!(format!("{login:?}").contains("<none>"));

        assert!(!Credentials::new("reader", Some(String::new())).has_password());
    }
}
