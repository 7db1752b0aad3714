//! Database drivers behind the executor's [`Driver`] seam.
//!
//! Each backend is compiled in with its cargo feature: `mssql` (default)
//! pulls in `tiberius`, `oracle` pulls in the `oracle` crate, which needs
//! Oracle Instant Client at run time.

use crate::executor::Driver;
use crate::models::Dialect;
use crate::Result;

#[cfg(feature = "mssql")]
pub mod mssql;

#[cfg(feature = "oracle")]
pub mod oracle;

/// Creates the driver for a dialect.
///
/// # Errors
/// Returns [`crate::DdlSyncError::UnsupportedFeature`] when the dialect's
/// driver was not compiled in.
pub fn create_driver(dialect: Dialect) -> Result<Box<dyn Driver>> {
    match dialect {
        Dialect::Mssql => {
            #[cfg(feature = "mssql")]
            {
                Ok(Box::new(mssql::MssqlDriver))
            }
            #[cfg(not(feature = "mssql"))]
            {
                Err(crate::DdlSyncError::unsupported_feature(
                    "SQL Server driver (compile with --features mssql)",
                    dialect.as_str(),
                ))
            }
        }
        Dialect::Oracle => {
            #[cfg(feature = "oracle")]
            {
                Ok(Box::new(oracle::OracleDriver))
            }
            #[cfg(not(feature = "oracle"))]
            {
                Err(crate::DdlSyncError::unsupported_feature(
                    "Oracle driver (compile with --features oracle)",
                    dialect.as_str(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "mssql")]
    #[test]
    fn test_mssql_driver_is_available() {
        let driver = create_driver(Dialect::Mssql).expect("mssql is a default feature");
        assert_eq!(driver.name(), "MSSQL");
    }

    #[cfg(not(feature = "oracle"))]
    #[test]
    fn test_oracle_driver_requires_feature() {
        let error = create_driver(Dialect::Oracle)
            .err()
            .expect("oracle is opt-in");
        assert!(matches!(
            error,
            crate::DdlSyncError::UnsupportedFeature { .. }
        ));
    }
}
