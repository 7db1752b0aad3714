//! Oracle driver over the `oracle` crate (ODPI-C).
//!
//! ODPI-C calls block, so every call runs on the blocking thread pool with
//! the connection behind a mutex.

use crate::config::ConnectionParams;
use crate::executor::{Driver, Session};
use crate::models::Dialect;
use crate::value::{ColumnDescriptor, RowSet, Value};
use crate::{DdlSyncError, Result};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use oracle::sql_type::OracleType;
use oracle::{Connection, Row};
use std::sync::{Arc, Mutex};

const DRIVER_NAME: &str = "ORA";

/// Opens Oracle sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleDriver;

/// EZConnect string of a service.
fn connect_string(params: &ConnectionParams) -> String {
    format!(
        "//{}:{}/{}",
        params.host,
        params.port_for(Dialect::Oracle),
        params.database
    )
}

fn map_error(error: &oracle::Error) -> DdlSyncError {
    DdlSyncError::query_failed(error.to_string())
}

/// Returns true for scripts that produce rows.
fn returns_rows(script: &str) -> bool {
    let head = script.trim_start().to_uppercase();
    head.starts_with("SELECT") || head.starts_with("WITH")
}

#[async_trait]
impl Driver for OracleDriver {
    fn name(&self) -> &'static str {
        DRIVER_NAME
    }

    async fn connect(&self, params: &ConnectionParams) -> Result<Box<dyn Session>> {
        let credentials = params.credentials()?;
        let username = credentials.login().to_string();
        let password = credentials.password_or_empty().to_string();
        let target = connect_string(params);

        let connection = tokio::task::spawn_blocking(move || {
            Connection::connect(username, password, target)
        })
        .await
        .map_err(|e| DdlSyncError::connection_failed(DRIVER_NAME, e))?
        .map_err(|e| DdlSyncError::connection_failed(DRIVER_NAME, e))?;

        Ok(Box::new(OracleSession {
            connection: Arc::new(Mutex::new(connection)),
        }))
    }
}

struct OracleSession {
    connection: Arc<Mutex<Connection>>,
}

fn run_script(connection: &Connection, script: &str) -> Result<RowSet> {
    if !returns_rows(script) {
        connection.execute(script, &[]).map_err(|e| map_error(&e))?;
        return Ok(RowSet::default());
    }

    let result = connection.query(script, &[]).map_err(|e| map_error(&e))?;
    let types: Vec<OracleType> = result
        .column_info()
        .iter()
        .map(|info| info.oracle_type().clone())
        .collect();
    let columns = result
        .column_info()
        .iter()
        .map(|info| ColumnDescriptor::new(info.name(), type_name(info.oracle_type())))
        .collect();

    let mut rows = Vec::new();
    for row in result {
        let row = row.map_err(|e| map_error(&e))?;
        let values = types
            .iter()
            .enumerate()
            .map(|(idx, oracle_type)| decode(&row, idx, oracle_type))
            .collect::<Result<Vec<_>>>()?;
        rows.push(values);
    }
    Ok(RowSet::new(columns, rows))
}

#[async_trait]
impl Session for OracleSession {
    async fn query(&mut self, script: &str) -> Result<RowSet> {
        let connection = Arc::clone(&self.connection);
        let script = script.to_string();
        tokio::task::spawn_blocking(move || {
            let connection = connection
                .lock()
                .map_err(|_| DdlSyncError::query_failed("connection mutex poisoned"))?;
            run_script(&connection, &script)
        })
        .await
        .map_err(|e| DdlSyncError::query_failed(e.to_string()))?
    }

    async fn close(self: Box<Self>) {
        let connection = self.connection;
        let _ = tokio::task::spawn_blocking(move || {
            if let Ok(connection) = connection.lock()
                && let Err(e) = connection.close()
            {
                tracing::debug!("ignoring close error: {}", e);
            }
        })
        .await;
    }
}

/// Base type name without length or precision, e.g. `varchar2`.
fn type_name(oracle_type: &OracleType) -> String {
    let full = oracle_type.to_string();
    full.split('(').next().unwrap_or_default().trim().to_string()
}

fn decode(row: &Row, idx: usize, oracle_type: &OracleType) -> Result<Value> {
    let value = match oracle_type {
        OracleType::Number(precision, 0) if (1..=18).contains(precision) => row
            .get::<usize, Option<i64>>(idx)
            .map_err(|e| map_error(&e))?
            .map_or(Value::Null, Value::Int),
        OracleType::Int64 => row
            .get::<usize, Option<i64>>(idx)
            .map_err(|e| map_error(&e))?
            .map_or(Value::Null, Value::Int),
        OracleType::Number(..) | OracleType::Float(_) | OracleType::UInt64 => row
            .get::<usize, Option<String>>(idx)
            .map_err(|e| map_error(&e))?
            .map_or(Value::Null, Value::Decimal),
        OracleType::BinaryFloat | OracleType::BinaryDouble => row
            .get::<usize, Option<f64>>(idx)
            .map_err(|e| map_error(&e))?
            .map_or(Value::Null, Value::Float),
        OracleType::Date | OracleType::Timestamp(_) | OracleType::TimestampLTZ(_) => row
            .get::<usize, Option<NaiveDateTime>>(idx)
            .map_err(|e| map_error(&e))?
            .map_or(Value::Null, Value::DateTime),
        OracleType::TimestampTZ(_) => row
            .get::<usize, Option<DateTime<FixedOffset>>>(idx)
            .map_err(|e| map_error(&e))?
            .map_or(Value::Null, |dt| Value::DateTime(dt.naive_local())),
        OracleType::Raw(_) | OracleType::BLOB | OracleType::LongRaw => row
            .get::<usize, Option<Vec<u8>>>(idx)
            .map_err(|e| map_error(&e))?
            .map_or(Value::Null, Value::Binary),
        OracleType::Boolean => row
            .get::<usize, Option<bool>>(idx)
            .map_err(|e| map_error(&e))?
            .map_or(Value::Null, Value::Bool),
        _ => row
            .get::<usize, Option<String>>(idx)
            .map_err(|e| map_error(&e))?
            .map_or(Value::Null, Value::Text),
    };
    Ok(value)
}
