//! SQL Server driver over tiberius.
//!
//! Scripts run through the simple query protocol, so catalog batches with
//! several statements work as-is. Only the first result set is decoded.

use crate::config::ConnectionParams;
use crate::executor::{Driver, Session};
use crate::models::Dialect;
use crate::value::{ColumnDescriptor, RowSet, Value};
use crate::{DdlSyncError, Result};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use tiberius::{AuthMethod, Client, ColumnData, ColumnType, Config, EncryptionLevel, FromSql};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

const DRIVER_NAME: &str = "MSSQL";

/// Opens tiberius sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct MssqlDriver;

fn client_config(params: &ConnectionParams) -> Result<Config> {
    let credentials = params.credentials()?;
    let mut config = Config::new();
    config.host(&params.host);
    config.port(params.port_for(Dialect::Mssql));
    config.database(&params.database);
    config.application_name("ddlsync");
    config.authentication(AuthMethod::sql_server(
        credentials.login(),
        credentials.password_or_empty(),
    ));
    config.trust_cert();
    config.encryption(if params.encrypt {
        EncryptionLevel::Required
    } else {
        EncryptionLevel::NotSupported
    });
    Ok(config)
}

fn map_error(error: tiberius::error::Error) -> DdlSyncError {
    match error {
        tiberius::error::Error::Io { .. } => {
            DdlSyncError::connection_failed(DRIVER_NAME, error)
        }
        other => DdlSyncError::query_failed(other.to_string()),
    }
}

#[async_trait]
impl Driver for MssqlDriver {
    fn name(&self) -> &'static str {
        DRIVER_NAME
    }

    async fn connect(&self, params: &ConnectionParams) -> Result<Box<dyn Session>> {
        let config = client_config(params)?;

        let tcp = TcpStream::connect(config.get_addr())
            .await
            .map_err(|e| DdlSyncError::connection_failed(DRIVER_NAME, e))?;
        tcp.set_nodelay(true)
            .map_err(|e| DdlSyncError::connection_failed(DRIVER_NAME, e))?;

        let client = Client::connect(config, tcp.compat_write())
            .await
            .map_err(|e| DdlSyncError::connection_failed(DRIVER_NAME, e))?;
        Ok(Box::new(MssqlSession { client }))
    }
}

struct MssqlSession {
    client: Client<Compat<TcpStream>>,
}

#[async_trait]
impl Session for MssqlSession {
    async fn query(&mut self, script: &str) -> Result<RowSet> {
        let mut stream = self.client.simple_query(script).await.map_err(map_error)?;
        let columns: Vec<ColumnDescriptor> = stream
            .columns()
            .await
            .map_err(map_error)?
            .map(|columns| {
                columns
                    .iter()
                    .map(|c| ColumnDescriptor::new(c.name(), type_name(c.column_type())))
                    .collect()
            })
            .unwrap_or_default();
        let rows = stream.into_first_result().await.map_err(map_error)?;

        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|data| decode(&data)).collect())
            .collect::<Result<Vec<Vec<Value>>>>()?;
        Ok(RowSet::new(columns, rows))
    }

    async fn close(self: Box<Self>) {
        if let Err(e) = self.client.close().await {
            tracing::debug!("ignoring close error: {}", e);
        }
    }
}

/// Server type name of a result column.
fn type_name(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::Bit | ColumnType::Bitn => "bit",
        ColumnType::Int1 => "tinyint",
        ColumnType::Int2 => "smallint",
        ColumnType::Int4 | ColumnType::Intn => "int",
        ColumnType::Int8 => "bigint",
        ColumnType::Float4 => "real",
        ColumnType::Float8 | ColumnType::Floatn => "float",
        ColumnType::Money | ColumnType::Money4 => "money",
        ColumnType::Decimaln => "decimal",
        ColumnType::Numericn => "numeric",
        ColumnType::Guid => "uniqueidentifier",
        ColumnType::Datetime4 => "smalldatetime",
        ColumnType::Datetime | ColumnType::Datetimen => "datetime",
        ColumnType::Daten => "date",
        ColumnType::Timen => "time",
        ColumnType::Datetime2 => "datetime2",
        ColumnType::DatetimeOffsetn => "datetimeoffset",
        ColumnType::BigVarBin | ColumnType::BigBinary | ColumnType::Image => "varbinary",
        ColumnType::BigVarChar | ColumnType::BigChar | ColumnType::Text => "varchar",
        ColumnType::NVarchar | ColumnType::NChar | ColumnType::NText => "nvarchar",
        ColumnType::Xml => "xml",
        _ => "sql_variant",
    }
}

fn temporal<'a, T: FromSql<'a>>(data: &'a ColumnData<'static>) -> Result<Option<T>> {
    T::from_sql(data).map_err(map_error)
}

/// Converts one cell into a driver-neutral value.
fn decode(data: &ColumnData<'static>) -> Result<Value> {
    let value = match data {
        ColumnData::U8(v) => v.map_or(Value::Null, |v| Value::Int(i64::from(v))),
        ColumnData::I16(v) => v.map_or(Value::Null, |v| Value::Int(i64::from(v))),
        ColumnData::I32(v) => v.map_or(Value::Null, |v| Value::Int(i64::from(v))),
        ColumnData::I64(v) => v.map_or(Value::Null, Value::Int),
        ColumnData::F32(v) => v.map_or(Value::Null, |v| Value::Float(f64::from(v))),
        ColumnData::F64(v) => v.map_or(Value::Null, Value::Float),
        ColumnData::Bit(v) => v.map_or(Value::Null, Value::Bool),
        ColumnData::String(v) => v
            .as_ref()
            .map_or(Value::Null, |s| Value::Text(s.to_string())),
        ColumnData::Guid(v) => v.map_or(Value::Null, |g| Value::Text(g.to_string().to_uppercase())),
        ColumnData::Binary(v) => v
            .as_ref()
            .map_or(Value::Null, |b| Value::Binary(b.to_vec())),
        ColumnData::Numeric(v) => v.map_or(Value::Null, |n| Value::Decimal(n.to_string())),
        ColumnData::Xml(v) => v.as_ref().map_or(Value::Null, |x| {
            Value::Text(x.clone().into_owned().into_string())
        }),
        ColumnData::Date(_) => temporal::<NaiveDate>(data)?.map_or(Value::Null, Value::Date),
        ColumnData::Time(_) => temporal::<NaiveTime>(data)?.map_or(Value::Null, Value::Time),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            temporal::<NaiveDateTime>(data)?.map_or(Value::Null, Value::DateTime)
        }
        ColumnData::DateTimeOffset(_) => temporal::<DateTime<FixedOffset>>(data)?
            .map_or(Value::Null, |dt| Value::DateTime(dt.naive_local())),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    #[test]
    fn test_decode_scalars() {
        assert_eq!(decode(&ColumnData::I32(Some(42))).expect("int"), Value::Int(42));
        assert_eq!(decode(&ColumnData::I32(None)).expect("null"), Value::Null);
        assert_eq!(decode(&ColumnData::Bit(Some(true))).expect("bit"), Value::Bool(true));
        assert_eq!(
            decode(&ColumnData::String(Some(Cow::Borrowed("dbo")))).expect("text"),
            Value::Text("dbo".into())
        );
        assert_eq!(
            decode(&ColumnData::Binary(Some(Cow::Owned(vec![0xAB])))).expect("binary"),
            Value::Binary(vec![0xAB])
        );
    }

    #[test]
    fn test_time_columns_are_named_time() {
        assert!(ColumnDescriptor::new("T", type_name(ColumnType::Timen)).is_time_only());
        assert_eq!(type_name(ColumnType::NVarchar), "nvarchar");
    }

    #[test]
    fn test_client_config_uses_default_port() {
        let params = ConnectionParams::new("db01", "SALES", "reader").with_password("pw");
        let config = client_config(&params).expect("config");
        assert_eq!(config.get_addr(), "db01:1433");
    }
}
