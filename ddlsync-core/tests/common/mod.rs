//! Scripted in-memory database shared by the integration tests.
//!
//! A [`Script`] answers each query with the reply of the most recently
//! registered rule whose needles all occur in the query text. Unmatched
//! queries return an empty row set.

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use ddlsync_core::config::{OBJECT_NAME, SCHEMA_NAME};
use ddlsync_core::{
    ColumnDescriptor, ConnectionParams, DbConfig, DdlSyncError, Dialect, Driver, ObjectsConfig,
    Result, RowSet, Session, Value,
};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Answer to a matched query.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Returns rows
    Rows(RowSet),
    /// Returns rows after a delay
    Slow(Duration, RowSet),
    /// Fails with a server message
    Fail(String),
    /// Fails like a dropped connection
    Lost,
}

#[derive(Debug)]
struct Rule {
    needles: Vec<String>,
    reply: Reply,
    remaining: Option<usize>,
}

#[derive(Debug, Default)]
struct ScriptState {
    rules: Vec<Rule>,
    executed: Vec<String>,
    connects: usize,
    refused_connects: usize,
    closes: usize,
}

/// Shared handle to a scripted database.
#[derive(Debug, Clone, Default)]
pub struct Script {
    state: Arc<Mutex<ScriptState>>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers every matching query with `reply`.
    pub fn on(&self, needles: &[&str], reply: Reply) -> &Self {
        self.push(needles, reply, None)
    }

    /// Answers the next `times` matching queries with `reply`.
    pub fn times(&self, needles: &[&str], times: usize, reply: Reply) -> &Self {
        self.push(needles, reply, Some(times))
    }

    fn push(&self, needles: &[&str], reply: Reply, remaining: Option<usize>) -> &Self {
        self.state.lock().unwrap().rules.push(Rule {
            needles: needles.iter().map(|n| (*n).to_string()).collect(),
            reply,
            remaining,
        });
        self
    }

    /// Refuses the next `count` connection attempts.
    pub fn refuse_connects(&self, count: usize) {
        self.state.lock().unwrap().refused_connects = count;
    }

    pub fn connects(&self) -> usize {
        self.state.lock().unwrap().connects
    }

    pub fn closes(&self) -> usize {
        self.state.lock().unwrap().closes
    }

    pub fn executed(&self) -> Vec<String> {
        self.state.lock().unwrap().executed.clone()
    }

    /// Number of executed queries containing `needle`.
    pub fn count(&self, needle: &str) -> usize {
        self.executed().iter().filter(|q| q.contains(needle)).count()
    }

    pub fn driver(&self) -> Box<dyn Driver> {
        Box::new(ScriptDriver {
            script: self.clone(),
        })
    }

    fn answer(&self, query: &str) -> Reply {
        let mut state = self.state.lock().unwrap();
        state.executed.push(query.to_string());
        let rule = state.rules.iter_mut().rev().find(|rule| {
            rule.remaining != Some(0) && rule.needles.iter().all(|n| query.contains(n.as_str()))
        });
        match rule {
            Some(rule) => {
                if let Some(remaining) = rule.remaining.as_mut() {
                    *remaining -= 1;
                }
                rule.reply.clone()
            }
            None => Reply::Rows(RowSet::default()),
        }
    }
}

struct ScriptDriver {
    script: Script,
}

#[async_trait]
impl Driver for ScriptDriver {
    fn name(&self) -> &'static str {
        "SCRIPT"
    }

    async fn connect(&self, _params: &ConnectionParams) -> Result<Box<dyn Session>> {
        let mut state = self.script.state.lock().unwrap();
        if state.refused_connects > 0 {
            state.refused_connects -= 1;
            return Err(DdlSyncError::connection_failed("SCRIPT", "connection refused"));
        }
        state.connects += 1;
        Ok(Box::new(ScriptSession {
            script: self.script.clone(),
        }))
    }
}

struct ScriptSession {
    script: Script,
}

#[async_trait]
impl Session for ScriptSession {
    async fn query(&mut self, script: &str) -> Result<RowSet> {
        match self.script.answer(script) {
            Reply::Rows(rows) => Ok(rows),
            Reply::Slow(delay, rows) => {
                tokio::time::sleep(delay).await;
                Ok(rows)
            }
            Reply::Fail(message) => Err(DdlSyncError::query_failed(message)),
            Reply::Lost => Err(DdlSyncError::query_failed("read ECONNRESET")),
        }
    }

    async fn close(self: Box<Self>) {
        self.script.state.lock().unwrap().closes += 1;
    }
}

/// Builds a row reply; every column is typed `nvarchar`.
pub fn rows(columns: &[&str], rows: Vec<Vec<Value>>) -> Reply {
    Reply::Rows(RowSet::new(
        columns
            .iter()
            .map(|name| ColumnDescriptor::new(*name, "nvarchar"))
            .collect(),
        rows,
    ))
}

pub fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

/// Registers the SQL Server catalog listings of a small `dbo` schema.
///
/// `objects` holds `(OBJECT_TYPE, OBJECT_NAME)` pairs; `primary_keys` holds
/// `(TABLE_NAME, COLUMN_NAME)` pairs.
pub fn mssql_catalog(script: &Script, objects: &[(&str, &str)], primary_keys: &[(&str, &str)]) {
    script.on(
        &["FROM sys.schemas WHERE principal_id = 1"],
        rows(&["SCHEMA_NAME"], vec![vec![text("dbo")]]),
    );
    script.on(
        &["CASE o.type"],
        rows(
            &["SCHEMA_NAME", "OBJECT_TYPE", "OBJECT_NAME"],
            objects
                .iter()
                .map(|(kind, name)| vec![text("dbo"), text(kind), text(name)])
                .collect(),
        ),
    );
    script.on(
        &["FROM sys.key_constraints kc"],
        rows(
            &["SCHEMA_NAME", "TABLE_NAME", "COLUMN_NAME"],
            primary_keys
                .iter()
                .map(|(table, column)| vec![text("dbo"), text(table), text(column)])
                .collect(),
        ),
    );
}

/// Answers the `sys.sql_modules` lookup of one object.
pub fn mssql_module(script: &Script, name: &str, definition: &str) {
    let filter = format!("o.name = '{name}'");
    script.on(
        &["FROM sys.sql_modules", filter.as_str()],
        rows(&["TEXT"], vec![vec![text(definition)]]),
    );
}

/// Path template `<root>/<folder>/{{schema-name}}.{{object-name}}.<ext>`.
pub fn template(root: &Path, folder: &str, ext: &str) -> String {
    format!(
        "{}/{folder}/{SCHEMA_NAME}.{OBJECT_NAME}.{ext}",
        root.display()
    )
}

/// SQL Server settings for database `SALES` with no kinds enabled.
pub fn mssql_db(objects: ObjectsConfig) -> DbConfig {
    DbConfig {
        kind: Dialect::Mssql,
        connection: ConnectionParams::new("localhost", "SALES", "reader").with_password("pw"),
        objects,
    }
}
