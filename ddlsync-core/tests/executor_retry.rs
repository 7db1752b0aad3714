//! Single-flight execution, reconnects and retry backoff of the executor.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

mod common;

use common::{Reply, Script, rows, text};
use ddlsync_core::executor::{DEFAULT_BACKOFF, MAX_RETRIES};
use ddlsync_core::{ConnectionParams, DdlSyncError, Executor, RowSet};
use std::time::Duration;
use tokio::time::Instant;

fn params() -> ConnectionParams {
    ConnectionParams::new("localhost", "SALES", "reader").with_password("pw")
}

async fn opened(script: &Script) -> Executor {
    let executor = Executor::new(script.driver());
    executor
        .open(params(), Some("SET NOCOUNT ON".to_string()))
        .await
        .expect("open");
    executor
}

#[tokio::test]
async fn test_exec_before_open_fails() {
    let script = Script::new();
    let executor = Executor::new(script.driver());
    let error = executor.exec("SELECT 1").await.expect_err("not opened");
    assert!(matches!(error, DdlSyncError::NotOpened));
    assert_eq!(script.connects(), 0);
}

#[tokio::test]
async fn test_open_runs_init_script_once() {
    let script = Script::new();
    script.on(&["SELECT name"], rows(&["NAME"], vec![vec![text("dbo")]]));
    let executor = opened(&script).await;

    let result = executor.exec("SELECT name FROM sys.schemas").await.expect("rows");
    assert_eq!(result.len(), 1);
    executor.exec("SELECT name FROM sys.tables").await.expect("rows");

    assert_eq!(script.count("SET NOCOUNT ON"), 1);
    assert_eq!(script.connects(), 1);
}

#[tokio::test]
async fn test_failed_init_script_fails_open() {
    let script = Script::new();
    script.on(&["SET NOCOUNT ON"], Reply::Fail("permission denied".into()));
    let executor = Executor::new(script.driver());
    let error = executor
        .open(params(), Some("SET NOCOUNT ON".to_string()))
        .await
        .expect_err("init fails");
    assert!(matches!(error, DdlSyncError::QueryExecution { .. }));
    assert_eq!(script.closes(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_lost_connection_is_retried_after_backoff() {
    let script = Script::new();
    script.on(&["SELECT 1"], rows(&["X"], vec![vec![text("1")]]));
    script.times(&["SELECT 1"], 1, Reply::Lost);
    let executor = opened(&script).await;

    let start = Instant::now();
    let result = executor.exec("SELECT 1").await.expect("retried");
    assert_eq!(result.len(), 1);
    assert_eq!(start.elapsed(), DEFAULT_BACKOFF);

    assert_eq!(script.connects(), 2);
    assert_eq!(script.count("SELECT 1"), 2);
    // the init script runs again on the new session
    assert_eq!(script.count("SET NOCOUNT ON"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_retries_are_bounded_with_linear_backoff() {
    let script = Script::new();
    script.on(&["SELECT 1"], Reply::Lost);
    let executor = opened(&script).await;

    let start = Instant::now();
    let error = executor.exec("SELECT 1").await.expect_err("exhausted");
    assert!(error.is_transient());
    // waits 1, 2 and 3 units
    assert_eq!(start.elapsed(), DEFAULT_BACKOFF * 6);

    let attempts = usize::try_from(MAX_RETRIES).expect("small") + 1;
    assert_eq!(script.count("SELECT 1"), attempts);
    assert_eq!(script.connects(), attempts);
}

#[tokio::test(start_paused = true)]
async fn test_refused_reconnect_is_retried() {
    let script = Script::new();
    script.on(&["SELECT 1"], rows(&["X"], vec![vec![text("1")]]));
    script.times(&["SELECT 1"], 1, Reply::Lost);
    let executor = Executor::new(script.driver()).with_backoff(Duration::from_millis(10));
    executor.open(params(), None).await.expect("open");
    script.refuse_connects(1);

    let start = Instant::now();
    executor.exec("SELECT 1").await.expect("eventually succeeds");
    assert_eq!(start.elapsed(), Duration::from_millis(30));
    assert_eq!(script.connects(), 2);
}

#[tokio::test]
async fn test_query_errors_are_not_retried() {
    let script = Script::new();
    script.on(
        &["SELECT bad"],
        Reply::Fail("Invalid column name 'bad'".into()),
    );
    let executor = opened(&script).await;

    let error = executor.exec("SELECT bad FROM t").await.expect_err("fails");
    assert_eq!(error.to_string(), "error execute: Invalid column name 'bad'");
    assert_eq!(script.count("SELECT bad"), 1);
    assert_eq!(script.connects(), 1);
}

#[tokio::test]
async fn test_open_failure_is_not_retried() {
    let script = Script::new();
    script.refuse_connects(5);
    let executor = Executor::new(script.driver());
    let error = executor.open(params(), None).await.expect_err("refused");
    assert!(matches!(error, DdlSyncError::Connection { .. }));
    assert_eq!(script.connects(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_exec_is_rejected() {
    let script = Script::new();
    script.on(
        &["SLOW"],
        Reply::Slow(Duration::from_secs(1), RowSet::default()),
    );
    let executor = opened(&script).await;

    let (first, second) = tokio::join!(executor.exec("SELECT SLOW"), executor.exec("SELECT 2"));
    first.expect("first query runs");
    assert!(matches!(second, Err(DdlSyncError::ParallelExec)));
    assert_eq!(script.count("SELECT 2"), 0);
}

#[tokio::test]
async fn test_close_is_idempotent_and_exec_reconnects() {
    let script = Script::new();
    let executor = opened(&script).await;
    executor.close().await;
    executor.close().await;
    assert_eq!(script.closes(), 1);

    executor.exec("SELECT 1").await.expect("reconnects");
    assert_eq!(script.connects(), 2);
}
