//! Resilient single-flight query execution.
//!
//! The [`Executor`] owns the only database session of a run. It runs one
//! script at a time, reconnects with the last parameters when the session is
//! gone, and retries connection-level failures with linear backoff.

use crate::config::ConnectionParams;
use crate::value::{FromRecord, RowSet};
use crate::{DdlSyncError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;

/// Retries after the first attempt for transient failures.
pub const MAX_RETRIES: u32 = 3;

/// Default backoff unit; attempt `n` waits `n` units.
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(1000);

/// Opens sessions for one dialect.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Dialect label used in connection errors.
    fn name(&self) -> &'static str;

    /// Opens a new session.
    ///
    /// # Errors
    /// Returns a connection error when the server cannot be reached or
    /// rejects the login.
    async fn connect(&self, params: &ConnectionParams) -> Result<Box<dyn Session>>;
}

/// A live database session.
#[async_trait]
pub trait Session: Send {
    /// Runs a script and returns its first result set.
    ///
    /// # Errors
    /// Returns a query error with the server's message, or a connection
    /// error when the session was lost.
    async fn query(&mut self, script: &str) -> Result<RowSet>;

    /// Closes the session; errors are ignored.
    async fn close(self: Box<Self>);
}

#[derive(Default)]
struct ExecutorState {
    session: Option<Box<dyn Session>>,
    params: Option<ConnectionParams>,
    init_script: Option<String>,
}

/// Serializes and retries all queries of a run.
pub struct Executor {
    driver: Box<dyn Driver>,
    state: Mutex<ExecutorState>,
    backoff: Duration,
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("driver", &self.driver.name())
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

impl Executor {
    /// Creates an executor over a driver with the default backoff.
    pub fn new(driver: Box<dyn Driver>) -> Self {
        Self {
            driver,
            state: Mutex::new(ExecutorState::default()),
            backoff: DEFAULT_BACKOFF,
        }
    }

    /// Builder method to set the backoff unit.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Dialect label of the underlying driver.
    pub fn driver_name(&self) -> &'static str {
        self.driver.name()
    }

    /// Opens a session, replacing any previous one, and runs `init_script`.
    ///
    /// The parameters and init script are remembered for transparent
    /// reconnects. The init script runs once, without retries.
    ///
    /// # Errors
    /// Fails with [`DdlSyncError::ParallelExec`] while a script is running,
    /// or with the connection or init-script error.
    pub async fn open(&self, params: ConnectionParams, init_script: Option<String>) -> Result<()> {
        let mut state = self.state.try_lock().map_err(|_| DdlSyncError::ParallelExec)?;
        if let Some(session) = state.session.take() {
            session.close().await;
        }
        state.params = Some(params);
        state.init_script = init_script;
        self.connect(&mut state).await
    }

    /// Runs a script and returns its rows.
    ///
    /// # Errors
    /// Fails with [`DdlSyncError::ParallelExec`] while another script is
    /// running, [`DdlSyncError::NotOpened`] before the first `open`, or with
    /// the last error once retries are exhausted. Non-transient errors are
    /// returned immediately.
    pub async fn exec(&self, script: &str) -> Result<RowSet> {
        let mut state = self.state.try_lock().map_err(|_| DdlSyncError::ParallelExec)?;

        let mut attempt: u32 = 0;
        loop {
            let error = match self.run_once(&mut state, script).await {
                Ok(rows) => return Ok(rows),
                Err(error) if error.is_transient() && attempt < MAX_RETRIES => error,
                Err(error) => return Err(error),
            };

            attempt += 1;
            tracing::warn!(
                attempt,
                max = MAX_RETRIES,
                "connection lost, retrying: {}",
                error
            );
            if let Some(session) = state.session.take() {
                session.close().await;
            }
            tokio::time::sleep(self.backoff * attempt).await;
        }
    }

    /// Runs a script and decodes each row.
    ///
    /// # Errors
    /// Fails like [`Executor::exec`] or when a row cannot be decoded.
    pub async fn exec_as<T: FromRecord>(&self, script: &str) -> Result<Vec<T>> {
        let rows = self.exec(script).await?;
        rows.records().map(|record| T::from_record(&record)).collect()
    }

    /// Closes the session. Safe to call repeatedly or before `open`.
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        if let Some(session) = state.session.take() {
            session.close().await;
        }
    }

    async fn run_once(&self, state: &mut ExecutorState, script: &str) -> Result<RowSet> {
        if state.session.is_none() {
            self.connect(state).await?;
        }
        match state.session.as_mut() {
            Some(session) => session.query(script).await,
            None => Err(DdlSyncError::NotOpened),
        }
    }

    async fn connect(&self, state: &mut ExecutorState) -> Result<()> {
        let params = state.params.as_ref().ok_or(DdlSyncError::NotOpened)?;
        let mut session = self.driver.connect(params).await?;
        if let Some(init) = state.init_script.as_deref() {
            if let Err(error) = session.query(init).await {
                session.close().await;
                return Err(error);
            }
        }
        tracing::debug!("connected to {} {}", self.driver.name(), params);
        state.session = Some(session);
        Ok(())
    }
}
