//! Scriptable connector and handle for exercising the connection manager
//! without a MySQL server.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use config::shared::MySqlCredentials;
use secrecy::SecretString;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::connection::{Connector, NativeHandle};
use crate::error::ExecutionFailure;
use crate::response::ExecutionOutcome;

/// Error returned by [`FakeConnector`] for a scripted failure.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct FakeConnectError(pub String);

/// Error returned by [`FakeHandle`] for a scripted statement failure.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct FakeServerError(pub String);

/// Outcome of one scripted connect call.
#[derive(Debug, Clone)]
pub enum ConnectAttempt {
    Succeed,
    Fail(String),
    /// Never completes, so only a timeout ends the attempt.
    Hang,
}

/// Outcome of one scripted statement.
#[derive(Debug, Clone)]
pub enum StatementOutcome {
    RowsAffected(Option<u64>),
    ServerError(String),
}

#[derive(Debug, Default)]
struct Inner {
    attempts: VecDeque<ConnectAttempt>,
    connect_calls: Vec<MySqlCredentials>,
    statements: VecDeque<StatementOutcome>,
    executed: Vec<String>,
    closed_handles: u64,
    fail_close: bool,
}

/// [`Connector`] whose connect calls follow a script.
///
/// Calls beyond the script succeed. Clones share their script and recordings.
#[derive(Clone, Default)]
pub struct FakeConnector {
    inner: Arc<Mutex<Inner>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends connect outcomes to the script.
    pub async fn script(&self, attempts: impl IntoIterator<Item = ConnectAttempt>) {
        self.inner.lock().await.attempts.extend(attempts);
    }

    /// Appends statement outcomes shared by every handle this connector opens.
    pub async fn script_statements(&self, outcomes: impl IntoIterator<Item = StatementOutcome>) {
        self.inner.lock().await.statements.extend(outcomes);
    }

    /// Makes closing any handle fail.
    pub async fn fail_close(&self) {
        self.inner.lock().await.fail_close = true;
    }

    /// Credentials passed to every connect call so far.
    pub async fn connect_calls(&self) -> Vec<MySqlCredentials> {
        self.inner.lock().await.connect_calls.clone()
    }

    pub async fn executed(&self) -> Vec<String> {
        self.inner.lock().await.executed.clone()
    }

    pub async fn closed_handles(&self) -> u64 {
        self.inner.lock().await.closed_handles
    }
}

impl fmt::Debug for FakeConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeConnector").finish_non_exhaustive()
    }
}

#[async_trait]
impl Connector for FakeConnector {
    type Handle = FakeHandle;
    type Error = FakeConnectError;

    async fn connect(&self, credentials: &MySqlCredentials) -> Result<FakeHandle, FakeConnectError> {
        let attempt = {
            let mut inner = self.inner.lock().await;
            inner.connect_calls.push(credentials.clone());
            inner.attempts.pop_front().unwrap_or(ConnectAttempt::Succeed)
        };

        match attempt {
            ConnectAttempt::Succeed => Ok(FakeHandle {
                inner: Arc::clone(&self.inner),
            }),
            ConnectAttempt::Fail(message) => Err(FakeConnectError(message)),
            ConnectAttempt::Hang => std::future::pending().await,
        }
    }
}

/// Native handle produced by [`FakeConnector`].
#[derive(Debug)]
pub struct FakeHandle {
    inner: Arc<Mutex<Inner>>,
}

#[async_trait]
impl NativeHandle for FakeHandle {
    async fn execute(&mut self, sql: &str) -> Result<ExecutionOutcome, ExecutionFailure> {
        let mut inner = self.inner.lock().await;
        inner.executed.push(sql.to_string());

        match inner.statements.pop_front() {
            Some(StatementOutcome::RowsAffected(rows)) => Ok(ExecutionOutcome::new(rows)),
            Some(StatementOutcome::ServerError(message)) => Err(ExecutionFailure::Database(
                Box::new(FakeServerError(message)),
            )),
            None => Ok(ExecutionOutcome::new(Some(0))),
        }
    }

    async fn close(self) -> Result<(), ExecutionFailure> {
        let mut inner = self.inner.lock().await;
        inner.closed_handles += 1;

        if inner.fail_close {
            return Err(ExecutionFailure::Unexpected(Box::new(FakeServerError(
                "connection reset while closing".to_string(),
            ))));
        }

        Ok(())
    }
}

/// Credentials pointing at a local test server.
pub fn test_credentials() -> MySqlCredentials {
    MySqlCredentials {
        host: "localhost".to_string(),
        port: 3306,
        database: "analytics".to_string(),
        username: "dbt".to_string(),
        password: Some(SecretString::new("dbt-password".to_string())),
    }
}
