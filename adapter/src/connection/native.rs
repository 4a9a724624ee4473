use std::error;

use async_trait::async_trait;
use config::shared::MySqlCredentials;
use sqlx::{Connection as _, MySqlConnection};

use crate::error::ExecutionFailure;
use crate::response::ExecutionOutcome;

/// Opens native connections to the database.
///
/// The connection manager owns the retry and state handling; implementations
/// only perform a single connect call.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Native connection handle produced by [`Connector::connect`].
    type Handle: NativeHandle;
    /// Error raised by the driver when a connect call fails.
    type Error: error::Error + Send + Sync + 'static;

    /// Opens one native connection using host, port, database, user and
    /// password from `credentials`.
    async fn connect(&self, credentials: &MySqlCredentials) -> Result<Self::Handle, Self::Error>;
}

/// A native connection handle owned by a [`crate::connection::Connection`].
#[async_trait]
pub trait NativeHandle: Send {
    /// Runs a single statement.
    async fn execute(&mut self, sql: &str) -> Result<ExecutionOutcome, ExecutionFailure>;

    /// Closes the handle and ends the server session.
    async fn close(self) -> Result<(), ExecutionFailure>;
}

/// [`Connector`] backed by the `sqlx` MySQL driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlConnector;

#[async_trait]
impl Connector for MySqlConnector {
    type Handle = MySqlConnection;
    type Error = sqlx::Error;

    async fn connect(&self, credentials: &MySqlCredentials) -> Result<MySqlConnection, sqlx::Error> {
        MySqlConnection::connect_with(&credentials.connect_options()).await
    }
}

#[async_trait]
impl NativeHandle for MySqlConnection {
    async fn execute(&mut self, sql: &str) -> Result<ExecutionOutcome, ExecutionFailure> {
        let result = sqlx::Executor::execute(&mut *self, sql).await?;

        Ok(ExecutionOutcome::new(Some(result.rows_affected())))
    }

    async fn close(self) -> Result<(), ExecutionFailure> {
        sqlx::Connection::close(self).await?;

        Ok(())
    }
}
