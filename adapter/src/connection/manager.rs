use std::sync::Arc;

use config::shared::{AdapterConfig, ConnectionSettings, MYSQL_ADAPTER_TYPE, MySqlCredentials};
use tracing::{debug, info};

use crate::bail;
use crate::connection::{Connection, ConnectionState, Connector, NativeHandle, exception_handler};
use crate::error::{AdapterError, AdapterResult, ErrorKind};
use crate::response::{AdapterResponse, get_response};

/// Owns the open/retry/close protocol for connections of one adapter.
///
/// Connect attempts are bounded by [`ConnectionSettings::connect_timeout`]. A
/// failed open is retried exactly once with the same credentials; the second
/// failure is reported as [`ErrorKind::ConnectionFailed`]. Statements are
/// never retried here.
#[derive(Debug, Clone)]
pub struct ConnectionManager<C> {
    connector: C,
    settings: ConnectionSettings,
}

impl<C> ConnectionManager<C>
where
    C: Connector,
{
    /// Adapter type tag served by this manager.
    pub const TYPE: &'static str = MYSQL_ADAPTER_TYPE;

    pub fn new(connector: C, settings: ConnectionSettings) -> Self {
        Self {
            connector,
            settings,
        }
    }

    /// Creates a manager from a validated [`AdapterConfig`].
    pub fn from_config(connector: C, config: &AdapterConfig) -> AdapterResult<Self> {
        config.validate()?;

        Ok(Self::new(connector, config.connection.clone()))
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    /// Opens `connection`.
    ///
    /// Does nothing when the connection is already open. Otherwise connects,
    /// retrying once with identical parameters. The retry absorbs a spurious
    /// failure of the first connect right after driver initialization. When
    /// both attempts fail the handle is cleared, the state becomes
    /// [`ConnectionState::Fail`] and the driver's message is returned as the
    /// error detail.
    pub async fn open<'a>(
        &self,
        connection: &'a mut Connection<C::Handle>,
    ) -> AdapterResult<&'a mut Connection<C::Handle>> {
        if connection.state == ConnectionState::Open {
            debug!("connection is already open, skipping open");
            return Ok(connection);
        }

        let credentials = Arc::clone(&connection.credentials);

        let attempt = match self.connect_once(&credentials).await {
            Ok(handle) => Ok(handle),
            Err(err) => {
                debug!(
                    error = err.detail().unwrap_or_default(),
                    "connection attempt failed, trying again with the same parameters"
                );
                self.connect_once(&credentials).await
            }
        };

        match attempt {
            Ok(handle) => {
                connection.handle = Some(handle);
                connection.state = ConnectionState::Open;
                info!(
                    connection = connection.name.as_deref().unwrap_or_default(),
                    server = %credentials.unique_field(),
                    "opened mysql connection"
                );

                Ok(connection)
            }
            Err(err) => {
                debug!(
                    error = err.detail().unwrap_or_default(),
                    "got an error when attempting to open a mysql connection"
                );
                connection.handle = None;
                connection.state = ConnectionState::Fail;

                Err(err)
            }
        }
    }

    /// Performs a single connect call bounded by the connect timeout.
    async fn connect_once(&self, credentials: &MySqlCredentials) -> AdapterResult<C::Handle> {
        let timeout = self.settings.connect_timeout();

        match tokio::time::timeout(timeout, self.connector.connect(credentials)).await {
            Ok(Ok(handle)) => Ok(handle),
            Ok(Err(err)) => {
                let detail = err.to_string();
                Err(AdapterError::from((
                    ErrorKind::ConnectionFailed,
                    "Failed to connect to MySQL",
                    detail,
                ))
                .with_source(err))
            }
            Err(_) => Err(AdapterError::from((
                ErrorKind::ConnectionFailed,
                "Failed to connect to MySQL",
                format!(
                    "connection attempt timed out after {}ms",
                    timeout.as_millis()
                ),
            ))),
        }
    }

    /// Releases the native handle of `connection`.
    ///
    /// Errors raised while closing the handle are returned to the caller.
    pub async fn cancel(&self, connection: &mut Connection<C::Handle>) -> AdapterResult<()> {
        let handle = connection.handle.take();
        connection.state = ConnectionState::Closed;

        match handle {
            Some(handle) => {
                debug!(
                    connection = connection.name.as_deref().unwrap_or_default(),
                    "cancelling connection"
                );
                handle.close().await.map_err(AdapterError::from)
            }
            None => {
                debug!("connection has no handle to cancel");
                Ok(())
            }
        }
    }

    /// Closes `connection` unless it was never opened or is already closed.
    pub async fn close(&self, connection: &mut Connection<C::Handle>) -> AdapterResult<()> {
        if matches!(
            connection.state,
            ConnectionState::Init | ConnectionState::Closed
        ) {
            return Ok(());
        }

        let handle = connection.handle.take();
        connection.state = ConnectionState::Closed;

        if let Some(handle) = handle {
            handle.close().await?;
        }

        Ok(())
    }

    /// Starts a transaction. MySQL statements issued through this adapter are
    /// auto-committed, so there is nothing to do.
    pub fn begin(&self) -> AdapterResult<()> {
        Ok(())
    }

    /// Commits a transaction. See [`ConnectionManager::begin`].
    pub fn commit(&self) -> AdapterResult<()> {
        Ok(())
    }

    /// Runs `sql` on an open connection and reports its outcome.
    pub async fn execute(
        &self,
        connection: &mut Connection<C::Handle>,
        sql: &str,
    ) -> AdapterResult<AdapterResponse> {
        let state = connection.state;
        let Some(handle) = connection.handle.as_mut().filter(|_| state == ConnectionState::Open)
        else {
            bail!(
                ErrorKind::InvalidState,
                "Cannot execute on a connection that is not open",
                format!("connection state is `{state}`")
            );
        };

        debug!(sql, "executing statement");
        let outcome = exception_handler(sql, handle.execute(sql)).await?;

        Ok(get_response(Some(&outcome)))
    }
}
