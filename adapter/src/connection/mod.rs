//! Connection lifecycle for the MySQL adapter.
//!
//! A [`Connection`] record is created in [`ConnectionState::Init`] by the
//! caller and driven through its states by the [`ConnectionManager`]. Every
//! statement run through the manager is wrapped by [`exception_handler`], which
//! classifies driver failures into the adapter error taxonomy.

mod manager;
mod native;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use config::shared::MySqlCredentials;
use tracing::debug;

use crate::error::{AdapterResult, ExecutionFailure};

pub use manager::ConnectionManager;
pub use native::{Connector, MySqlConnector, NativeHandle};

/// Lifecycle state of a [`Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Created, never opened.
    Init,
    /// Holds a live native handle.
    Open,
    /// The last open attempt failed after its retry.
    Fail,
    /// The handle was released.
    Closed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Init => "init",
            ConnectionState::Open => "open",
            ConnectionState::Fail => "fail",
            ConnectionState::Closed => "closed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A logical connection: state, the native handle it exclusively owns, and
/// read-only credentials.
///
/// The engine guarantees at most one in-flight operation per connection, so
/// the record carries no locking.
pub struct Connection<H> {
    name: Option<String>,
    state: ConnectionState,
    handle: Option<H>,
    credentials: Arc<MySqlCredentials>,
}

impl<H> Connection<H> {
    /// Creates a connection in [`ConnectionState::Init`] with no handle.
    pub fn new(credentials: Arc<MySqlCredentials>) -> Self {
        Self {
            name: None,
            state: ConnectionState::Init,
            handle: None,
            credentials,
        }
    }

    /// Sets the name the engine uses to refer to this connection in logs.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Returns the native handle, present only while the connection is open.
    pub fn handle(&self) -> Option<&H> {
        self.handle.as_ref()
    }

    pub fn handle_mut(&mut self) -> Option<&mut H> {
        self.handle.as_mut()
    }

    pub fn credentials(&self) -> &MySqlCredentials {
        &self.credentials
    }
}

impl<H> fmt::Debug for Connection<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("has_handle", &self.handle.is_some())
            .field("credentials", &self.credentials)
            .finish()
    }
}

/// Runs `statement` and classifies its failure.
///
/// Database errors become [`crate::error::ErrorKind::DatabaseExecutionError`]
/// with the server's message, adapter errors pass through unchanged and
/// anything else becomes [`crate::error::ErrorKind::RuntimeError`].
pub async fn exception_handler<T, E, F>(sql: &str, statement: F) -> AdapterResult<T>
where
    F: Future<Output = Result<T, E>>,
    E: Into<ExecutionFailure>,
{
    match statement.await {
        Ok(value) => Ok(value),
        Err(err) => {
            let failure = err.into();
            match &failure {
                ExecutionFailure::Database(err) => debug!(error = %err, "database error"),
                ExecutionFailure::Adapter(_) | ExecutionFailure::Unexpected(_) => {
                    debug!(sql, "error running SQL")
                }
            }

            Err(failure.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error;
    use std::io;

    use secrecy::SecretString;

    use super::*;
    use crate::adapter_error;
    use crate::error::{AdapterError, ErrorKind};

    fn credentials() -> Arc<MySqlCredentials> {
        Arc::new(MySqlCredentials {
            host: "localhost".to_string(),
            port: 3306,
            database: "dw".to_string(),
            username: "root".to_string(),
            password: Some(SecretString::new("secret".to_string())),
        })
    }

    #[derive(Debug)]
    struct ServerError;

    impl fmt::Display for ServerError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("1064 (42000): You have an error in your SQL syntax\n")
        }
    }

    impl error::Error for ServerError {}

    #[derive(Debug)]
    struct TableMissing;

    impl fmt::Display for TableMissing {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("1146 (42S02): Table 'dw.orders' doesn't exist")
        }
    }

    impl error::Error for TableMissing {}

    impl sqlx::error::DatabaseError for TableMissing {
        fn message(&self) -> &str {
            "Table 'dw.orders' doesn't exist"
        }

        fn as_error(&self) -> &(dyn error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::Other
        }
    }

    #[test]
    fn new_connection_starts_in_init_without_handle() {
        let connection: Connection<()> = Connection::new(credentials()).with_name("model.orders");

        assert_eq!(connection.state(), ConnectionState::Init);
        assert!(connection.handle().is_none());
        assert_eq!(connection.name(), Some("model.orders"));
        assert_eq!(connection.credentials().database, "dw");
    }

    #[test]
    fn debug_output_hides_handle_and_password() {
        let connection: Connection<()> = Connection::new(credentials());
        let rendered = format!("{connection:?}");

        assert!(rendered.contains("has_handle: false"));
        assert!(!rendered.contains("secret\""));
    }

    #[tokio::test]
    async fn handler_passes_successful_results_through() {
        let value = exception_handler("select 1", async { Ok::<_, ExecutionFailure>(1) })
            .await
            .unwrap();
        assert_eq!(value, 1);
    }

    #[tokio::test]
    async fn handler_classifies_database_errors() {
        let err = exception_handler("selec 1", async {
            Err::<(), _>(ExecutionFailure::Database(Box::new(ServerError)))
        })
        .await
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::DatabaseExecutionError);
        assert_eq!(
            err.detail(),
            Some("1064 (42000): You have an error in your SQL syntax")
        );
    }

    #[tokio::test]
    async fn handler_reports_driver_errors_with_server_message() {
        let err = exception_handler("select * from orders", async {
            Err::<(), _>(sqlx::Error::Database(Box::new(TableMissing)))
        })
        .await
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::DatabaseExecutionError);
        assert_eq!(
            err.detail(),
            Some("1146 (42S02): Table 'dw.orders' doesn't exist")
        );
    }

    #[tokio::test]
    async fn handler_wraps_unexpected_errors() {
        let err = exception_handler("select 1", async {
            Err::<(), _>(io::Error::other("broken pipe"))
        })
        .await
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RuntimeError);
    }

    #[tokio::test]
    async fn handler_reraises_adapter_errors_unchanged() {
        let err = exception_handler("select 1", async {
            Err::<(), AdapterError>(adapter_error!(ErrorKind::InvalidState, "Not open"))
        })
        .await
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(err.description(), "Not open");
    }
}
