//! Error types and result definitions for adapter operations.
//!
//! Every failure that leaves this crate is an [`AdapterError`] tagged with an
//! [`ErrorKind`]. Driver errors raised while a statement runs are first
//! captured as an [`ExecutionFailure`] and then classified into the taxonomy,
//! so no raw driver error type crosses the crate boundary.

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::error;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::panic::Location;
use std::sync::Arc;

/// Convenient result type for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;

#[derive(Debug, Clone)]
struct ErrorPayload {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
    backtrace: Arc<Backtrace>,
}

/// Main error type of the adapter.
///
/// Carries a kind, a static description, optional dynamic detail (for
/// example the database's own error text), an optional source error and the
/// call site that created it.
#[derive(Debug, Clone)]
pub struct AdapterError {
    payload: Box<ErrorPayload>,
}

/// Categories of adapter failures.
///
/// Callers branch on the kind: connection failures may be retried by a higher
/// layer, database execution errors are reported with the server's message,
/// validation errors are usage errors and are never retried.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Connection Errors
    ConnectionFailed,

    // Query & Execution Errors
    DatabaseExecutionError,

    // Configuration & Validation Errors
    ValidationError,
    ConfigError,

    // State Errors
    InvalidState,

    // Unexpected failures wrapped at a statement boundary
    RuntimeError,

    // Unknown / Uncategorized
    Unknown,
}

impl ErrorKind {
    /// Returns `true` for failures that happened while establishing a connection.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, ErrorKind::ConnectionFailed)
    }
}

impl AdapterError {
    /// Returns the [`ErrorKind`] of this error.
    pub fn kind(&self) -> ErrorKind {
        self.payload.kind
    }

    /// Returns the static description of this error.
    pub fn description(&self) -> &str {
        &self.payload.description
    }

    /// Returns the dynamic detail, if any.
    pub fn detail(&self) -> Option<&str> {
        self.payload.detail.as_deref()
    }

    /// Returns the captured backtrace.
    pub fn backtrace(&self) -> &Backtrace {
        self.payload.backtrace.as_ref()
    }

    /// Returns the call site that created this error.
    pub fn location(&self) -> &'static Location<'static> {
        self.payload.location
    }

    /// Attaches an originating error, exposed through [`error::Error::source`].
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        self.payload.source = Some(Arc::new(source));
        self
    }

    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    ) -> Self {
        AdapterError {
            payload: Box::new(ErrorPayload {
                kind,
                description,
                detail,
                source,
                location: Location::caller(),
                backtrace: Arc::new(Backtrace::capture()),
            }),
        }
    }
}

impl PartialEq for AdapterError {
    fn eq(&self, other: &AdapterError) -> bool {
        self.payload.kind == other.payload.kind
    }
}

impl Hash for AdapterError {
    /// Hashes only the kind and static description so that repeated
    /// occurrences of the same failure group together.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.payload.kind.hash(state);
        self.payload.description.hash(state);
    }
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let payload = &self.payload;
        write!(
            f,
            "[{:?}] {} @ {}:{}:{}",
            payload.kind,
            payload.description,
            payload.location.file(),
            payload.location.line(),
            payload.location.column()
        )?;

        write_detail(payload.detail.as_deref(), f)?;
        write_backtrace(payload.backtrace.as_ref(), f)
    }
}

impl error::Error for AdapterError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.payload
            .source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn error::Error + 'static))
    }
}

fn write_detail(detail: Option<&str>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let Some(detail) = detail else {
        return Ok(());
    };

    if detail.trim().is_empty() {
        return write!(f, "\n  Detail: <empty>");
    }

    write!(f, "\n  Detail:")?;
    for line in detail.lines() {
        write!(f, "\n    {line}")?;
    }

    Ok(())
}

fn write_backtrace(backtrace: &Backtrace, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let rendered = backtrace.to_string();
    if rendered.trim().is_empty() || rendered.contains("disabled backtrace") {
        return Ok(());
    }

    write!(f, "\n  Backtrace:")?;
    for line in rendered.lines() {
        write!(f, "\n    {line}")?;
    }

    Ok(())
}

/// Creates an [`AdapterError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for AdapterError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> AdapterError {
        AdapterError::from_components(kind, Cow::Borrowed(desc), None, None)
    }
}

/// Creates an [`AdapterError`] from an error kind, static description, and dynamic detail.
impl<D> From<(ErrorKind, &'static str, D)> for AdapterError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> AdapterError {
        AdapterError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()), None)
    }
}

/// Converts configuration validation failures to [`ErrorKind::ConfigError`].
impl From<config::shared::ValidationError> for AdapterError {
    #[track_caller]
    fn from(err: config::shared::ValidationError) -> AdapterError {
        let detail = err.to_string();
        AdapterError::from_components(
            ErrorKind::ConfigError,
            Cow::Borrowed("Invalid adapter configuration"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts configuration loading failures to [`ErrorKind::ConfigError`].
impl From<config::LoadConfigError> for AdapterError {
    #[track_caller]
    fn from(err: config::LoadConfigError) -> AdapterError {
        let detail = err.to_string();
        AdapterError::from_components(
            ErrorKind::ConfigError,
            Cow::Borrowed("Failed to load adapter configuration"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`sqlx::Error`] through the statement classification rules.
///
/// Server-side errors become [`ErrorKind::DatabaseExecutionError`], everything
/// else becomes [`ErrorKind::RuntimeError`].
impl From<sqlx::Error> for AdapterError {
    #[track_caller]
    fn from(err: sqlx::Error) -> AdapterError {
        ExecutionFailure::from(err).into()
    }
}

/// A failure raised while a statement runs, before classification.
#[derive(Debug)]
pub enum ExecutionFailure {
    /// Already an adapter error; passed through unchanged.
    Adapter(AdapterError),
    /// The database rejected the statement.
    Database(Box<dyn error::Error + Send + Sync>),
    /// Any other failure.
    Unexpected(Box<dyn error::Error + Send + Sync>),
}

impl From<AdapterError> for ExecutionFailure {
    fn from(err: AdapterError) -> Self {
        ExecutionFailure::Adapter(err)
    }
}

impl From<sqlx::Error> for ExecutionFailure {
    fn from(err: sqlx::Error) -> Self {
        // Unwrapped so the detail is the server's message without sqlx's prefix.
        match err {
            sqlx::Error::Database(err) => ExecutionFailure::Database(err.into_error()),
            other => ExecutionFailure::Unexpected(Box::new(other)),
        }
    }
}

impl From<std::io::Error> for ExecutionFailure {
    fn from(err: std::io::Error) -> Self {
        ExecutionFailure::Unexpected(Box::new(err))
    }
}

/// Classifies an [`ExecutionFailure`] into the adapter taxonomy.
///
/// Adapter errors are returned as they are, never wrapped a second time.
/// Database errors keep the server's message, trimmed, as detail.
impl From<ExecutionFailure> for AdapterError {
    #[track_caller]
    fn from(failure: ExecutionFailure) -> AdapterError {
        match failure {
            ExecutionFailure::Adapter(err) => err,
            ExecutionFailure::Database(err) => {
                let detail = err.to_string().trim().to_owned();
                AdapterError::from_components(
                    ErrorKind::DatabaseExecutionError,
                    Cow::Borrowed("Database error"),
                    Some(Cow::Owned(detail)),
                    Some(Arc::from(err)),
                )
            }
            ExecutionFailure::Unexpected(err) => {
                let detail = err.to_string();
                AdapterError::from_components(
                    ErrorKind::RuntimeError,
                    Cow::Borrowed("Unexpected error while running SQL"),
                    Some(Cow::Owned(detail)),
                    Some(Arc::from(err)),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::{adapter_error, bail};

    #[derive(Debug)]
    struct FakeServerError(&'static str);

    impl fmt::Display for FakeServerError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    impl error::Error for FakeServerError {}

    #[test]
    fn database_failures_keep_trimmed_server_message() {
        let failure = ExecutionFailure::Database(Box::new(FakeServerError(
            "  1146 (42S02): Table 'dw.orders' doesn't exist \n",
        )));

        let err = AdapterError::from(failure);
        assert_eq!(err.kind(), ErrorKind::DatabaseExecutionError);
        assert_eq!(
            err.detail(),
            Some("1146 (42S02): Table 'dw.orders' doesn't exist")
        );
        assert!(error::Error::source(&err).is_some());
    }

    #[test]
    fn unexpected_failures_become_runtime_errors() {
        let failure = ExecutionFailure::from(io::Error::other("socket closed"));

        let err = AdapterError::from(failure);
        assert_eq!(err.kind(), ErrorKind::RuntimeError);
        assert_eq!(err.detail(), Some("socket closed"));
    }

    #[test]
    fn adapter_errors_are_not_wrapped_again() {
        let original = adapter_error!(ErrorKind::ValidationError, "Bad relation", "too long");
        let line = original.location().line();

        let err = AdapterError::from(ExecutionFailure::from(original));
        assert_eq!(err.kind(), ErrorKind::ValidationError);
        assert_eq!(err.detail(), Some("too long"));
        assert_eq!(err.location().line(), line);
        assert!(error::Error::source(&err).is_none());
    }

    #[test]
    fn sqlx_non_database_errors_are_runtime_errors() {
        let err = AdapterError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.kind(), ErrorKind::RuntimeError);
    }

    #[test]
    fn validation_errors_map_to_config_errors() {
        let err = AdapterError::from(config::shared::ValidationError::ConnectTimeoutZero);
        assert_eq!(err.kind(), ErrorKind::ConfigError);
        assert!(err.detail().unwrap().contains("connect_timeout_ms"));
    }

    #[test]
    fn display_includes_kind_description_and_detail() {
        let err = adapter_error!(
            ErrorKind::ConnectionFailed,
            "Failed to connect",
            "Access denied for user 'root'"
        );
        let rendered = err.to_string();

        assert!(rendered.starts_with("[ConnectionFailed] Failed to connect @ "));
        assert!(rendered.contains("Access denied for user 'root'"));
    }

    #[test]
    fn errors_compare_by_kind() {
        let a = adapter_error!(ErrorKind::InvalidState, "a");
        let b = adapter_error!(ErrorKind::InvalidState, "b");
        let c = adapter_error!(ErrorKind::RuntimeError, "a");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(ErrorKind::ConnectionFailed.is_connection_error());
        assert!(!ErrorKind::DatabaseExecutionError.is_connection_error());
    }

    fn always_fails() -> AdapterResult<()> {
        bail!(ErrorKind::InvalidState, "Connection is not open", "state is init");
    }

    #[test]
    fn bail_returns_early_with_detail() {
        let err = always_fails().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(err.detail(), Some("state is init"));
    }
}
