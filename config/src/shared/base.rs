use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The connect timeout would make every connection attempt fail immediately.
    #[error("`connect_timeout_ms` cannot be zero")]
    ConnectTimeoutZero,
    /// Credentials must name the server to connect to.
    #[error("`host` cannot be empty")]
    EmptyHost,
}
