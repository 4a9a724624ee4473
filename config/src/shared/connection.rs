use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sqlx::mysql::MySqlConnectOptions;

use crate::shared::ValidationError;

/// Type tag the transformation engine uses to pick this adapter.
pub const MYSQL_ADAPTER_TYPE: &str = "mysql";

/// Credential fields that identify a connection in logs and connection keys.
///
/// Never includes the password.
const CONNECTION_KEYS: &[&str] = &["host", "port", "database", "username"];

const DEFAULT_MYSQL_PORT: u16 = 3306;

/// Credentials for connecting to a MySQL server.
///
/// The field aliases accept the names used by older profile files
/// (`base`/`schema` for the database, `user` for the username and
/// `pass`/`word` for the password).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MySqlCredentials {
    /// Hostname or IP address of the MySQL server.
    pub host: String,
    /// Port the server listens on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Database to connect to.
    #[serde(alias = "base", alias = "schema")]
    pub database: String,
    /// User to authenticate as.
    #[serde(alias = "user")]
    pub username: String,
    /// Password for `username`. Redacted in debug output.
    #[serde(default, alias = "pass", alias = "word")]
    pub password: Option<SecretString>,
}

fn default_port() -> u16 {
    DEFAULT_MYSQL_PORT
}

impl MySqlCredentials {
    /// Returns the adapter type tag, see [`MYSQL_ADAPTER_TYPE`].
    pub fn type_name(&self) -> &'static str {
        MYSQL_ADAPTER_TYPE
    }

    /// Returns the key the engine uses to deduplicate connections to the same database.
    pub fn unique_field(&self) -> String {
        format!("{}/{}/{}", self.host, self.port, self.database)
    }

    /// Returns the ordered names of the identifying credential fields.
    pub fn connection_keys(&self) -> &'static [&'static str] {
        CONNECTION_KEYS
    }

    /// Returns `(key, value)` pairs for [`Self::connection_keys`], in order.
    pub fn connection_info(&self) -> Vec<(&'static str, String)> {
        let values = [
            self.host.clone(),
            self.port.to_string(),
            self.database.clone(),
            self.username.clone(),
        ];

        CONNECTION_KEYS.iter().copied().zip(values).collect()
    }

    /// Validates the credentials.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.host.trim().is_empty() {
            return Err(ValidationError::EmptyHost);
        }

        Ok(())
    }

    /// Builds `sqlx` connect options for the configured database.
    pub fn connect_options(&self) -> MySqlConnectOptions {
        let mut options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .database(&self.database);

        if let Some(password) = &self.password {
            options = options.password(password.expose_secret());
        }

        options
    }
}

/// Same as [`MySqlCredentials`] but without the password, safe to serialize.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct MySqlCredentialsWithoutSecrets {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
}

impl From<MySqlCredentials> for MySqlCredentialsWithoutSecrets {
    fn from(value: MySqlCredentials) -> Self {
        MySqlCredentialsWithoutSecrets {
            host: value.host,
            port: value.port,
            database: value.database,
            username: value.username,
        }
    }
}

/// Connect-time behaviour of the connection manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// Upper bound for a single connect attempt, in milliseconds.
    ///
    /// A timed out attempt counts as a failed attempt. Default: 10000ms.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl ConnectionSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.connect_timeout_ms == 0 {
            return Err(ValidationError::ConnectTimeoutZero);
        }

        Ok(())
    }
}
