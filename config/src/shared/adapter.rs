use serde::Deserialize;

use crate::Config;
use crate::shared::{ConnectionSettings, MySqlCredentials, ValidationError};

/// Root configuration for a process embedding the adapter.
#[derive(Debug, Clone, Deserialize)]
pub struct AdapterConfig {
    /// Credentials of the target MySQL server.
    pub credentials: MySqlCredentials,
    /// Connect-time settings.
    #[serde(default)]
    pub connection: ConnectionSettings,
}

impl AdapterConfig {
    /// Validates all nested sections.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.credentials.validate()?;
        self.connection.validate()
    }
}

impl Config for AdapterConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &[];
}
