//! Configuration types for the ADDRESSFACTORY DIRECT client.

use serde::{Deserialize, Serialize};

use crate::request::{Credentials, RecordsOptions};

/// Main client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// SOAP endpoint URL
    pub endpoint: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Account used to open sessions
    pub credentials: CredentialsConfig,

    /// Default getRecords parameters
    pub records: RecordsOptions,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://localhost/addressfactory-direct/ws".to_string(),
            timeout_secs: 30,
            credentials: CredentialsConfig::default(),
            records: RecordsOptions::default(),
        }
    }
}

impl ClientConfig {
    /// Parse a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }
}

/// Account credentials.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub user: String,
    pub password: String,
}

impl CredentialsConfig {
    pub fn to_credentials(&self) -> Credentials {
        Credentials::new(self.user.clone(), self.password.clone())
    }
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self.to_credentials(), f)
    }
}
