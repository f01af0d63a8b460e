//! Configuration for the shared-secret filter plugin.

use secrecy::SecretString;
use serde::Deserialize;

/// Plugin configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SharedSecretFilterConfig {
    /// Header carrying the presented token.
    pub header: String,

    /// Header set on allowed calls, recording the permitted principal.
    pub principal_header: String,

    /// The shared-secret token. An empty token rejects every call.
    pub token: SecretString,
}

impl Default for SharedSecretFilterConfig {
    fn default() -> Self {
        Self {
            header: "authorization".to_owned(),
            principal_header: "user".to_owned(),
            token: SecretString::from(String::new()),
        }
    }
}
