// ── Runtime session configuration ──
//
// Describes which account to use and how to reach the cloud. Hosts build a
// `SessionConfig` from their own settings; the core never reads files.

use secrecy::SecretString;

use fermly_api::{Credentials, TransportConfig};

/// Everything a [`Session`](crate::Session) needs to talk to the cloud.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub username: String,
    pub password: SecretString,
    /// Base URLs, timeout, and app identity headers.
    pub transport: TransportConfig,
}

impl SessionConfig {
    /// Production endpoints with the default 30 s timeout.
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
            transport: TransportConfig::default(),
        }
    }

    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    pub(crate) fn credentials(&self) -> Credentials {
        Credentials::new(self.username.clone(), self.password.clone())
    }
}
