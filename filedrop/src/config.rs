//! Server configuration, built once at startup and shared with handlers.

use std::net::SocketAddr;

/// Default transport-level upload limit (1 GiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 1024 * 1024 * 1024;

/// Settings for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind: SocketAddr,
    /// Shared upload secret. Uploads are refused when unset.
    pub password: Option<String>,
    /// Request body limit for uploads; 0 disables it.
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    /// Check a submitted upload credential.
    ///
    /// Plain equality against the configured secret. An unset or empty
    /// secret accepts nothing.
    pub fn accepts(&self, submitted: Option<&str>) -> bool {
        match (self.password.as_deref(), submitted) {
            (Some(expected), Some(given)) => !expected.is_empty() && expected == given,
            _ => false,
        }
    }
}
