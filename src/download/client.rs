//! HTTP client wrapper for streaming downloads.
//!
//! This module provides the `HttpClient` struct which configures the
//! underlying reqwest client with proper timeouts and a project User-Agent.

use std::time::Duration;

use reqwest::Client;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};

/// Project URL for User-Agent identification (good citizenship; RFC 9308).
const PROJECT_UA_URL: &str = "https://github.com/nicksrandall/hauler";

/// HTTP client for streaming file downloads.
///
/// This client is designed to be created once and reused for multiple
/// download sessions, taking advantage of connection pooling. Cloning is
/// cheap; all clones share the same connection pool.
///
/// # Example
///
/// ```no_run
/// use hauler::download::{DownloadSession, HttpClient};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new();
/// let mut session = DownloadSession::new(
///     "https://example.com/runtime.tar.xz",
///     Path::new("./runtime.tar.xz"),
///     false,
/// );
/// session.start(&client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Read timeout: 5 minutes (for large files)
    /// - Gzip decompression: enabled
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::new_with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new_with_timeouts(connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .user_agent(default_user_agent())
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Returns a reference to the underlying reqwest client.
    ///
    /// This can be used for advanced operations not covered by this wrapper.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

/// Default User-Agent for download requests (identifies the tool).
fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("hauler/{version} (+{PROJECT_UA_URL})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_user_agent_contains_version_and_project_url() {
        let ua = default_user_agent();
        assert!(
            ua.starts_with(&format!("hauler/{}", env!("CARGO_PKG_VERSION"))),
            "UA must lead with crate version: {ua}"
        );
        assert!(ua.contains(PROJECT_UA_URL), "UA must contain project URL");
    }

    #[test]
    fn test_client_construction_does_not_panic() {
        let _ = HttpClient::new();
        let _ = HttpClient::new_with_timeouts(5, 10);
        let _ = HttpClient::default();
    }
}
