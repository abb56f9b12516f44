//! Outbound HTTP client
//!
//! Every call to an external identity provider goes through a client built
//! here so that connect and request deadlines are always set.

use std::time::Duration;

use thiserror::Error;

/// Failure classes of an outbound call
#[derive(Debug, Error)]
pub enum HttpClientError {
    /// Deadline elapsed (connect or whole request)
    #[error("request timed out")]
    Timeout,

    /// Connection, TLS or protocol failure
    #[error("transport failure: {0}")]
    Transport(String),

    /// Response body did not have the expected shape
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// Client could not be constructed
    #[error("client build failed: {0}")]
    Build(String),
}

impl From<reqwest::Error> for HttpClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HttpClientError::Timeout
        } else if err.is_decode() {
            HttpClientError::Decode(err.to_string())
        } else {
            HttpClientError::Transport(err.to_string())
        }
    }
}

/// Build a client whose requests fail with [`HttpClientError::Timeout`]
/// once `timeout` elapses
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, HttpClientError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()
        .map_err(|e| HttpClientError::Build(e.to_string()))
}
