//! Error types for reading fetches.

use thiserror::Error;

/// How soon a failed fetch should be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    /// The service answered but had nothing usable; try again shortly.
    Soon,
    /// Something unexpected failed; back off before the next attempt.
    Backoff,
}

/// Errors that can occur while fetching a reading.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Login was rejected.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The session token is no longer accepted.
    #[error("Session expired")]
    AuthExpired,

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The response carried no measurement.
    #[error("No data: {0}")]
    NoData(String),
}

impl FetchError {
    /// Whether re-establishing the session may fix this error.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, FetchError::AuthExpired)
    }

    /// Retry policy for this error.
    pub fn retry_class(&self) -> RetryClass {
        match self {
            FetchError::NoData(_) => RetryClass::Soon,
            _ => RetryClass::Backoff,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::Connection(err.to_string())
        } else if err.is_decode() {
            FetchError::Parse(err.to_string())
        } else {
            FetchError::Http(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_no_data_retries_soon() {
        assert_eq!(FetchError::NoData("empty".into()).retry_class(), RetryClass::Soon);
        assert_eq!(FetchError::Timeout.retry_class(), RetryClass::Backoff);
        assert_eq!(FetchError::AuthExpired.retry_class(), RetryClass::Backoff);
        assert_eq!(FetchError::Parse("bad".into()).retry_class(), RetryClass::Backoff);
    }

    #[test]
    fn auth_expired_is_detected() {
        assert!(FetchError::AuthExpired.is_auth_expired());
        assert!(!FetchError::Auth("denied".into()).is_auth_expired());
    }
}
