//! LibreLinkUp reading source.

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use glucoled_librelink::{Credentials, FetchError, LibreLinkClient, Session};
use glucoled_types::Reading;
use tracing::{debug, info, warn};

use super::ReadingSource;

/// Reads the followed patient's latest measurement from LibreLinkUp.
///
/// The session is established lazily on the first fetch and kept between
/// fetches. When the service reports the session as expired, the source logs
/// in again and retries the fetch once.
#[derive(Debug)]
pub struct LibreLinkSource {
    client: LibreLinkClient,
    credentials: Credentials,
    session: Option<Session>,
    description: String,
}

impl LibreLinkSource {
    pub fn new(client: LibreLinkClient, credentials: Credentials) -> Self {
        let description = format!("librelink: {}", credentials.email());
        Self {
            client,
            credentials,
            session: None,
            description,
        }
    }

    /// Whether a session is currently held.
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    async fn session(&mut self) -> Result<Session, FetchError> {
        let now = unix_secs();
        if let Some(session) = self.session.as_ref().filter(|s| !s.is_expired_at(now)) {
            return Ok(session.clone());
        }

        debug!("logging in to LibreLinkUp");
        let session = self.client.login(&self.credentials).await?;
        info!(patient = %session.patient_id(), "LibreLinkUp session established");
        self.session = Some(session.clone());
        Ok(session)
    }
}

#[async_trait]
impl ReadingSource for LibreLinkSource {
    async fn fetch_latest(&mut self) -> Result<Reading, FetchError> {
        let session = self.session().await?;

        match self.client.latest_reading(&session).await {
            Err(e) if e.is_auth_expired() => {
                warn!("LibreLinkUp session expired, logging in again");
                self.session = None;
                let session = self.session().await?;
                let result = self.client.latest_reading(&session).await;
                if result.as_ref().is_err_and(FetchError::is_auth_expired) {
                    self.session = None;
                }
                result
            }
            other => other,
        }
    }

    fn description(&self) -> &str {
        &self.description
    }
}

fn unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glucoled_librelink::RetryClass;
    use std::time::Duration;

    fn unreachable_source() -> LibreLinkSource {
        let client = LibreLinkClient::builder()
            .base_url("http://127.0.0.1:9")
            .timeout(Duration::from_millis(500))
            .build()
            .unwrap();
        LibreLinkSource::new(client, Credentials::new("follower@example.com", "secret"))
    }

    #[tokio::test]
    async fn login_failure_is_transient_and_keeps_no_session() {
        let mut source = unreachable_source();

        let err = source.fetch_latest().await.unwrap_err();
        assert_eq!(err.retry_class(), RetryClass::Backoff);
        assert!(!source.has_session());
    }

    #[test]
    fn description_hides_password() {
        let source = unreachable_source();
        assert_eq!(source.description(), "librelink: follower@example.com");
        assert!(!format!("{:?}", source).contains("secret"));
    }
}
