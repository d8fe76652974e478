//! HTTP client for the LibreLinkUp follower API.

use std::fmt;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use glucoled_types::Reading;

use crate::wire::{Connection, Envelope, GraphData, LoginData};
use crate::FetchError;

/// Default API endpoint (global region).
pub const DEFAULT_BASE_URL: &str = "https://api.libreview.io";

/// Product header value expected by the service.
pub const DEFAULT_PRODUCT: &str = "llu.android";

/// Client version header value expected by the service.
pub const DEFAULT_VERSION: &str = "4.7.0";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Login redirects are followed at most this many times.
const MAX_REDIRECTS: usize = 2;

/// Follower account credentials.
#[derive(Clone)]
pub struct Credentials {
    email: String,
    password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An authenticated session for one followed patient.
///
/// Sessions are explicit state: they are created by
/// [`LibreLinkClient::login`] and passed into every data call.
#[derive(Clone)]
pub struct Session {
    token: String,
    patient_id: String,
    base_url: String,
    expires_at: Option<u64>,
}

impl Session {
    /// The followed patient's id.
    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    /// Regional endpoint this session is bound to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether the ticket's advertised expiry has passed.
    pub fn is_expired_at(&self, now_secs: u64) -> bool {
        self.expires_at.is_some_and(|expires| now_secs >= expires)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("patient_id", &self.patient_id)
            .field("base_url", &self.base_url)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// LibreLinkUp API client.
#[derive(Debug, Clone)]
pub struct LibreLinkClient {
    client: Client,
    base_url: String,
    product: String,
    version: String,
    patient_id: Option<String>,
}

impl LibreLinkClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> LibreLinkClientBuilder {
        LibreLinkClientBuilder::default()
    }

    /// Log in and resolve the followed patient.
    ///
    /// Follows the regional redirect the service answers with when the
    /// account lives in another region.
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, FetchError> {
        let mut base_url = self.base_url.clone();

        for _ in 0..=MAX_REDIRECTS {
            let url = format!("{}/llu/auth/login", base_url);
            let body = LoginRequest {
                email: &credentials.email,
                password: &credentials.password,
            };

            let response = self.headers(self.client.post(&url)).json(&body).send().await?;
            if response.status() == StatusCode::UNAUTHORIZED {
                return Err(FetchError::Auth("Invalid credentials".to_string()));
            }
            let envelope: Envelope<LoginData> = decode(response).await?;
            if envelope.status != 0 {
                return Err(FetchError::Auth(envelope.error_message()));
            }

            let data = envelope
                .data
                .ok_or_else(|| FetchError::Parse("login response has no data".to_string()))?;

            if data.redirect {
                let region = data
                    .region
                    .ok_or_else(|| FetchError::Parse("redirect without region".to_string()))?;
                base_url = regional_url(&region);
                info!(region = %region, "LibreLinkUp login redirected");
                continue;
            }

            let ticket = data
                .auth_ticket
                .ok_or_else(|| FetchError::Auth("login response has no auth ticket".to_string()))?;

            let patient_id = match &self.patient_id {
                Some(id) => id.clone(),
                None => self.first_patient(&base_url, &ticket.token).await?,
            };

            debug!(patient_id = %patient_id, base_url = %base_url, "LibreLinkUp session established");

            return Ok(Session {
                token: ticket.token,
                patient_id,
                base_url,
                expires_at: ticket.expires,
            });
        }

        Err(FetchError::Auth("too many login redirects".to_string()))
    }

    /// List the patients this follower account can see.
    pub async fn connections(
        &self,
        base_url: &str,
        token: &str,
    ) -> Result<Vec<Connection>, FetchError> {
        let url = format!("{}/llu/connections", base_url);
        let response = self
            .headers(self.client.get(&url))
            .bearer_auth(token)
            .send()
            .await?;
        check_session(response.status())?;

        let envelope: Envelope<Vec<Connection>> = decode(response).await?;
        if envelope.status != 0 {
            return Err(FetchError::AuthExpired);
        }
        Ok(envelope.data.unwrap_or_default())
    }

    /// Fetch the latest glucose reading for the session's patient.
    pub async fn latest_reading(&self, session: &Session) -> Result<Reading, FetchError> {
        let url = format!(
            "{}/llu/connections/{}/graph",
            session.base_url, session.patient_id
        );
        let response = self
            .headers(self.client.get(&url))
            .bearer_auth(&session.token)
            .send()
            .await?;
        check_session(response.status())?;

        let envelope: Envelope<GraphData> = decode(response).await?;
        if envelope.status != 0 {
            return Err(FetchError::AuthExpired);
        }

        envelope
            .data
            .ok_or_else(|| FetchError::NoData("graph response has no data".to_string()))?
            .latest_reading()
    }

    async fn first_patient(&self, base_url: &str, token: &str) -> Result<String, FetchError> {
        self.connections(base_url, token)
            .await?
            .into_iter()
            .next()
            .map(|c| c.patient_id)
            .ok_or_else(|| FetchError::NoData("account follows no patients".to_string()))
    }

    fn headers(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("product", &self.product)
            .header("version", &self.version)
            .header("cache-control", "no-cache")
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, FetchError> {
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Http(format!("API returned status {}", status)));
    }
    response
        .json()
        .await
        .map_err(|e| FetchError::Parse(e.to_string()))
}

fn check_session(status: StatusCode) -> Result<(), FetchError> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(FetchError::AuthExpired);
    }
    Ok(())
}

/// Endpoint for a region named in a login redirect.
pub fn regional_url(region: &str) -> String {
    format!("https://api-{}.libreview.io", region)
}

/// Builder for LibreLinkClient.
#[derive(Debug, Default)]
pub struct LibreLinkClientBuilder {
    base_url: Option<String>,
    product: Option<String>,
    version: Option<String>,
    timeout: Option<Duration>,
    patient_id: Option<String>,
}

impl LibreLinkClientBuilder {
    /// Set the API endpoint.
    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = Some(url.trim_end_matches('/').to_string());
        self
    }

    /// Set the `product` header value.
    pub fn product(mut self, product: &str) -> Self {
        self.product = Some(product.to_string());
        self
    }

    /// Set the `version` header value.
    pub fn version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Follow a specific patient instead of the first connection.
    pub fn patient_id(mut self, patient_id: Option<String>) -> Self {
        self.patient_id = patient_id;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<LibreLinkClient, FetchError> {
        let client = Client::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()
            .map_err(|e| FetchError::Http(e.to_string()))?;

        Ok(LibreLinkClient {
            client,
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            product: self.product.unwrap_or_else(|| DEFAULT_PRODUCT.to_string()),
            version: self.version.unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            patient_id: self.patient_id,
        })
    }
}
