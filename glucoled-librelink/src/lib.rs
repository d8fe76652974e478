//! # glucoled-librelink
//!
//! Client for the LibreLinkUp follower API, used to fetch the most recent
//! glucose measurement of the followed patient.
//!
//! Authentication is explicit: [`LibreLinkClient::login`] returns a
//! [`Session`] that is passed into every data call. When a call fails with
//! [`FetchError::AuthExpired`] the caller logs in again and retries.
//!
//! ## Example
//!
//! ```rust,no_run
//! use glucoled_librelink::{Credentials, LibreLinkClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = LibreLinkClient::builder()
//!         .base_url("https://api.libreview.io")
//!         .build()?;
//!
//!     let credentials = Credentials::new("follower@example.com", "secret");
//!     let session = client.login(&credentials).await?;
//!     let reading = client.latest_reading(&session).await?;
//!
//!     println!("{} mg/dL {}", reading.value_mg_dl, reading.trend);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod wire;

pub use client::{Credentials, LibreLinkClient, LibreLinkClientBuilder, Session};
pub use error::{FetchError, RetryClass};

// Re-export types for convenience
pub use glucoled_types::{Reading, TrendArrow};
