//! Reading source abstraction.
//!
//! The monitor pulls one [`Reading`] per cycle from a [`ReadingSource`].
//! Implementations cover the LibreLinkUp service, an in-process channel and
//! a scripted queue for tests.

mod channel;
mod librelink;
mod scripted;

pub use channel::ChannelSource;
pub use librelink::LibreLinkSource;
pub use scripted::ScriptedSource;

use std::fmt::Debug;

use async_trait::async_trait;
use glucoled_librelink::FetchError;
use glucoled_types::Reading;

/// Trait for fetching the latest glucose reading.
///
/// # Example
///
/// ```
/// use glucoled::{ReadingSource, ScriptedSource};
/// use glucoled_types::Reading;
///
/// # tokio_test::block_on(async {
/// let mut source = ScriptedSource::new([Ok(Reading::new(112.0, 1_000))]);
/// let reading = source.fetch_latest().await.unwrap();
/// assert_eq!(reading.value_mg_dl, 112.0);
/// # });
/// ```
#[async_trait]
pub trait ReadingSource: Send + Debug {
    /// Fetch the most recent reading.
    ///
    /// Implementations bound the call with their own timeout.
    async fn fetch_latest(&mut self) -> Result<Reading, FetchError>;

    /// Returns a human-readable description of the source.
    fn description(&self) -> &str;
}

#[async_trait]
impl<S: ReadingSource + ?Sized> ReadingSource for Box<S> {
    async fn fetch_latest(&mut self) -> Result<Reading, FetchError> {
        (**self).fetch_latest().await
    }

    fn description(&self) -> &str {
        (**self).description()
    }
}
