//! Channel-based reading source.
//!
//! Readings are pushed by a producer through a tokio watch channel and the
//! monitor picks up whatever was published last.

use async_trait::async_trait;
use glucoled_librelink::FetchError;
use glucoled_types::Reading;
use tokio::sync::watch;

use super::ReadingSource;

/// Latest value published on the channel.
pub type Published = Option<Result<Reading, FetchError>>;

/// A reading source fed through a watch channel.
///
/// # Example
///
/// ```
/// use glucoled::ChannelSource;
/// use glucoled_types::Reading;
///
/// let (tx, _source) = ChannelSource::create("bridge");
/// tx.send(Some(Ok(Reading::new(98.0, 0)))).unwrap();
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: watch::Receiver<Published>,
    description: String,
}

impl ChannelSource {
    /// Create a new channel source.
    pub fn new(receiver: watch::Receiver<Published>, source_description: &str) -> Self {
        Self {
            receiver,
            description: format!("channel: {}", source_description),
        }
    }

    /// Create a channel pair. Nothing is published initially.
    pub fn create(source_description: &str) -> (watch::Sender<Published>, Self) {
        let (tx, rx) = watch::channel(None);
        (tx, Self::new(rx, source_description))
    }
}

#[async_trait]
impl ReadingSource for ChannelSource {
    async fn fetch_latest(&mut self) -> Result<Reading, FetchError> {
        match self.receiver.borrow_and_update().clone() {
            Some(result) => result,
            None => Err(FetchError::NoData("nothing published yet".to_string())),
        }
    }

    fn description(&self) -> &str {
        &self.description
    }
}
