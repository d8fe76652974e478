//! Scripted reading source for tests and demos.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use glucoled_librelink::FetchError;
use glucoled_types::Reading;
use parking_lot::Mutex;
use tokio::time::Instant;

use super::ReadingSource;

/// A reading source that replays a fixed queue of results.
///
/// Once the queue is drained the last result is repeated. Every fetch is
/// timestamped with the tokio clock so tests can check the polling cadence.
#[derive(Debug)]
pub struct ScriptedSource {
    script: VecDeque<Result<Reading, FetchError>>,
    last: Option<Result<Reading, FetchError>>,
    fetches: Arc<Mutex<Vec<Instant>>>,
}

impl ScriptedSource {
    pub fn new(script: impl IntoIterator<Item = Result<Reading, FetchError>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            last: None,
            fetches: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A source that returns `result` forever.
    pub fn repeating(result: Result<Reading, FetchError>) -> Self {
        Self::new([result])
    }

    /// Shared log of fetch times, readable after the source is moved.
    pub fn fetch_log(&self) -> Arc<Mutex<Vec<Instant>>> {
        self.fetches.clone()
    }
}

#[async_trait]
impl ReadingSource for ScriptedSource {
    async fn fetch_latest(&mut self) -> Result<Reading, FetchError> {
        self.fetches.lock().push(Instant::now());

        if let Some(next) = self.script.pop_front() {
            self.last = Some(next);
        }
        self.last
            .clone()
            .unwrap_or_else(|| Err(FetchError::NoData("empty script".to_string())))
    }

    fn description(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_then_repeats_last() {
        let mut source = ScriptedSource::new([
            Err(FetchError::Timeout),
            Ok(Reading::new(100.0, 0)),
        ]);

        assert_eq!(source.fetch_latest().await, Err(FetchError::Timeout));
        assert_eq!(source.fetch_latest().await.unwrap().value_mg_dl, 100.0);
        assert_eq!(source.fetch_latest().await.unwrap().value_mg_dl, 100.0);
        assert_eq!(source.fetch_log().lock().len(), 3);
    }

    #[tokio::test]
    async fn empty_script_is_no_data() {
        let mut source = ScriptedSource::new([]);
        assert!(matches!(
            source.fetch_latest().await,
            Err(FetchError::NoData(_))
        ));
    }
}
