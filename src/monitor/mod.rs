//! The monitor loop: fetch, classify, drive the light, sleep.
//!
//! Each cycle pulls one reading, classifies it against the configured
//! [`Thresholds`] and asks the [`PatternRunner`] for the matching pattern.
//! How long to wait before the next cycle depends on what happened:
//!
//! | Cycle result                      | Next fetch after             |
//! |-----------------------------------|------------------------------|
//! | valid reading                     | `poll_interval` (300 s)      |
//! | stale reading, or no data         | `unavailable_retry` (5 s)    |
//! | any other fetch failure           | `backoff` (60 s)             |
//!
//! Shutdown is requested through a `watch::Receiver<bool>`. The loop checks
//! it while fetching and while sleeping, then stops the active pattern and
//! releases the output.

mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use glucoled_librelink::{FetchError, RetryClass};
use glucoled_types::{classify, Classification, Reading, Thresholds};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::output::SignalOutput;
use crate::pattern::{PatternKind, PatternRunner, PatternTiming};
use crate::source::ReadingSource;

/// Delays between monitor cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorTiming {
    /// Wait after a valid reading.
    pub poll_interval: Duration,
    /// Wait after a stale reading or an empty response. Zero re-fetches
    /// immediately.
    pub unavailable_retry: Duration,
    /// Wait after an unexpected fetch failure.
    pub backoff: Duration,
}

impl Default for MonitorTiming {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(300),
            unavailable_retry: Duration::from_secs(5),
            backoff: Duration::from_secs(60),
        }
    }
}

/// Lifecycle state of a [`MonitorLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Running,
    ShuttingDown,
}

/// What one monitor cycle observed and decided.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutcome {
    pub classification: Classification,
    pub pattern: PatternKind,
    /// How long to wait before the next cycle.
    pub delay: Duration,
    pub reading: Option<Reading>,
    pub error: Option<FetchError>,
}

/// Drives the indicator light from a [`ReadingSource`].
#[derive(Debug)]
pub struct MonitorLoop<S> {
    source: S,
    runner: PatternRunner,
    output: Arc<dyn SignalOutput>,
    thresholds: Thresholds,
    timing: MonitorTiming,
    clock: Arc<dyn Clock>,
    state: MonitorState,
}

impl<S: ReadingSource> MonitorLoop<S> {
    /// Create a monitor with default thresholds, timings and the system clock.
    pub fn new(source: S, output: Arc<dyn SignalOutput>) -> Self {
        Self {
            source,
            runner: PatternRunner::new(output.clone()),
            output,
            thresholds: Thresholds::default(),
            timing: MonitorTiming::default(),
            clock: Arc::new(SystemClock),
            state: MonitorState::Running,
        }
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_timing(mut self, timing: MonitorTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Override the light pattern timings. Must be called before the first
    /// cycle.
    pub fn with_pattern_timing(mut self, timing: PatternTiming) -> Self {
        self.runner = PatternRunner::with_timing(self.output.clone(), timing);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// The pattern currently driving the light.
    pub fn active_pattern(&self) -> Option<PatternKind> {
        self.runner.active_kind()
    }

    /// Run one fetch, classify and start cycle.
    pub async fn step(&mut self) -> CycleOutcome {
        let fetched = self.source.fetch_latest().await;
        self.apply(fetched).await
    }

    /// Classify a fetch result and switch the light accordingly.
    pub async fn apply(&mut self, fetched: Result<Reading, FetchError>) -> CycleOutcome {
        let now_ms = self.clock.now_ms();

        let (reading, error) = match fetched {
            Ok(reading) => {
                info!(
                    value = reading.value_mg_dl,
                    trend = %reading.trend,
                    age_secs = reading.age_ms(now_ms) / 1000,
                    "glucose reading"
                );
                (Some(reading), None)
            }
            Err(e) => {
                warn!(source = %self.source.description(), error = %e, "fetch failed");
                (None, Some(e))
            }
        };

        let classification = classify(reading.as_ref(), now_ms, &self.thresholds);
        let pattern = PatternKind::from(classification);
        self.runner.start(pattern).await;

        let delay = match &error {
            Some(e) => match e.retry_class() {
                RetryClass::Soon => self.timing.unavailable_retry,
                RetryClass::Backoff => self.timing.backoff,
            },
            None if classification.is_available() => self.timing.poll_interval,
            None => {
                debug!("reading unusable, retrying soon");
                self.timing.unavailable_retry
            }
        };

        debug!(%classification, pattern = %pattern, delay_secs = delay.as_secs_f64(), "cycle complete");

        CycleOutcome {
            classification,
            pattern,
            delay,
            reading,
            error,
        }
    }

    /// Run cycles until `shutdown` becomes `true`, then shut down.
    ///
    /// A dropped shutdown sender never triggers shutdown.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(source = %self.source.description(), "monitor started");

        loop {
            let fetched = tokio::select! {
                _ = shutdown_requested(&mut shutdown) => break,
                fetched = self.source.fetch_latest() => fetched,
            };

            // Pattern switches are not interrupted; they join the old task.
            let outcome = self.apply(fetched).await;

            tokio::select! {
                _ = shutdown_requested(&mut shutdown) => break,
                _ = tokio::time::sleep(outcome.delay) => {}
            }
        }

        self.shutdown().await;
    }

    /// Stop the active pattern and release the output.
    ///
    /// Failures are logged, never returned.
    pub async fn shutdown(&mut self) {
        if self.state == MonitorState::ShuttingDown {
            return;
        }
        self.state = MonitorState::ShuttingDown;
        info!("monitor shutting down");

        self.runner.stop().await;
        if let Err(e) = self.output.release() {
            warn!(error = %e, "failed to release output");
        }
        info!("monitor stopped");
    }
}

/// Request shutdown once `signal` resolves.
///
/// If listening for the signal fails, the error is logged and shutdown is
/// never requested; the sender is held so the monitor keeps running.
pub async fn shutdown_on<F>(signal: F, shutdown: watch::Sender<bool>)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        error!(error = %e, "failed to listen for interrupt");
        std::future::pending::<()>().await;
    }
    info!("interrupt received");
    let _ = shutdown.send(true);
}

async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}
