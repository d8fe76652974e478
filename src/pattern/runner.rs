//! Owner of the single active pattern task.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info, warn};

use super::body::{self, StopSignal};
use super::{PatternKind, PatternTiming};
use crate::output::{OutputError, SignalOutput};

/// Result of [`PatternRunner::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new pattern task was spawned.
    Started,
    /// The requested pattern was already running and was left alone.
    AlreadyRunning,
}

/// One pattern generation: its stop signal and its task.
struct ActivePattern {
    kind: PatternKind,
    generation: u64,
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<Result<(), OutputError>>,
}

/// Runs at most one light pattern at a time.
///
/// Replacing a pattern signals the old task to stop and waits for it to
/// exit before the new one is spawned, so two tasks never write to the
/// output concurrently. A task that died on its own is noticed on the next
/// call and the runner treats itself as idle.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use glucoled::{PatternKind, PatternRunner, RecordingOutput};
///
/// # tokio_test::block_on(async {
/// let output = Arc::new(RecordingOutput::new());
/// let mut runner = PatternRunner::new(output.clone());
///
/// runner.start(PatternKind::InRange).await;
/// assert_eq!(runner.active_kind(), Some(PatternKind::InRange));
///
/// runner.stop().await;
/// assert_eq!(runner.active_kind(), None);
/// assert_eq!(output.last_duty(), Some(0.0));
/// # });
/// ```
pub struct PatternRunner {
    output: Arc<dyn SignalOutput>,
    timing: PatternTiming,
    active: Option<ActivePattern>,
    generation: u64,
}

impl PatternRunner {
    /// Create an idle runner with default pattern timing.
    pub fn new(output: Arc<dyn SignalOutput>) -> Self {
        Self::with_timing(output, PatternTiming::default())
    }

    /// Create an idle runner with custom pattern timing.
    pub fn with_timing(output: Arc<dyn SignalOutput>, timing: PatternTiming) -> Self {
        Self {
            output,
            timing,
            active: None,
            generation: 0,
        }
    }

    /// The pattern currently driving the output, if its task is alive.
    pub fn active_kind(&self) -> Option<PatternKind> {
        self.active
            .as_ref()
            .filter(|active| !active.handle.is_finished())
            .map(|active| active.kind)
    }

    /// Number of pattern tasks spawned so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Run `kind`, replacing whatever pattern is active.
    ///
    /// Requesting the pattern that is already running is a no-op, so the
    /// light does not visibly restart.
    pub async fn start(&mut self, kind: PatternKind) -> StartOutcome {
        self.reap().await;

        if self.active_kind() == Some(kind) {
            debug!(pattern = %kind, "pattern already running");
            return StartOutcome::AlreadyRunning;
        }

        self.stop().await;

        let (stop_tx, stop_rx) = watch::channel(false);
        self.generation += 1;
        let handle = tokio::spawn(body::run(
            kind,
            self.timing.clone(),
            self.output.clone(),
            StopSignal::new(stop_rx),
        ));

        info!(pattern = %kind, generation = self.generation, "pattern started");

        self.active = Some(ActivePattern {
            kind,
            generation: self.generation,
            stop_tx,
            handle,
        });
        StartOutcome::Started
    }

    /// Stop the active pattern, wait for its task to exit, then force the
    /// output to zero. Does nothing when idle.
    pub async fn stop(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };

        // The task may already be gone; a failed send is fine.
        let _ = active.stop_tx.send(true);
        let kind = active.kind;
        let generation = active.generation;
        log_exit(kind, generation, active.handle.await);

        if let Err(e) = self.output.off() {
            warn!(error = %e, "failed to turn the light off");
        }
        debug!(pattern = %kind, generation, "pattern stopped");
    }

    /// Forget a task that exited on its own and blank the output it left.
    async fn reap(&mut self) {
        let finished = self
            .active
            .as_ref()
            .is_some_and(|active| active.handle.is_finished());
        if finished {
            self.stop().await;
        }
    }
}

fn log_exit(kind: PatternKind, generation: u64, result: Result<Result<(), OutputError>, JoinError>) {
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            error!(pattern = %kind, generation, error = %e, "pattern task failed");
        }
        Err(e) if e.is_panic() => {
            error!(pattern = %kind, generation, "pattern task panicked");
        }
        Err(e) => {
            warn!(pattern = %kind, generation, error = %e, "pattern task cancelled");
        }
    }
}

impl std::fmt::Debug for PatternRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternRunner")
            .field("active", &self.active_kind())
            .field("generation", &self.generation)
            .finish()
    }
}
