//! Instrumented output that records every write.

use parking_lot::Mutex;
use tokio::task::Id;
use tokio::time::Instant;

use super::{clamp_duty, OutputError, SignalOutput};

/// One recorded write.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedWrite {
    /// Task that performed the write, `None` outside a tokio task.
    pub task: Option<Id>,
    /// Clamped duty cycle.
    pub duty: f64,
    /// Tokio clock time of the write (follows paused test time).
    pub at: Instant,
}

#[derive(Debug, Default)]
struct Inner {
    writes: Vec<RecordedWrite>,
    released: bool,
    fail_after: Option<usize>,
}

/// A signal output that records the writer identity and value of every
/// write, for tests and diagnostics.
#[derive(Debug, Default)]
pub struct RecordingOutput {
    inner: Mutex<Inner>,
}

impl RecordingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every write once `count` writes have succeeded.
    pub fn failing_after(count: usize) -> Self {
        let output = Self::default();
        output.inner.lock().fail_after = Some(count);
        output
    }

    /// Stop injecting failures.
    pub fn heal(&self) {
        self.inner.lock().fail_after = None;
    }

    /// All writes so far, oldest first.
    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.inner.lock().writes.clone()
    }

    /// Number of writes so far.
    pub fn write_count(&self) -> usize {
        self.inner.lock().writes.len()
    }

    /// The most recently written duty cycle.
    pub fn last_duty(&self) -> Option<f64> {
        self.inner.lock().writes.last().map(|w| w.duty)
    }

    /// Whether [`SignalOutput::release`] has been called.
    pub fn is_released(&self) -> bool {
        self.inner.lock().released
    }

    /// Forget recorded writes.
    pub fn clear(&self) {
        self.inner.lock().writes.clear();
    }
}

impl SignalOutput for RecordingOutput {
    fn set_duty_cycle(&self, percent: f64) -> Result<(), OutputError> {
        let mut inner = self.inner.lock();
        if inner.released {
            return Err(OutputError::Released);
        }
        if inner.fail_after.is_some_and(|limit| inner.writes.len() >= limit) {
            return Err(OutputError::Write("injected failure".to_string()));
        }
        inner.writes.push(RecordedWrite {
            task: tokio::task::try_id(),
            duty: clamp_duty(percent),
            at: Instant::now(),
        });
        Ok(())
    }

    fn release(&self) -> Result<(), OutputError> {
        let mut inner = self.inner.lock();
        if inner.released {
            return Ok(());
        }
        inner.writes.push(RecordedWrite {
            task: tokio::task::try_id(),
            duty: 0.0,
            at: Instant::now(),
        });
        inner.released = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_writer_identity() {
        let output = std::sync::Arc::new(RecordingOutput::new());

        let spawned = {
            let output = output.clone();
            tokio::spawn(async move {
                output.set_duty_cycle(10.0).unwrap();
                tokio::task::id()
            })
        };
        let task_id = spawned.await.unwrap();

        let writes = output.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].task, Some(task_id));
        assert_eq!(writes[0].duty, 10.0);
    }

    #[test]
    fn writes_after_release_fail() {
        let output = RecordingOutput::new();
        output.release().unwrap();
        assert_eq!(output.set_duty_cycle(5.0), Err(OutputError::Released));
        // Releasing twice is harmless.
        assert!(output.release().is_ok());
    }

    #[test]
    fn injected_failures() {
        let output = RecordingOutput::failing_after(2);
        assert!(output.set_duty_cycle(1.0).is_ok());
        assert!(output.set_duty_cycle(2.0).is_ok());
        assert!(matches!(
            output.set_duty_cycle(3.0),
            Err(OutputError::Write(_))
        ));

        output.heal();
        assert!(output.set_duty_cycle(4.0).is_ok());
        assert_eq!(output.write_count(), 3);
    }
}
