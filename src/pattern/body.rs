//! Loop bodies of the light patterns.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use glucoled_types::brightness;
use tokio::sync::watch;

use super::{PatternKind, PatternTiming};
use crate::output::{OutputError, SignalOutput};

/// Receiving side of a pattern generation's stop signal.
pub(crate) struct StopSignal(watch::Receiver<bool>);

impl StopSignal {
    pub(crate) fn new(rx: watch::Receiver<bool>) -> Self {
        Self(rx)
    }

    fn is_set(&self) -> bool {
        *self.0.borrow()
    }

    /// Wait for `period` unless stopped first. Returns `false` once the
    /// pattern must exit. A dropped sender counts as a stop.
    async fn dwell(&mut self, period: Duration) -> bool {
        if self.is_set() {
            return false;
        }
        tokio::select! {
            _ = tokio::time::sleep(period) => !self.is_set(),
            changed = self.0.changed() => changed.is_ok() && !self.is_set(),
        }
    }
}

fn wall_clock_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Run `kind` against `output` until `stop` fires.
///
/// A failed write ends the pattern with the error.
pub(crate) async fn run(
    kind: PatternKind,
    timing: PatternTiming,
    output: Arc<dyn SignalOutput>,
    mut stop: StopSignal,
) -> Result<(), OutputError> {
    match kind {
        PatternKind::CriticalLow => blink(&timing, output.as_ref(), &mut stop).await,
        PatternKind::InRange => {
            breathe(
                timing.slow_breath_speed,
                timing.slow_breath_step,
                output.as_ref(),
                &mut stop,
            )
            .await
        }
        PatternKind::CriticalHigh => {
            breathe(
                timing.fast_breath_speed,
                timing.fast_breath_step,
                output.as_ref(),
                &mut stop,
            )
            .await
        }
        PatternKind::Unavailable => error_bursts(&timing, output.as_ref(), &mut stop).await,
    }
}

async fn blink(
    timing: &PatternTiming,
    output: &dyn SignalOutput,
    stop: &mut StopSignal,
) -> Result<(), OutputError> {
    while !stop.is_set() {
        output.set_duty_cycle(100.0)?;
        if !stop.dwell(timing.blink_dwell).await {
            break;
        }
        output.set_duty_cycle(0.0)?;
        if !stop.dwell(timing.blink_dwell).await {
            break;
        }
    }
    Ok(())
}

async fn breathe(
    speed: f64,
    step: Duration,
    output: &dyn SignalOutput,
    stop: &mut StopSignal,
) -> Result<(), OutputError> {
    while !stop.is_set() {
        output.set_duty_cycle(brightness(wall_clock_secs(), speed))?;
        if !stop.dwell(step).await {
            break;
        }
    }
    Ok(())
}

async fn error_bursts(
    timing: &PatternTiming,
    output: &dyn SignalOutput,
    stop: &mut StopSignal,
) -> Result<(), OutputError> {
    'bursts: while !stop.is_set() {
        for _ in 0..timing.error_blinks {
            output.set_duty_cycle(100.0)?;
            if !stop.dwell(timing.error_blink).await {
                break 'bursts;
            }
            output.set_duty_cycle(0.0)?;
            if !stop.dwell(timing.error_blink).await {
                break 'bursts;
            }
        }
        if !stop.dwell(timing.error_pause).await {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::RecordingOutput;

    fn assert_gap(earlier: tokio::time::Instant, later: tokio::time::Instant, expected: Duration) {
        let gap = later - earlier;
        let slack = Duration::from_millis(1);
        assert!(
            gap + slack >= expected && gap <= expected + slack,
            "gap {gap:?}, expected {expected:?}"
        );
    }

    async fn run_for(kind: PatternKind, span: Duration) -> Arc<RecordingOutput> {
        let output = Arc::new(RecordingOutput::new());
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(run(
            kind,
            PatternTiming::default(),
            output.clone(),
            StopSignal::new(rx),
        ));

        tokio::time::sleep(span).await;
        tx.send(true).unwrap();
        task.await.unwrap().unwrap();
        output
    }

    #[tokio::test(start_paused = true)]
    async fn critical_low_blinks_symmetrically() {
        let output = run_for(PatternKind::CriticalLow, Duration::from_millis(500)).await;
        let writes = output.writes();

        // ~500ms / 51ms per write
        assert!(writes.len() >= 9, "only {} writes", writes.len());
        for (i, write) in writes.iter().enumerate() {
            let expected = if i % 2 == 0 { 100.0 } else { 0.0 };
            assert_eq!(write.duty, expected);
        }
        for pair in writes.windows(2) {
            assert_gap(pair[0].at, pair[1].at, Duration::from_millis(51));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn in_range_resamples_every_ten_millis() {
        let output = run_for(PatternKind::InRange, Duration::from_millis(205)).await;
        let writes = output.writes();

        assert!(writes.len() >= 20, "only {} writes", writes.len());
        for pair in writes.windows(2) {
            assert_gap(pair[0].at, pair[1].at, Duration::from_millis(10));
        }
        assert!(writes.iter().all(|w| (0.0..=100.0).contains(&w.duty)));
    }

    #[tokio::test(start_paused = true)]
    async fn critical_high_resamples_every_fifty_millis() {
        let output = run_for(PatternKind::CriticalHigh, Duration::from_millis(230)).await;
        let writes = output.writes();

        assert_eq!(writes.len(), 5);
        for pair in writes.windows(2) {
            assert_gap(pair[0].at, pair[1].at, Duration::from_millis(50));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn error_pattern_bursts_then_pauses() {
        // One full cycle is 6 x 100ms + 2s.
        let output = run_for(PatternKind::Unavailable, Duration::from_millis(2_650)).await;
        let writes = output.writes();

        let duties: Vec<f64> = writes.iter().map(|w| w.duty).collect();
        assert_eq!(
            duties,
            vec![100.0, 0.0, 100.0, 0.0, 100.0, 0.0, 100.0]
        );

        let start = writes[0].at;
        assert_gap(start, writes[5].at, Duration::from_millis(500));
        assert_gap(start, writes[6].at, Duration::from_millis(2_600));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_interrupts_long_pause_promptly() {
        let output = Arc::new(RecordingOutput::new());
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(run(
            PatternKind::Unavailable,
            PatternTiming::default(),
            output.clone(),
            StopSignal::new(rx),
        ));

        // Land inside the 2s pause.
        tokio::time::sleep(Duration::from_millis(1_000)).await;
        let stopped_at = tokio::time::Instant::now();
        tx.send(true).unwrap();
        task.await.unwrap().unwrap();

        assert!(tokio::time::Instant::now() - stopped_at < Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_sender_stops_the_pattern() {
        let output = Arc::new(RecordingOutput::new());
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(run(
            PatternKind::InRange,
            PatternTiming::default(),
            output.clone(),
            StopSignal::new(rx),
        ));

        tokio::time::sleep(Duration::from_millis(30)).await;
        drop(tx);
        assert!(task.await.unwrap().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn write_failure_ends_the_pattern() {
        let output = Arc::new(RecordingOutput::failing_after(3));
        let (_tx, rx) = watch::channel(false);
        let result = run(
            PatternKind::CriticalLow,
            PatternTiming::default(),
            output.clone(),
            StopSignal::new(rx),
        )
        .await;

        assert!(matches!(result, Err(OutputError::Write(_))));
        assert_eq!(output.write_count(), 3);
    }
}
