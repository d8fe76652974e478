//! Light patterns and the runner that owns the active pattern task.
//!
//! Each [`PatternKind`] is a loop that emits duty-cycle values to a
//! [`SignalOutput`](crate::SignalOutput) until its stop signal fires.
//! [`PatternRunner`] guarantees at most one such loop is alive at a time.

mod body;
mod runner;

pub use runner::{PatternRunner, StartOutcome};

use std::fmt;
use std::time::Duration;

use glucoled_types::{Classification, FAST_BREATH, SLOW_BREATH};

/// The four light patterns, one per classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternKind {
    /// Fast symmetric on/off blink.
    CriticalLow,
    /// Slow sine breathing.
    InRange,
    /// Fast sine breathing.
    CriticalHigh,
    /// Bursts of quick blinks separated by a pause.
    Unavailable,
}

impl PatternKind {
    pub fn label(&self) -> &'static str {
        match self {
            PatternKind::CriticalLow => "critical-low blink",
            PatternKind::InRange => "in-range breathing",
            PatternKind::CriticalHigh => "critical-high breathing",
            PatternKind::Unavailable => "error blink",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<Classification> for PatternKind {
    fn from(classification: Classification) -> Self {
        match classification {
            Classification::CriticalLow => PatternKind::CriticalLow,
            Classification::InRange => PatternKind::InRange,
            Classification::CriticalHigh => PatternKind::CriticalHigh,
            Classification::Unavailable => PatternKind::Unavailable,
        }
    }
}

/// Dwell times and breathing speeds of the patterns.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternTiming {
    /// On and off time of the critical-low blink.
    pub blink_dwell: Duration,
    /// Breathing speed while in range.
    pub slow_breath_speed: f64,
    /// Resample period of the in-range curve.
    pub slow_breath_step: Duration,
    /// Breathing speed while critically high.
    pub fast_breath_speed: f64,
    /// Resample period of the critical-high curve.
    pub fast_breath_step: Duration,
    /// On and off time of each error blink.
    pub error_blink: Duration,
    /// Blinks per error burst.
    pub error_blinks: u32,
    /// Dark pause after each error burst.
    pub error_pause: Duration,
}

impl Default for PatternTiming {
    fn default() -> Self {
        Self {
            blink_dwell: Duration::from_millis(51),
            slow_breath_speed: SLOW_BREATH,
            slow_breath_step: Duration::from_millis(10),
            fast_breath_speed: FAST_BREATH,
            fast_breath_step: Duration::from_millis(50),
            error_blink: Duration::from_millis(100),
            error_blinks: 3,
            error_pause: Duration::from_secs(2),
        }
    }
}
