//! Signal output abstraction for the single indicator light.
//!
//! The light is driven by a duty-cycle percentage on one binary output
//! channel. Only the active pattern task, or the stop path forcing the
//! output to zero, writes to it; [`crate::PatternRunner`] enforces that.

#[cfg(feature = "gpio")]
mod gpio;
mod log;
mod recording;

#[cfg(feature = "gpio")]
pub use gpio::GpioOutput;
pub use log::LogOutput;
pub use recording::{RecordedWrite, RecordingOutput};

use std::fmt::Debug;

use thiserror::Error;

/// Errors raised by a signal output.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OutputError {
    /// The underlying hardware rejected the write.
    #[error("GPIO error: {0}")]
    Gpio(String),

    /// The output has already been released.
    #[error("Output released")]
    Released,

    /// A write failed for another reason.
    #[error("Output write failed: {0}")]
    Write(String),
}

/// A single duty-cycle driven output channel.
///
/// Writes are synchronous and non-blocking. Implementations use interior
/// mutability so one output can be shared between the runner and its
/// pattern task.
pub trait SignalOutput: Send + Sync + Debug {
    /// Set the duty cycle, in percent. Values are clamped to `0..=100`.
    fn set_duty_cycle(&self, percent: f64) -> Result<(), OutputError>;

    /// Turn the light off.
    fn off(&self) -> Result<(), OutputError> {
        self.set_duty_cycle(0.0)
    }

    /// Turn the light off and give the channel back to the system.
    fn release(&self) -> Result<(), OutputError> {
        self.off()
    }
}

/// Clamp a requested duty cycle into `0..=100`. NaN maps to 0.
pub fn clamp_duty(percent: f64) -> f64 {
    if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_duty() {
        assert_eq!(clamp_duty(-5.0), 0.0);
        assert_eq!(clamp_duty(42.5), 42.5);
        assert_eq!(clamp_duty(140.0), 100.0);
        assert_eq!(clamp_duty(f64::NAN), 0.0);
        assert_eq!(clamp_duty(f64::INFINITY), 100.0);
    }

    #[test]
    fn default_off_and_release_write_zero() {
        let output = RecordingOutput::new();
        output.set_duty_cycle(80.0).unwrap();
        output.off().unwrap();
        assert_eq!(output.last_duty(), Some(0.0));

        output.set_duty_cycle(80.0).unwrap();
        output.release().unwrap();
        assert_eq!(output.last_duty(), Some(0.0));
        assert!(output.is_released());
    }
}
