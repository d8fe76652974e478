//! Output that only logs, for running without GPIO hardware.

use parking_lot::Mutex;
use tracing::{debug, trace};

use super::{clamp_duty, OutputError, SignalOutput};

/// A signal output that logs duty changes instead of driving a pin.
#[derive(Debug, Default)]
pub struct LogOutput {
    last: Mutex<Option<f64>>,
}

impl LogOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently written duty cycle.
    pub fn last_duty(&self) -> Option<f64> {
        *self.last.lock()
    }
}

impl SignalOutput for LogOutput {
    fn set_duty_cycle(&self, percent: f64) -> Result<(), OutputError> {
        let duty = clamp_duty(percent);
        trace!(duty, "light duty cycle");
        *self.last.lock() = Some(duty);
        Ok(())
    }

    fn release(&self) -> Result<(), OutputError> {
        self.off()?;
        debug!("log output released");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remembers_clamped_duty() {
        let output = LogOutput::new();
        assert_eq!(output.last_duty(), None);

        output.set_duty_cycle(150.0).unwrap();
        assert_eq!(output.last_duty(), Some(100.0));

        output.release().unwrap();
        assert_eq!(output.last_duty(), Some(0.0));
    }
}
