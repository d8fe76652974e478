//! Software PWM on a Raspberry Pi GPIO pin.

use parking_lot::Mutex;
use rppal::gpio::{Gpio, OutputPin};
use tracing::{debug, info};

use super::{clamp_duty, OutputError, SignalOutput};

/// Drives the light through `rppal` software PWM on a BCM pin.
///
/// After [`SignalOutput::release`] the pin is reset and every further write
/// fails with [`OutputError::Released`].
#[derive(Debug)]
pub struct GpioOutput {
    pin: Mutex<Option<OutputPin>>,
    bcm_pin: u8,
    frequency_hz: f64,
}

impl GpioOutput {
    /// Claim `bcm_pin` as an output, initially low.
    pub fn new(bcm_pin: u8, frequency_hz: f64) -> Result<Self, OutputError> {
        let pin = Gpio::new()
            .and_then(|gpio| gpio.get(bcm_pin))
            .map_err(|e| OutputError::Gpio(e.to_string()))?
            .into_output_low();

        info!(pin = bcm_pin, frequency_hz, "GPIO output ready");

        Ok(Self {
            pin: Mutex::new(Some(pin)),
            bcm_pin,
            frequency_hz,
        })
    }

    pub fn bcm_pin(&self) -> u8 {
        self.bcm_pin
    }
}

impl SignalOutput for GpioOutput {
    fn set_duty_cycle(&self, percent: f64) -> Result<(), OutputError> {
        let mut guard = self.pin.lock();
        let pin = guard.as_mut().ok_or(OutputError::Released)?;
        pin.set_pwm_frequency(self.frequency_hz, clamp_duty(percent) / 100.0)
            .map_err(|e| OutputError::Gpio(e.to_string()))
    }

    fn release(&self) -> Result<(), OutputError> {
        let Some(mut pin) = self.pin.lock().take() else {
            return Ok(());
        };
        let cleared = pin
            .clear_pwm()
            .map_err(|e| OutputError::Gpio(e.to_string()));
        pin.set_low();
        debug!(pin = self.bcm_pin, "GPIO output released");
        // Dropping the pin restores its original mode.
        cleared
    }
}
