//! Power-rail pins: VDET detect input, RESET output, sensor-select output.
//!
//! Just pin ownership and level changes; the timing contract lives in
//! [`crate::sequencer`] so it can run on any host.

use rppal::gpio::{Gpio, InputPin, OutputPin};
use thiserror::Error;
use tracing::debug;

use crate::config::PinConfig;

/// GPIO access failure.
#[derive(Debug, Error)]
#[error("gpio unavailable: {detail}")]
pub struct PowerError {
    detail: String,
}

impl From<rppal::gpio::Error> for PowerError {
    fn from(e: rppal::gpio::Error) -> Self {
        Self {
            detail: e.to_string(),
        }
    }
}

/// VDET / RESET pin pair for the battery link.
///
/// RESET is active low: driving the line high releases the downstream
/// hardware from reset.
pub struct PowerPins {
    vdet: InputPin,
    reset: OutputPin,
}

impl PowerPins {
    /// Claim VDET (input, pull-down) and RESET (output, initially asserted).
    pub fn claim(pins: &PinConfig) -> Result<Self, PowerError> {
        let gpio = Gpio::new()?;
        let vdet = gpio.get(pins.vdet)?.into_input_pulldown();
        let reset = gpio.get(pins.reset)?.into_output_low();
        debug!(vdet = pins.vdet, reset = pins.reset, "claimed power pins");
        Ok(Self { vdet, reset })
    }

    /// Current VDET level.
    pub fn vdet_high(&self) -> bool {
        self.vdet.is_high()
    }

    /// Release the RESET line (drive high).
    pub fn release_reset(&mut self) {
        self.reset.set_high();
    }

    /// Assert the RESET line (drive low).
    pub fn assert_reset(&mut self) {
        self.reset.set_low();
    }
}

/// Sensor-select line, held high while the SPI controller is in use.
/// The pin reverts to its previous state when this is dropped.
pub struct SensorSelect {
    _pin: OutputPin,
}

impl SensorSelect {
    /// Claim the line and drive it high.
    pub fn claim(bcm: u8) -> Result<Self, PowerError> {
        let gpio = Gpio::new()?;
        let pin = gpio.get(bcm)?.into_output_high();
        debug!(pin = bcm, "sensor select high");
        Ok(Self { _pin: pin })
    }
}
