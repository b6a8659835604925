//! Rig configuration.
//!
//! Typed config structs whose defaults match the documented bench setup:
//! I2C bus 1, expander at 0x74, SPI at 1 MHz, BCM pins 4/15/27.

use std::time::Duration;

use crate::hal::pca9539::PCA9539_ADDR;

/// Bus parameters.
#[derive(Clone, Copy, Debug)]
pub struct BusConfig {
    /// I2C bus index (bus 1 = `/dev/i2c-1`).
    pub i2c_bus: u8,
    /// Expander 7-bit slave address.
    pub expander_addr: u8,
    /// SPI clock for the sensor controller, Hz. The device accepts
    /// 0.39 - 5.0 MHz.
    pub spi_clock_hz: u32,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            i2c_bus: 1,
            expander_addr: PCA9539_ADDR,
            spi_clock_hz: 1_000_000,
        }
    }
}

/// BCM pin assignments.
#[derive(Clone, Copy, Debug)]
pub struct PinConfig {
    /// Supply-detect input (pull-down).
    pub vdet: u8,
    /// Active-low reset output for the downstream board.
    pub reset: u8,
    /// Sensor-select line, high while the SPI controller is in use.
    pub sensor_select: u8,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            vdet: 4,
            reset: 15,
            sensor_select: 27,
        }
    }
}

/// Application poll periods.
#[derive(Clone, Copy, Debug)]
pub struct PollConfig {
    /// Seat climate read period.
    pub seat_period: Duration,
    /// Battery read / VDET poll period.
    pub battery_period: Duration,
    /// Loop period while the power link is still settling.
    pub settle_period: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            seat_period: Duration::from_secs(1),
            battery_period: Duration::from_millis(500),
            settle_period: Duration::from_millis(100),
        }
    }
}
