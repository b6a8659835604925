//! PCA9539 16-bit I/O expander driver.
//!
//! Two 8-bit ports behind four register pairs (input, output, polarity,
//! configuration). The driver owns its bus handle and targets a single
//! slave address for its whole lifetime.
//! Reference: PCA9539 datasheet register map.

use thiserror::Error;
use tracing::{debug, info};

use crate::hal::i2c::{BusError, RegisterBus};

/// Expander 7-bit address on the bench rig (A0 low, A1 high).
pub const PCA9539_ADDR: u8 = 0x74;

/// Register addresses.
#[allow(dead_code)]
mod regs {
    pub const INPUT0: u8 = 0x00;
    pub const INPUT1: u8 = 0x01;
    pub const OUTPUT0: u8 = 0x02;
    pub const OUTPUT1: u8 = 0x03;
    pub const POLARITY0: u8 = 0x04;
    pub const POLARITY1: u8 = 0x05;
    pub const CONFIG0: u8 = 0x06;
    pub const CONFIG1: u8 = 0x07;
}

/// Port bank selector (P00..P07, P10..P17).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Port {
    P0,
    P1,
}

impl Port {
    fn index(self) -> usize {
        match self {
            Port::P0 => 0,
            Port::P1 => 1,
        }
    }

    fn input_reg(self) -> u8 {
        regs::INPUT0 + self.index() as u8
    }

    fn output_reg(self) -> u8 {
        regs::OUTPUT0 + self.index() as u8
    }

    fn config_reg(self) -> u8 {
        regs::CONFIG0 + self.index() as u8
    }
}

/// Pin direction. Configuration bit 1 = input (power-on default), 0 = output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinDirection {
    Output,
    Input,
}

/// Expander driver error.
#[derive(Debug, Error)]
pub enum ExpanderError {
    /// Underlying bus failure.
    #[error(transparent)]
    Bus(#[from] BusError),

    /// Read-back after a write did not match.
    #[error("register 0x{register:02X} readback mismatch: wrote 0x{wrote:02X}, read 0x{read:02X}")]
    Verify { register: u8, wrote: u8, read: u8 },

    /// Pin index outside 0..16.
    #[error("pin {0} out of range (0..16)")]
    InvalidPin(u8),
}

/// Local copy of the writable register banks, refreshed by reads.
#[derive(Clone, Copy, Debug, Default)]
pub struct PortState {
    /// Output level per port.
    pub output: [u8; 2],
    /// Direction per port (1 = input).
    pub config: [u8; 2],
}

/// PCA9539 driver.
///
/// Owns the bus handle exclusively; every transaction targets the address
/// given at construction. No retries: a NACK or I/O failure surfaces as
/// [`BusError::TransferError`] and the caller decides what to do with it.
pub struct Pca9539<B: RegisterBus> {
    bus: B,
    address: u8,
    state: PortState,
    ready: bool,
}

impl<B: RegisterBus> Pca9539<B> {
    /// Wrap an open bus handle. No bus traffic happens here.
    pub fn new(bus: B, address: u8) -> Self {
        Self {
            bus,
            address,
            // Power-on defaults: all pins input, outputs high.
            state: PortState {
                output: [0xFF; 2],
                config: [0xFF; 2],
            },
            ready: false,
        }
    }

    /// Slave address this driver targets.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Last-seen register banks.
    pub fn state(&self) -> PortState {
        self.state
    }

    /// Whether [`init_all_outputs`](Self::init_all_outputs) has completed.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Whether the underlying bus handle is still open.
    pub fn is_open(&self) -> bool {
        self.bus.is_open()
    }

    /// Bring the device to a known state: polarity normal, every pin an
    /// output, every output low. Each write is read back; a mismatch means
    /// the device is not the one we think it is (or is held in reset).
    pub fn init_all_outputs(&mut self) -> Result<(), ExpanderError> {
        self.write_verified(regs::POLARITY0, 0x00)?;
        self.write_verified(regs::POLARITY1, 0x00)?;
        self.write_verified(regs::CONFIG0, 0x00)?;
        self.write_verified(regs::CONFIG1, 0x00)?;
        self.write_verified(regs::OUTPUT0, 0x00)?;
        self.write_verified(regs::OUTPUT1, 0x00)?;
        self.state.config = [0x00; 2];
        self.state.output = [0x00; 2];
        self.ready = true;
        info!(address = self.address, "expander initialized, all pins output low");
        Ok(())
    }

    /// Read the output register bank for a port, refreshing the local copy.
    pub fn read_port(&mut self, port: Port) -> Result<u8, ExpanderError> {
        let value = self.bus.read_reg(self.address, port.output_reg())?;
        self.state.output[port.index()] = value;
        Ok(value)
    }

    /// Write the output register bank for a port.
    pub fn write_port(&mut self, port: Port, value: u8) -> Result<(), ExpanderError> {
        self.bus.write_reg(self.address, port.output_reg(), value)?;
        self.state.output[port.index()] = value;
        Ok(())
    }

    /// Read the input register bank for a port (actual pin levels).
    pub fn read_inputs(&mut self, port: Port) -> Result<u8, ExpanderError> {
        Ok(self.bus.read_reg(self.address, port.input_reg())?)
    }

    /// Set the direction mask for a whole port (1 = input).
    pub fn set_directions(&mut self, port: Port, mask: u8) -> Result<(), ExpanderError> {
        self.bus.write_reg(self.address, port.config_reg(), mask)?;
        self.state.config[port.index()] = mask;
        Ok(())
    }

    /// Set one pin's direction. Pins 0..8 map to P00..P07, 8..16 to P10..P17.
    pub fn set_pin_direction(&mut self, pin: u8, dir: PinDirection) -> Result<(), ExpanderError> {
        let (port, bit) = split_pin(pin)?;
        let current = self.bus.read_reg(self.address, port.config_reg())?;
        let mask = match dir {
            PinDirection::Input => current | (1 << bit),
            PinDirection::Output => current & !(1 << bit),
        };
        self.set_directions(port, mask)
    }

    /// Drive one output pin high or low.
    pub fn set_pin(&mut self, pin: u8, high: bool) -> Result<(), ExpanderError> {
        let (port, bit) = split_pin(pin)?;
        let current = self.bus.read_reg(self.address, port.output_reg())?;
        let value = if high {
            current | (1 << bit)
        } else {
            current & !(1 << bit)
        };
        self.write_port(port, value)
    }

    /// Read one pin's level from the input register.
    pub fn read_pin(&mut self, pin: u8) -> Result<bool, ExpanderError> {
        let (port, bit) = split_pin(pin)?;
        let inputs = self.read_inputs(port)?;
        Ok(inputs & (1 << bit) != 0)
    }

    /// Drive all 16 outputs from one mask: bit 0 -> P00 .. bit 7 -> P07,
    /// bit 8 -> P10 .. bit 15 -> P17. Both writes are read back and verified.
    pub fn set_outputs(&mut self, mask: u16) -> Result<(), ExpanderError> {
        let low = (mask & 0xFF) as u8;
        let high = (mask >> 8) as u8;
        self.write_port(Port::P0, low)?;
        self.write_port(Port::P1, high)?;
        let read_low = self.read_port(Port::P0)?;
        let read_high = self.read_port(Port::P1)?;
        if read_low != low {
            return Err(ExpanderError::Verify {
                register: regs::OUTPUT0,
                wrote: low,
                read: read_low,
            });
        }
        if read_high != high {
            return Err(ExpanderError::Verify {
                register: regs::OUTPUT1,
                wrote: high,
                read: read_high,
            });
        }
        debug!(mask, "expander outputs updated");
        Ok(())
    }

    /// Best-effort teardown: force every output low, then release the bus.
    /// Safe to call more than once; write failures are swallowed.
    pub fn shutdown(&mut self) {
        if self.bus.is_open() {
            let _ = self.bus.write_reg(self.address, regs::OUTPUT0, 0x00);
            let _ = self.bus.write_reg(self.address, regs::OUTPUT1, 0x00);
            info!("expander outputs forced low on shutdown");
        }
        self.close();
        self.ready = false;
    }

    /// Release the bus handle. Idempotent.
    pub fn close(&mut self) {
        self.bus.close();
    }

    /// Consume the driver and hand the bus handle back.
    pub fn release(self) -> B {
        self.bus
    }

    fn write_verified(&mut self, register: u8, value: u8) -> Result<(), ExpanderError> {
        self.bus.write_reg(self.address, register, value)?;
        let read = self.bus.read_reg(self.address, register)?;
        if read != value {
            return Err(ExpanderError::Verify {
                register,
                wrote: value,
                read,
            });
        }
        Ok(())
    }
}

fn split_pin(pin: u8) -> Result<(Port, u8), ExpanderError> {
    match pin {
        0..=7 => Ok((Port::P0, pin)),
        8..=15 => Ok((Port::P1, pin - 8)),
        _ => Err(ExpanderError::InvalidPin(pin)),
    }
}
