//! Linux I2C bus layer.
//!
//! Owns one `/dev/i2c-N` node and exposes the register transaction seam
//! ([`RegisterBus`]) that device drivers and host tests share. Open-time
//! failures mean the interface is not enabled at the OS level; mid-transfer
//! failures mean the addressed device did not respond.

use rppal::i2c::I2c;
use thiserror::Error;
use tracing::debug;

/// I2C failure taxonomy.
#[derive(Debug, Error)]
pub enum BusError {
    /// The bus device node is missing or inaccessible. The operator has to
    /// enable the interface at the OS level before retrying.
    #[error("i2c bus {bus} unavailable: {detail}")]
    BusUnavailable { bus: u8, detail: String },

    /// NACK or I/O failure mid-transfer. The device is absent, unpowered,
    /// or held in reset.
    #[error("i2c transfer with 0x{address:02X} failed: {detail}")]
    TransferError { address: u8, detail: String },

    /// Operation on a handle that was already closed.
    #[error("i2c bus is closed")]
    Closed,
}

/// Register-level transactions against a 7-bit slave address.
///
/// Each call is a single bounded bus transaction. The Linux bus implements
/// this over `/dev/i2c-N`; host tests implement it over an in-memory
/// register map.
pub trait RegisterBus {
    /// Write one register.
    fn write_reg(&mut self, address: u8, register: u8, value: u8) -> Result<(), BusError>;

    /// Read one register (write the register pointer, then read one byte).
    fn read_reg(&mut self, address: u8, register: u8) -> Result<u8, BusError>;

    /// Release the underlying handle. Idempotent.
    fn close(&mut self);

    /// Whether the handle is still open.
    fn is_open(&self) -> bool;
}

/// Exclusive handle to one `/dev/i2c-N` node.
#[derive(Debug)]
pub struct LinuxI2cBus {
    bus: u8,
    inner: Option<I2c>,
}

impl LinuxI2cBus {
    /// Open `/dev/i2c-N`.
    pub fn open(bus: u8) -> Result<Self, BusError> {
        let i2c = I2c::with_bus(bus).map_err(|e| BusError::BusUnavailable {
            bus,
            detail: e.to_string(),
        })?;
        debug!(bus, "opened i2c bus");
        Ok(Self {
            bus,
            inner: Some(i2c),
        })
    }

    /// Bus index this handle was opened on.
    pub fn bus(&self) -> u8 {
        self.bus
    }
}

impl RegisterBus for LinuxI2cBus {
    fn write_reg(&mut self, address: u8, register: u8, value: u8) -> Result<(), BusError> {
        let i2c = self.inner.as_mut().ok_or(BusError::Closed)?;
        i2c.set_slave_address(u16::from(address))
            .map_err(|e| transfer_error(address, &e))?;
        i2c.write(&[register, value])
            .map_err(|e| transfer_error(address, &e))?;
        Ok(())
    }

    fn read_reg(&mut self, address: u8, register: u8) -> Result<u8, BusError> {
        let i2c = self.inner.as_mut().ok_or(BusError::Closed)?;
        i2c.set_slave_address(u16::from(address))
            .map_err(|e| transfer_error(address, &e))?;
        let mut buf = [0u8; 1];
        i2c.write_read(&[register], &mut buf)
            .map_err(|e| transfer_error(address, &e))?;
        Ok(buf[0])
    }

    fn close(&mut self) {
        if self.inner.take().is_some() {
            debug!(bus = self.bus, "closed i2c bus");
        }
    }

    fn is_open(&self) -> bool {
        self.inner.is_some()
    }
}

fn transfer_error(address: u8, e: &rppal::i2c::Error) -> BusError {
    BusError::TransferError {
        address,
        detail: e.to_string(),
    }
}
