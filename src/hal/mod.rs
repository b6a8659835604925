//! Hardware access layer.
//!
//! Thin wrappers around the Pi's userspace device interfaces.
//! Decode and sequencing logic stays in the core modules, the HAL is just I/O.

pub mod i2c;
pub mod mr793200;
pub mod pca9539;
pub mod power;

pub use i2c::{BusError, LinuxI2cBus, RegisterBus};
pub use pca9539::{ExpanderError, Pca9539, PCA9539_ADDR};
