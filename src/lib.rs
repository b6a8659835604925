//! # cabin-sense
//!
//! Seat climate and EV battery sensing for a Raspberry Pi cabin rig.
//!
//! ## Architecture
//!
//! Everything that touches a device file lives in [`hal`]; the modules above
//! it are pure logic and run on any host:
//! - [`hal::i2c`] owns `/dev/i2c-N` and the register transaction seam
//! - [`hal::pca9539`] drives the 16-bit port expander behind it
//! - [`hal::mr793200`] talks to the SPI NVM sensor controller
//! - [`sequencer`] is the VDET/RESET power-link state machine
//! - [`seat`] / [`battery`] decode sensor words into frames
//!
//! Single-threaded and blocking throughout: one bus handle per process, each
//! transfer is one bounded transaction, no retries. Whether a failed transfer
//! is worth retrying depends on what the application is doing, so that
//! decision stays with the caller.

pub mod battery;
pub mod config;
pub mod hal;
pub mod seat;
pub mod sequencer;

pub use battery::BatteryFrame;
pub use hal::i2c::{BusError, LinuxI2cBus, RegisterBus};
pub use hal::mr793200::{Mr793200, SensorError, SensorLink};
pub use hal::pca9539::{ExpanderError, Pca9539, PinDirection, Port};
pub use seat::{HoldFilter, SeatFrame, SeatZone};
pub use sequencer::{LinkState, PowerSequencer, SeqAction, SequencerConfig};
