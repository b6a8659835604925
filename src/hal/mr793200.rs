//! MR793200 NVM sensor controller driver (SPI).
//!
//! The device speaks a command-byte protocol: upper nibble is the opcode,
//! lower nibble the NVM page. Reads clock the command, the word offset and
//! two turnaround bytes before data appears; multi-word reads return each
//! data word followed by two status bytes. SPI mode 0, 0.39 - 5.0 MHz.
//! Reference: MR793200 datasheet.

use std::thread;
use std::time::Duration;

use rppal::spi::{Bus, Mode, SlaveSelect, Spi};
use thiserror::Error;
use tracing::debug;

/// Command opcodes, pre-shifted into the upper nibble.
pub mod cmd {
    pub const READ: u8 = 0x09 << 4;
    pub const WRITE: u8 = 0x0D << 4;
    pub const READ_NVM0: u8 = 0x00 << 4;
    pub const READ_NVM1: u8 = 0x01 << 4;
    pub const READ_NVM2: u8 = 0x02 << 4;
    pub const READ_NVM3: u8 = 0x03 << 4;
    pub const READ_NVM4: u8 = 0x04 << 4;
    pub const WRITE_NVM: u8 = 0x0E << 4;
    pub const READ_SPIST: u8 = 0x08 << 4;
    pub const WRITE_SPIST: u8 = 0x0C << 4;
}

/// NVM locations the rig uses.
pub mod map {
    /// Page holding identity words and user memory.
    pub const PAGE: u8 = 0x04;
    /// Factory tracer ID, 6 words.
    pub const TRACER_ID: u8 = 0x16;
    /// Model number, 1 word.
    pub const MODEL_NUMBER: u8 = 0x18;
    /// Start of user memory.
    pub const USER_BASE: u8 = 0x22;
}

/// Programming time the device needs per written word.
const WRITE_WORD_DELAY: Duration = Duration::from_millis(8);

/// Sensor controller error.
#[derive(Debug, Error)]
pub enum SensorError {
    /// SPI transfer failed at the OS/bus level.
    #[error("spi transfer failed: {detail}")]
    Spi { detail: String },

    /// The exchange clocked fewer bytes than the frame requires.
    #[error("short spi response: expected {expected} bytes, got {actual}")]
    ShortResponse { expected: usize, actual: usize },

    /// Operation on a link that was already closed.
    #[error("spi link is closed")]
    Closed,
}

/// Full-duplex exchange seam.
///
/// The Linux link implements it over spidev; host tests script the responses.
pub trait SensorLink {
    /// Clock `tx` out while reading the same number of bytes back.
    fn exchange(&mut self, tx: &[u8]) -> Result<Vec<u8>, SensorError>;

    /// Release the underlying device. Idempotent.
    fn close(&mut self);

    /// Whether the link is still open.
    fn is_open(&self) -> bool;
}

/// spidev-backed link on SPI0 / CE0, mode 0.
pub struct LinuxSpiLink {
    spi: Option<Spi>,
}

impl LinuxSpiLink {
    /// Open the SPI device at the given clock rate.
    pub fn open(clock_hz: u32) -> Result<Self, SensorError> {
        let spi = Spi::new(Bus::Spi0, SlaveSelect::Ss0, clock_hz, Mode::Mode0)
            .map_err(|e| SensorError::Spi {
                detail: e.to_string(),
            })?;
        debug!(clock_hz, "opened spi link");
        Ok(Self { spi: Some(spi) })
    }
}

impl SensorLink for LinuxSpiLink {
    fn exchange(&mut self, tx: &[u8]) -> Result<Vec<u8>, SensorError> {
        let spi = self.spi.as_mut().ok_or(SensorError::Closed)?;
        let mut rx = vec![0u8; tx.len()];
        let n = spi.transfer(&mut rx, tx).map_err(|e| SensorError::Spi {
            detail: e.to_string(),
        })?;
        if n < tx.len() {
            return Err(SensorError::ShortResponse {
                expected: tx.len(),
                actual: n,
            });
        }
        Ok(rx)
    }

    fn close(&mut self) {
        if self.spi.take().is_some() {
            debug!("closed spi link");
        }
    }

    fn is_open(&self) -> bool {
        self.spi.is_some()
    }
}

/// MR793200 controller.
pub struct Mr793200<L: SensorLink> {
    link: L,
}

impl<L: SensorLink> Mr793200<L> {
    pub fn new(link: L) -> Self {
        Self { link }
    }

    /// Read a single NVM word: command, offset, two turnaround bytes, then
    /// the word itself (big-endian).
    pub fn read_word(&mut self, page: u8, offset: u8) -> Result<u16, SensorError> {
        let tx = [cmd::READ_NVM1 | page, offset, 0x00, 0x00, 0x00, 0x00];
        let rx = self.link.exchange(&tx)?;
        if rx.len() < 6 {
            return Err(SensorError::ShortResponse {
                expected: 6,
                actual: rx.len(),
            });
        }
        Ok(u16::from_be_bytes([rx[4], rx[5]]))
    }

    /// Read `words` consecutive NVM words with status framing: a 4-byte
    /// header, then `[data:2][status:2]` per word. The status bytes are
    /// discarded.
    pub fn read_words(&mut self, page: u8, offset: u8, words: usize) -> Result<Vec<u16>, SensorError> {
        let len = 4 + words * 4;
        let mut tx = vec![0u8; len];
        tx[0] = cmd::READ_NVM1 | page;
        tx[1] = offset;
        let rx = self.link.exchange(&tx)?;
        if rx.len() < len {
            return Err(SensorError::ShortResponse {
                expected: len,
                actual: rx.len(),
            });
        }
        Ok((0..words)
            .map(|i| u16::from_be_bytes([rx[4 + 4 * i], rx[5 + 4 * i]]))
            .collect())
    }

    /// Request NVM write access: set the SPI_EXCL bit in the SPI_STAT
    /// register. Must precede [`write_words`](Self::write_words).
    pub fn write_enable(&mut self) -> Result<(), SensorError> {
        self.link
            .exchange(&[cmd::WRITE_SPIST, 0x00, 0x00, 0x01])
            .map(|_| ())
    }

    /// Program consecutive NVM words. The device needs 8 ms per word, so
    /// this blocks for `8 ms * words.len()` on top of the transfers.
    pub fn write_words(&mut self, page: u8, offset: u8, words: &[u16]) -> Result<(), SensorError> {
        for (i, word) in words.iter().enumerate() {
            let [hi, lo] = word.to_be_bytes();
            let word_offset = offset + (i as u8) * 2;
            self.link
                .exchange(&[cmd::WRITE_NVM | page, word_offset, hi, lo])?;
            thread::sleep(WRITE_WORD_DELAY);
        }
        Ok(())
    }

    /// Factory tracer ID as uppercase hex (6 words, 24 characters).
    pub fn tracer_id(&mut self) -> Result<String, SensorError> {
        let words = self.read_words(map::PAGE, map::TRACER_ID, 6)?;
        Ok(words.iter().map(|w| format!("{w:04X}")).collect())
    }

    /// Model number word.
    pub fn model_number(&mut self) -> Result<u16, SensorError> {
        self.read_word(map::PAGE, map::MODEL_NUMBER)
    }

    /// Release the SPI device. Idempotent.
    pub fn close(&mut self) {
        self.link.close();
    }

    /// Whether the underlying link is still open.
    pub fn is_open(&self) -> bool {
        self.link.is_open()
    }

    /// Consume the controller and hand the link back.
    pub fn release(self) -> L {
        self.link
    }
}
