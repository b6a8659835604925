//! Sensor controller framing tests over a scripted SPI link.

use std::collections::VecDeque;

use cabin_sense::hal::mr793200::{cmd, map, Mr793200, SensorError, SensorLink};

/// Replays canned responses and records every transmitted frame.
struct ScriptedLink {
    responses: VecDeque<Vec<u8>>,
    sent: Vec<Vec<u8>>,
    open: bool,
}

impl ScriptedLink {
    fn new(responses: Vec<Vec<u8>>) -> Self {
        Self {
            responses: responses.into(),
            sent: Vec::new(),
            open: true,
        }
    }
}

impl SensorLink for ScriptedLink {
    fn exchange(&mut self, tx: &[u8]) -> Result<Vec<u8>, SensorError> {
        if !self.open {
            return Err(SensorError::Closed);
        }
        self.sent.push(tx.to_vec());
        self.responses.pop_front().ok_or(SensorError::Spi {
            detail: "script exhausted".into(),
        })
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

/// Respond to a single-word read: 4 header bytes, then the word.
fn word_response(word: u16) -> Vec<u8> {
    let [hi, lo] = word.to_be_bytes();
    vec![0x00, 0x00, 0x00, 0x00, hi, lo]
}

/// Respond to a status-framed read: 4 header bytes, then
/// [data:2][status:2] per word.
fn framed_response(words: &[u16]) -> Vec<u8> {
    let mut out = vec![0x00; 4];
    for word in words {
        out.extend_from_slice(&word.to_be_bytes());
        out.extend_from_slice(&[0xAA, 0x55]); // status, discarded
    }
    out
}

#[test]
fn test_read_word_frame() {
    let link = ScriptedLink::new(vec![word_response(0x1234)]);
    let mut sensor = Mr793200::new(link);

    let value = sensor.read_word(0x04, 0x18).unwrap();
    assert_eq!(value, 0x1234);
}

#[test]
fn test_read_word_command_bytes() {
    let link = ScriptedLink::new(vec![word_response(0x0000)]);
    let mut sensor = Mr793200::new(link);
    sensor.read_word(map::PAGE, map::USER_BASE).unwrap();

    let link = sensor.release();
    // Command | page, offset, two turnaround bytes, two clock bytes.
    assert_eq!(
        link.sent[0],
        vec![cmd::READ_NVM1 | 0x04, 0x22, 0x00, 0x00, 0x00, 0x00]
    );
}

#[test]
fn test_read_words_status_framing() {
    let link = ScriptedLink::new(vec![framed_response(&[0x0123, 0xBEEF])]);
    let mut sensor = Mr793200::new(link);

    let words = sensor.read_words(map::PAGE, map::USER_BASE, 2).unwrap();
    assert_eq!(words, vec![0x0123, 0xBEEF]);

    let link = sensor.release();
    // 4-byte header plus 4 clocked bytes per word.
    assert_eq!(link.sent[0].len(), 12);
    assert_eq!(link.sent[0][0], cmd::READ_NVM1 | 0x04);
    assert_eq!(link.sent[0][1], 0x22);
}

#[test]
fn test_read_words_short_response() {
    // Device only clocks 8 of the 12 expected bytes.
    let link = ScriptedLink::new(vec![vec![0x00; 8]]);
    let mut sensor = Mr793200::new(link);

    let err = sensor.read_words(map::PAGE, map::USER_BASE, 2).unwrap_err();
    assert!(matches!(
        err,
        SensorError::ShortResponse {
            expected: 12,
            actual: 8,
        }
    ));
}

#[test]
fn test_write_enable_command() {
    let link = ScriptedLink::new(vec![vec![0x00; 4]]);
    let mut sensor = Mr793200::new(link);
    sensor.write_enable().unwrap();

    let link = sensor.release();
    // SPI_EXCL bit in SPI_STAT.
    assert_eq!(link.sent[0], vec![cmd::WRITE_SPIST, 0x00, 0x00, 0x01]);
}

#[test]
fn test_write_words_strides_by_word() {
    let link = ScriptedLink::new(vec![vec![0x00; 4], vec![0x00; 4]]);
    let mut sensor = Mr793200::new(link);
    sensor
        .write_words(map::PAGE, map::USER_BASE, &[0x0102, 0x0304])
        .unwrap();

    let link = sensor.release();
    assert_eq!(
        link.sent,
        vec![
            vec![cmd::WRITE_NVM | 0x04, 0x22, 0x01, 0x02],
            vec![cmd::WRITE_NVM | 0x04, 0x24, 0x03, 0x04],
        ]
    );
}

#[test]
fn test_tracer_id_formats_uppercase_hex() {
    let link = ScriptedLink::new(vec![framed_response(&[
        0x0102, 0xA0B0, 0xFFFF, 0x0000, 0x1234, 0xC0DE,
    ])]);
    let mut sensor = Mr793200::new(link);

    let id = sensor.tracer_id().unwrap();
    assert_eq!(id, "0102A0B0FFFF00001234C0DE");

    let link = sensor.release();
    assert_eq!(link.sent[0][1], map::TRACER_ID);
}

#[test]
fn test_model_number_location() {
    let link = ScriptedLink::new(vec![word_response(0x7932)]);
    let mut sensor = Mr793200::new(link);

    assert_eq!(sensor.model_number().unwrap(), 0x7932);

    let link = sensor.release();
    assert_eq!(link.sent[0][0], cmd::READ_NVM1 | map::PAGE);
    assert_eq!(link.sent[0][1], map::MODEL_NUMBER);
}

#[test]
fn test_spi_failure_propagates() {
    // Empty script: the first exchange fails.
    let link = ScriptedLink::new(vec![]);
    let mut sensor = Mr793200::new(link);

    let err = sensor.read_word(map::PAGE, map::USER_BASE).unwrap_err();
    assert!(matches!(err, SensorError::Spi { .. }));
}

#[test]
fn test_close_is_idempotent() {
    let link = ScriptedLink::new(vec![word_response(0x0001)]);
    let mut sensor = Mr793200::new(link);
    assert!(sensor.is_open());

    sensor.close();
    assert!(!sensor.is_open());
    sensor.close();
    assert!(!sensor.is_open());
}

#[test]
fn test_reads_after_close_fail() {
    let link = ScriptedLink::new(vec![word_response(0x0001)]);
    let mut sensor = Mr793200::new(link);
    sensor.close();

    let err = sensor.read_word(map::PAGE, map::USER_BASE).unwrap_err();
    assert!(matches!(err, SensorError::Closed));
}
