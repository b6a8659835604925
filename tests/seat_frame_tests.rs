//! Seat climate decode and hold-filter tests.

use cabin_sense::seat::{HoldFilter, SeatFrame};

#[test]
fn test_nibble_order() {
    // FL in bits 3:0, FR in 7:4, RL in 11:8, RR in 15:12.
    let frame = SeatFrame::decode(0x4321, 0x3210);
    assert_eq!(frame.fan, [1, 2, 3, 4]);
    assert_eq!(frame.heater, [0, 1, 2, 3]);
}

#[test]
fn test_fan_full_scale() {
    let frame = SeatFrame::decode(0xAAAA, 0x0000);
    assert_eq!(frame.fan, [10, 10, 10, 10]);
}

#[test]
fn test_filter_passes_valid_levels() {
    let mut filter = HoldFilter::default();
    let out = filter.apply(SeatFrame::decode(0x4321, 0x3210));
    assert_eq!(out.fan, [1, 2, 3, 4]);
    assert_eq!(out.heater, [0, 1, 2, 3]);
}

#[test]
fn test_filter_holds_invalid_fan_nibble() {
    let mut filter = HoldFilter::default();
    filter.apply(SeatFrame::decode(0x4321, 0x3210));

    // FL fan nibble 0xB is out of range: its previous level (1) sticks,
    // the rest update.
    let out = filter.apply(SeatFrame::decode(0x565B, 0x3210));
    assert_eq!(out.fan, [1, 5, 6, 5]);
}

#[test]
fn test_filter_holds_invalid_heater_nibble() {
    let mut filter = HoldFilter::default();
    filter.apply(SeatFrame::decode(0x0000, 0x3213));

    // RR heater nibble 0x4 and FL nibble 0xF are invalid.
    let out = filter.apply(SeatFrame::decode(0x0000, 0x412F));
    assert_eq!(out.heater, [3, 2, 1, 3]);
}

#[test]
fn test_filter_reports_zero_before_first_valid_reading() {
    let mut filter = HoldFilter::default();
    let out = filter.apply(SeatFrame::decode(0xFFFF, 0xFFFF));
    assert_eq!(out.fan, [0, 0, 0, 0]);
    assert_eq!(out.heater, [0, 0, 0, 0]);
}
