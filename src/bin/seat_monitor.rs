//! Seat climate monitor.
//!
//! Raises the sensor-select line, opens the SPI link, logs the controller's
//! tracer ID once, then polls the two climate words every second and logs
//! the decoded fan / heater levels per seat.

use std::thread;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cabin_sense::config::{BusConfig, PinConfig, PollConfig};
use cabin_sense::hal::mr793200::{map, LinuxSpiLink, Mr793200};
use cabin_sense::hal::power::SensorSelect;
use cabin_sense::seat::{HoldFilter, SeatFrame, SEAT_ZONES};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let bus = BusConfig::default();
    let pins = PinConfig::default();
    let poll = PollConfig::default();

    let _select = SensorSelect::claim(pins.sensor_select).context("claiming sensor-select pin")?;
    let link = LinuxSpiLink::open(bus.spi_clock_hz).context("opening spi link")?;
    let mut sensor = Mr793200::new(link);

    match sensor.tracer_id() {
        Ok(id) => info!(%id, "sensor tracer id"),
        Err(e) => warn!(error = %e, "tracer id read failed"),
    }

    let mut filter = HoldFilter::default();
    loop {
        match sensor.read_words(map::PAGE, map::USER_BASE, 2) {
            Ok(words) => {
                let raw = SeatFrame::decode(words[0], words[1]);
                let frame = filter.apply(raw);
                if frame != raw {
                    // Controller writes show up as out-of-range nibbles.
                    warn!(fan_word = words[0], heater_word = words[1], "out-of-range level held");
                }
                for (i, zone) in SEAT_ZONES.iter().enumerate() {
                    info!(
                        seat = zone.label(),
                        fan = frame.fan[i],
                        heater = frame.heater[i],
                        "seat climate"
                    );
                }
            }
            // Read failures here are transient; the next cycle retries.
            Err(e) => warn!(error = %e, "climate read failed"),
        }
        thread::sleep(poll.seat_period);
    }
}
