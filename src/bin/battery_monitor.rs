//! Battery pack monitor.
//!
//! Polls the VDET line and drives the RESET sequencing; once the downstream
//! board settles, initializes the port expander, then mirrors cell on/off
//! state to the expander outputs while logging the pack.

use std::thread;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use cabin_sense::battery::{BatteryFrame, CELL_COUNT, ON_OFF_OFFSET, TEMP_OFFSETS};
use cabin_sense::config::{BusConfig, PinConfig, PollConfig};
use cabin_sense::hal::i2c::LinuxI2cBus;
use cabin_sense::hal::mr793200::{map, LinuxSpiLink, Mr793200, SensorError};
use cabin_sense::hal::pca9539::Pca9539;
use cabin_sense::hal::power::{PowerPins, SensorSelect};
use cabin_sense::sequencer::{LinkState, PowerSequencer, SeqAction, SequencerConfig};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let bus_cfg = BusConfig::default();
    let pin_cfg = PinConfig::default();
    let poll = PollConfig::default();

    let mut pins = PowerPins::claim(&pin_cfg).context("claiming power pins")?;
    let _select = SensorSelect::claim(pin_cfg.sensor_select).context("claiming sensor-select pin")?;
    let link = LinuxSpiLink::open(bus_cfg.spi_clock_hz).context("opening spi link")?;
    let mut sensor = Mr793200::new(link);

    let mut seq = PowerSequencer::new(SequencerConfig::default());
    let mut expander: Option<Pca9539<LinuxI2cBus>> = None;

    let started = Instant::now();
    loop {
        let now_ms = started.elapsed().as_millis() as u64;
        let vdet = pins.vdet_high();

        for action in seq.tick(now_ms, vdet) {
            match action {
                SeqAction::ReleaseReset => {
                    info!("supply detected, reset released");
                    pins.release_reset();
                }
                SeqAction::AssertReset => {
                    info!("supply lost, reset asserted");
                    pins.assert_reset();
                }
                SeqAction::InitExpander => match bring_up_expander(&mut expander, &bus_cfg) {
                    Ok(()) => info!("battery link up"),
                    Err(e) => warn!(error = %e, "expander init failed"),
                },
            }
        }

        if seq.state() == LinkState::Up {
            match read_pack(&mut sensor) {
                Ok(frame) => {
                    info!(on_mask = frame.on_mask, "pack state");
                    for cell in 0..CELL_COUNT {
                        debug!(
                            cell = cell + 1,
                            on = frame.is_on(cell),
                            temp_c = frame.temps_c[cell],
                            "cell state"
                        );
                    }
                    if let Some(exp) = expander.as_mut() {
                        if exp.is_ready() {
                            if let Err(e) = exp.set_outputs(frame.output_mask()) {
                                warn!(error = %e, "output mirror failed");
                            }
                        }
                    }
                }
                Err(e) => warn!(error = %e, "pack read failed"),
            }
        }

        // Tick faster while the reset/settle delays are running.
        let period = if seq.state() == LinkState::Starting {
            poll.settle_period
        } else {
            poll.battery_period
        };
        thread::sleep(period);
    }
}

/// Open the I2C bus on first use and run the expander init sequence.
/// A failure leaves the link un-mirrored; the next supply cycle retries.
fn bring_up_expander(
    expander: &mut Option<Pca9539<LinuxI2cBus>>,
    bus: &BusConfig,
) -> Result<()> {
    if expander.is_none() {
        let handle = LinuxI2cBus::open(bus.i2c_bus)?;
        *expander = Some(Pca9539::new(handle, bus.expander_addr));
    }
    if let Some(exp) = expander.as_mut() {
        if !exp.is_ready() {
            exp.init_all_outputs()?;
        }
    }
    Ok(())
}

fn read_pack(sensor: &mut Mr793200<LinuxSpiLink>) -> Result<BatteryFrame, SensorError> {
    let on_word = sensor.read_word(map::PAGE, ON_OFF_OFFSET)?;
    let mut temp_words = [0u16; TEMP_OFFSETS.len()];
    for (word, offset) in temp_words.iter_mut().zip(TEMP_OFFSETS) {
        *word = sensor.read_word(map::PAGE, offset)?;
    }
    Ok(BatteryFrame::decode(on_word, &temp_words))
}
