//! Power-link sequencer for the battery board.
//!
//! Pure logic, no hardware dependencies. Consumes the VDET level, produces
//! pin and init actions. Fully testable on host.
//!
//! The contract: when supply voltage appears (VDET high), the downstream
//! board gets 100 ms before RESET is released, then another 100 ms to settle
//! before the expander is initialized. When supply drops, RESET is asserted
//! immediately. A hot reset holds RESET low for 500 ms and then walks the
//! same release/settle path.

/// Sequencer timing, all in milliseconds.
#[derive(Clone, Copy, Debug)]
pub struct SequencerConfig {
    /// VDET high -> RESET release delay.
    pub reset_release_ms: u64,
    /// RESET release -> expander init delay.
    pub init_settle_ms: u64,
    /// Hot-reset low pulse width.
    pub hot_reset_pulse_ms: u64,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            reset_release_ms: 100,
            init_settle_ms: 100,
            hot_reset_pulse_ms: 500,
        }
    }
}

/// Action the caller has to perform on the hardware.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeqAction {
    /// Drive RESET high.
    ReleaseReset,
    /// Drive RESET low.
    AssertReset,
    /// Bring up the port expander (the board has settled).
    InitExpander,
}

/// Externally visible link state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkState {
    /// Supply absent, RESET asserted.
    Down,
    /// Supply present, walking the release/settle delays.
    Starting,
    /// Board out of reset and initialized.
    Up,
}

/// FSM state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Down,
    ResetDelay { since: u64 },
    InitDelay { since: u64 },
    HotReset { since: u64 },
    Up,
}

/// Power-link state machine.
///
/// Call [`tick`](Self::tick) on every poll with the current timestamp and
/// VDET level, and apply the returned actions in order.
pub struct PowerSequencer {
    config: SequencerConfig,
    state: State,
    last_vdet: bool,
}

impl PowerSequencer {
    pub fn new(config: SequencerConfig) -> Self {
        Self {
            config,
            state: State::Down,
            last_vdet: false,
        }
    }

    /// Externally visible link state.
    pub fn state(&self) -> LinkState {
        match self.state {
            State::Down => LinkState::Down,
            State::Up => LinkState::Up,
            State::ResetDelay { .. } | State::InitDelay { .. } | State::HotReset { .. } => {
                LinkState::Starting
            }
        }
    }

    /// Advance the FSM.
    ///
    /// `now_ms` only needs to be monotonic; the reference point does not
    /// matter. Supply loss overrides everything else.
    pub fn tick(&mut self, now_ms: u64, vdet: bool) -> Vec<SeqAction> {
        self.last_vdet = vdet;
        let mut actions = Vec::new();

        if !vdet {
            if self.state != State::Down {
                actions.push(SeqAction::AssertReset);
                self.state = State::Down;
            }
            return actions;
        }

        match self.state {
            State::Down => {
                self.state = State::ResetDelay { since: now_ms };
            }
            State::ResetDelay { since } => {
                if now_ms.saturating_sub(since) >= self.config.reset_release_ms {
                    actions.push(SeqAction::ReleaseReset);
                    self.state = State::InitDelay { since: now_ms };
                }
            }
            State::InitDelay { since } => {
                if now_ms.saturating_sub(since) >= self.config.init_settle_ms {
                    actions.push(SeqAction::InitExpander);
                    self.state = State::Up;
                }
            }
            State::HotReset { since } => {
                if now_ms.saturating_sub(since) >= self.config.hot_reset_pulse_ms {
                    actions.push(SeqAction::ReleaseReset);
                    self.state = State::InitDelay { since: now_ms };
                }
            }
            State::Up => {}
        }

        actions
    }

    /// Start a hot reset. Only available while the supply is present;
    /// returns the action to apply now, or `None` if the link is down.
    pub fn hot_reset(&mut self, now_ms: u64) -> Option<SeqAction> {
        if !self.last_vdet {
            return None;
        }
        self.state = State::HotReset { since: now_ms };
        Some(SeqAction::AssertReset)
    }
}
