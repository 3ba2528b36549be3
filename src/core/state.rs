// core/state.rs

//! Operating modes of the robot and the indicator lights that show them.
//! Every mode owns exactly one light; the table is a `match`, so adding a
//! mode without a light does not compile.

// Dependencies
use log::debug;

use crate::interface::LightOutput;

/// Robot operating modes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Watching straight ahead, motors off
    Idle,
    /// Target lost, sweeping the camera and spinning
    Scan,
    /// Target in view, pointing the camera at it
    Track,
    /// Target in view and far enough to chase
    Follow,
    /// Operator control placeholder, no behaviour
    Manual,
}

impl Mode {
    /// The indicator light shown while in this mode.
    pub fn light(self) -> Light {
        match self {
            Mode::Idle => Light::Blue,
            Mode::Scan => Light::Red,
            Mode::Track => Light::Yellow,
            Mode::Follow => Light::Green,
            Mode::Manual => Light::White,
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            Mode::Idle => "IDLE",
            Mode::Scan => "SCAN",
            Mode::Track => "TRACK",
            Mode::Follow => "FOLLOW",
            Mode::Manual => "MANUAL",
        };
        f.write_str(name)
    }
}

/// One lamp of the indicator bank.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Light {
    /// IDLE
    Blue,
    /// SCAN
    Red,
    /// TRACK
    Yellow,
    /// FOLLOW
    Green,
    /// MANUAL
    White,
}

/// Shows the current mode on the light bank, one light at a time.
pub struct IndicatorPanel {
    output: Box<dyn LightOutput>,
    shown: Option<Mode>,
}

impl IndicatorPanel {
    /// Panel with nothing shown yet.
    pub fn new(output: Box<dyn LightOutput>) -> Self {
        IndicatorPanel {
            output,
            shown: None,
        }
    }

    /// Lights the indicator for `mode` and no other.
    ///
    /// Returns `false` without touching the hardware when `mode` is already
    /// shown.
    pub fn set_mode(&mut self, mode: Mode) -> bool {
        if self.shown == Some(mode) {
            return false;
        }
        self.output.all_off();
        self.output.on(mode.light());
        self.shown = Some(mode);
        debug!("indicator {:?} for {}", mode.light(), mode);
        true
    }

    /// Mode whose light is currently on, if any.
    pub fn shown(&self) -> Option<Mode> {
        self.shown
    }
}
