// src/interface/actuators.rs
//! Output side of the hardware boundary: servo PWM channels, wheel motors and
//! indicator lights. The core only talks to these traits, so the same control
//! logic drives real hardware, the simulator, or a mock in tests.

use crate::PibotError;
use crate::core::Light;

/// The four PWM-capable outputs a pan/tilt servo may be wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServoChannel {
    /// Expansion output 1
    Out1,
    /// Expansion output 2
    Out2,
    /// Expansion output 3
    Out3,
    /// Expansion output 4
    Out4,
}

impl TryFrom<u8> for ServoChannel {
    type Error = PibotError;

    /// A servo on anything other than outputs 1-4 cannot be driven and is
    /// fatal at startup.
    fn try_from(channel: u8) -> Result<Self, Self::Error> {
        match channel {
            1 => Ok(ServoChannel::Out1),
            2 => Ok(ServoChannel::Out2),
            3 => Ok(ServoChannel::Out3),
            4 => Ok(ServoChannel::Out4),
            other => Err(PibotError::Hardware(format!(
                "no servo output on channel {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ServoChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let n = match self {
            ServoChannel::Out1 => 1,
            ServoChannel::Out2 => 2,
            ServoChannel::Out3 => 3,
            ServoChannel::Out4 => 4,
        };
        write!(f, "OUT{}", n)
    }
}

/// A single servo signal line.
#[cfg_attr(test, mockall::automock)]
pub trait ServoOutput {
    /// Emit a PWM signal at `frequency_hz` with the given duty cycle (percent).
    fn pwm(&mut self, frequency_hz: f64, duty_cycle: f64);
    /// De-energize the line; the servo goes limp.
    fn off(&mut self);
}

/// One wheel motor behind an H-bridge.
#[cfg_attr(test, mockall::automock)]
pub trait MotorOutput {
    /// Spin forwards at `speed` (0..=100).
    fn forwards(&mut self, speed: f64);
    /// Spin backwards at `speed` (0..=100).
    fn backwards(&mut self, speed: f64);
    /// Cut power to the wheel.
    fn stop(&mut self);
}

/// A bank of indicator lights.
#[cfg_attr(test, mockall::automock)]
pub trait LightOutput {
    /// Switch every light off.
    fn all_off(&mut self);
    /// Switch one light on, leaving the others as they are.
    fn on(&mut self, light: Light);
}
