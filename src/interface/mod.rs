//! Hardware boundary for Pibot
//!
//! This module defines the collaborators the controller talks to:
//! - Actuator outputs (servo PWM, wheel motors, indicator lights)
//! - Per-frame vision input and the start/quit control surface
//! - The optional status display
//! - A simulated backend that records every command

pub mod actuators;
pub mod sim;
pub mod vision;

pub use actuators::{LightOutput, MotorOutput, ServoChannel, ServoOutput};
pub use sim::{LogDisplay, ServoEvent, SimControls, SimHardware, SimLog, Wheel};
pub use vision::{ControlSurface, Release, Scoped, ScriptedVision, StatusDisplay, VisionSource};
