//! Pibot - pan/tilt camera robot that finds, tracks and chases a coloured target
//!
//! This library provides the robot control core: the camera gimbal, the
//! differential drive, the mode indicator lights, and the tracking state
//! machine that ties them to per-frame target detections. Image processing,
//! camera capture and real motor drivers sit behind the traits in
//! [`interface`].

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

pub mod core;
pub mod interface;
pub mod navigation;

// Re-export commonly used items for easier access
pub use crate::core::{Detection, DriveBase, Frame, Gimbal, GimbalAxis, IndicatorPanel, Light, Mode, Robot};
pub use interface::{ControlSurface, Release, Scoped, StatusDisplay, VisionSource};
pub use navigation::{RobotStatus, ScanPattern, TrackingController};

use std::path::Path;
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Main configuration structure for Pibot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PibotConfig {
    /// Camera frame geometry
    pub frame: FrameConfig,
    /// Visual servo and chase parameters
    pub tracking: TrackingConfig,
    /// Lost-target search parameters
    pub scan: ScanConfig,
    /// Servo wiring and calibration
    pub gimbal: GimbalConfig,
    /// Time the camera is given to re-centre before its servos are powered off
    pub idle_settle_ms: u64,
    /// Whether the status display receives a snapshot every frame
    pub display_status: bool,
}

/// Frame size the detections are measured in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// Visual servo and chase parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Degrees of correction for a target offset by a full frame
    pub angular_gain: f64,
    /// Above this tilt the target is overhead and the robot stops
    pub elevation_stop_deg: f64,
    /// Targets with a larger radius are close: turn in place, don't advance
    pub max_target_radius: f64,
    /// Blobs at or below this radius are treated as noise
    pub min_target_radius: f64,
    /// Wheel speed taken off the inside wheel per degree of pan
    pub follow_turn_gain: f64,
    /// Outer wheel speed while following
    pub cruise_speed: f64,
}

/// Lost-target search parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Waypoints per scan pattern
    pub steps: usize,
    /// Pan half-width of the sweep, degrees
    pub pan_amplitude_deg: f64,
    /// Tilt half-height of the sweep, degrees
    pub tilt_amplitude_deg: f64,
    /// Empty frames tolerated before the target counts as lost
    pub lost_frame_threshold: u32,
    /// Scan ticks allowed before giving up and idling
    pub timeout_ticks: u32,
    /// Wheel speed while spinning in place
    pub spin_speed: f64,
}

/// Servo wiring and calibration of the camera mount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GimbalConfig {
    /// Servo PWM frequency
    pub pwm_frequency_hz: f64,
    /// Pan servo
    pub pan: AxisCalibration,
    /// Tilt servo
    pub tilt: AxisCalibration,
}

/// Output channel and duty range of one servo
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisCalibration {
    /// Expansion board output (1-4)
    pub channel: u8,
    /// Duty cycle (percent) at -90 degrees
    pub min_duty: f64,
    /// Duty cycle (percent) at +90 degrees
    pub max_duty: f64,
}

impl Default for PibotConfig {
    fn default() -> Self {
        PibotConfig {
            frame: FrameConfig::default(),
            tracking: TrackingConfig::default(),
            scan: ScanConfig::default(),
            gimbal: GimbalConfig::default(),
            idle_settle_ms: 1000,
            display_status: true,
        }
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        FrameConfig {
            width: 320,
            height: 240,
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        TrackingConfig {
            angular_gain: 20.0,
            elevation_stop_deg: 15.0,
            max_target_radius: 80.0,
            min_target_radius: 0.1,
            follow_turn_gain: 2.0,
            cruise_speed: 100.0,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            steps: 32,
            pan_amplitude_deg: 45.0,
            tilt_amplitude_deg: 30.0,
            lost_frame_threshold: 4,
            timeout_ticks: 100,
            spin_speed: 100.0,
        }
    }
}

impl Default for GimbalConfig {
    fn default() -> Self {
        GimbalConfig {
            pwm_frequency_hz: 50.0,
            pan: AxisCalibration {
                channel: 2,
                min_duty: 88.61,
                max_duty: 97.64,
            },
            tilt: AxisCalibration {
                channel: 1,
                min_duty: 88.61,
                max_duty: 96.39,
            },
        }
    }
}

impl PibotConfig {
    /// Loads and validates a YAML configuration file. Missing keys keep their
    /// defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PibotError> {
        let file = std::fs::File::open(path.as_ref())?;
        let config: PibotConfig = serde_yaml::from_reader(file)?;
        config.validate()?;
        info!("Loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    /// Rejects values the controller cannot work with.
    pub fn validate(&self) -> Result<(), PibotError> {
        if self.frame.width == 0 || self.frame.height == 0 {
            return Err(PibotError::ConfigError(format!(
                "frame must be non-empty, got {}x{}",
                self.frame.width, self.frame.height
            )));
        }
        if self.scan.steps == 0 {
            return Err(PibotError::ConfigError(
                "scan pattern needs at least one step".to_string(),
            ));
        }

        let t = &self.tracking;
        let finite = [
            ("angular_gain", t.angular_gain),
            ("elevation_stop_deg", t.elevation_stop_deg),
            ("max_target_radius", t.max_target_radius),
            ("min_target_radius", t.min_target_radius),
            ("follow_turn_gain", t.follow_turn_gain),
            ("cruise_speed", t.cruise_speed),
            ("pan_amplitude_deg", self.scan.pan_amplitude_deg),
            ("tilt_amplitude_deg", self.scan.tilt_amplitude_deg),
            ("spin_speed", self.scan.spin_speed),
        ];
        if let Some((name, value)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(PibotError::ConfigError(format!("{} must be finite, got {}", name, value)));
        }
        if t.min_target_radius < 0.0 || t.min_target_radius >= t.max_target_radius {
            return Err(PibotError::ConfigError(format!(
                "target radius bounds are inverted ({} .. {})",
                t.min_target_radius, t.max_target_radius
            )));
        }

        for (name, axis) in [("pan", &self.gimbal.pan), ("tilt", &self.gimbal.tilt)] {
            if !(axis.min_duty < axis.max_duty) {
                return Err(PibotError::ConfigError(format!(
                    "{} servo duty range is empty ({} .. {})",
                    name, axis.min_duty, axis.max_duty
                )));
            }
        }
        if !(self.gimbal.pwm_frequency_hz > 0.0) {
            return Err(PibotError::ConfigError(format!(
                "servo PWM frequency must be positive, got {}",
                self.gimbal.pwm_frequency_hz
            )));
        }
        Ok(())
    }
}

/// Result of a completed run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Frames processed
    pub frames: u64,
    /// Mode when the loop ended
    pub final_mode: Mode,
    /// True if the operator quit, false if the vision stream ended
    pub quit: bool,
}

/// Primary entry point: the robot plus its controller, driven frame by frame
pub struct Pibot {
    config: PibotConfig,
    robot: Robot,
    controller: TrackingController,
    frames: u64,
    started: bool,
}

impl Pibot {
    /// Create a Pibot around an assembled robot, starting in IDLE
    pub fn new(config: PibotConfig, robot: Robot) -> Result<Self, PibotError> {
        config.validate()?;
        let controller = TrackingController::new(&config);
        Ok(Pibot {
            config,
            robot,
            controller,
            frames: 0,
            started: false,
        })
    }

    /// Blocks until the start trigger fires. Returns `false` if the operator
    /// quit first.
    pub fn wait_for_start(&mut self, controls: &mut dyn ControlSurface) -> bool {
        info!("Waiting for start...");
        loop {
            if controls.quit_requested() {
                info!("Quit before start");
                return false;
            }
            if controls.start_pressed() {
                self.started = true;
                info!("Started");
                return true;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    /// Runs the frame loop until the operator quits or the vision stream
    /// ends, then stops the robot and parks the camera.
    ///
    /// The vision source and display are released on every exit path,
    /// including errors.
    pub fn run(
        &mut self,
        vision: &mut dyn VisionSource,
        display: Option<&mut dyn StatusDisplay>,
        controls: &mut dyn ControlSurface,
    ) -> Result<RunSummary, PibotError> {
        let mut vision = Scoped::new(vision);
        let mut display = display.map(Scoped::new);
        if !self.started {
            return Err(PibotError::NotInitialized);
        }

        let result = self.frame_loop(&mut vision, &mut display, controls);
        if let Err(e) = &result {
            warn!("Frame loop aborted: {}", e);
        }
        self.shutdown();
        result
    }

    fn frame_loop(
        &mut self,
        vision: &mut Scoped<&mut dyn VisionSource>,
        display: &mut Option<Scoped<&mut dyn StatusDisplay>>,
        controls: &mut dyn ControlSurface,
    ) -> Result<RunSummary, PibotError> {
        loop {
            if controls.quit_requested() {
                info!("Quit requested after {} frames", self.frames);
                return Ok(self.summary(true));
            }
            let frame = match vision.next_frame()? {
                Some(frame) => frame,
                None => {
                    info!("Vision stream ended after {} frames", self.frames);
                    return Ok(self.summary(false));
                }
            };

            self.step(&frame);

            if self.config.display_status {
                if let Some(display) = display.as_mut() {
                    display.show(&self.status());
                }
            }
        }
    }

    /// Feeds one frame to the controller
    pub fn step(&mut self, frame: &Frame) -> Mode {
        self.frames += 1;
        self.controller.on_frame(&mut self.robot, frame)
    }

    /// Stops the wheels and parks the camera mount
    pub fn shutdown(&mut self) {
        self.robot.shutdown();
        self.started = false;
        info!("Pibot shutdown complete");
    }

    /// Current status snapshot
    pub fn status(&self) -> RobotStatus {
        self.controller.status(&self.robot)
    }

    /// Current mode
    pub fn mode(&self) -> Mode {
        self.controller.mode()
    }

    /// The robot being driven
    pub fn robot(&self) -> &Robot {
        &self.robot
    }

    /// The mode state machine
    pub fn controller(&self) -> &TrackingController {
        &self.controller
    }

    fn summary(&self, quit: bool) -> RunSummary {
        RunSummary {
            frames: self.frames,
            final_mode: self.controller.mode(),
            quit,
        }
    }
}

/// Pibot error types
#[derive(Debug)]
pub enum PibotError {
    /// Actuator missing or unusable
    Hardware(String),
    /// Invalid or unreadable configuration
    ConfigError(String),
    /// Vision source failure
    Vision(String),
    /// Run loop entered before the start trigger
    NotInitialized,
}

impl std::fmt::Display for PibotError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            PibotError::Hardware(msg) => write!(f, "Hardware error: {}", msg),
            PibotError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            PibotError::Vision(msg) => write!(f, "Vision error: {}", msg),
            PibotError::NotInitialized => write!(f, "Robot not started"),
        }
    }
}

impl std::error::Error for PibotError {}

impl From<std::io::Error> for PibotError {
    fn from(e: std::io::Error) -> Self {
        PibotError::ConfigError(e.to_string())
    }
}

impl From<serde_yaml::Error> for PibotError {
    fn from(e: serde_yaml::Error) -> Self {
        PibotError::ConfigError(e.to_string())
    }
}
