//! Target tracking for Pibot
//!
//! This module turns per-frame detections into gimbal and drive commands:
//! it points the camera at a visible target and chases it, and when the
//! target has been gone for a few frames it sweeps the camera, then spins the
//! robot, then gives up and idles.

pub mod controller;
pub mod planner;

pub use controller::{PursuitCommand, decide_pursuit, servo_correction};
pub use planner::{ScanPattern, sweep_sign};

use std::time::Duration;

use log::{debug, info};

use crate::core::{Detection, Frame, LossMonitor, Mode, Observation, Robot};
use crate::{FrameConfig, PibotConfig, ScanConfig, TrackingConfig};

/// Progress through one search episode.
///
/// `ticks` is `None` before the episode starts; that is the only state in
/// which a new pattern is generated.
#[derive(Debug, Clone, Default)]
pub struct ScanState {
    pattern: Option<ScanPattern>,
    ticks: Option<u32>,
}

impl ScanState {
    /// Scan calls made in the current episode, `None` if none has started.
    pub fn ticks(&self) -> Option<u32> {
        self.ticks
    }

    /// Waypoints of the current episode, if one has started.
    pub fn pattern(&self) -> Option<&ScanPattern> {
        self.pattern.as_ref()
    }

    fn reset(&mut self) {
        self.pattern = None;
        self.ticks = None;
    }
}

/// Snapshot handed to the status display each frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RobotStatus {
    /// Current mode
    pub mode: Mode,
    /// Pan angle, degrees
    pub pan: f64,
    /// Tilt angle, degrees
    pub tilt: f64,
    /// Consecutive frames without a usable target
    pub lost_frames: u32,
    /// Progress of the current scan episode
    pub scan_ticks: Option<u32>,
    /// Most recent target that was tracked
    pub detection: Option<Detection>,
}

impl std::fmt::Display for RobotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} pan={:.1} tilt={:.1} lost={}",
            self.mode, self.pan, self.tilt, self.lost_frames
        )?;
        if let Some(ticks) = self.scan_ticks {
            write!(f, " scan={}", ticks)?;
        }
        if let Some(d) = &self.detection {
            write!(f, " target=({:.0}, {:.0}) r={:.1}", d.x, d.y, d.radius)?;
        }
        Ok(())
    }
}

/// The robot's mode state machine.
pub struct TrackingController {
    frame: FrameConfig,
    tracking: TrackingConfig,
    scan_config: ScanConfig,
    idle_settle: Duration,
    mode: Mode,
    loss: LossMonitor,
    scan: ScanState,
    last_detection: Option<Detection>,
}

impl TrackingController {
    /// Creates a controller in IDLE.
    pub fn new(config: &PibotConfig) -> Self {
        TrackingController {
            frame: config.frame.clone(),
            tracking: config.tracking.clone(),
            scan_config: config.scan.clone(),
            idle_settle: Duration::from_millis(config.idle_settle_ms),
            mode: Mode::Idle,
            loss: LossMonitor::new(
                config.scan.lost_frame_threshold,
                config.tracking.min_target_radius,
            ),
            scan: ScanState::default(),
            last_detection: None,
        }
    }

    /// Current mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Progress of the current search episode.
    pub fn scan_state(&self) -> &ScanState {
        &self.scan
    }

    /// Consecutive frames without a usable target.
    pub fn lost_frames(&self) -> u32 {
        self.loss.lost_frames()
    }

    /// Handles one camera frame. Returns the mode after the frame.
    ///
    /// Frames are ignored in MANUAL.
    pub fn on_frame(&mut self, robot: &mut Robot, frame: &Frame) -> Mode {
        if self.mode == Mode::Manual {
            debug!("manual mode, frame ignored");
            return self.mode;
        }

        match self.loss.observe(frame) {
            Observation::Track(detection) => self.track(robot, &detection),
            Observation::Hold => {
                debug!("target missing for {} frames", self.loss.lost_frames());
            }
            Observation::Search => self.scan(robot),
        }
        self.mode
    }

    /// Points the camera at a detected target and chases it.
    pub fn track(&mut self, robot: &mut Robot, detection: &Detection) {
        self.change(robot, Mode::Track);

        let corrected = servo_correction(
            robot.gimbal().angles(),
            detection,
            &self.frame,
            self.tracking.angular_gain,
        );
        robot.gimbal_mut().look_at(corrected.x, corrected.y);

        let command = decide_pursuit(corrected, detection.radius, &self.tracking);
        match command.wheel_speeds() {
            Some((left, right)) => robot.drive_mut().drive(left, right),
            None => robot.drive_mut().stop(),
        }
        if let PursuitCommand::Follow { .. } = command {
            self.change(robot, Mode::Follow);
        }

        if self.scan.ticks.is_some() {
            debug!("scan abandoned at tick {:?}", self.scan.ticks);
        }
        self.scan.reset();
        self.last_detection = Some(*detection);
    }

    /// One step of the search for a lost target: sweep the camera through
    /// the pattern, then centre it and spin the robot, and idle once the tick
    /// budget is spent.
    pub fn scan(&mut self, robot: &mut Robot) {
        let ticks = self.scan.ticks.unwrap_or(0);
        if ticks > self.scan_config.timeout_ticks {
            self.idle(robot);
            return;
        }

        self.change(robot, Mode::Scan);

        if self.scan.ticks.is_none() || self.scan.pattern.is_none() {
            let origin = robot.gimbal().angles();
            let pattern = ScanPattern::generate(origin, &self.scan_config);
            info!(
                "New scan pattern of {} waypoints from pan={:.1} tilt={:.1}",
                pattern.len(),
                origin.x,
                origin.y
            );
            self.scan.pattern = Some(pattern);
        }

        if let Some(pattern) = &self.scan.pattern {
            match pattern.get(ticks as usize) {
                Some(waypoint) => {
                    debug!("scan waypoint {}/{}", ticks + 1, pattern.len());
                    robot.gimbal_mut().look_at(waypoint.x, waypoint.y);
                }
                None => {
                    let speed = pattern.spin_direction() * self.scan_config.spin_speed;
                    if ticks as usize == pattern.len() {
                        let side = if speed > 0.0 { "right" } else { "left" };
                        info!("Scan pattern exhausted, spinning {}", side);
                    }
                    robot.gimbal_mut().look_at(0.0, 0.0);
                    robot.drive_mut().drive(speed, -speed);
                }
            }
        }

        self.scan.ticks = Some(ticks + 1);
    }

    /// Stops, centres the camera, waits for it to settle and powers the
    /// mount down. Does nothing if already idle.
    pub fn idle(&mut self, robot: &mut Robot) {
        if self.mode == Mode::Idle {
            return;
        }
        self.change(robot, Mode::Idle);
        robot.drive_mut().stop();
        robot.gimbal_mut().look_at(0.0, 0.0);
        if !self.idle_settle.is_zero() {
            std::thread::sleep(self.idle_settle);
        }
        robot.gimbal_mut().park();
    }

    /// Hands the robot to an operator. No manual driving is implemented, so
    /// this only changes the mode and its light.
    pub fn manual(&mut self, robot: &mut Robot) {
        self.change(robot, Mode::Manual);
    }

    /// Leaves MANUAL for IDLE; autonomous tracking resumes with the next frame.
    pub fn resume(&mut self, robot: &mut Robot) {
        if self.mode == Mode::Manual {
            self.idle(robot);
        }
    }

    /// Snapshot of the mode, gimbal angles and search progress.
    pub fn status(&self, robot: &Robot) -> RobotStatus {
        let angles = robot.gimbal().angles();
        RobotStatus {
            mode: self.mode,
            pan: angles.x,
            tilt: angles.y,
            lost_frames: self.loss.lost_frames(),
            scan_ticks: self.scan.ticks,
            detection: self.last_detection,
        }
    }

    fn change(&mut self, robot: &mut Robot, mode: Mode) {
        if self.mode != mode {
            info!("{} -> {}", self.mode, mode);
            self.mode = mode;
            robot.indicators_mut().set_mode(mode);
        }
    }
}
