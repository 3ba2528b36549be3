// src/interface/sim.rs
//! Simulated hardware backend. Every output writes into a shared `SimLog` so a
//! run can be inspected afterwards; the binary uses it when no robot is
//! attached and the integration tests use it to observe the controller.
//!
//! Servo and light histories keep only the most recent [`HISTORY_LIMIT`]
//! entries, so a long session runs in bounded memory.

use std::cell::{Cell, Ref, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use log::{debug, info};

use super::actuators::{LightOutput, MotorOutput, ServoChannel, ServoOutput};
use super::vision::{ControlSurface, Release, StatusDisplay};
use crate::core::Light;
use crate::navigation::RobotStatus;

/// One signal change on a simulated servo line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ServoEvent {
    /// Signal on
    Pwm {
        /// Carrier frequency
        frequency_hz: f64,
        /// Duty cycle, percent
        duty_cycle: f64,
    },
    /// Line de-energized
    Off,
}

/// Which side of the robot a motor drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wheel {
    /// Port side
    Left,
    /// Starboard side
    Right,
}

/// Entries kept per servo channel, and light switches kept, before the
/// oldest are dropped.
pub const HISTORY_LIMIT: usize = 512;

fn record<T>(history: &mut VecDeque<T>, entry: T) {
    if history.len() >= HISTORY_LIMIT {
        history.pop_front();
    }
    history.push_back(entry);
}

/// Everything the simulated actuators have been told to do.
#[derive(Debug, Default)]
pub struct SimLog {
    servos: HashMap<ServoChannel, VecDeque<ServoEvent>>,
    wheels: HashMap<Wheel, f64>,
    wheel_commands: usize,
    active_lights: Vec<Light>,
    light_writes: VecDeque<Light>,
    light_switches: usize,
}

impl SimLog {
    /// Recent events on a servo channel, oldest first.
    pub fn servo_events(&self, channel: ServoChannel) -> Vec<ServoEvent> {
        self.servos
            .get(&channel)
            .map(|events| events.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Latest event on a servo channel.
    pub fn last_servo_event(&self, channel: ServoChannel) -> Option<ServoEvent> {
        self.servos.get(&channel).and_then(|events| events.back().copied())
    }

    /// Signed speed the wheel is currently turning at; 0 when stopped.
    pub fn wheel_speed(&self, wheel: Wheel) -> f64 {
        self.wheels.get(&wheel).copied().unwrap_or(0.0)
    }

    /// Current (left, right) wheel speeds.
    pub fn wheel_speeds(&self) -> (f64, f64) {
        (self.wheel_speed(Wheel::Left), self.wheel_speed(Wheel::Right))
    }

    /// Number of individual wheel commands issued (stop included).
    pub fn wheel_commands(&self) -> usize {
        self.wheel_commands
    }

    /// Lights currently on.
    pub fn active_lights(&self) -> &[Light] {
        &self.active_lights
    }

    /// Recent lights switched on, in order.
    pub fn light_writes(&self) -> &VecDeque<Light> {
        &self.light_writes
    }

    /// Lights switched on over the whole run, including ones no longer in
    /// the history.
    pub fn light_switches(&self) -> usize {
        self.light_switches
    }
}

/// Factory for simulated outputs sharing one `SimLog`.
#[derive(Clone, Default)]
pub struct SimHardware {
    log: Rc<RefCell<SimLog>>,
}

impl SimHardware {
    /// Backend with an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Servo line on `channel`.
    pub fn servo(&self, channel: ServoChannel) -> SimServo {
        SimServo {
            channel,
            log: Rc::clone(&self.log),
        }
    }

    /// Motor for one wheel.
    pub fn motor(&self, wheel: Wheel) -> SimMotor {
        SimMotor {
            wheel,
            log: Rc::clone(&self.log),
        }
    }

    /// The indicator light bank.
    pub fn lights(&self) -> SimLights {
        SimLights {
            log: Rc::clone(&self.log),
        }
    }

    /// Read access to everything recorded so far.
    pub fn log(&self) -> Ref<'_, SimLog> {
        self.log.borrow()
    }
}

/// Simulated servo line.
pub struct SimServo {
    channel: ServoChannel,
    log: Rc<RefCell<SimLog>>,
}

impl ServoOutput for SimServo {
    fn pwm(&mut self, frequency_hz: f64, duty_cycle: f64) {
        debug!(
            "{}: pwm {:.1} Hz, duty {:.3}%",
            self.channel, frequency_hz, duty_cycle
        );
        let mut log = self.log.borrow_mut();
        let events = log.servos.entry(self.channel).or_default();
        record(
            events,
            ServoEvent::Pwm {
                frequency_hz,
                duty_cycle,
            },
        );
    }

    fn off(&mut self) {
        debug!("{}: off", self.channel);
        let mut log = self.log.borrow_mut();
        record(log.servos.entry(self.channel).or_default(), ServoEvent::Off);
    }
}

/// Simulated wheel motor.
pub struct SimMotor {
    wheel: Wheel,
    log: Rc<RefCell<SimLog>>,
}

impl SimMotor {
    fn set(&mut self, speed: f64) {
        let mut log = self.log.borrow_mut();
        log.wheels.insert(self.wheel, speed);
        log.wheel_commands += 1;
    }
}

impl MotorOutput for SimMotor {
    fn forwards(&mut self, speed: f64) {
        debug!("{:?} wheel forwards {:.1}", self.wheel, speed);
        self.set(speed);
    }

    fn backwards(&mut self, speed: f64) {
        debug!("{:?} wheel backwards {:.1}", self.wheel, speed);
        self.set(-speed);
    }

    fn stop(&mut self) {
        debug!("{:?} wheel stop", self.wheel);
        self.set(0.0);
    }
}

/// Simulated indicator light bank.
pub struct SimLights {
    log: Rc<RefCell<SimLog>>,
}

impl LightOutput for SimLights {
    fn all_off(&mut self) {
        self.log.borrow_mut().active_lights.clear();
    }

    fn on(&mut self, light: Light) {
        debug!("light {:?} on", light);
        let mut log = self.log.borrow_mut();
        if !log.active_lights.contains(&light) {
            log.active_lights.push(light);
        }
        record(&mut log.light_writes, light);
        log.light_switches += 1;
    }
}

/// Status display that writes each snapshot to the log.
#[derive(Debug, Default)]
pub struct LogDisplay {
    frames_shown: usize,
    released: bool,
}

impl LogDisplay {
    /// Display that has shown nothing yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshots received so far.
    pub fn frames_shown(&self) -> usize {
        self.frames_shown
    }
}

impl StatusDisplay for LogDisplay {
    fn show(&mut self, status: &RobotStatus) {
        self.frames_shown += 1;
        debug!("status: {}", status);
    }
}

impl Release for LogDisplay {
    fn release(&mut self) {
        if !self.released {
            self.released = true;
            info!("Status display closed after {} frames", self.frames_shown);
        }
    }
}

/// Control surface that presses "start" after a number of polls and quits
/// when its shared flag is raised.
#[derive(Debug, Default)]
pub struct SimControls {
    start_after_polls: u32,
    polls: u32,
    quit: Rc<Cell<bool>>,
}

impl SimControls {
    /// Controls whose start trigger fires on poll `start_after_polls + 1`.
    pub fn new(start_after_polls: u32) -> Self {
        SimControls {
            start_after_polls,
            ..Self::default()
        }
    }

    /// Handle that can raise the quit trigger from outside.
    pub fn quit_handle(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.quit)
    }
}

impl ControlSurface for SimControls {
    fn start_pressed(&mut self) -> bool {
        if self.polls >= self.start_after_polls {
            return true;
        }
        self.polls += 1;
        false
    }

    fn quit_requested(&mut self) -> bool {
        self.quit.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motor_directions_are_signed() {
        let hw = SimHardware::new();
        let mut left = hw.motor(Wheel::Left);
        let mut right = hw.motor(Wheel::Right);

        left.forwards(40.0);
        right.backwards(25.0);
        assert_eq!(hw.log().wheel_speeds(), (40.0, -25.0));

        left.stop();
        assert_eq!(hw.log().wheel_speed(Wheel::Left), 0.0);
        assert_eq!(hw.log().wheel_commands(), 3);
    }

    #[test]
    fn lights_track_active_set() {
        let hw = SimHardware::new();
        let mut lights = hw.lights();

        lights.on(Light::Red);
        lights.all_off();
        lights.on(Light::Blue);

        assert_eq!(hw.log().active_lights(), &[Light::Blue]);
        assert_eq!(hw.log().light_writes(), &[Light::Red, Light::Blue]);
    }

    #[test]
    fn histories_are_bounded() {
        let hw = SimHardware::new();
        let mut servo = hw.servo(ServoChannel::Out3);
        let mut lights = hw.lights();

        for i in 0..HISTORY_LIMIT + 100 {
            servo.pwm(50.0, i as f64);
            lights.on(Light::Green);
        }
        servo.off();

        let log = hw.log();
        let events = log.servo_events(ServoChannel::Out3);
        assert_eq!(events.len(), HISTORY_LIMIT);
        assert_eq!(
            events[0],
            ServoEvent::Pwm {
                frequency_hz: 50.0,
                duty_cycle: 101.0
            }
        );
        assert_eq!(log.last_servo_event(ServoChannel::Out3), Some(ServoEvent::Off));
        assert_eq!(log.light_writes().len(), HISTORY_LIMIT);
        assert_eq!(log.light_switches(), HISTORY_LIMIT + 100);
        assert_eq!(log.active_lights(), &[Light::Green]);
    }

    #[test]
    fn controls_start_after_polls() {
        let mut controls = SimControls::new(2);
        assert!(!controls.start_pressed());
        assert!(!controls.start_pressed());
        assert!(controls.start_pressed());

        assert!(!controls.quit_requested());
        controls.quit_handle().set(true);
        assert!(controls.quit_requested());
    }
}
