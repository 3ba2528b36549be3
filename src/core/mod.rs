// core/mod.rs

//! The robot's body: camera mount, wheels and indicator lights, owned by a
//! single `Robot` value that the tracking controller borrows each frame.
//! Nothing here decides what to do; it only carries out commands.

pub mod drive;
pub mod gimbal;
pub mod perception;
pub mod state;

pub use drive::DriveBase;
pub use gimbal::{ANGLE_LIMIT, Gimbal, GimbalAxis, clamp_angle};
pub use perception::{Detection, Frame, LossMonitor, Observation};
pub use state::{IndicatorPanel, Light, Mode};

use log::info;

use crate::interface::{ServoChannel, SimHardware, Wheel};
use crate::{PibotConfig, PibotError};

/// Robot aggregate: exclusive owner of every actuator.
pub struct Robot {
    gimbal: Gimbal,
    drive: DriveBase,
    indicators: IndicatorPanel,
}

impl Robot {
    /// Assembles the robot, centres the camera, stops the wheels and shows
    /// the IDLE light.
    pub fn new(gimbal: Gimbal, drive: DriveBase, indicators: IndicatorPanel) -> Self {
        let mut robot = Robot {
            gimbal,
            drive,
            indicators,
        };
        robot.gimbal.look_at(0.0, 0.0);
        robot.drive.stop();
        robot.indicators.set_mode(Mode::Idle);
        info!("Created a robot");
        robot
    }

    /// Builds a robot on the simulated backend, wiring servos to the channels
    /// named in the configuration.
    pub fn simulated(hardware: &SimHardware, config: &PibotConfig) -> Result<Self, PibotError> {
        let gimbal_cfg = &config.gimbal;
        let pan_channel = ServoChannel::try_from(gimbal_cfg.pan.channel)?;
        let tilt_channel = ServoChannel::try_from(gimbal_cfg.tilt.channel)?;
        if pan_channel == tilt_channel {
            return Err(PibotError::Hardware(format!(
                "pan and tilt servos both wired to {}",
                pan_channel
            )));
        }

        let pan = GimbalAxis::new(
            "pan",
            Box::new(hardware.servo(pan_channel)),
            &gimbal_cfg.pan,
            gimbal_cfg.pwm_frequency_hz,
        )?;
        let tilt = GimbalAxis::new(
            "tilt",
            Box::new(hardware.servo(tilt_channel)),
            &gimbal_cfg.tilt,
            gimbal_cfg.pwm_frequency_hz,
        )?;
        let drive = DriveBase::new(
            Box::new(hardware.motor(Wheel::Left)),
            Box::new(hardware.motor(Wheel::Right)),
        );
        let indicators = IndicatorPanel::new(Box::new(hardware.lights()));

        Ok(Robot::new(Gimbal::new(pan, tilt), drive, indicators))
    }

    /// The camera mount.
    pub fn gimbal(&self) -> &Gimbal {
        &self.gimbal
    }

    /// The camera mount, for pointing.
    pub fn gimbal_mut(&mut self) -> &mut Gimbal {
        &mut self.gimbal
    }

    /// The wheels.
    pub fn drive_mut(&mut self) -> &mut DriveBase {
        &mut self.drive
    }

    /// The mode lights.
    pub fn indicators(&self) -> &IndicatorPanel {
        &self.indicators
    }

    /// The mode lights, for switching.
    pub fn indicators_mut(&mut self) -> &mut IndicatorPanel {
        &mut self.indicators
    }

    /// Leaves the robot safe: wheels stopped, camera mount unpowered.
    pub fn shutdown(&mut self) {
        self.drive.stop();
        self.gimbal.park();
        info!("Robot stopped and gimbal parked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::ServoEvent;

    #[test]
    fn starts_centred_stopped_and_idle() {
        let hw = SimHardware::new();
        let robot = Robot::simulated(&hw, &PibotConfig::default()).unwrap();

        assert_eq!(robot.gimbal().pan().angle(), 0.0);
        assert_eq!(robot.gimbal().tilt().angle(), 0.0);
        assert_eq!(robot.indicators().shown(), Some(Mode::Idle));
        assert_eq!(hw.log().wheel_speeds(), (0.0, 0.0));
        assert_eq!(hw.log().active_lights(), &[Light::Blue]);
    }

    #[test]
    fn servo_off_the_expansion_outputs_is_fatal() {
        let mut config = PibotConfig::default();
        config.gimbal.pan.channel = 7;
        let result = Robot::simulated(&SimHardware::new(), &config);
        assert!(matches!(result, Err(PibotError::Hardware(_))));
    }

    #[test]
    fn shared_servo_channel_is_fatal() {
        let mut config = PibotConfig::default();
        config.gimbal.tilt.channel = config.gimbal.pan.channel;
        assert!(Robot::simulated(&SimHardware::new(), &config).is_err());
    }

    #[test]
    fn shutdown_parks_both_servos() {
        let hw = SimHardware::new();
        let mut robot = Robot::simulated(&hw, &PibotConfig::default()).unwrap();
        robot.shutdown();

        assert_eq!(hw.log().last_servo_event(ServoChannel::Out1), Some(ServoEvent::Off));
        assert_eq!(hw.log().last_servo_event(ServoChannel::Out2), Some(ServoEvent::Off));
        assert_eq!(hw.log().wheel_speeds(), (0.0, 0.0));
    }
}
