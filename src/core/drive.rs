// core/drive.rs

//! Differential drive: two independently driven wheels. Speeds are signed,
//! positive forwards, and the caller keeps them within roughly +/-100.

// Dependencies
use log::{debug, info};

use crate::interface::MotorOutput;

/// Left and right wheel motors.
pub struct DriveBase {
    left: Box<dyn MotorOutput>,
    right: Box<dyn MotorOutput>,
}

impl DriveBase {
    /// Takes ownership of both wheel motors.
    pub fn new(left: Box<dyn MotorOutput>, right: Box<dyn MotorOutput>) -> Self {
        info!("Created a robot driver");
        DriveBase { left, right }
    }

    /// Stops both wheels.
    pub fn stop(&mut self) {
        debug!("drive stop");
        self.left.stop();
        self.right.stop();
    }

    /// Drives each wheel at its own signed speed.
    pub fn drive(&mut self, left_speed: f64, right_speed: f64) {
        debug!("drive L={:.1} R={:.1}", left_speed, right_speed);
        Self::spin(self.left.as_mut(), left_speed);
        Self::spin(self.right.as_mut(), right_speed);
    }

    fn spin(wheel: &mut dyn MotorOutput, speed: f64) {
        if speed > 0.0 {
            wheel.forwards(speed);
        } else if speed < 0.0 {
            wheel.backwards(-speed);
        } else {
            wheel.stop();
        }
    }
}
