// core/gimbal.rs

//! Pan/tilt camera mount. Each axis is a hobby servo whose position is set by
//! the duty cycle of a fixed-frequency PWM signal; the calibrated duty range
//! maps linearly onto -90..+90 degrees. The logical angle is kept even while
//! the servo is parked so tracking maths stays continuous across idle periods.

// Dependencies
use log::{debug, info, warn};
use nalgebra::Vector2;

use crate::interface::ServoOutput;
use crate::{AxisCalibration, PibotError};

/// Mechanical limit of either axis, in degrees either side of centre.
pub const ANGLE_LIMIT: f64 = 90.0;

/// Clamp a requested angle into the servo's reachable range. NaN has no
/// meaningful position and maps to centre.
pub fn clamp_angle(degrees: f64) -> f64 {
    if degrees.is_nan() {
        return 0.0;
    }
    degrees.clamp(-ANGLE_LIMIT, ANGLE_LIMIT)
}

/// One servo axis: owns its output line and remembers where it points.
pub struct GimbalAxis {
    name: &'static str,
    output: Box<dyn ServoOutput>,
    angle: f64,
    min_duty: f64,
    max_duty: f64,
    frequency_hz: f64,
}

impl GimbalAxis {
    /// Takes ownership of a servo output and centres it.
    ///
    /// A calibration whose duty range is empty or not finite cannot be driven
    /// and aborts startup.
    pub fn new(
        name: &'static str,
        output: Box<dyn ServoOutput>,
        calibration: &AxisCalibration,
        frequency_hz: f64,
    ) -> Result<Self, PibotError> {
        let AxisCalibration {
            min_duty, max_duty, ..
        } = *calibration;
        if !(min_duty.is_finite() && max_duty.is_finite() && min_duty < max_duty) {
            return Err(PibotError::Hardware(format!(
                "{} servo calibration has an empty duty range ({}..{})",
                name, min_duty, max_duty
            )));
        }
        if !(frequency_hz.is_finite() && frequency_hz > 0.0) {
            return Err(PibotError::Hardware(format!(
                "{} servo PWM frequency must be positive, got {}",
                name, frequency_hz
            )));
        }

        let mut axis = GimbalAxis {
            name,
            output,
            angle: 0.0,
            min_duty,
            max_duty,
            frequency_hz,
        };
        axis.point(0.0);
        info!(
            "Controlling the {} servo on channel {} (duty {}..{})",
            name, calibration.channel, min_duty, max_duty
        );
        Ok(axis)
    }

    /// Moves the servo to `degrees`, clamped to +/-90. A NaN request leaves
    /// the axis where it was and re-sends that position.
    pub fn point(&mut self, degrees: f64) {
        if degrees.is_nan() {
            warn!("{} ignoring NaN angle, holding {:.2} deg", self.name, self.angle);
        } else {
            self.angle = clamp_angle(degrees);
        }
        let duty = self.duty_cycle();
        debug!("{} -> {:.2} deg (duty {:.3}%)", self.name, self.angle, duty);
        self.output.pwm(self.frequency_hz, duty);
    }

    /// De-energizes the servo without forgetting its angle.
    pub fn park(&mut self) {
        debug!("{} parked at {:.2} deg", self.name, self.angle);
        self.output.off();
    }

    /// Current logical angle in degrees.
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Duty cycle for the current angle.
    pub fn duty_cycle(&self) -> f64 {
        let mid = (self.min_duty + self.max_duty) / 2.0;
        let half_range = (self.max_duty - self.min_duty) / 2.0;
        mid + half_range * self.angle / ANGLE_LIMIT
    }
}

/// The two-axis mount.
pub struct Gimbal {
    pan: GimbalAxis,
    tilt: GimbalAxis,
}

impl Gimbal {
    /// Pairs the two axes into one mount.
    pub fn new(pan: GimbalAxis, tilt: GimbalAxis) -> Self {
        info!("Created a pan/tilt camera mount");
        Gimbal { pan, tilt }
    }

    /// Points the camera; each axis clamps independently.
    pub fn look_at(&mut self, pan: f64, tilt: f64) {
        self.pan.point(pan);
        self.tilt.point(tilt);
    }

    /// Turns both servo motors off.
    pub fn park(&mut self) {
        self.pan.park();
        self.tilt.park();
    }

    /// Horizontal axis.
    pub fn pan(&self) -> &GimbalAxis {
        &self.pan
    }

    /// Vertical axis.
    pub fn tilt(&self) -> &GimbalAxis {
        &self.tilt
    }

    /// (pan, tilt) in degrees.
    pub fn angles(&self) -> Vector2<f64> {
        Vector2::new(self.pan.angle(), self.tilt.angle())
    }
}
