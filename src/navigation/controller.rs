// src/navigation/controller.rs
//! Proportional visual servo and the chase decision that follows it.
//! Pure functions of the current gimbal angles and one detection, so the
//! control law can be checked without any hardware.

use nalgebra::Vector2;

use crate::core::{Detection, clamp_angle};
use crate::{FrameConfig, TrackingConfig};

/// New (pan, tilt) for the gimbal: the old angles plus a correction
/// proportional to the target's offset from the frame centre.
///
/// A target at the right edge adds `angular_gain / 2` degrees of pan; a
/// target at the top edge adds `angular_gain / 2` degrees of tilt. The result
/// is clamped the same way the gimbal clamps it. An axis with a zero-pixel
/// frame dimension gets no correction.
pub fn servo_correction(
    current: Vector2<f64>,
    detection: &Detection,
    frame: &FrameConfig,
    angular_gain: f64,
) -> Vector2<f64> {
    let size = Vector2::new(frame.width as f64, frame.height as f64);
    let offset = detection.center() - size / 2.0;
    let pan = if size.x > 0.0 {
        current.x + offset.x / size.x * angular_gain
    } else {
        current.x
    };
    // image y grows downward, tilt grows upward
    let tilt = if size.y > 0.0 {
        current.y - offset.y / size.y * angular_gain
    } else {
        current.y
    };
    Vector2::new(clamp_angle(pan), clamp_angle(tilt))
}

/// What the wheels should do while the target is in view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PursuitCommand {
    /// Camera is looking up at the target: stay put.
    Hold,
    /// Target is close: turn on the spot toward it.
    Spin {
        /// Left wheel speed
        left: f64,
        /// Right wheel speed
        right: f64,
    },
    /// Chase, curving toward the target.
    Follow {
        /// Left wheel speed
        left: f64,
        /// Right wheel speed
        right: f64,
    },
}

impl PursuitCommand {
    /// Wheel speeds, or `None` for a stop.
    pub fn wheel_speeds(&self) -> Option<(f64, f64)> {
        match *self {
            PursuitCommand::Hold => None,
            PursuitCommand::Spin { left, right } | PursuitCommand::Follow { left, right } => {
                Some((left, right))
            }
        }
    }
}

/// Chooses the drive behaviour from the corrected gimbal angles and the
/// target's apparent radius, checking elevation first, then size.
pub fn decide_pursuit(corrected: Vector2<f64>, radius: f64, config: &TrackingConfig) -> PursuitCommand {
    let pan = corrected.x;
    if corrected.y > config.elevation_stop_deg {
        PursuitCommand::Hold
    } else if radius > config.max_target_radius {
        PursuitCommand::Spin {
            left: pan,
            right: -pan,
        }
    } else {
        let k = config.follow_turn_gain;
        let cruise = config.cruise_speed;
        if pan > 0.0 {
            PursuitCommand::Follow {
                left: cruise,
                right: cruise - k * pan,
            }
        } else {
            PursuitCommand::Follow {
                left: cruise + k * pan,
                right: cruise,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn tracking() -> TrackingConfig {
        TrackingConfig::default()
    }

    #[test]
    fn centred_target_needs_no_correction() {
        let current = Vector2::new(12.0, -4.0);
        let d = Detection::new(160.0, 120.0, 30.0);
        let corrected = servo_correction(current, &d, &FrameConfig::default(), 20.0);
        assert_eq!(corrected, current);
    }

    #[test]
    fn correction_is_relative_to_current_angle() {
        let d = Detection::new(320.0, 0.0, 30.0);
        let corrected = servo_correction(Vector2::new(5.0, 5.0), &d, &FrameConfig::default(), 20.0);
        assert!((corrected.x - 15.0).abs() < 1e-9);
        assert!((corrected.y - 15.0).abs() < 1e-9);
    }

    #[test]
    fn correction_is_clamped() {
        let d = Detection::new(320.0, 240.0, 30.0);
        let corrected =
            servo_correction(Vector2::new(88.0, -85.0), &d, &FrameConfig::default(), 20.0);
        assert_eq!(corrected, Vector2::new(90.0, -90.0));
    }

    #[test]
    fn empty_frame_leaves_angles_alone() {
        let frame = FrameConfig {
            width: 0,
            height: 0,
        };
        let d = Detection::new(0.0, 0.0, 30.0);
        let corrected = servo_correction(Vector2::new(-20.0, 10.0), &d, &frame, 20.0);
        assert_eq!(corrected, Vector2::new(-20.0, 10.0));
    }

    #[test]
    fn high_target_holds_position() {
        let cmd = decide_pursuit(Vector2::new(10.0, 15.5), 200.0, &tracking());
        assert_eq!(cmd, PursuitCommand::Hold);
        assert_eq!(cmd.wheel_speeds(), None);
    }

    #[test]
    fn elevation_at_threshold_still_chases() {
        let cmd = decide_pursuit(Vector2::new(0.0, 15.0), 50.0, &tracking());
        assert!(matches!(cmd, PursuitCommand::Follow { .. }));
    }

    #[test]
    fn close_target_spins_in_place() {
        let cmd = decide_pursuit(Vector2::new(-12.0, 0.0), 81.0, &tracking());
        assert_eq!(
            cmd,
            PursuitCommand::Spin {
                left: -12.0,
                right: 12.0
            }
        );
    }

    #[rstest]
    #[case(10.0, 100.0, 80.0)]
    #[case(45.0, 100.0, 10.0)]
    #[case(0.0, 100.0, 100.0)]
    #[case(-10.0, 80.0, 100.0)]
    #[case(-45.0, 10.0, 100.0)]
    fn follow_curves_toward_target(#[case] pan: f64, #[case] left: f64, #[case] right: f64) {
        let cmd = decide_pursuit(Vector2::new(pan, 0.0), 80.0, &tracking());
        assert_eq!(cmd, PursuitCommand::Follow { left, right });
    }
}
