// src/navigation/planner.rs
//! Search pattern for a lost target. The camera sweeps an ellipse around where
//! it was pointing when the target disappeared, starting on the side it was
//! already facing.

use nalgebra::Vector2;

use crate::ScanConfig;

/// Sign of an axis angle, with zero counted as positive.
///
/// A centred axis would otherwise give the sweep zero amplitude on that axis.
pub fn sweep_sign(angle: f64) -> f64 {
    if angle < 0.0 { -1.0 } else { 1.0 }
}

/// A fixed list of (pan, tilt) gimbal waypoints for one scan episode.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPattern {
    waypoints: Vec<Vector2<f64>>,
    pan_sign: f64,
}

impl ScanPattern {
    /// Generates `config.steps` waypoints around `origin` (pan, tilt).
    ///
    /// Waypoint `i` sits at angle `theta = 360 * i / steps` degrees, offset by
    /// `pan_amplitude * sign(pan) * cos(theta)` and
    /// `tilt_amplitude * sign(tilt) * sin(theta)`. Angles are not clamped here;
    /// the gimbal does that when it is pointed.
    pub fn generate(origin: Vector2<f64>, config: &ScanConfig) -> Self {
        let pan_sign = sweep_sign(origin.x);
        let tilt_sign = sweep_sign(origin.y);
        let steps = config.steps;

        let waypoints = (0..steps)
            .map(|i| {
                let theta = (360.0 * i as f64 / steps as f64).to_radians();
                let offset = Vector2::new(
                    config.pan_amplitude_deg * pan_sign * theta.cos(),
                    config.tilt_amplitude_deg * tilt_sign * theta.sin(),
                );
                origin + offset
            })
            .collect();

        ScanPattern {
            waypoints,
            pan_sign,
        }
    }

    /// Number of waypoints.
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// True for a zero-step pattern.
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Waypoint `index` as (pan, tilt), `None` past the end.
    pub fn get(&self, index: usize) -> Option<Vector2<f64>> {
        self.waypoints.get(index).copied()
    }

    /// All waypoints in sweep order.
    pub fn waypoints(&self) -> &[Vector2<f64>] {
        &self.waypoints
    }

    /// +1 to spin right, -1 to spin left once the sweep is exhausted: the
    /// side of the first waypoint's pan offset.
    pub fn spin_direction(&self) -> f64 {
        self.pan_sign
    }
}
