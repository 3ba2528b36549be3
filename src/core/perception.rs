// core/perception.rs

//! What the controller sees of each camera frame: at most one target blob,
//! reduced to its centre and apparent radius. Blob extraction happens upstream;
//! here detections are filtered by size and short dropouts are debounced so a
//! single missed frame does not count as losing the target.

// Dependencies
use log::{debug, warn};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// A target blob in pixel coordinates of the captured frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Horizontal centre, pixels from the left edge
    pub x: f64,
    /// Vertical centre, pixels from the top edge
    pub y: f64,
    /// Radius of the minimum enclosing circle, a proxy for distance.
    pub radius: f64,
}

impl Detection {
    /// Blob centred at (`x`, `y`) with the given radius.
    pub fn new(x: f64, y: f64, radius: f64) -> Self {
        Detection { x, y, radius }
    }

    /// Blob centre as a pixel vector.
    pub fn center(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

/// Vision output for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Frame {
    /// The largest blob found in the frame
    Target(Detection),
    /// Nothing of the target colour in view
    NoTarget,
}

impl From<Option<Detection>> for Frame {
    fn from(detection: Option<Detection>) -> Self {
        match detection {
            Some(d) => Frame::Target(d),
            None => Frame::NoTarget,
        }
    }
}

/// What the controller should do with a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Observation {
    /// A usable target: track it.
    Track(Detection),
    /// No target, but not missing for long enough to call it lost.
    Hold,
    /// Target lost: run the search behaviour.
    Search,
}

/// Counts consecutive frames without a usable target.
#[derive(Debug, Clone)]
pub struct LossMonitor {
    lost_frame_threshold: u32,
    min_target_radius: f64,
    lost_frames: u32,
}

impl LossMonitor {
    /// Monitor that tolerates `lost_frame_threshold` misses and ignores blobs
    /// no larger than `min_target_radius`.
    pub fn new(lost_frame_threshold: u32, min_target_radius: f64) -> Self {
        LossMonitor {
            lost_frame_threshold,
            min_target_radius,
            lost_frames: 0,
        }
    }

    /// Classifies a frame and updates the lost-frame counter.
    ///
    /// Tiny or non-finite blobs count as no target. The counter is bumped
    /// before the threshold test, so with a threshold of 4 the fifth empty
    /// frame in a row is the first to return `Search`.
    pub fn observe(&mut self, frame: &Frame) -> Observation {
        if let Some(detection) = self.qualify(frame) {
            if self.lost_frames > 0 {
                debug!("target reacquired after {} frames", self.lost_frames);
            }
            self.lost_frames = 0;
            return Observation::Track(detection);
        }

        self.lost_frames = self.lost_frames.saturating_add(1);
        if self.lost_frames > self.lost_frame_threshold {
            Observation::Search
        } else {
            Observation::Hold
        }
    }

    fn qualify(&self, frame: &Frame) -> Option<Detection> {
        match frame {
            Frame::Target(d) => {
                let finite = d.x.is_finite() && d.y.is_finite() && d.radius.is_finite();
                if finite && d.radius > self.min_target_radius {
                    Some(*d)
                } else {
                    warn!(
                        "ignoring detection at ({}, {}) with radius {}",
                        d.x, d.y, d.radius
                    );
                    None
                }
            }
            Frame::NoTarget => None,
        }
    }

    /// Consecutive frames without a usable target.
    pub fn lost_frames(&self) -> u32 {
        self.lost_frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn seen() -> Frame {
        Frame::Target(Detection::new(160.0, 120.0, 50.0))
    }

    #[test]
    fn four_misses_are_tolerated() {
        let mut monitor = LossMonitor::new(4, 0.1);
        for _ in 0..4 {
            assert_eq!(monitor.observe(&Frame::NoTarget), Observation::Hold);
        }
        assert!(matches!(monitor.observe(&seen()), Observation::Track(_)));
        assert_eq!(monitor.lost_frames(), 0);
    }

    #[test]
    fn fifth_miss_starts_search() {
        let mut monitor = LossMonitor::new(4, 0.1);
        for _ in 0..4 {
            monitor.observe(&Frame::NoTarget);
        }
        assert_eq!(monitor.observe(&Frame::NoTarget), Observation::Search);
        assert_eq!(monitor.observe(&Frame::NoTarget), Observation::Search);
        assert_eq!(monitor.lost_frames(), 6);
    }

    #[rstest]
    #[case(Detection::new(10.0, 10.0, 0.1))]
    #[case(Detection::new(10.0, 10.0, 0.0))]
    #[case(Detection::new(f64::NAN, 10.0, 5.0))]
    fn unusable_blobs_count_as_misses(#[case] detection: Detection) {
        let mut monitor = LossMonitor::new(0, 0.1);
        assert_eq!(monitor.observe(&Frame::Target(detection)), Observation::Search);
        assert_eq!(monitor.lost_frames(), 1);
    }

    #[test]
    fn frame_from_option() {
        assert_eq!(Frame::from(None), Frame::NoTarget);
        assert_eq!(
            Frame::from(Some(Detection::new(1.0, 2.0, 3.0))),
            Frame::Target(Detection::new(1.0, 2.0, 3.0))
        );
    }
}
