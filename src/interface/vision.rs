// src/interface/vision.rs
//! Input side of the hardware boundary: per-frame target detections, the
//! operator's start/quit controls and the optional status display.
//!
//! Sources and displays hold real resources (camera, window), so they are
//! handed to the run loop wrapped in `Scoped`, which releases them on drop.

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::path::Path;

use log::info;

use crate::PibotError;
use crate::core::{Detection, Frame};
use crate::navigation::RobotStatus;

/// A resource that must be given back when the run loop ends.
pub trait Release {
    /// Give the resource back. Called once, from `Scoped`'s drop.
    fn release(&mut self);
}

/// Produces one `Frame` per captured camera image.
///
/// `Ok(None)` means the stream has ended (camera closed, script exhausted).
pub trait VisionSource: Release {
    /// The next frame, `Ok(None)` once the stream is over.
    fn next_frame(&mut self) -> Result<Option<Frame>, PibotError>;
}

/// Receives a status snapshot every frame.
pub trait StatusDisplay: Release {
    /// Render one snapshot.
    fn show(&mut self, status: &RobotStatus);
}

/// The button-equivalent triggers of the process control surface.
pub trait ControlSurface {
    /// True once the "begin operation" trigger has fired.
    fn start_pressed(&mut self) -> bool;
    /// True once the operator has asked to quit.
    fn quit_requested(&mut self) -> bool;
}

impl<T: Release + ?Sized> Release for &mut T {
    fn release(&mut self) {
        (**self).release();
    }
}

impl<T: VisionSource + ?Sized> VisionSource for &mut T {
    fn next_frame(&mut self) -> Result<Option<Frame>, PibotError> {
        (**self).next_frame()
    }
}

impl<T: StatusDisplay + ?Sized> StatusDisplay for &mut T {
    fn show(&mut self, status: &RobotStatus) {
        (**self).show(status);
    }
}

/// Owns a resource and releases it exactly once when dropped, whatever path
/// the owner leaves by.
pub struct Scoped<T: Release> {
    inner: T,
}

impl<T: Release> Scoped<T> {
    /// Takes charge of releasing `inner`.
    pub fn new(inner: T) -> Self {
        Scoped { inner }
    }
}

impl<T: Release> Deref for Scoped<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T: Release> DerefMut for Scoped<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}

impl<T: Release> Drop for Scoped<T> {
    fn drop(&mut self) {
        self.inner.release();
    }
}

/// Replays a fixed list of frames, standing in for camera + blob detector.
///
/// The YAML form is a sequence where each entry is either a detection map or
/// `~` for a frame without a target:
///
/// ```yaml
/// - ~
/// - { x: 160, y: 120, radius: 50 }
/// ```
#[derive(Debug, Default)]
pub struct ScriptedVision {
    frames: VecDeque<Frame>,
    released: bool,
}

impl ScriptedVision {
    /// Source that yields `frames` in order, then ends.
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        ScriptedVision {
            frames: frames.into_iter().collect(),
            released: false,
        }
    }

    /// Parses a detection script from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, PibotError> {
        let entries: Vec<Option<Detection>> = serde_yaml::from_str(text)?;
        Ok(Self::new(entries.into_iter().map(Frame::from)))
    }

    /// Loads a detection script from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PibotError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let vision = Self::from_yaml_str(&text)?;
        info!(
            "Loaded {} scripted frames from {}",
            vision.remaining(),
            path.as_ref().display()
        );
        Ok(vision)
    }

    /// Frames not yet delivered.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }

    /// True once the run loop has let go of the source.
    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl VisionSource for ScriptedVision {
    fn next_frame(&mut self) -> Result<Option<Frame>, PibotError> {
        if self.released {
            return Err(PibotError::Vision("source already released".to_string()));
        }
        Ok(self.frames.pop_front())
    }
}

impl Release for ScriptedVision {
    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.frames.clear();
            info!("Scripted vision source released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_present_and_absent_frames() {
        let mut vision =
            ScriptedVision::from_yaml_str("- ~\n- { x: 160, y: 120, radius: 50 }\n").unwrap();

        assert_eq!(vision.remaining(), 2);
        assert_eq!(vision.next_frame().unwrap(), Some(Frame::NoTarget));
        match vision.next_frame().unwrap() {
            Some(Frame::Target(d)) => {
                assert_eq!(d.x, 160.0);
                assert_eq!(d.y, 120.0);
                assert_eq!(d.radius, 50.0);
            }
            other => panic!("expected a target, got {:?}", other),
        }
        assert_eq!(vision.next_frame().unwrap(), None);
    }

    #[test]
    fn rejects_malformed_script() {
        assert!(ScriptedVision::from_yaml_str("- { x: 1 }").is_err());
    }

    #[test]
    fn scoped_releases_on_drop() {
        let mut released = false;
        {
            struct Flag<'a>(&'a mut bool);
            impl Release for Flag<'_> {
                fn release(&mut self) {
                    *self.0 = true;
                }
            }
            let _guard = Scoped::new(Flag(&mut released));
        }
        assert!(released);
    }

    #[test]
    fn released_source_refuses_frames() {
        let mut vision = ScriptedVision::new(vec![Frame::NoTarget]);
        vision.release();
        assert!(vision.is_released());
        assert!(vision.next_frame().is_err());
    }
}
