//! Landmark frames and the external collaborators that produce them.
//!
//! The face-landmark model, the camera and the video element are outside this crate.
//! They are consumed through the traits below so the tracking pipeline can run against
//! real backends or the synthetic ones in [`crate::simulation`].

use crate::config::{CameraConfig, DetectorConfig, FacingMode};
use crate::constants::{LEFT_CHEEK_INDEX, NOSE_TIP_INDEX, RIGHT_CHEEK_INDEX};
use crate::{Error, Result};

/// A single landmark in normalized video coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    /// Horizontal position in [0, 1]
    pub x: f64,
    /// Vertical position in [0, 1]
    pub y: f64,
    /// Relative depth, unused by the estimator
    pub z: f64,
}

impl Landmark {
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// One detected face, indexed by anatomical landmark id
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkFrame {
    points: Vec<Landmark>,
}

impl LandmarkFrame {
    /// Wrap a detector result
    ///
    /// # Errors
    ///
    /// Returns an error if the frame is too short to contain the nose tip and both
    /// cheek edges.
    pub fn new(points: Vec<Landmark>) -> Result<Self> {
        let required = NOSE_TIP_INDEX.max(LEFT_CHEEK_INDEX).max(RIGHT_CHEEK_INDEX) + 1;
        if points.len() < required {
            return Err(Error::InvalidInput(format!(
                "Landmark frame has {} points, at least {required} required",
                points.len()
            )));
        }
        Ok(Self { points })
    }

    /// Number of points
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a validated frame
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Landmark by index
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.points.get(index)
    }

    /// Nose tip, the head-center proxy
    #[must_use]
    pub fn nose_tip(&self) -> Landmark {
        self.points[NOSE_TIP_INDEX]
    }

    /// Left cheek edge
    #[must_use]
    pub fn left_cheek(&self) -> Landmark {
        self.points[LEFT_CHEEK_INDEX]
    }

    /// Right cheek edge
    #[must_use]
    pub fn right_cheek(&self) -> Landmark {
        self.points[RIGHT_CHEEK_INDEX]
    }
}

/// A video element the detector reads frames from
pub trait VideoSource {
    /// Pixel dimensions of the current decoded frame, `None` until one exists
    fn frame_size(&self) -> Option<(u32, u32)>;

    /// Media timestamp of the current frame in seconds
    fn current_time(&self) -> f64;
}

/// Face landmark detector
pub trait LandmarkDetector {
    /// Run the detector on the current frame of `source`
    ///
    /// Returns `Ok(None)` when no face is visible.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails; callers treat this as a skipped tick.
    fn detect(&mut self, source: &dyn VideoSource, timestamp_ms: f64) -> Result<Option<LandmarkFrame>>;
}

/// Creates a detector from configuration; loading may be slow and may fail
pub trait DetectorLoader {
    /// Concrete detector type
    type Detector: LandmarkDetector;

    /// Load the model
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelLoad`] if the model cannot be fetched or initialized.
    fn load(&mut self, options: &DetectorConfig) -> Result<Self::Detector>;
}

/// Capture constraints passed to [`Camera::acquire`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureRequest {
    /// Ideal frame size
    pub ideal_size: Option<(u32, u32)>,
    /// Ideal frame rate
    pub ideal_frame_rate: Option<u32>,
    /// Facing preference
    pub facing_mode: Option<FacingMode>,
}

impl CaptureRequest {
    /// Preferred low-resolution, front-facing request
    #[must_use]
    pub const fn preferred(config: &CameraConfig) -> Self {
        Self {
            ideal_size: Some((config.ideal_width, config.ideal_height)),
            ideal_frame_rate: Some(config.ideal_frame_rate),
            facing_mode: Some(config.facing_mode),
        }
    }

    /// Any camera at all
    #[must_use]
    pub const fn any() -> Self {
        Self {
            ideal_size: None,
            ideal_frame_rate: None,
            facing_mode: None,
        }
    }

    /// True when no constraint is set
    #[must_use]
    pub const fn is_unconstrained(&self) -> bool {
        self.ideal_size.is_none() && self.ideal_frame_rate.is_none() && self.facing_mode.is_none()
    }
}

/// Camera acquisition
pub trait Camera {
    /// Live stream type; also the video source the detector reads
    type Stream: VideoSource;

    /// Whether the platform can capture at all
    fn is_supported(&self) -> bool;

    /// Open a live stream
    ///
    /// # Errors
    ///
    /// Returns [`Error::CameraAccess`] if permission is denied or no device matches.
    fn acquire(&mut self, request: &CaptureRequest) -> Result<Self::Stream>;

    /// Stop every track of `stream`
    fn release(&mut self, stream: Self::Stream);
}
