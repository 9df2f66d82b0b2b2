//! Synthetic camera, video and detector backends.
//!
//! These drive the full pipeline without hardware: the demo binary, the integration
//! tests and the benchmarks all run against them. Faces are placed in millimeters and
//! turned into landmark frames by inverting the head estimator, so a placement comes
//! back out of the estimator unchanged as long as it lies inside the clamp limits.

use crate::config::{DetectorConfig, EstimatorConfig};
use crate::constants::{LEFT_CHEEK_INDEX, NOSE_TIP_INDEX, NUM_FACE_MESH_LANDMARKS, RIGHT_CHEEK_INDEX};
use crate::landmarks::{Camera, CaptureRequest, DetectorLoader, Landmark, LandmarkDetector, LandmarkFrame, VideoSource};
use crate::utils::safe_cast::u32_to_f64;
use crate::{Error, Result};
use log::{debug, info};
use std::cell::Cell;
use std::rc::Rc;

/// Shared, manually advanced clock in milliseconds
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now: Rc<Cell<f64>>,
}

impl SimClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time
    #[must_use]
    pub fn now(&self) -> f64 {
        self.now.get()
    }

    /// Jump to `ms`
    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }

    /// Move forward by `ms`
    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }
}

/// Video stream whose frame timestamps advance at a fixed rate
#[derive(Debug, Clone)]
pub struct SyntheticVideo {
    clock: SimClock,
    width: u32,
    height: u32,
    fps: f64,
    started_ms: f64,
    warmup_ms: f64,
}

impl SyntheticVideo {
    /// Stream starting at the clock's current time
    #[must_use]
    pub fn new(clock: SimClock, width: u32, height: u32, fps: f64) -> Self {
        let started_ms = clock.now();
        Self {
            clock,
            width,
            height,
            fps,
            started_ms,
            warmup_ms: 0.0,
        }
    }

    /// Report no frame until `warmup_ms` after start
    #[must_use]
    pub fn with_warmup(mut self, warmup_ms: f64) -> Self {
        self.warmup_ms = warmup_ms;
        self
    }

    fn elapsed_ms(&self) -> f64 {
        (self.clock.now() - self.started_ms).max(0.0)
    }
}

impl VideoSource for SyntheticVideo {
    fn frame_size(&self) -> Option<(u32, u32)> {
        if self.elapsed_ms() < self.warmup_ms || self.width == 0 || self.height == 0 {
            None
        } else {
            Some((self.width, self.height))
        }
    }

    fn current_time(&self) -> f64 {
        let frame_index = (self.elapsed_ms() * self.fps / 1000.0).floor();
        frame_index / self.fps
    }
}

/// Camera producing [`SyntheticVideo`] streams
#[derive(Debug)]
pub struct SyntheticCamera {
    clock: SimClock,
    supported: bool,
    deny_constrained: bool,
    deny_all: bool,
    size: (u32, u32),
    fps: f64,
    live_streams: usize,
    requests: Vec<CaptureRequest>,
}

impl SyntheticCamera {
    /// Working 320x240 camera at 30 fps
    #[must_use]
    pub fn new(clock: SimClock) -> Self {
        Self {
            clock,
            supported: true,
            deny_constrained: false,
            deny_all: false,
            size: (320, 240),
            fps: 30.0,
            live_streams: 0,
            requests: Vec::new(),
        }
    }

    /// Platform without camera support
    #[must_use]
    pub fn unsupported(mut self) -> Self {
        self.supported = false;
        self
    }

    /// Reject requests carrying constraints; unconstrained ones still succeed
    #[must_use]
    pub fn rejecting_constraints(mut self) -> Self {
        self.deny_constrained = true;
        self
    }

    /// Reject every request, as when permission is denied
    #[must_use]
    pub fn denying_access(mut self) -> Self {
        self.deny_all = true;
        self
    }

    /// Frame size and rate of produced streams
    #[must_use]
    pub fn with_format(mut self, width: u32, height: u32, fps: f64) -> Self {
        self.size = (width, height);
        self.fps = fps;
        self
    }

    /// Streams acquired and not yet released
    #[must_use]
    pub const fn live_streams(&self) -> usize {
        self.live_streams
    }

    /// Every request seen, in order
    #[must_use]
    pub fn requests(&self) -> &[CaptureRequest] {
        &self.requests
    }
}

impl Camera for SyntheticCamera {
    type Stream = SyntheticVideo;

    fn is_supported(&self) -> bool {
        self.supported
    }

    fn acquire(&mut self, request: &CaptureRequest) -> Result<Self::Stream> {
        self.requests.push(*request);
        if self.deny_all {
            return Err(Error::CameraAccess("permission denied".to_string()));
        }
        if self.deny_constrained && !request.is_unconstrained() {
            return Err(Error::CameraAccess("constraints not satisfiable".to_string()));
        }
        self.live_streams += 1;
        debug!("Synthetic camera opened {}x{} @ {}fps", self.size.0, self.size.1, self.fps);
        Ok(SyntheticVideo::new(self.clock.clone(), self.size.0, self.size.1, self.fps))
    }

    fn release(&mut self, _stream: Self::Stream) {
        self.live_streams = self.live_streams.saturating_sub(1);
    }
}

/// Head position to synthesize, relative to the video center
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FacePlacement {
    /// Horizontal displacement
    pub x_mm: f64,
    /// Vertical displacement
    pub y_mm: f64,
    /// Distance from the camera
    pub z_mm: f64,
}

impl FacePlacement {
    #[must_use]
    pub const fn new(x_mm: f64, y_mm: f64, z_mm: f64) -> Self {
        Self { x_mm, y_mm, z_mm }
    }

    /// Centered face at a typical viewing distance
    #[must_use]
    pub const fn centered() -> Self {
        Self::new(0.0, 0.0, 550.0)
    }

    /// Side-to-side sway with `amplitude_mm` and `period_ms`
    #[must_use]
    pub fn sway(t_ms: f64, amplitude_mm: f64, period_ms: f64) -> Self {
        let phase = t_ms / period_ms.max(1.0) * std::f64::consts::TAU;
        Self::new(amplitude_mm * phase.sin(), 0.25 * amplitude_mm * (2.0 * phase).sin(), 550.0)
    }
}

/// Landmark frame that estimates back to `placement` on a `video_w` x `video_h` source
///
/// # Errors
///
/// Returns an error if the video size or depth is not positive.
pub fn synthesize_landmarks(
    placement: FacePlacement,
    video_w: f64,
    video_h: f64,
    config: &EstimatorConfig,
) -> Result<LandmarkFrame> {
    if video_w <= 0.0 || video_h <= 0.0 || placement.z_mm <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "Cannot synthesize a face at {placement:?} on a {video_w}x{video_h} video"
        )));
    }

    let face_w_px = config.assumed_face_width_mm * video_w * config.depth_factor / placement.z_mm;
    let mm_per_px = config.assumed_face_width_mm / face_w_px;
    let cx = video_w / 2.0 + placement.x_mm / mm_per_px;
    let cy = video_h / 2.0 + placement.y_mm / mm_per_px;
    let (nx, ny) = (cx / video_w, cy / video_h);
    let half_w = face_w_px / 2.0 / video_w;

    let mut points = vec![Landmark::new(nx, ny, 0.0); NUM_FACE_MESH_LANDMARKS];
    points[NOSE_TIP_INDEX] = Landmark::new(nx, ny, -0.05);
    points[LEFT_CHEEK_INDEX] = Landmark::new(nx - half_w, ny, 0.0);
    points[RIGHT_CHEEK_INDEX] = Landmark::new(nx + half_w, ny, 0.0);
    LandmarkFrame::new(points)
}

type Script = Box<dyn FnMut(f64) -> Option<FacePlacement>>;

/// Detector that returns faces from a script keyed by detection timestamp
pub struct ScriptedDetector {
    script: Script,
    estimator: EstimatorConfig,
    calls: usize,
}

impl ScriptedDetector {
    /// Detector driven by `script`; `None` means no face
    pub fn from_fn<F>(script: F) -> Self
    where
        F: FnMut(f64) -> Option<FacePlacement> + 'static,
    {
        Self {
            script: Box::new(script),
            estimator: EstimatorConfig::default(),
            calls: 0,
        }
    }

    /// Detector that always sees the same face
    #[must_use]
    pub fn still(placement: FacePlacement) -> Self {
        Self::from_fn(move |_| Some(placement))
    }

    /// Detector that never sees a face
    #[must_use]
    pub fn empty() -> Self {
        Self::from_fn(|_| None)
    }

    /// Use the geometry of `estimator` when synthesizing landmarks
    #[must_use]
    pub fn with_estimator(mut self, estimator: EstimatorConfig) -> Self {
        self.estimator = estimator;
        self
    }

    /// Number of detector invocations
    #[must_use]
    pub const fn calls(&self) -> usize {
        self.calls
    }
}

impl std::fmt::Debug for ScriptedDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedDetector").field("calls", &self.calls).finish_non_exhaustive()
    }
}

impl LandmarkDetector for ScriptedDetector {
    fn detect(&mut self, source: &dyn VideoSource, timestamp_ms: f64) -> Result<Option<LandmarkFrame>> {
        self.calls += 1;
        let (w, h) = source
            .frame_size()
            .ok_or_else(|| Error::Detection("video has no frame".to_string()))?;
        match (self.script)(timestamp_ms) {
            Some(placement) => {
                synthesize_landmarks(placement, u32_to_f64(w), u32_to_f64(h), &self.estimator).map(Some)
            }
            None => Ok(None),
        }
    }
}

/// Loader handing out one prepared [`ScriptedDetector`]
#[derive(Debug, Default)]
pub struct SyntheticLoader {
    detector: Option<ScriptedDetector>,
    fail: bool,
    loads: usize,
}

impl SyntheticLoader {
    #[must_use]
    pub fn new(detector: ScriptedDetector) -> Self {
        Self {
            detector: Some(detector),
            fail: false,
            loads: 0,
        }
    }

    /// Loader whose model never loads
    #[must_use]
    pub fn failing() -> Self {
        Self {
            detector: None,
            fail: true,
            loads: 0,
        }
    }

    /// Number of load attempts
    #[must_use]
    pub const fn loads(&self) -> usize {
        self.loads
    }
}

impl DetectorLoader for SyntheticLoader {
    type Detector = ScriptedDetector;

    fn load(&mut self, options: &DetectorConfig) -> Result<Self::Detector> {
        self.loads += 1;
        if self.fail {
            return Err(Error::ModelLoad(format!("{} unavailable", options.model_path.display())));
        }
        let detector = self
            .detector
            .take()
            .ok_or_else(|| Error::ModelLoad("detector already handed out".to_string()))?;
        info!(
            "Loaded {} ({:?}, {} face)",
            options.model_path.display(),
            options.delegate,
            options.num_faces
        );
        Ok(detector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::head_estimator::HeadEstimator;

    #[test]
    fn test_synthesized_landmarks_round_trip() {
        let est = HeadEstimator::default();
        let placement = FacePlacement::new(35.0, -20.0, 600.0);
        let frame = synthesize_landmarks(placement, 320.0, 240.0, est.config()).unwrap();
        let sample = est.estimate(&frame, 320.0, 240.0);

        assert_eq!(frame.len(), NUM_FACE_MESH_LANDMARKS);
        assert!((sample.x_mm - 35.0).abs() < 1e-9);
        assert!((sample.y_mm + 20.0).abs() < 1e-9);
        assert!((sample.z_mm - 600.0).abs() < 1e-9);
    }

    #[test]
    fn test_synthesize_rejects_bad_geometry() {
        let cfg = EstimatorConfig::default();
        assert!(synthesize_landmarks(FacePlacement::centered(), 0.0, 240.0, &cfg).is_err());
        assert!(synthesize_landmarks(FacePlacement::new(0.0, 0.0, 0.0), 320.0, 240.0, &cfg).is_err());
    }

    #[test]
    fn test_video_time_quantized_to_frames() {
        let clock = SimClock::new();
        let video = SyntheticVideo::new(clock.clone(), 320, 240, 10.0);
        clock.set(99.0);
        assert_eq!(video.current_time(), 0.0);
        clock.set(100.0);
        assert!((video.current_time() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_warmup_hides_frames() {
        let clock = SimClock::new();
        let video = SyntheticVideo::new(clock.clone(), 320, 240, 30.0).with_warmup(50.0);
        assert_eq!(video.frame_size(), None);
        clock.advance(50.0);
        assert_eq!(video.frame_size(), Some((320, 240)));
    }

    #[test]
    fn test_camera_constraint_fallback() {
        let mut camera = SyntheticCamera::new(SimClock::new()).rejecting_constraints();
        let preferred = CaptureRequest::preferred(&crate::config::CameraConfig::default());
        assert!(matches!(camera.acquire(&preferred), Err(Error::CameraAccess(_))));
        let stream = camera.acquire(&CaptureRequest::any()).unwrap();
        assert_eq!(camera.live_streams(), 1);
        camera.release(stream);
        assert_eq!(camera.live_streams(), 0);
        assert_eq!(camera.requests().len(), 2);
    }

    #[test]
    fn test_loader_hands_out_once() {
        let mut loader = SyntheticLoader::new(ScriptedDetector::empty());
        let options = DetectorConfig::default();
        assert!(loader.load(&options).is_ok());
        assert!(matches!(loader.load(&options), Err(Error::ModelLoad(_))));
        assert_eq!(loader.loads(), 2);

        let mut failing = SyntheticLoader::failing();
        assert!(failing.load(&options).is_err());
    }

    #[test]
    fn test_scripted_detector_needs_frame() {
        let clock = SimClock::new();
        let video = SyntheticVideo::new(clock, 320, 240, 30.0).with_warmup(100.0);
        let mut det = ScriptedDetector::still(FacePlacement::centered());
        assert!(det.detect(&video, 0.0).is_err());
        assert_eq!(det.calls(), 1);
    }
}
