//! Tracking session lifecycle.
//!
//! A [`ParallaxSession`] owns the camera, the detector, both loop states and the
//! presentation sink. The host calls [`ParallaxSession::frame`] once per display frame;
//! detection and rendering then run as two independently scheduled tasks that share
//! nothing but the [`TargetCell`].
//!
//! Setup failures (no camera support, model load failure, camera denied) are reported
//! once through the sink as a terminal status with a retry control and returned to the
//! caller. Per-frame detector failures never stop the session.

use crate::calibration::{ScreenCalibration, Viewport};
use crate::config::Config;
use crate::detection::{DetectionPipelineState, DetectionReport};
use crate::head_estimator::HeadSample;
use crate::jitter::{Baseline, SmoothedHeadState};
use crate::landmarks::{Camera, CaptureRequest, DetectorLoader};
use crate::perspective::{DisplayOrigin, PerspectiveParams};
use crate::presentation::{status_text, PresentationSink, StartControl, TrackingStatus};
use crate::render::{RenderPipelineState, RenderState};
use crate::target::{TargetCell, TargetSnapshot};
use crate::{Error, Result};
use log::{debug, error, info, warn};

/// Result of one host frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    /// Detection task result, `None` when no stream is open
    pub detection: Option<DetectionReport>,
    /// Origin written this frame
    pub origin: Option<DisplayOrigin>,
}

/// A head-tracking parallax session
pub struct ParallaxSession<C: Camera, L: DetectorLoader, S: PresentationSink> {
    config: Config,
    camera: C,
    loader: L,
    sink: S,
    detector: Option<L::Detector>,
    stream: Option<C::Stream>,
    tracking: bool,
    status: TrackingStatus,
    viewport: Viewport,
    calibration: ScreenCalibration,
    target: TargetCell,
    detection: DetectionPipelineState,
    render: RenderPipelineState,
}

impl<C: Camera, L: DetectorLoader, S: PresentationSink> ParallaxSession<C, L, S> {
    /// Create an idle session and publish the initial perspective parameters
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration does not validate.
    pub fn new(config: Config, camera: C, loader: L, sink: S, viewport: Viewport) -> Result<Self> {
        config.validate()?;
        let calibration = ScreenCalibration::from_config(&config.screen);
        let detection = DetectionPipelineState::new(&config);
        let render = RenderPipelineState::new(&config);
        let mut session = Self {
            config,
            camera,
            loader,
            sink,
            detector: None,
            stream: None,
            tracking: false,
            status: TrackingStatus::Off,
            viewport,
            calibration,
            target: TargetCell::new(),
            detection,
            render,
        };
        session.publish_params();
        session.sink.start_control(StartControl::Ready);
        Ok(session)
    }

    /// Start tracking
    ///
    /// Checks camera support, loads the detector on first use, opens the camera with
    /// the preferred constraints (falling back to any camera), then resets every piece
    /// of tracking state and activates both loops. Does nothing when already tracking.
    ///
    /// # Errors
    ///
    /// Returns the setup failure after reporting it through the sink.
    pub fn start(&mut self) -> Result<()> {
        if self.tracking {
            debug!("start requested while already tracking");
            return Ok(());
        }
        self.sink.start_control(StartControl::Busy);

        if !self.camera.is_supported() {
            return Err(self.fail_setup(Error::CameraUnsupported));
        }

        if self.detector.is_none() {
            self.sink.status(self.status, status_text::LOADING_MODEL);
            match self.loader.load(&self.config.detector) {
                Ok(detector) => self.detector = Some(detector),
                Err(e) => return Err(self.fail_setup(e)),
            }
        }

        let stream = match self.open_camera() {
            Ok(stream) => stream,
            Err(e) => return Err(self.fail_setup(e)),
        };
        self.stream = Some(stream);

        self.sink.start_control(StartControl::Hidden);
        self.set_status(TrackingStatus::Searching, status_text::DETECTING);

        self.tracking = true;
        self.target.clear();
        self.render.start(self.target.load());
        self.detection.start();
        info!("Tracking started ({} profile)", self.config.profile);
        Ok(())
    }

    fn open_camera(&mut self) -> Result<C::Stream> {
        let preferred = CaptureRequest::preferred(&self.config.camera);
        match self.camera.acquire(&preferred) {
            Ok(stream) => Ok(stream),
            Err(e) => {
                warn!("Preferred camera request failed ({e}), retrying without constraints");
                self.camera.acquire(&CaptureRequest::any())
            }
        }
    }

    fn fail_setup(&mut self, err: Error) -> Error {
        let text = match &err {
            Error::CameraUnsupported => status_text::CAMERA_UNSUPPORTED,
            Error::ModelLoad(_) => status_text::MODEL_FAILED,
            Error::CameraAccess(_) => status_text::CAMERA_FAILED,
            _ => "",
        };
        if text.is_empty() {
            self.report_fatal(&err.to_string());
        } else {
            error!("{err}");
            self.teardown();
            self.set_status(TrackingStatus::Off, text);
            self.sink.start_control(StartControl::Retry);
        }
        err
    }

    /// Stop tracking and return everything to the idle, centered state
    pub fn stop(&mut self) {
        self.teardown();
        self.sink.start_control(StartControl::Ready);
        self.set_status(TrackingStatus::Off, status_text::IDLE);
        self.sink.readout("");
        if let Some(origin) = self.render.present(0.0, 0.0, self.viewport) {
            self.sink.perspective_origin(origin);
        }
        info!("Tracking stopped");
    }

    fn teardown(&mut self) {
        self.tracking = false;
        self.detection.stop();
        self.render.stop();
        self.render.reset();
        self.target.clear();
        if let Some(stream) = self.stream.take() {
            self.camera.release(stream);
        }
    }

    /// Make the current head position the new center
    ///
    /// Only acts while tracking. Target, smoothing and velocity are zeroed.
    pub fn calibrate(&mut self) {
        if !self.tracking {
            return;
        }
        self.detection.recalibrate(&self.target);
        self.render.reset();
        let baseline = self.detection.baseline();
        info!("Calibrated at ({:.1}, {:.1}) mm", baseline.x, baseline.y);
    }

    /// Run the detection task then the render task for one host frame
    pub fn frame(&mut self, now_ms: f64) -> FrameReport {
        let detection = match (self.stream.as_ref(), self.detector.as_mut()) {
            (Some(stream), Some(detector)) => Some(self.detection.tick(
                now_ms,
                self.tracking,
                stream,
                detector,
                self.viewport,
                &self.target,
            )),
            _ => None,
        };

        if let Some(report) = &detection {
            match report.status_change {
                Some(TrackingStatus::Tracking) => self.set_status(TrackingStatus::Tracking, status_text::TRACKING),
                Some(TrackingStatus::Searching) => self.set_status(TrackingStatus::Searching, status_text::SEARCHING),
                Some(TrackingStatus::Off) | None => {}
            }
            if let Some(text) = &report.readout {
                self.sink.readout(text);
            }
        }

        let origin = self.render.tick(now_ms, &self.target, self.viewport);
        if let Some(origin) = origin {
            self.sink.perspective_origin(origin);
        }

        FrameReport { detection, origin }
    }

    /// Viewport changed: recompute and publish perspective parameters
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.publish_params();
    }

    fn publish_params(&mut self) {
        let params = PerspectiveParams::compute(&self.calibration, self.viewport);
        self.sink.perspective_params(params);
    }

    /// Pointer moved to `(x, y)` in viewport pixels
    ///
    /// While idle the pointer offset from the viewport center drives the origin directly.
    /// Ignored while tracking.
    pub fn pointer_moved(&mut self, x: f64, y: f64) {
        if self.tracking {
            return;
        }
        let (cx, cy) = self.viewport.center();
        if let Some(origin) = self.render.present(x - cx, y - cy, self.viewport) {
            self.sink.perspective_origin(origin);
        }
    }

    /// Report an unexpected failure: tear down and offer a retry
    pub fn report_fatal(&mut self, message: &str) {
        error!("Fatal: {message}");
        self.teardown();
        self.set_status(TrackingStatus::Off, &format!("Error: {message}"));
        self.sink.start_control(StartControl::Retry);
    }

    fn set_status(&mut self, status: TrackingStatus, text: &str) {
        self.status = status;
        self.sink.status(status, text);
    }

    /// Whether tracking is active
    #[must_use]
    pub const fn is_tracking(&self) -> bool {
        self.tracking
    }

    /// Current tracking indicator
    #[must_use]
    pub const fn status(&self) -> TrackingStatus {
        self.status
    }

    /// Calibration origin
    #[must_use]
    pub const fn baseline(&self) -> Baseline {
        self.detection.baseline()
    }

    /// Smoothed head state
    #[must_use]
    pub fn head_state(&self) -> SmoothedHeadState {
        self.detection.head_state()
    }

    /// Most recent raw head estimate
    #[must_use]
    pub const fn last_sample(&self) -> Option<HeadSample> {
        self.detection.last_sample()
    }

    /// Latest published target
    #[must_use]
    pub fn target(&self) -> TargetSnapshot {
        self.target.load()
    }

    /// Render-side state
    #[must_use]
    pub fn render_state(&self) -> RenderState {
        self.render.state()
    }

    /// Last origin written
    #[must_use]
    pub const fn last_origin(&self) -> Option<DisplayOrigin> {
        self.render.last_origin()
    }

    /// Current viewport
    #[must_use]
    pub const fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Presentation sink
    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Presentation sink, mutably
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Camera backend
    #[must_use]
    pub const fn camera(&self) -> &C {
        &self.camera
    }

    /// Detector loader
    #[must_use]
    pub const fn loader(&self) -> &L {
        &self.loader
    }
}

impl<C: Camera, L: DetectorLoader, S: PresentationSink> std::fmt::Debug for ParallaxSession<C, L, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParallaxSession")
            .field("tracking", &self.tracking)
            .field("status", &self.status)
            .field("viewport", &self.viewport)
            .field("target", &self.target.load())
            .field("render", &self.render)
            .finish_non_exhaustive()
    }
}
