//! Detection loop: detector cadence, head estimation and target publication.
//!
//! The loop is polled once per platform frame. It runs the detector at most once per
//! `interval_ms`, never twice on the same video frame, and survives individual
//! detector failures. Face presence is edge-triggered so status writes only happen on
//! transitions.

use crate::calibration::{ScreenCalibration, Viewport};
use crate::config::{Config, DetectionConfig, ParallaxConfig};
use crate::head_estimator::{HeadEstimator, HeadSample};
use crate::jitter::{Baseline, JitterFilter, SmoothedHeadState};
use crate::landmarks::{LandmarkDetector, VideoSource};
use crate::presentation::TrackingStatus;
use crate::target::{TargetCell, TargetOffset};
use crate::utils::safe_cast::{f64_to_i32_round, u32_to_f64};
use log::{debug, warn};

/// What one poll of the detection loop did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DetectionOutcome {
    /// Loop not running
    Inactive,
    /// Video has no decoded frame yet
    NoFrame,
    /// Too soon after the previous detector call
    RateLimited,
    /// Video timestamp unchanged since the previous call
    DuplicateFrame,
    /// Face found and target published
    Face {
        /// Raw estimate for this frame
        sample: HeadSample,
        /// Published target
        target: TargetOffset,
    },
    /// Detector ran and found no face
    NoFace,
    /// Detector raised; tick skipped
    Failed,
}

/// Outcome of a poll plus the UI updates it calls for
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionReport {
    /// What happened
    pub outcome: DetectionOutcome,
    /// Set only when face presence flipped
    pub status_change: Option<TrackingStatus>,
    /// Rate-limited position readout
    pub readout: Option<String>,
}

impl DetectionReport {
    const fn quiet(outcome: DetectionOutcome) -> Self {
        Self {
            outcome,
            status_change: None,
            readout: None,
        }
    }
}

/// State owned by the detection loop
#[derive(Debug, Clone)]
pub struct DetectionPipelineState {
    config: DetectionConfig,
    parallax: ParallaxConfig,
    calibration: ScreenCalibration,
    estimator: HeadEstimator,
    jitter: JitterFilter,
    active: bool,
    last_detect_ms: Option<f64>,
    last_video_time: Option<f64>,
    face_present: bool,
    last_readout_ms: Option<f64>,
    last_sample: Option<HeadSample>,
}

impl DetectionPipelineState {
    /// Build the detection state from configuration
    ///
    /// # Panics
    ///
    /// Panics if the jitter alpha is not in (0, 1]; validated configurations never are.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.detection.clone(),
            parallax: config.parallax.clone(),
            calibration: ScreenCalibration::from_config(&config.screen),
            estimator: HeadEstimator::new(config.estimator.clone()),
            jitter: JitterFilter::new(config.jitter.clone()),
            active: false,
            last_detect_ms: None,
            last_video_time: None,
            face_present: false,
            last_readout_ms: None,
            last_sample: None,
        }
    }

    /// Activate the loop with fresh per-session state
    pub fn start(&mut self) {
        self.reset();
        self.active = true;
    }

    /// Deactivate the loop; takes effect on the next poll
    pub fn stop(&mut self) {
        self.active = false;
        self.reset();
    }

    fn reset(&mut self) {
        self.jitter.clear();
        self.last_video_time = None;
        self.face_present = false;
        self.last_readout_ms = None;
        self.last_sample = None;
    }

    /// Whether the loop is running
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the last detector result contained a face
    #[must_use]
    pub const fn face_present(&self) -> bool {
        self.face_present
    }

    /// Calibration origin
    #[must_use]
    pub const fn baseline(&self) -> Baseline {
        self.jitter.baseline()
    }

    /// Smoothed head state
    #[must_use]
    pub fn head_state(&self) -> SmoothedHeadState {
        self.jitter.state()
    }

    /// Most recent raw estimate
    #[must_use]
    pub const fn last_sample(&self) -> Option<HeadSample> {
        self.last_sample
    }

    /// Re-center on the current smoothed head position and zero the published target
    pub fn recalibrate(&mut self, target: &TargetCell) {
        if !self.jitter.recalibrate() {
            debug!("Calibration requested before any face sample; baseline left unset");
        }
        target.clear();
    }

    /// Poll once
    ///
    /// `tracking` is the session-wide flag; the loop does nothing unless both it and
    /// the local active flag are set.
    pub fn tick(
        &mut self,
        now_ms: f64,
        tracking: bool,
        source: &dyn VideoSource,
        detector: &mut dyn LandmarkDetector,
        viewport: Viewport,
        target: &TargetCell,
    ) -> DetectionReport {
        if !self.active || !tracking {
            return DetectionReport::quiet(DetectionOutcome::Inactive);
        }

        let Some((video_w, video_h)) = source.frame_size() else {
            return DetectionReport::quiet(DetectionOutcome::NoFrame);
        };

        if let Some(last) = self.last_detect_ms {
            if now_ms - last < self.config.interval_ms {
                return DetectionReport::quiet(DetectionOutcome::RateLimited);
            }
        }
        self.last_detect_ms = Some(now_ms);

        let video_time = source.current_time();
        if self.last_video_time == Some(video_time) {
            return DetectionReport::quiet(DetectionOutcome::DuplicateFrame);
        }
        self.last_video_time = Some(video_time);

        let frame = match detector.detect(source, now_ms) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("detect error: {e}");
                return DetectionReport::quiet(DetectionOutcome::Failed);
            }
        };

        let Some(frame) = frame else {
            let status_change = if self.face_present {
                self.face_present = false;
                Some(TrackingStatus::Searching)
            } else {
                None
            };
            return DetectionReport {
                outcome: DetectionOutcome::NoFace,
                status_change,
                readout: None,
            };
        };

        let sample = self.estimator.estimate(&frame, u32_to_f64(video_w), u32_to_f64(video_h));
        self.last_sample = Some(sample);

        let displacement = self.jitter.update(sample, now_ms);
        let offset = TargetOffset::from_displacement(displacement, self.calibration.px_per_mm(viewport), &self.parallax);
        target.publish(offset, self.jitter.velocity());

        let status_change = if self.face_present {
            None
        } else {
            self.face_present = true;
            Some(TrackingStatus::Tracking)
        };

        let readout_due = self
            .last_readout_ms
            .map_or(true, |last| now_ms - last > self.config.readout_interval_ms);
        let readout = if readout_due {
            self.last_readout_ms = Some(now_ms);
            Some(format_readout(offset, sample))
        } else {
            None
        };

        DetectionReport {
            outcome: DetectionOutcome::Face { sample, target: offset },
            status_change,
            readout,
        }
    }
}

/// `X:<target_x> Y:<target_y> Z≈<depth>` with whole-pixel and whole-millimeter values
#[must_use]
pub fn format_readout(offset: TargetOffset, sample: HeadSample) -> String {
    format!(
        "X:{} Y:{} Z≈{}",
        f64_to_i32_round(offset.target_x),
        f64_to_i32_round(offset.target_y),
        f64_to_i32_round(sample.z_mm)
    )
}
