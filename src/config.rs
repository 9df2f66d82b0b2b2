//! Configuration management for the parallax head tracker

use crate::constants::{
    DEFAULT_DEPTH_FACTOR, DEFAULT_DETECT_INTERVAL_MS, DEFAULT_FACE_WIDTH_MM, DEFAULT_ORIGIN_THRESHOLD_PX,
    DEFAULT_READOUT_INTERVAL_MS, DEFAULT_SAMPLE_DT_MS, MAX_DEPTH_MM, MIN_DEPTH_MM, MIN_FACE_WIDTH_PX,
    MIN_VELOCITY_DT_MS,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Named tuning preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TuningProfile {
    /// Velocity prediction with two-stage render smoothing
    #[default]
    Predictive,
    /// Single-stage render smoothing, no prediction
    Simple,
}

impl FromStr for TuningProfile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "predictive" => Ok(Self::Predictive),
            "simple" => Ok(Self::Simple),
            other => Err(Error::ConfigError(format!("Unknown tuning profile: {other}"))),
        }
    }
}

impl fmt::Display for TuningProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Predictive => write!(f, "predictive"),
            Self::Simple => write!(f, "simple"),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Preset the remaining sections were derived from
    pub profile: TuningProfile,

    /// Physical screen description
    pub screen: ScreenConfig,

    /// Head displacement to parallax mapping
    pub parallax: ParallaxConfig,

    /// Head estimator parameters
    pub estimator: EstimatorConfig,

    /// Jitter/velocity filter parameters
    pub jitter: JitterConfig,

    /// Render loop smoothing and prediction
    pub render: RenderConfig,

    /// Perspective origin mapping
    pub perspective: PerspectiveConfig,

    /// Detection loop cadence
    pub detection: DetectionConfig,

    /// Landmark detector options
    pub detector: DetectorConfig,

    /// Camera request
    pub camera: CameraConfig,
}

/// Physical screen and viewer geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    /// Assumed distance between viewer and screen
    pub viewing_distance_cm: f64,

    /// Screen diagonal
    pub diagonal_in: f64,

    /// Aspect ratio width term
    pub aspect_w: f64,

    /// Aspect ratio height term
    pub aspect_h: f64,
}

/// Signed sensitivity of the parallax mapping per axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallaxConfig {
    /// Horizontal scale; negative mirrors the camera view
    pub scale_x: f64,

    /// Vertical scale; smaller than horizontal to damp vertical parallax
    pub scale_y: f64,
}

/// Head estimator parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Real face width assumed for every user
    pub assumed_face_width_mm: f64,

    /// Depth heuristic factor `k`
    pub depth_factor: f64,

    /// Floor for apparent face width
    pub min_face_width_px: f64,

    /// Horizontal outlier clamp
    pub x_limit_mm: f64,

    /// Vertical outlier clamp
    pub y_limit_mm: f64,

    /// Depth clamp lower bound
    pub z_min_mm: f64,

    /// Depth clamp upper bound
    pub z_max_mm: f64,
}

/// Jitter/velocity filter parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JitterConfig {
    /// Exponential smoothing responsiveness in (0, 1]
    pub alpha: f64,

    /// Displacements below this snap to zero
    pub deadzone_mm: f64,

    /// Weight of the previous velocity when blending a new estimate
    pub velocity_blend: f64,

    /// dt assumed for the first tick
    pub default_dt_ms: f64,

    /// Ticks closer together than this leave velocity untouched
    pub min_velocity_dt_ms: f64,
}

/// Render smoothing layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmoothingMode {
    /// One exponential stage with `response_ms`
    Single,
    /// Response stage followed by a visual stage
    TwoStage,
}

/// Render loop parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Stage layout
    pub smoothing: SmoothingMode,

    /// Response stage time constant
    pub response_ms: f64,

    /// Visual stage time constant
    pub visual_ms: f64,

    /// Share of velocity extrapolation applied per frame; 0 disables prediction
    pub prediction_fraction: f64,

    /// Per-frame velocity decay factor
    pub velocity_decay: f64,
}

/// Perspective origin mapping parameters, expressed as viewport fractions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerspectiveConfig {
    /// Soft-clamp range as a fraction of viewport width
    pub max_excursion_x: f64,

    /// Soft-clamp range as a fraction of viewport height
    pub max_excursion_y: f64,

    /// Hard inset from the left/right edges
    pub inset_x: f64,

    /// Hard inset from the top/bottom edges
    pub inset_y: f64,

    /// Minimum origin movement that triggers a write
    pub origin_threshold_px: f64,
}

/// Detection loop cadence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Minimum spacing between detector invocations
    pub interval_ms: f64,

    /// Minimum spacing between position readouts
    pub readout_interval_ms: f64,
}

/// Detector execution backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delegate {
    /// GPU inference
    Gpu,
    /// CPU inference
    Cpu,
}

/// Landmark detector options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Model asset location
    pub model_path: PathBuf,

    /// Execution backend
    pub delegate: Delegate,

    /// Faces to track; the pipeline only consumes the first
    pub num_faces: usize,

    /// Minimum face detection confidence (0.0-1.0)
    pub min_face_detection_confidence: f32,

    /// Minimum tracking confidence (0.0-1.0)
    pub min_tracking_confidence: f32,
}

/// Camera facing preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    /// Front camera
    User,
    /// Rear camera
    Environment,
}

/// Preferred camera request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Ideal capture width
    pub ideal_width: u32,

    /// Ideal capture height
    pub ideal_height: u32,

    /// Ideal frame rate
    pub ideal_frame_rate: u32,

    /// Facing preference
    pub facing_mode: FacingMode,
}

impl Default for Config {
    fn default() -> Self {
        Self::for_profile(TuningProfile::default())
    }
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            viewing_distance_cm: 55.0,
            diagonal_in: 14.0,
            aspect_w: 16.0,
            aspect_h: 10.0,
        }
    }
}

impl Default for ParallaxConfig {
    fn default() -> Self {
        Self {
            scale_x: -1.0,
            scale_y: 0.6,
        }
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self::for_profile(TuningProfile::default())
    }
}

impl EstimatorConfig {
    /// Estimator clamps for a profile
    #[must_use]
    pub const fn for_profile(profile: TuningProfile) -> Self {
        let (x_limit_mm, y_limit_mm) = match profile {
            TuningProfile::Predictive => (150.0, 120.0),
            TuningProfile::Simple => (200.0, 150.0),
        };
        Self {
            assumed_face_width_mm: DEFAULT_FACE_WIDTH_MM,
            depth_factor: DEFAULT_DEPTH_FACTOR,
            min_face_width_px: MIN_FACE_WIDTH_PX,
            x_limit_mm,
            y_limit_mm,
            z_min_mm: MIN_DEPTH_MM,
            z_max_mm: MAX_DEPTH_MM,
        }
    }
}

impl Default for JitterConfig {
    fn default() -> Self {
        Self::for_profile(TuningProfile::default())
    }
}

impl JitterConfig {
    /// Jitter filter tuning for a profile
    #[must_use]
    pub const fn for_profile(profile: TuningProfile) -> Self {
        let (alpha, deadzone_mm) = match profile {
            TuningProfile::Predictive => (0.55, 1.5),
            TuningProfile::Simple => (0.8, 1.2),
        };
        Self {
            alpha,
            deadzone_mm,
            velocity_blend: 0.5,
            default_dt_ms: DEFAULT_SAMPLE_DT_MS,
            min_velocity_dt_ms: MIN_VELOCITY_DT_MS,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::for_profile(TuningProfile::default())
    }
}

impl RenderConfig {
    /// Render tuning for a profile
    #[must_use]
    pub const fn for_profile(profile: TuningProfile) -> Self {
        match profile {
            TuningProfile::Predictive => Self {
                smoothing: SmoothingMode::TwoStage,
                response_ms: 30.0,
                visual_ms: 10.0,
                prediction_fraction: 0.4,
                velocity_decay: 0.92,
            },
            TuningProfile::Simple => Self {
                smoothing: SmoothingMode::Single,
                response_ms: 25.0,
                visual_ms: 10.0,
                prediction_fraction: 0.0,
                velocity_decay: 0.92,
            },
        }
    }

    /// Whether velocity extrapolation is applied
    #[must_use]
    pub fn predicts(&self) -> bool {
        self.prediction_fraction > 0.0
    }
}

impl Default for PerspectiveConfig {
    fn default() -> Self {
        Self {
            max_excursion_x: 0.42,
            max_excursion_y: 0.34,
            inset_x: 0.06,
            inset_y: 0.08,
            origin_threshold_px: DEFAULT_ORIGIN_THRESHOLD_PX,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_DETECT_INTERVAL_MS,
            readout_interval_ms: DEFAULT_READOUT_INTERVAL_MS,
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("assets/face_landmarker.task"),
            delegate: Delegate::Gpu,
            num_faces: 1,
            min_face_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            ideal_width: 320,
            ideal_height: 240,
            ideal_frame_rate: 30,
            facing_mode: FacingMode::User,
        }
    }
}

impl Config {
    /// Build a complete configuration from a named preset
    #[must_use]
    pub fn for_profile(profile: TuningProfile) -> Self {
        Self {
            profile,
            screen: ScreenConfig::default(),
            parallax: ParallaxConfig::default(),
            estimator: EstimatorConfig::for_profile(profile),
            jitter: JitterConfig::for_profile(profile),
            render: RenderConfig::for_profile(profile),
            perspective: PerspectiveConfig::default(),
            detection: DetectionConfig::default(),
            detector: DetectorConfig::default(),
            camera: CameraConfig::default(),
        }
    }

    /// Switch to a preset, replacing only the estimator, jitter and render sections
    pub fn apply_profile(&mut self, profile: TuningProfile) {
        self.profile = profile;
        self.estimator = EstimatorConfig::for_profile(profile);
        self.jitter = JitterConfig::for_profile(profile);
        self.render = RenderConfig::for_profile(profile);
    }

    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::IoError(e.to_string()))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Serialize configuration to YAML text
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_yaml()?;

        std::fs::write(path, content).map_err(|e| Error::IoError(e.to_string()))?;

        Ok(())
    }

    /// Validate configuration
    ///
    /// Every float must be finite; NaN compares false against any bound.
    pub fn validate(&self) -> Result<()> {
        let screen = &self.screen;
        if !is_positive(screen.viewing_distance_cm) || !is_positive(screen.diagonal_in) {
            return Err(Error::ConfigError(
                "Viewing distance and screen diagonal must be positive".to_string(),
            ));
        }
        if !is_positive(screen.aspect_w) || !is_positive(screen.aspect_h) {
            return Err(Error::ConfigError("Aspect ratio terms must be positive".to_string()));
        }

        if !self.parallax.scale_x.is_finite() || !self.parallax.scale_y.is_finite() {
            return Err(Error::ConfigError("Parallax scales must be finite".to_string()));
        }

        let est = &self.estimator;
        if !is_positive(est.assumed_face_width_mm)
            || !is_positive(est.depth_factor)
            || !is_positive(est.min_face_width_px)
        {
            return Err(Error::ConfigError(
                "Face width, depth factor and minimum face width must be positive".to_string(),
            ));
        }
        if !is_positive(est.x_limit_mm) || !is_positive(est.y_limit_mm) {
            return Err(Error::ConfigError("Estimator limits must be positive".to_string()));
        }
        if !est.z_min_mm.is_finite() || !est.z_max_mm.is_finite() || est.z_min_mm >= est.z_max_mm {
            return Err(Error::ConfigError("Depth range must be finite and non-empty".to_string()));
        }

        let jitter = &self.jitter;
        if !(jitter.alpha > 0.0 && jitter.alpha <= 1.0) {
            return Err(Error::ConfigError("Jitter alpha must be in (0, 1]".to_string()));
        }
        if !is_non_negative(jitter.deadzone_mm) {
            return Err(Error::ConfigError("Deadzone must be non-negative".to_string()));
        }
        if !(0.0..=1.0).contains(&jitter.velocity_blend) {
            return Err(Error::ConfigError(
                "Velocity blend must be between 0.0 and 1.0".to_string(),
            ));
        }
        if !is_positive(jitter.default_dt_ms) {
            return Err(Error::ConfigError("Default sample dt must be positive".to_string()));
        }
        if !is_non_negative(jitter.min_velocity_dt_ms) {
            return Err(Error::ConfigError("Minimum velocity dt must be non-negative".to_string()));
        }

        let render = &self.render;
        if !is_positive(render.response_ms) || !is_positive(render.visual_ms) {
            return Err(Error::ConfigError("Smoothing time constants must be positive".to_string()));
        }
        if !(0.0..=1.0).contains(&render.prediction_fraction) {
            return Err(Error::ConfigError(
                "Prediction fraction must be between 0.0 and 1.0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&render.velocity_decay) {
            return Err(Error::ConfigError(
                "Velocity decay must be between 0.0 and 1.0".to_string(),
            ));
        }

        let persp = &self.perspective;
        if !(0.0..0.5).contains(&persp.inset_x) || !(0.0..0.5).contains(&persp.inset_y) {
            return Err(Error::ConfigError("Insets must be in [0.0, 0.5)".to_string()));
        }
        if !is_positive(persp.max_excursion_x) || !is_positive(persp.max_excursion_y) {
            return Err(Error::ConfigError("Excursion ranges must be positive".to_string()));
        }
        if !is_non_negative(persp.origin_threshold_px) {
            return Err(Error::ConfigError("Origin threshold must be non-negative".to_string()));
        }

        if !is_non_negative(self.detection.interval_ms)
            || !is_non_negative(self.detection.readout_interval_ms)
        {
            return Err(Error::ConfigError("Detection intervals must be non-negative".to_string()));
        }

        let det = &self.detector;
        if det.num_faces == 0 {
            return Err(Error::ConfigError("Detector must track at least one face".to_string()));
        }
        if !(0.0..=1.0).contains(&det.min_face_detection_confidence)
            || !(0.0..=1.0).contains(&det.min_tracking_confidence)
        {
            return Err(Error::ConfigError(
                "Detector confidences must be between 0.0 and 1.0".to_string(),
            ));
        }

        Ok(())
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Parallax Head Tracking Configuration

# Tuning preset: predictive or simple
profile: predictive

# Physical screen
screen:
  viewing_distance_cm: 55.0
  diagonal_in: 14.0
  aspect_w: 16.0
  aspect_h: 10.0

# Parallax sensitivity (negative x mirrors the camera)
parallax:
  scale_x: -1.0
  scale_y: 0.6

# Head estimator
estimator:
  assumed_face_width_mm: 140.0
  depth_factor: 0.3
  min_face_width_px: 10.0
  x_limit_mm: 150.0
  y_limit_mm: 120.0
  z_min_mm: 300.0
  z_max_mm: 1200.0

# Jitter filter
jitter:
  alpha: 0.55
  deadzone_mm: 1.5
  velocity_blend: 0.5
  default_dt_ms: 33.0
  min_velocity_dt_ms: 1.0

# Render loop
render:
  smoothing: two_stage
  response_ms: 30.0
  visual_ms: 10.0
  prediction_fraction: 0.4
  velocity_decay: 0.92

# Perspective origin
perspective:
  max_excursion_x: 0.42
  max_excursion_y: 0.34
  inset_x: 0.06
  inset_y: 0.08
  origin_threshold_px: 0.08

# Detection cadence
detection:
  interval_ms: 33.0
  readout_interval_ms: 120.0

# Landmark detector
detector:
  model_path: "assets/face_landmarker.task"
  delegate: gpu
  num_faces: 1
  min_face_detection_confidence: 0.5
  min_tracking_confidence: 0.5

# Camera request
camera:
  ideal_width: 320
  ideal_height: 240
  ideal_frame_rate: 30
  facing_mode: user
"#;
